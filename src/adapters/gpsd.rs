//! Client for the gpsd JSON protocol.
//!
//! Each `watch()` opens a new TCP connection and enables JSON watching, so
//! the reports seen are current rather than whatever sat in a buffer since
//! the last poll. Only `TPV` and `SKY` reports are decoded.

use crate::domain::model::{GpsReport, SkyReport, TpvReport};
use crate::domain::ports::{GpsSource, ReportStream};
use crate::utils::error::{LoggerError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;

pub const DEFAULT_GPSD_ADDRESS: &str = "127.0.0.1:2947";
pub const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";

#[derive(Debug, Deserialize)]
struct WireTpv {
    mode: Option<u8>,
    time: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    alt: Option<f64>,
    #[serde(rename = "altMSL")]
    alt_msl: Option<f64>,
    #[serde(rename = "altHAE")]
    alt_hae: Option<f64>,
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WireSky {
    satellites: Option<Vec<serde_json::Value>>,
    #[serde(rename = "nSat")]
    n_sat: Option<u32>,
}

/// Decodes one line of gpsd output.
pub fn decode_report(line: &str) -> Result<GpsReport> {
    let value: serde_json::Value = serde_json::from_str(line)?;
    let class = value
        .get("class")
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string();

    let report = match class.as_str() {
        "TPV" => {
            let tpv: WireTpv = serde_json::from_value(value)?;
            GpsReport::Tpv(TpvReport {
                mode: tpv.mode.unwrap_or(0),
                time: tpv.time,
                latitude: tpv.lat,
                longitude: tpv.lon,
                altitude: tpv.alt.or(tpv.alt_msl).or(tpv.alt_hae),
                speed: tpv.speed,
            })
        }
        "SKY" => {
            let sky: WireSky = serde_json::from_value(value)?;
            GpsReport::Sky(SkyReport {
                satellites: sky
                    .satellites
                    .map(|s| s.len() as u32)
                    .or(sky.n_sat),
            })
        }
        _ => GpsReport::Other(class),
    };

    Ok(report)
}

#[derive(Debug, Clone)]
pub struct GpsdClient {
    address: String,
    connect_timeout: Duration,
}

impl GpsdClient {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connect_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Default for GpsdClient {
    fn default() -> Self {
        Self::new(DEFAULT_GPSD_ADDRESS)
    }
}

pub struct GpsdStream {
    lines: Lines<BufReader<TcpStream>>,
}

#[async_trait]
impl GpsSource for GpsdClient {
    type Stream = GpsdStream;

    async fn watch(&self) -> Result<GpsdStream> {
        tracing::debug!("Connecting to gpsd at {}", self.address);

        let connect = TcpStream::connect(&self.address);
        let mut stream = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| LoggerError::GpsdError {
                message: format!("timed out connecting to {}", self.address),
            })?
            .map_err(|e| LoggerError::GpsdError {
                message: format!("cannot connect to {}: {}", self.address, e),
            })?;

        stream
            .write_all(WATCH_COMMAND)
            .await
            .map_err(|e| LoggerError::GpsdError {
                message: format!("failed to send WATCH: {}", e),
            })?;

        Ok(GpsdStream {
            lines: BufReader::new(stream).lines(),
        })
    }
}

#[async_trait]
impl ReportStream for GpsdStream {
    async fn next_report(&mut self) -> Result<Option<GpsReport>> {
        loop {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|e| LoggerError::GpsdError {
                    message: format!("connection lost: {}", e),
                })?;

            let Some(line) = line else {
                return Ok(None);
            };

            if line.trim().is_empty() {
                continue;
            }

            match decode_report(&line) {
                Ok(report) => return Ok(Some(report)),
                Err(e) => {
                    tracing::debug!("Skipping undecodable gpsd line ({}): {}", e, line);
                }
            }
        }
    }
}
