//! DS18B20 temperature probe read through the 1-Wire sysfs interface.

use crate::domain::ports::Thermometer;
use crate::utils::error::{LoggerError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_W1_DEVICES: &str = "/sys/bus/w1/devices";
const READ_ATTEMPTS: usize = 10;
const RETRY_DELAY: Duration = Duration::from_millis(200);

/// Parses a `w1_slave` file. `None` means the CRC line did not say `YES`
/// and the read should be retried.
pub fn parse_w1_slave(content: &str) -> Result<Option<f64>> {
    let mut lines = content.lines();
    let crc_ok = lines
        .next()
        .map(|l| l.trim_end().ends_with("YES"))
        .unwrap_or(false);
    if !crc_ok {
        return Ok(None);
    }

    let data = lines.next().unwrap_or_default();
    let raw = data
        .find("t=")
        .map(|pos| data[pos + 2..].trim())
        .ok_or_else(|| LoggerError::SensorError {
            message: format!("no t= reading in '{}'", data.trim()),
        })?;

    let millidegrees: f64 = raw.parse().map_err(|_| LoggerError::SensorError {
        message: format!("unreadable temperature '{}'", raw),
    })?;

    Ok(Some(millidegrees / 1000.0))
}

#[derive(Debug, Clone)]
pub struct W1Thermometer {
    device_file: PathBuf,
}

impl W1Thermometer {
    pub fn new(device_file: impl Into<PathBuf>) -> Self {
        Self {
            device_file: device_file.into(),
        }
    }

    /// Finds the first `28*` family device under `devices_dir`.
    pub fn discover(devices_dir: impl AsRef<Path>) -> Result<Self> {
        let pattern = devices_dir.as_ref().join("28*").join("w1_slave");
        let pattern = pattern.to_string_lossy();

        let found = glob::glob(&pattern)
            .map_err(|e| LoggerError::SensorError {
                message: format!("bad device pattern '{}': {}", pattern, e),
            })?
            .filter_map(|entry| entry.ok())
            .next()
            .ok_or_else(|| LoggerError::SensorError {
                message: format!("no DS18B20 probe matching {}", pattern),
            })?;

        tracing::info!("🌡️ Using temperature probe {}", found.display());
        Ok(Self::new(found))
    }

    pub fn device_file(&self) -> &Path {
        &self.device_file
    }
}

#[async_trait]
impl Thermometer for W1Thermometer {
    async fn read_celsius(&self) -> Result<Option<f64>> {
        for attempt in 1..=READ_ATTEMPTS {
            let content = tokio::fs::read_to_string(&self.device_file).await?;
            if let Some(celsius) = parse_w1_slave(&content)? {
                return Ok(Some(celsius));
            }
            tracing::debug!("Probe CRC not ready (attempt {})", attempt);
            tokio::time::sleep(RETRY_DELAY).await;
        }

        Err(LoggerError::SensorError {
            message: format!(
                "probe {} never reported a valid CRC",
                self.device_file.display()
            ),
        })
    }
}

/// Used when no probe is fitted; the CSV temp column stays empty.
#[derive(Debug, Clone, Default)]
pub struct NoThermometer;

#[async_trait]
impl Thermometer for NoThermometer {
    async fn read_celsius(&self) -> Result<Option<f64>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n72 01 4b 46 7f ff 0e 10 57 t=23125\n";
    const BAD_CRC: &str = "72 01 4b 46 7f ff 0e 10 57 : crc=57 NO\n72 01 4b 46 7f ff 0e 10 57 t=23125\n";

    #[test]
    fn test_parse_w1_slave() {
        assert_eq!(parse_w1_slave(GOOD).unwrap(), Some(23.125));
        assert_eq!(parse_w1_slave(BAD_CRC).unwrap(), None);
        assert!(parse_w1_slave("crc=00 YES\nnothing here\n").is_err());
    }

    #[test]
    fn test_parse_negative_temperature() {
        let content = "crc=aa YES\nff ff t=-10500\n";
        assert_eq!(parse_w1_slave(content).unwrap(), Some(-10.5));
    }

    #[tokio::test]
    async fn test_discover_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let probe = dir.path().join("28-0316a2794aff");
        std::fs::create_dir_all(&probe).unwrap();
        std::fs::create_dir_all(dir.path().join("w1_bus_master1")).unwrap();
        std::fs::write(probe.join("w1_slave"), GOOD).unwrap();

        let thermometer = W1Thermometer::discover(dir.path()).unwrap();
        assert_eq!(thermometer.device_file(), probe.join("w1_slave"));
        assert_eq!(thermometer.read_celsius().await.unwrap(), Some(23.125));
    }

    #[test]
    fn test_discover_without_probe_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = W1Thermometer::discover(dir.path()).unwrap_err();
        assert!(matches!(err, LoggerError::SensorError { .. }));
    }

    #[tokio::test]
    async fn test_no_thermometer() {
        assert_eq!(NoThermometer.read_celsius().await.unwrap(), None);
    }
}
