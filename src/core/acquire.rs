use crate::domain::model::{FixMode, GpsFix, GpsReport, Position, TpvReport};
use crate::domain::ports::ReportStream;
use crate::domain::services::finite_or_zero;
use crate::utils::error::{LoggerError, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;

pub const NO_FIX_BACKOFF: Duration = Duration::from_millis(500);

fn fix_from_tpv(tpv: &TpvReport) -> Option<GpsFix> {
    let latitude = finite_or_zero(tpv.latitude);
    let longitude = finite_or_zero(tpv.longitude);

    // (0, 0) doubles as "no position"; the equator/meridian crossing is lost
    if latitude == 0.0 || longitude == 0.0 {
        return None;
    }

    let time = tpv
        .time
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Some(GpsFix {
        position: Position::new(latitude, longitude),
        mode: FixMode::from_code(tpv.mode),
        time,
        speed: finite_or_zero(tpv.speed),
        altitude: finite_or_zero(tpv.altitude),
    })
}

/// Reads reports until both a satellite count and a usable position have
/// been seen, returning the fix and the satellites in view.
pub async fn acquire_fix<S>(stream: &mut S, no_fix_backoff: Duration) -> Result<(GpsFix, u32)>
where
    S: ReportStream + ?Sized,
{
    let mut satellites: Option<u32> = None;
    let mut fix: Option<GpsFix> = None;

    while satellites.is_none() || fix.is_none() {
        let report = stream
            .next_report()
            .await?
            .ok_or_else(|| LoggerError::GpsdError {
                message: "report stream ended before a fix was acquired".to_string(),
            })?;

        match report {
            GpsReport::Sky(sky) if satellites.is_none() => {
                if let Some(count) = sky.satellites {
                    tracing::debug!("🛰️ {} satellites in view", count);
                    satellites = Some(count);
                }
            }
            GpsReport::Tpv(tpv) if fix.is_none() => match fix_from_tpv(&tpv) {
                Some(found) => fix = Some(found),
                None if !FixMode::from_code(tpv.mode).has_fix() => {
                    tracing::debug!("No satellite fix yet (mode {})", tpv.mode);
                    tokio::time::sleep(no_fix_backoff).await;
                }
                None => {}
            },
            _ => {}
        }
    }

    match (fix, satellites) {
        (Some(fix), Some(satellites)) => Ok((fix, satellites)),
        _ => Err(LoggerError::ProcessingError {
            message: "acquisition finished without a fix".to_string(),
        }),
    }
}
