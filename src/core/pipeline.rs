use crate::core::acquire::{acquire_fix, NO_FIX_BACKOFF};
use crate::core::track_log::TrackLog;
use crate::core::{Camera, GpsSource, Pipeline, Storage, Thermometer};
use crate::domain::model::{GpsExifTags, GpsFix, LogPoint, Observation, SessionLayout};
use crate::utils::error::{LoggerError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GPS_TIMEOUT: Duration = Duration::from_secs(30);

/// Reads the GPS and probe, then writes the CSV row and the photo.
pub struct GpsPipeline<G: GpsSource, C: Camera, T: Thermometer, S: Storage> {
    gps: G,
    camera: C,
    thermometer: T,
    track_log: TrackLog<S>,
    layout: SessionLayout,
    gps_timeout: Duration,
    no_fix_backoff: Duration,
}

impl<G: GpsSource, C: Camera, T: Thermometer, S: Storage> GpsPipeline<G, C, T, S> {
    pub fn new(gps: G, camera: C, thermometer: T, storage: S, layout: SessionLayout) -> Self {
        Self {
            gps,
            camera,
            thermometer,
            track_log: TrackLog::new(storage, &layout),
            layout,
            gps_timeout: DEFAULT_GPS_TIMEOUT,
            no_fix_backoff: NO_FIX_BACKOFF,
        }
    }

    pub fn with_gps_timeout(mut self, timeout: Duration) -> Self {
        self.gps_timeout = timeout;
        self
    }

    pub fn with_no_fix_backoff(mut self, backoff: Duration) -> Self {
        self.no_fix_backoff = backoff;
        self
    }

    pub fn layout(&self) -> &SessionLayout {
        &self.layout
    }

    pub fn track_log(&self) -> &TrackLog<S> {
        &self.track_log
    }

    async fn watch_and_acquire(&self) -> Result<(GpsFix, u32)> {
        let mut stream = self.gps.watch().await?;
        acquire_fix(&mut stream, self.no_fix_backoff).await
    }
}

#[async_trait::async_trait]
impl<G, C, T, S> Pipeline for GpsPipeline<G, C, T, S>
where
    G: GpsSource,
    C: Camera,
    T: Thermometer,
    S: Storage,
{
    async fn start(&self) -> Result<()> {
        self.track_log.storage().create_dir(self.layout.dir()).await?;
        self.track_log.start().await?;
        tracing::info!(
            "📁 Session {} logging to {}",
            self.layout.id(),
            self.track_log.storage().resolve(self.track_log.path()).display()
        );
        Ok(())
    }

    async fn acquire(&self) -> Result<Observation> {
        let (fix, satellites) = tokio::time::timeout(self.gps_timeout, self.watch_and_acquire())
            .await
            .map_err(|_| LoggerError::GpsTimeout {
                seconds: self.gps_timeout.as_secs(),
            })??;

        let temperature_c = self.thermometer.read_celsius().await?;

        tracing::debug!(
            "Fix {:.6},{:.6} mode {:?}, {} sats, temp {:?}",
            fix.position.latitude,
            fix.position.longitude,
            fix.mode,
            satellites,
            temperature_c
        );

        Ok(Observation {
            fix,
            satellites,
            temperature_c,
        })
    }

    /// The photo is taken first so a failed capture leaves no CSV row
    /// naming a missing file.
    async fn record(&self, point: &LogPoint) -> Result<PathBuf> {
        let photo_path = self
            .track_log
            .storage()
            .resolve(&self.layout.photo_path(point.index));
        let tags = GpsExifTags::from_point(point);
        self.camera.capture(&photo_path, &tags).await?;

        self.track_log.append(point).await?;

        Ok(photo_path)
    }
}
