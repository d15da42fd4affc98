use crate::domain::model::{DistanceReference, GpsExifTags, GpsReport, LogPoint, Observation};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono_tz::Tz;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn append_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn create_dir(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Absolute location of a storage-relative path.
    fn resolve(&self, path: &str) -> PathBuf;
}

pub trait ConfigProvider: Send + Sync {
    fn data_path(&self) -> &str;
    fn poll_interval(&self) -> Duration;
    fn distance_feet(&self) -> f64;
    fn distance_reference(&self) -> DistanceReference;
    fn timezone(&self) -> Tz;
    fn quiet(&self) -> bool;
}

/// A live feed of gpsd reports.
#[async_trait]
pub trait ReportStream: Send {
    /// `None` once the feed has ended.
    async fn next_report(&mut self) -> Result<Option<GpsReport>>;
}

#[async_trait]
pub trait GpsSource: Send + Sync {
    type Stream: ReportStream;

    /// Opens a fresh stream so no stale buffered reports are seen.
    async fn watch(&self) -> Result<Self::Stream>;
}

#[async_trait]
pub trait Camera: Send + Sync {
    async fn capture(&self, path: &Path, tags: &GpsExifTags) -> Result<()>;
}

#[async_trait]
pub trait Thermometer: Send + Sync {
    async fn read_celsius(&self) -> Result<Option<f64>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Prepares the session directory and CSV header.
    async fn start(&self) -> Result<()>;
    async fn acquire(&self) -> Result<Observation>;
    /// Returns the absolute path of the captured photo.
    async fn record(&self, point: &LogPoint) -> Result<PathBuf>;
}
