pub mod acquire;
pub mod engine;
pub mod pipeline;
pub mod track_log;

pub use crate::domain::model::{LogPoint, Observation};
pub use crate::domain::ports::{
    Camera, ConfigProvider, GpsSource, Pipeline, ReportStream, Storage, Thermometer,
};
pub use crate::utils::error::Result;
