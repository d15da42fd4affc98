pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

pub use adapters::storage::LocalStorage;
pub use config::{CliConfig, Settings};
pub use core::{engine::LoggerEngine, pipeline::GpsPipeline};
pub use utils::error::{LoggerError, Result};
