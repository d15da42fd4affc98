pub mod toml_config;

use crate::adapters::button::{DEFAULT_BOUNCE, DEFAULT_BUTTON_PIN, DEFAULT_GPIO_ROOT};
use crate::adapters::camera::CameraSettings;
use crate::adapters::gpsd::DEFAULT_GPSD_ADDRESS;
use crate::adapters::thermometer::DEFAULT_W1_DEVICES;
use crate::core::ConfigProvider;
use crate::domain::model::DistanceReference;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use chrono_tz::Tz;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use toml_config::TomlConfig;

pub const DEFAULT_DATA_PATH: &str = "/usr/local/gpsdata";
pub const DEFAULT_POLL_SECONDS: u64 = 10;
pub const DEFAULT_DISTANCE_FEET: f64 = 100.0;
pub const DEFAULT_TIMEZONE: &str = "US/Central";
pub const DEFAULT_GPS_TIMEOUT_SECONDS: u64 = 30;

/// Command line of the field logger. Value flags are optional so they only
/// override the TOML file when given.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "gps-logger")]
#[command(about = "Logs GPS points to CSV and takes a geotagged photo every N feet")]
pub struct CliConfig {
    /// Don't write the data table to stdout
    #[arg(short = 'q')]
    pub quiet: bool,

    /// Absolute path to the destination folder
    #[arg(short = 'p', long = "path")]
    pub path: Option<String>,

    /// Seconds to wait between polls of the GPS
    #[arg(short = 't', long = "poll")]
    pub poll: Option<u64>,

    /// Distance in feet to travel before writing a new data point
    #[arg(short = 'd', long = "dist")]
    pub dist: Option<f64>,

    /// Where movement is measured from: last-logged or last-poll
    #[arg(long)]
    pub distance_reference: Option<DistanceReference>,

    /// gpsd host:port
    #[arg(long)]
    pub gpsd: Option<String>,

    /// Seconds to wait for a fix before giving up on a poll
    #[arg(long)]
    pub gps_timeout: Option<u64>,

    /// IANA time zone for the Date/Localtime columns
    #[arg(long)]
    pub timezone: Option<String>,

    /// TOML configuration file
    #[arg(short = 'c', long)]
    pub config: Option<String>,

    /// Still-capture program (raspistill, rpicam-still, ...)
    #[arg(long)]
    pub camera_program: Option<String>,

    /// Image rotation in degrees
    #[arg(long)]
    pub rotation: Option<u16>,

    /// Log CSV rows only, no photos
    #[arg(long)]
    pub no_camera: bool,

    /// Leave the temp column empty instead of reading a DS18B20
    #[arg(long)]
    pub no_thermometer: bool,

    /// Don't watch the GPIO push-button
    #[arg(long)]
    pub no_button: bool,

    /// GPIO line of the push-button
    #[arg(long)]
    pub button_pin: Option<u32>,

    /// Log memory and free disk space after every point
    #[arg(long)]
    pub monitor: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

/// Resolved settings: command line, then TOML file, then defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_path: String,
    pub poll_seconds: u64,
    pub distance_feet: f64,
    pub distance_reference: DistanceReference,
    pub timezone_name: String,
    pub timezone: Tz,
    pub quiet: bool,
    pub verbose: bool,
    pub monitor: bool,
    pub gpsd_address: String,
    pub gps_timeout_seconds: u64,
    pub camera_enabled: bool,
    pub camera: CameraSettings,
    pub thermometer_enabled: bool,
    pub w1_devices_dir: String,
    pub button_enabled: bool,
    pub button_pin: u32,
    pub gpio_root: String,
    pub bounce_ms: u64,
}

impl Settings {
    pub fn resolve(cli: &CliConfig) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };
        Self::merge(cli, &file)
    }

    pub fn merge(cli: &CliConfig, file: &TomlConfig) -> Result<Self> {
        file.validate()?;

        let defaults = CameraSettings::default();
        let camera = CameraSettings {
            program: cli
                .camera_program
                .clone()
                .or_else(|| file.camera.program.clone())
                .unwrap_or(defaults.program),
            width: file.camera.width.unwrap_or(defaults.width),
            height: file.camera.height.unwrap_or(defaults.height),
            rotation: cli
                .rotation
                .or(file.camera.rotation)
                .unwrap_or(defaults.rotation),
            warmup_ms: file.camera.warmup_ms.unwrap_or(defaults.warmup_ms),
            extra_args: file.camera.extra_args.clone().unwrap_or_default(),
        };

        let timezone_name = cli
            .timezone
            .clone()
            .or_else(|| file.logger.timezone.clone())
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone = validation::validate_timezone("logger.timezone", &timezone_name)?;

        let settings = Self {
            data_path: cli
                .path
                .clone()
                .or_else(|| file.logger.path.clone())
                .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string()),
            poll_seconds: cli
                .poll
                .or(file.logger.poll_seconds)
                .unwrap_or(DEFAULT_POLL_SECONDS),
            distance_feet: cli
                .dist
                .or(file.logger.distance_feet)
                .unwrap_or(DEFAULT_DISTANCE_FEET),
            distance_reference: cli
                .distance_reference
                .or(file.logger.distance_reference)
                .unwrap_or_default(),
            timezone_name,
            timezone,
            quiet: cli.quiet || file.logger.quiet.unwrap_or(false),
            verbose: cli.verbose,
            monitor: cli.monitor || file.monitoring.enabled.unwrap_or(false),
            gpsd_address: cli
                .gpsd
                .clone()
                .or_else(|| file.gpsd.address.clone())
                .unwrap_or_else(|| DEFAULT_GPSD_ADDRESS.to_string()),
            gps_timeout_seconds: cli
                .gps_timeout
                .or(file.gpsd.timeout_seconds)
                .unwrap_or(DEFAULT_GPS_TIMEOUT_SECONDS),
            camera_enabled: !cli.no_camera && file.camera.enabled.unwrap_or(true),
            camera,
            thermometer_enabled: !cli.no_thermometer && file.thermometer.enabled.unwrap_or(true),
            w1_devices_dir: file
                .thermometer
                .devices_dir
                .clone()
                .unwrap_or_else(|| DEFAULT_W1_DEVICES.to_string()),
            button_enabled: !cli.no_button && file.button.enabled.unwrap_or(true),
            button_pin: cli
                .button_pin
                .or(file.button.pin)
                .unwrap_or(DEFAULT_BUTTON_PIN),
            gpio_root: file
                .button
                .gpio_root
                .clone()
                .unwrap_or_else(|| DEFAULT_GPIO_ROOT.to_string()),
            bounce_ms: file
                .button
                .bounce_ms
                .unwrap_or(DEFAULT_BOUNCE.as_millis() as u64),
        };

        Ok(settings)
    }

    pub fn gps_timeout(&self) -> Duration {
        Duration::from_secs(self.gps_timeout_seconds)
    }

    pub fn bounce(&self) -> Duration {
        Duration::from_millis(self.bounce_ms)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_path("logger.path", &self.data_path)?;
        validation::validate_positive_number("logger.poll_seconds", self.poll_seconds, 1)?;
        validation::validate_range("logger.distance_feet", self.distance_feet, 0.0, 1_000_000.0)?;
        validation::validate_host_port("gpsd.address", &self.gpsd_address)?;
        validation::validate_positive_number("gpsd.timeout_seconds", self.gps_timeout_seconds, 1)?;
        if self.camera_enabled {
            validation::validate_non_empty_string("camera.program", &self.camera.program)?;
            validation::validate_one_of("camera.rotation", self.camera.rotation, &[0, 90, 180, 270])?;
        }
        if self.thermometer_enabled {
            validation::validate_path("thermometer.devices_dir", &self.w1_devices_dir)?;
        }
        if self.button_enabled {
            validation::validate_path("button.gpio_root", &self.gpio_root)?;
        }
        Ok(())
    }
}

impl ConfigProvider for Settings {
    fn data_path(&self) -> &str {
        &self.data_path
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_seconds)
    }

    fn distance_feet(&self) -> f64 {
        self.distance_feet
    }

    fn distance_reference(&self) -> DistanceReference {
        self.distance_reference
    }

    fn timezone(&self) -> Tz {
        self.timezone
    }

    fn quiet(&self) -> bool {
        self.quiet
    }
}
