use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("gpsd error: {message}")]
    GpsdError { message: String },

    #[error("No GPS fix within {seconds}s")]
    GpsTimeout { seconds: u64 },

    #[error("Camera error: {message}")]
    CameraError { message: String },

    #[error("EXIF error: {message}")]
    ExifError { message: String },

    #[error("Sensor error: {message}")]
    SensorError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Gps,
    Hardware,
    Storage,
    Configuration,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LoggerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LoggerError::GpsdError { .. } | LoggerError::GpsTimeout { .. } => ErrorCategory::Gps,
            LoggerError::CameraError { .. }
            | LoggerError::ExifError { .. }
            | LoggerError::SensorError { .. } => ErrorCategory::Hardware,
            LoggerError::IoError(_) | LoggerError::CsvError(_) => ErrorCategory::Storage,
            LoggerError::ConfigError { .. }
            | LoggerError::ConfigValidationError { .. }
            | LoggerError::InvalidConfigValueError { .. }
            | LoggerError::MissingConfigError { .. } => ErrorCategory::Configuration,
            LoggerError::SerializationError(_) | LoggerError::ProcessingError { .. } => {
                ErrorCategory::Data
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // no fix yet is normal right after power-on
            LoggerError::GpsTimeout { .. } => ErrorSeverity::Low,
            LoggerError::GpsdError { .. }
            | LoggerError::SensorError { .. }
            | LoggerError::ExifError { .. }
            | LoggerError::ProcessingError { .. }
            | LoggerError::SerializationError(_) => ErrorSeverity::Medium,
            LoggerError::CameraError { .. }
            | LoggerError::CsvError(_)
            | LoggerError::ConfigError { .. }
            | LoggerError::ConfigValidationError { .. }
            | LoggerError::InvalidConfigValueError { .. }
            | LoggerError::MissingConfigError { .. } => ErrorSeverity::High,
            LoggerError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// Whether the worker loop should try again after this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.category(), ErrorCategory::Configuration)
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            LoggerError::GpsdError { .. } => {
                "Check that gpsd is running (systemctl status gpsd) and the receiver is plugged in"
            }
            LoggerError::GpsTimeout { .. } => {
                "Move to open sky and wait for the receiver to acquire satellites"
            }
            LoggerError::CameraError { .. } => {
                "Check the camera ribbon cable and that the capture program is installed"
            }
            LoggerError::ExifError { .. } => "The photo was kept without GPS tags; check the JPEG",
            LoggerError::SensorError { .. } => {
                "Check the DS18B20 wiring and that the w1-gpio overlay is enabled"
            }
            LoggerError::IoError(_) | LoggerError::CsvError(_) => {
                "Check that the data directory exists, is writable and has free space"
            }
            LoggerError::ConfigError { .. }
            | LoggerError::ConfigValidationError { .. }
            | LoggerError::InvalidConfigValueError { .. }
            | LoggerError::MissingConfigError { .. } => {
                "Fix the command line flags or the TOML configuration file"
            }
            LoggerError::SerializationError(_) | LoggerError::ProcessingError { .. } => {
                "Run with --verbose to see the offending report"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Gps => format!("GPS unavailable: {}", self),
            ErrorCategory::Hardware => format!("Hardware problem: {}", self),
            ErrorCategory::Storage => format!("Could not save data: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Data => format!("Unexpected data: {}", self),
        }
    }
}
