use crate::domain::model::DistanceReference;
use crate::utils::error::{LoggerError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional file configuration; every key may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub logger: LoggerSection,
    #[serde(default)]
    pub gpsd: GpsdSection,
    #[serde(default)]
    pub camera: CameraSection,
    #[serde(default)]
    pub thermometer: ThermometerSection,
    #[serde(default)]
    pub button: ButtonSection,
    #[serde(default)]
    pub monitoring: MonitoringSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggerSection {
    pub path: Option<String>,
    pub poll_seconds: Option<u64>,
    pub distance_feet: Option<f64>,
    pub distance_reference: Option<DistanceReference>,
    pub timezone: Option<String>,
    pub quiet: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpsdSection {
    pub address: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CameraSection {
    pub enabled: Option<bool>,
    pub program: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub rotation: Option<u16>,
    pub warmup_ms: Option<u64>,
    pub extra_args: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThermometerSection {
    pub enabled: Option<bool>,
    pub devices_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ButtonSection {
    pub enabled: Option<bool>,
    pub pin: Option<u32>,
    pub gpio_root: Option<String>,
    pub bounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringSection {
    pub enabled: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LoggerError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LoggerError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GPSD_HOST})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LoggerError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Checks only the values that are present; defaults fill the rest.
    pub fn validate_config(&self) -> Result<()> {
        if let Some(path) = &self.logger.path {
            validation::validate_path("logger.path", path)?;
        }
        if let Some(poll) = self.logger.poll_seconds {
            validation::validate_positive_number("logger.poll_seconds", poll, 1)?;
        }
        if let Some(distance) = self.logger.distance_feet {
            validation::validate_range("logger.distance_feet", distance, 0.0, 1_000_000.0)?;
        }
        if let Some(tz) = &self.logger.timezone {
            validation::validate_timezone("logger.timezone", tz)?;
        }
        if let Some(address) = &self.gpsd.address {
            validation::validate_host_port("gpsd.address", address)?;
        }
        if let Some(timeout) = self.gpsd.timeout_seconds {
            validation::validate_positive_number("gpsd.timeout_seconds", timeout, 1)?;
        }
        if let Some(rotation) = self.camera.rotation {
            validation::validate_one_of("camera.rotation", rotation, &[0, 90, 180, 270])?;
        }
        if let Some(program) = &self.camera.program {
            validation::validate_non_empty_string("camera.program", program)?;
        }
        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[logger]
path = "/media/usb/gpsdata"
poll_seconds = 5
distance_feet = 250.0
distance_reference = "last-poll"
timezone = "America/Denver"

[gpsd]
address = "127.0.0.1:2947"
timeout_seconds = 60

[camera]
program = "rpicam-still"
rotation = 180
extra_args = ["--quality", "90"]

[thermometer]
enabled = false

[button]
pin = 17
bounce_ms = 500
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.logger.path.as_deref(), Some("/media/usb/gpsdata"));
        assert_eq!(config.logger.poll_seconds, Some(5));
        assert_eq!(
            config.logger.distance_reference,
            Some(DistanceReference::LastPoll)
        );
        assert_eq!(config.camera.rotation, Some(180));
        assert_eq!(config.thermometer.enabled, Some(false));
        assert_eq!(config.button.pin, Some(17));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.logger.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("GPS_LOGGER_TEST_GPSD", "10.0.0.5:2947");

        let toml_content = r#"
[gpsd]
address = "${GPS_LOGGER_TEST_GPSD}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.gpsd.address.as_deref(), Some("10.0.0.5:2947"));

        std::env::remove_var("GPS_LOGGER_TEST_GPSD");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[camera]
rotation = 45
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[logger]\ntimezone = \"Nowhere/Special\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_distance_reference_fails_to_parse() {
        let err = TomlConfig::from_toml_str("[logger]\ndistance_reference = \"nearest\"\n")
            .unwrap_err();
        assert!(matches!(err, LoggerError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[logger]\npath = \"/data\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.logger.path.as_deref(), Some("/data"));
    }
}
