use crate::adapters::exif;
use crate::domain::model::GpsExifTags;
use crate::domain::ports::Camera;
use crate::utils::error::{LoggerError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    pub program: String,
    pub width: u32,
    pub height: u32,
    pub rotation: u16,
    /// Preview/warm-up time before the shot, in milliseconds.
    pub warmup_ms: u64,
    pub extra_args: Vec<String>,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            program: "raspistill".to_string(),
            width: 3280,
            height: 2464,
            rotation: 270,
            warmup_ms: 2000,
            extra_args: Vec::new(),
        }
    }
}

impl CameraSettings {
    fn uses_libcamera_flags(&self) -> bool {
        let name = Path::new(&self.program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        name == "rpicam-still" || name == "libcamera-still"
    }

    /// Arguments for the capture program writing to `output`.
    pub fn capture_args(&self, output: &Path) -> Vec<String> {
        let output = output.display().to_string();
        let mut args = if self.uses_libcamera_flags() {
            vec![
                "--output".to_string(),
                output,
                "--width".to_string(),
                self.width.to_string(),
                "--height".to_string(),
                self.height.to_string(),
                "--rotation".to_string(),
                self.rotation.to_string(),
                "--timeout".to_string(),
                self.warmup_ms.to_string(),
                "--nopreview".to_string(),
            ]
        } else {
            vec![
                "-o".to_string(),
                output,
                "-w".to_string(),
                self.width.to_string(),
                "-h".to_string(),
                self.height.to_string(),
                "-rot".to_string(),
                self.rotation.to_string(),
                "-t".to_string(),
                self.warmup_ms.to_string(),
                "-n".to_string(),
            ]
        };
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Shells out to a still-capture program, then embeds the GPS tags.
#[derive(Debug, Clone)]
pub struct CommandCamera {
    settings: CameraSettings,
}

impl CommandCamera {
    pub fn new(settings: CameraSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Camera for CommandCamera {
    async fn capture(&self, path: &Path, tags: &GpsExifTags) -> Result<()> {
        let args = self.settings.capture_args(path);
        tracing::debug!("📷 {} {}", self.settings.program, args.join(" "));

        let output = Command::new(&self.settings.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| LoggerError::CameraError {
                message: format!("failed to start '{}': {}", self.settings.program, e),
            })?;

        if !output.status.success() {
            return Err(LoggerError::CameraError {
                message: format!(
                    "'{}' exited with {}: {}",
                    self.settings.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(LoggerError::CameraError {
                message: format!("no image written to {}", path.display()),
            });
        }

        let target: PathBuf = path.to_path_buf();
        let tags = tags.clone();
        let written = tokio::task::spawn_blocking(move || exif::write_gps_exif(&target, &tags))
            .await
            .map_err(|e| LoggerError::ProcessingError {
                message: format!("EXIF task failed: {}", e),
            })?;

        // the photo is still worth keeping without its GPS block
        if let Err(e) = written {
            tracing::warn!("⚠️ {} ({})", e, e.recovery_suggestion());
        }

        Ok(())
    }
}

/// Used with `--no-camera`: points are logged to CSV only.
#[derive(Debug, Clone, Default)]
pub struct NoCamera;

#[async_trait]
impl Camera for NoCamera {
    async fn capture(&self, path: &Path, _tags: &GpsExifTags) -> Result<()> {
        tracing::debug!("Camera disabled, skipping {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> GpsExifTags {
        GpsExifTags {
            latitude: (1, 2, 3),
            latitude_ref: "N".to_string(),
            longitude: (4, 5, 6),
            longitude_ref: "E".to_string(),
            altitude_cm: 0,
            speed_mm_s: 0,
            satellites: "4".to_string(),
            time_stamp: (0, 0, 0),
            date_stamp: "2020:01:01".to_string(),
        }
    }

    #[test]
    fn test_raspistill_args() {
        let settings = CameraSettings::default();
        let args = settings.capture_args(Path::new("/data/s/s-1.jpg"));
        assert_eq!(
            args,
            vec![
                "-o", "/data/s/s-1.jpg", "-w", "3280", "-h", "2464", "-rot", "270", "-t", "2000",
                "-n"
            ]
        );
    }

    #[test]
    fn test_libcamera_args_and_extras() {
        let settings = CameraSettings {
            program: "/usr/bin/rpicam-still".to_string(),
            rotation: 180,
            extra_args: vec!["--quality".to_string(), "90".to_string()],
            ..Default::default()
        };
        let args = settings.capture_args(Path::new("out.jpg"));
        assert_eq!(args[0], "--output");
        assert_eq!(args[1], "out.jpg");
        assert!(args.contains(&"--nopreview".to_string()));
        assert_eq!(&args[args.len() - 2..], &["--quality", "90"]);
    }

    #[tokio::test]
    async fn test_missing_program_is_camera_error() {
        let camera = CommandCamera::new(CameraSettings {
            program: "/nonexistent/still-capture".to_string(),
            ..Default::default()
        });
        let err = camera
            .capture(Path::new("/tmp/never.jpg"), &tags())
            .await
            .unwrap_err();
        assert!(matches!(err, LoggerError::CameraError { .. }));
    }

    #[tokio::test]
    async fn test_no_camera_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.jpg");
        NoCamera.capture(&path, &tags()).await.unwrap();
        assert!(!path.exists());
    }
}
