//! Manual "log now" triggers: a push-button on a sysfs GPIO line and SIGUSR1.

use crate::utils::error::{LoggerError, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub const DEFAULT_GPIO_ROOT: &str = "/sys/class/gpio";
pub const DEFAULT_BUTTON_PIN: u32 = 23;
pub const DEFAULT_BOUNCE: Duration = Duration::from_millis(300);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Rising-edge detection with a bounce window.
#[derive(Debug, Clone)]
pub struct EdgeDetector {
    last_level: Option<bool>,
    last_fire: Option<Instant>,
    bounce: Duration,
}

impl EdgeDetector {
    pub fn new(bounce: Duration) -> Self {
        Self {
            last_level: None,
            last_fire: None,
            bounce,
        }
    }

    /// Feeds one sample; true when it completes a 0→1 edge outside the
    /// bounce window of the previous one.
    pub fn update(&mut self, level: bool, now: Instant) -> bool {
        let rising = self.last_level == Some(false) && level;
        self.last_level = Some(level);

        if !rising {
            return false;
        }

        let bouncing = self
            .last_fire
            .map(|t| now.saturating_duration_since(t) < self.bounce)
            .unwrap_or(false);
        if bouncing {
            return false;
        }

        self.last_fire = Some(now);
        true
    }
}

#[derive(Debug, Clone)]
pub struct GpioButton {
    gpio_root: PathBuf,
    pin: u32,
    bounce: Duration,
}

impl GpioButton {
    pub fn new(gpio_root: impl Into<PathBuf>, pin: u32) -> Self {
        Self {
            gpio_root: gpio_root.into(),
            pin,
            bounce: DEFAULT_BOUNCE,
        }
    }

    pub fn with_bounce(mut self, bounce: Duration) -> Self {
        self.bounce = bounce;
        self
    }

    fn line_dir(&self) -> PathBuf {
        self.gpio_root.join(format!("gpio{}", self.pin))
    }

    pub fn value_path(&self) -> PathBuf {
        self.line_dir().join("value")
    }

    /// Exports the line if needed and configures it as an input.
    pub async fn prepare(&self) -> Result<()> {
        if !tokio::fs::try_exists(self.line_dir()).await.unwrap_or(false) {
            tokio::fs::write(self.gpio_root.join("export"), self.pin.to_string())
                .await
                .map_err(|e| LoggerError::ConfigError {
                    message: format!("cannot export GPIO {}: {}", self.pin, e),
                })?;
        }

        tokio::fs::write(self.line_dir().join("direction"), "in")
            .await
            .map_err(|e| LoggerError::ConfigError {
                message: format!("cannot set GPIO {} as input: {}", self.pin, e),
            })?;

        Ok(())
    }

    /// Polls the line and wakes `trigger` on every debounced press.
    pub fn spawn(self, trigger: Arc<Notify>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let value_path = self.value_path();
            let mut detector = EdgeDetector::new(self.bounce);
            let mut ticker = tokio::time::interval(POLL_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!("🔘 Watching button on GPIO {}", self.pin);

            loop {
                ticker.tick().await;
                let level = match tokio::fs::read_to_string(&value_path).await {
                    Ok(raw) => raw.trim() == "1",
                    Err(e) => {
                        tracing::warn!("Button read failed on GPIO {}: {}", self.pin, e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                };

                if detector.update(level, Instant::now()) {
                    tracing::info!("🔘 Button pressed, logging now");
                    trigger.notify_one();
                }
            }
        })
    }
}

/// `kill -USR1 <pid>` logs a point immediately.
#[cfg(unix)]
pub fn spawn_signal_trigger(trigger: Arc<Notify>) -> Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut usr1 = signal(SignalKind::user_defined1())?;
    Ok(tokio::spawn(async move {
        while usr1.recv().await.is_some() {
            tracing::info!("📨 SIGUSR1 received, logging now");
            trigger.notify_one();
        }
    }))
}

#[cfg(not(unix))]
pub fn spawn_signal_trigger(_trigger: Arc<Notify>) -> Result<JoinHandle<()>> {
    Ok(tokio::spawn(async {}))
}
