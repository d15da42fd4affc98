use crate::core::track_log::{console_header, console_row};
use crate::core::{ConfigProvider, Pipeline};
use crate::domain::model::{LogPoint, SessionLayout, SessionSummary};
use crate::domain::services::DistanceTracker;
use crate::utils::error::Result;
use crate::utils::monitor::HealthMonitor;
use chrono_tz::Tz;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Drives the poll → acquire → distance gate → record loop.
pub struct LoggerEngine<P: Pipeline> {
    pipeline: P,
    tracker: DistanceTracker,
    layout: SessionLayout,
    timezone: Tz,
    poll_interval: Duration,
    retry_delay: Duration,
    quiet: bool,
    trigger: Arc<Notify>,
    monitor: HealthMonitor,
    summary: SessionSummary,
}

impl<P: Pipeline> LoggerEngine<P> {
    pub fn new<C: ConfigProvider>(pipeline: P, config: &C, layout: SessionLayout) -> Self {
        Self::new_with_monitoring(pipeline, config, layout, HealthMonitor::disabled())
    }

    pub fn new_with_monitoring<C: ConfigProvider>(
        pipeline: P,
        config: &C,
        layout: SessionLayout,
        monitor: HealthMonitor,
    ) -> Self {
        let summary = SessionSummary {
            session_id: layout.id().to_string(),
            ..Default::default()
        };

        Self {
            pipeline,
            tracker: DistanceTracker::new(config.distance_feet(), config.distance_reference()),
            layout,
            timezone: config.timezone(),
            poll_interval: config.poll_interval(),
            retry_delay: DEFAULT_RETRY_DELAY,
            quiet: config.quiet(),
            trigger: Arc::new(Notify::new()),
            monitor,
            summary,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Wakes the worker loop for an immediate poll (button, signal).
    pub fn trigger_handle(&self) -> Arc<Notify> {
        self.trigger.clone()
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// One poll: read the GPS and log a point if we moved far enough.
    pub async fn tick(&mut self) -> Result<Option<LogPoint>> {
        self.summary.polls += 1;
        let observation = self.pipeline.acquire().await?;

        let position = observation.fix.position;
        let Some(index) = self.tracker.candidate(position) else {
            return Ok(None);
        };

        let point = LogPoint::new(index, &self.layout, observation, self.timezone);
        // a failed record leaves the tracker as it was so the retry logs it
        let photo = self.pipeline.record(&point).await?;
        self.summary.points_logged = self.tracker.commit(position);

        tracing::info!("📍 Point {} logged, photo {}", index, photo.display());
        if !self.quiet {
            println!("{}", console_row(&point));
        }
        self.monitor.log_stats(&format!("Point {}", index));

        Ok(Some(point))
    }

    /// Runs until `shutdown` resolves. Tick failures are logged and retried.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<SessionSummary>
    where
        F: Future<Output = ()>,
    {
        self.pipeline.start().await?;
        if !self.quiet {
            println!("{}", console_header());
        }

        tokio::pin!(shutdown);
        let trigger = self.trigger.clone();
        let mut retry_pending = false;

        loop {
            if !retry_pending {
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    _ = trigger.notified() => tracing::debug!("Manual trigger"),
                }
            }
            retry_pending = false;

            let outcome = tokio::select! {
                _ = &mut shutdown => break,
                outcome = self.tick() => outcome,
            };

            if let Err(e) = outcome {
                self.summary.errors += 1;
                tracing::error!(
                    "❌ Polling the GPS failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                tracing::warn!("💡 {}", e.recovery_suggestion());

                if !e.is_retryable() {
                    return Err(e);
                }

                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(self.retry_delay) => {}
                }
                tracing::info!("🔄 Trying GPS again...");
                retry_pending = true;
            }
        }

        tracing::info!(
            "🛑 Session {} stopped: {} points, {} polls, {} errors",
            self.summary.session_id,
            self.summary.points_logged,
            self.summary.polls,
            self.summary.errors
        );
        Ok(self.summary)
    }

    /// Runs until Ctrl-C or SIGTERM.
    pub async fn run(self) -> Result<SessionSummary> {
        self.run_until(shutdown_signal()).await
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{DistanceReference, FixMode, GpsFix, Observation, Position};
    use crate::utils::error::LoggerError;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct TestConfig {
        distance: f64,
    }

    impl ConfigProvider for TestConfig {
        fn data_path(&self) -> &str {
            "/tmp"
        }
        fn poll_interval(&self) -> Duration {
            Duration::from_secs(10)
        }
        fn distance_feet(&self) -> f64 {
            self.distance
        }
        fn distance_reference(&self) -> DistanceReference {
            DistanceReference::LastLogged
        }
        fn timezone(&self) -> Tz {
            chrono_tz::UTC
        }
        fn quiet(&self) -> bool {
            true
        }
    }

    /// Hands out scripted acquisitions and remembers recorded points.
    #[derive(Default)]
    struct ScriptedPipeline {
        acquisitions: Mutex<VecDeque<Result<Position>>>,
        recorded: Mutex<Vec<u32>>,
        record_failures: Mutex<u32>,
    }

    impl ScriptedPipeline {
        fn new(script: Vec<Result<Position>>) -> Self {
            Self {
                acquisitions: Mutex::new(script.into()),
                recorded: Mutex::new(Vec::new()),
                record_failures: Mutex::new(0),
            }
        }

        fn failing_records(self, count: u32) -> Self {
            *self.record_failures.lock().unwrap() = count;
            self
        }
    }

    #[async_trait]
    impl Pipeline for ScriptedPipeline {
        async fn start(&self) -> Result<()> {
            Ok(())
        }

        async fn acquire(&self) -> Result<Observation> {
            let next = self.acquisitions.lock().unwrap().pop_front();
            let position = match next {
                Some(result) => result?,
                None => std::future::pending().await,
            };
            Ok(Observation {
                fix: GpsFix {
                    position,
                    mode: FixMode::ThreeD,
                    time: Utc::now(),
                    speed: 0.0,
                    altitude: 0.0,
                },
                satellites: 6,
                temperature_c: None,
            })
        }

        async fn record(&self, point: &LogPoint) -> Result<PathBuf> {
            {
                let mut failures = self.record_failures.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(LoggerError::CameraError {
                        message: "busy".to_string(),
                    });
                }
            }
            self.recorded.lock().unwrap().push(point.index);
            Ok(PathBuf::from(&point.photo_name))
        }
    }

    #[tokio::test]
    async fn test_tick_logs_only_after_threshold() {
        let pipeline = ScriptedPipeline::new(vec![
            Ok(Position::new(41.0, -87.0)),
            Ok(Position::new(41.0, -87.0)),
            Ok(Position::new(41.01, -87.0)),
        ]);
        let config = TestConfig { distance: 100.0 };
        let mut engine = LoggerEngine::new(pipeline, &config, SessionLayout::new("s"));

        assert_eq!(engine.tick().await.unwrap().map(|p| p.index), Some(1));
        assert!(engine.tick().await.unwrap().is_none());
        let point = engine.tick().await.unwrap().unwrap();
        assert_eq!(point.index, 2);
        assert_eq!(point.photo_name, "s-2.jpg");
        assert_eq!(engine.summary().polls, 3);
        assert_eq!(engine.summary().points_logged, 2);
    }

    #[tokio::test]
    async fn test_failed_record_is_retried_at_same_spot() {
        let pipeline = ScriptedPipeline::new(vec![
            Ok(Position::new(41.0, -87.0)),
            Ok(Position::new(41.0, -87.0)),
        ])
        .failing_records(1);
        let config = TestConfig { distance: 100.0 };
        let mut engine = LoggerEngine::new(pipeline, &config, SessionLayout::new("s"));

        assert!(matches!(
            engine.tick().await,
            Err(LoggerError::CameraError { .. })
        ));
        assert_eq!(engine.summary().points_logged, 0);

        let point = engine.tick().await.unwrap().unwrap();
        assert_eq!(point.index, 1);
        assert_eq!(engine.summary().points_logged, 1);
        assert_eq!(*engine.pipeline.recorded.lock().unwrap(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_retries_after_error_and_stops_on_shutdown() {
        let pipeline = ScriptedPipeline::new(vec![
            Err(LoggerError::GpsTimeout { seconds: 30 }),
            Ok(Position::new(41.0, -87.0)),
        ]);
        let config = TestConfig { distance: 100.0 };
        let engine = LoggerEngine::new(pipeline, &config, SessionLayout::new("s"));

        // first poll at 10s fails, retry at 11s succeeds, then idle
        let summary = engine
            .run_until(tokio::time::sleep(Duration::from_secs(15)))
            .await
            .unwrap();

        assert_eq!(summary.errors, 1);
        assert_eq!(summary.points_logged, 1);
        assert_eq!(summary.polls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_polls_immediately() {
        let pipeline = ScriptedPipeline::new(vec![Ok(Position::new(41.0, -87.0))]);
        let config = TestConfig { distance: 100.0 };
        let engine = LoggerEngine::new(pipeline, &config, SessionLayout::new("s"));
        engine.trigger_handle().notify_one();

        // well before the 10s poll interval
        let summary = engine
            .run_until(tokio::time::sleep(Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(summary.points_logged, 1);
    }

    #[tokio::test]
    async fn test_config_errors_stop_the_loop() {
        let pipeline = ScriptedPipeline::new(vec![Err(LoggerError::ConfigError {
            message: "bad".to_string(),
        })]);
        let config = TestConfig { distance: 100.0 };
        let engine = LoggerEngine::new(pipeline, &config, SessionLayout::new("s"));
        engine.trigger_handle().notify_one();

        let result = engine.run_until(std::future::pending()).await;
        assert!(matches!(result, Err(LoggerError::ConfigError { .. })));
    }
}
