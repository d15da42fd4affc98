use chrono::Local;
use clap::Parser;
use gps_logger::adapters::button::{spawn_signal_trigger, GpioButton};
use gps_logger::adapters::camera::{CommandCamera, NoCamera};
use gps_logger::adapters::gpsd::GpsdClient;
use gps_logger::adapters::thermometer::{NoThermometer, W1Thermometer};
use gps_logger::core::{Camera, Thermometer};
use gps_logger::domain::model::{SessionLayout, SessionSummary};
use gps_logger::utils::error::ErrorSeverity;
use gps_logger::utils::monitor::HealthMonitor;
use gps_logger::utils::{logger, validation::Validate};
use gps_logger::{CliConfig, GpsPipeline, LocalStorage, LoggerEngine, Result, Settings};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("🚀 Starting gps-logger");

    let settings = match Settings::resolve(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if cli.verbose {
        tracing::debug!("Settings: {:?}", settings);
    }

    // 驗證配置
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match run(settings).await {
        Ok(summary) => {
            tracing::info!(
                "✅ GPSLogger done: {} points in session {}",
                summary.points_logged,
                summary.session_id
            );
        }
        Err(e) => {
            tracing::error!(
                "❌ gps-logger failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run(settings: Settings) -> Result<SessionSummary> {
    match (settings.camera_enabled, settings.thermometer_enabled) {
        (true, true) => {
            let thermometer = W1Thermometer::discover(&settings.w1_devices_dir)?;
            let camera = CommandCamera::new(settings.camera.clone());
            run_with(settings, camera, thermometer).await
        }
        (true, false) => {
            let camera = CommandCamera::new(settings.camera.clone());
            run_with(settings, camera, NoThermometer).await
        }
        (false, true) => {
            let thermometer = W1Thermometer::discover(&settings.w1_devices_dir)?;
            run_with(settings, NoCamera, thermometer).await
        }
        (false, false) => run_with(settings, NoCamera, NoThermometer).await,
    }
}

async fn run_with<C: Camera, T: Thermometer>(
    settings: Settings,
    camera: C,
    thermometer: T,
) -> Result<SessionSummary> {
    let layout = SessionLayout::starting_at(Local::now().naive_local());
    let storage = LocalStorage::new(settings.data_path.clone());
    let gps = GpsdClient::new(settings.gpsd_address.clone());

    let pipeline = GpsPipeline::new(gps, camera, thermometer, storage, layout.clone())
        .with_gps_timeout(settings.gps_timeout());

    let monitor = HealthMonitor::new(settings.data_path.clone(), settings.monitor);
    if monitor.is_enabled() {
        tracing::info!("🔍 Health monitoring enabled");
    }

    let engine = LoggerEngine::new_with_monitoring(pipeline, &settings, layout, monitor);
    let trigger = engine.trigger_handle();

    let mut watchers = Vec::new();
    if settings.button_enabled {
        let button = GpioButton::new(settings.gpio_root.clone(), settings.button_pin)
            .with_bounce(settings.bounce());
        match button.prepare().await {
            Ok(()) => watchers.push(button.spawn(trigger.clone())),
            Err(e) => tracing::warn!("⚠️ Push-button disabled: {}", e),
        }
    }
    watchers.push(spawn_signal_trigger(trigger)?);

    tracing::info!(
        "🛰️ Polling {} every {}s, logging every {}ft",
        settings.gpsd_address,
        settings.poll_seconds,
        settings.distance_feet
    );

    let summary = engine.run().await;

    for watcher in watchers {
        watcher.abort();
    }

    summary
}
