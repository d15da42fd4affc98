use clap::Parser;
use gps_logger::config::DEFAULT_DATA_PATH;
use gps_logger::core::engine::shutdown_signal;
use gps_logger::server;
use gps_logger::utils::logger;
use gps_logger::utils::validation::{validate_path, validate_socket_addr};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gps-serve")]
#[command(about = "Serves logged GPS sessions (CSV, photos, zip) over the Wi-Fi access point")]
struct Args {
    /// Data root written by gps-logger
    #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
    path: String,

    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_server_logger(args.verbose, args.json_logs);

    validate_path("path", &args.path)?;
    let bind = validate_socket_addr("bind", &args.bind)?;

    let root = PathBuf::from(&args.path);
    if !root.is_dir() {
        tracing::warn!(
            "⚠️ {} does not exist yet; sessions will appear once gps-logger runs",
            root.display()
        );
    }

    server::serve(bind, root, shutdown_signal()).await?;

    tracing::info!("👋 gps-serve stopped");
    Ok(())
}
