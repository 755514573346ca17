//! Gateway binary entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use http_gateway::config::loader::load_config;
use http_gateway::gateway::Gateway;
use http_gateway::lifecycle::signals;
use http_gateway::observability::logging;

#[derive(Parser)]
#[command(
    name = "gateway",
    version,
    about = "HTTP/1.1 reverse-proxy gateway with hot-reloadable routing"
)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(default_value = "config/config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.log_level, &config.log_file) {
        eprintln!("failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = config.listen_port,
        log_level = %config.log_level,
        backend_timeout_ms = config.backend_timeout_ms,
        routes = config.routes.len(),
        "gateway starting"
    );

    let mut gateway = Gateway::new(config, &cli.config);
    if let Err(e) = gateway.start().await {
        tracing::error!(error = %e, "failed to start gateway");
        eprintln!("fatal: failed to start gateway: {e}");
        return ExitCode::FAILURE;
    }
    gateway.enable_hot_reload();

    signals::shutdown_signal().await;

    gateway.disable_hot_reload().await;
    gateway.stop().await;
    tracing::info!("gateway stopped");
    ExitCode::SUCCESS
}
