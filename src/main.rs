//! `vhostd`: name-based virtual host reverse proxy.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{error::ErrorKind, Parser};

use vhost_proxy::config::{load_config, LogConfig};
use vhost_proxy::lifecycle::{signals, startup, Shutdown};
use vhost_proxy::observability;

#[derive(Parser, Debug)]
#[command(name = "vhostd", version, about = "Name-based virtual host reverse proxy")]
struct Cli {
    /// Configuration file (JSON, or TOML when it ends in .toml).
    config: PathBuf,
}

fn usage() {
    eprintln!("Usage: vhostd <config>");
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(_) => {
            usage();
            return ExitCode::FAILURE;
        }
    };

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = observability::logging::init(&config.log) {
        eprintln!("{}", e);
        let _ = observability::logging::init(&LogConfig::default());
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.bind_address(),
        timeout_secs = config.timeout,
        vhosts = config.vhosts.len(),
        "vhostd starting"
    );

    if let Some(metrics) = &config.metrics {
        if let Err(e) = observability::metrics::init_metrics(&metrics.address) {
            tracing::error!(error = %e, "Metrics exporter not started");
        }
    }

    let (server, listener) = match startup(&config).await {
        Ok(ready) => ready,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    if let Err(e) = server.run(listener, server_shutdown).await {
        tracing::error!(error = %e, "Server stopped");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
