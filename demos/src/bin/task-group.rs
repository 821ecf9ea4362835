//! Runs a hello-world server next to a quit signal listener and a ticker.
//!
//! `MAX_TICKS` (default 3) bounds the ticker; reaching it stops the whole
//! service, as does Ctrl+C.

use std::process::ExitCode;

use halyard::core::Scope;
use halyard::server::ServerConfig;
use halyard::telemetry::{init_logging, LogConfig};
use halyard_demos::{env_u32, http_addr, load_settings, task_group};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&LogConfig::from(&settings.logging)) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let max_ticks = match env_u32("MAX_TICKS", 3) {
        Ok(n) => n,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let addr = http_addr("127.0.0.1:8080");
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to create listener");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(addr = %addr, max_ticks, "Service started, press Ctrl+C to stop");

    let config = ServerConfig::from_settings(&settings.server);
    match task_group::run(&Scope::new(), listener, config, max_ticks).await {
        Ok(()) => tracing::info!("Service exited"),
        Err(cause) => tracing::info!(cause = %cause, "Service exited"),
    }
    ExitCode::SUCCESS
}
