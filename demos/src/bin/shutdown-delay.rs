//! Serves `/health` and delays shutdown after a quit signal.
//!
//! After Ctrl+C the endpoint reports 503 for `SD_DELAY` milliseconds
//! (default 5000) before the server shuts down. A monitor polls the
//! endpoint once per second and logs what it sees.

use std::process::ExitCode;
use std::time::Duration;

use halyard::core::Scope;
use halyard::http::Uri;
use halyard::server::ServerConfig;
use halyard::telemetry::{init_logging, LogConfig};
use halyard_demos::{env_delay, http_addr, load_settings, shutdown_delay};
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

    let delay = match env_delay("SD_DELAY", Duration::from_secs(5)) {
        Ok(delay) => delay,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let listener = match TcpListener::bind(http_addr("127.0.0.1:0")).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create listener for the server");
            return ExitCode::FAILURE;
        }
    };
    let local_addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, "Listener has no local address");
            return ExitCode::FAILURE;
        }
    };

    let monitor_scope = Scope::new();
    match format!("http://{local_addr}/health").parse::<Uri>() {
        Ok(url) => {
            tokio::spawn(shutdown_delay::monitor_status(monitor_scope.clone(), url));
        }
        Err(e) => tracing::warn!(error = %e, "Health monitor disabled"),
    }

    tracing::info!(
        addr = %local_addr,
        delay = ?delay,
        "Server started, press Ctrl+C to stop it"
    );

    let config = ServerConfig::from_settings(&settings.server);
    let result = shutdown_delay::run(&Scope::new(), listener, config, delay).await;
    monitor_scope.cancel();

    match result {
        Ok(()) => tracing::info!("Service exited"),
        Err(cause) => tracing::info!(cause = %cause, "Service exited"),
    }
    ExitCode::SUCCESS
}
