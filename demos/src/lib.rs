//! Runnable Halyard programs.
//!
//! - `task-group`: the server runs next to a quit signal listener and a
//!   ticker; the first task to fail stops the rest.
//! - `shutdown-delay`: a quit signal first flips `/health` to 503, and the
//!   server shuts down only after `SD_DELAY` milliseconds.
//!
//! Both read `HTTP_ADDR` for the listen address, and `HALYARD__*`
//! variables (or a `.env` file) for the server and logging settings.

use std::env;
use std::time::Duration;

use halyard::config::{ConfigError, ConfigLoader, HalyardConfig};
use thiserror::Error;

pub mod group;
pub mod shutdown_delay;
pub mod signal;
pub mod task_group;

/// Invalid demo setting read from the environment.
#[derive(Debug, Error)]
pub enum DemoError {
    /// Settings file or `HALYARD__*` variables are invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A plain environment variable holds an unusable value.
    #[error("invalid value for {var}: {reason}")]
    InvalidVar {
        /// Variable name.
        var: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Loads the development preset overridden by `.env` and `HALYARD__*`.
pub fn load_settings() -> Result<HalyardConfig, DemoError> {
    Ok(ConfigLoader::new()
        .with_development()
        .with_dotenv()?
        .with_env_prefix("HALYARD")
        .load()?)
}

/// Listen address from `HTTP_ADDR`, or `default`.
pub fn http_addr(default: &str) -> String {
    env::var("HTTP_ADDR")
        .ok()
        .filter(|addr| !addr.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Reads a whole number from `var`, or `default` if unset.
pub fn env_u32(var: &'static str, default: u32) -> Result<u32, DemoError> {
    match env::var(var) {
        Ok(value) => value.parse().map_err(|e| DemoError::InvalidVar {
            var,
            reason: format!("{e}"),
        }),
        Err(_) => Ok(default),
    }
}

/// Reads a positive millisecond duration from `var`, or `default`.
pub fn env_delay(var: &'static str, default: Duration) -> Result<Duration, DemoError> {
    let delay = match env::var(var) {
        Ok(value) => parse_millis(&value).map_err(|reason| DemoError::InvalidVar { var, reason })?,
        Err(_) => default,
    };
    if delay.is_zero() {
        return Err(DemoError::InvalidVar {
            var,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(delay)
}

fn parse_millis(value: &str) -> Result<Duration, String> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| format!("expected milliseconds: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_millis() {
        assert_eq!(parse_millis("1500"), Ok(Duration::from_millis(1500)));
        assert_eq!(parse_millis(" 0 "), Ok(Duration::ZERO));
        assert!(parse_millis("5s").is_err());
        assert!(parse_millis("-1").is_err());
    }

    #[test]
    fn test_unset_vars_use_defaults() {
        let var = "HALYARD_DEMOS_TEST_UNSET_VAR";
        assert_eq!(env_u32(var, 3).unwrap(), 3);
        assert_eq!(
            env_delay(var, Duration::from_secs(5)).unwrap(),
            Duration::from_secs(5)
        );
        assert!(env_delay(var, Duration::ZERO).is_err());
    }
}
