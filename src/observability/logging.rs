//! # Logging
//!
//! Installs the global tracing subscriber.
//!
//! `RUST_LOG` wins when set; otherwise the filter is built from `LOG_LEVEL`.

use crate::config::{LogFormat, RotatorConfig};
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
#[must_use]
pub fn default_filter(config: &RotatorConfig) -> String {
    format!("secret_rotator={}", config.log_level.to_lowercase())
}

/// Install the global subscriber. Fails if one is already installed.
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn init_tracing(config: &RotatorConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config).into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.log_format {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Text => builder.try_init(),
    }
    .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_uses_log_level() {
        let config = RotatorConfig {
            log_level: "DEBUG".to_string(),
            ..RotatorConfig::default()
        };
        assert_eq!(default_filter(&config), "secret_rotator=debug");
    }
}
