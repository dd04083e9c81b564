//! # Rotator Configuration
//!
//! Process-level settings loaded from environment variables.

use crate::constants::DEFAULT_NETWORK_TIMEOUT_MS;
use std::time::Duration;

/// Rotator configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatorConfig {
    /// Timeout for each individual secret store call (milliseconds)
    /// Zero falls back to the default
    pub network_timeout_ms: u64,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: LogFormat,
    /// Enable metrics collection
    pub enable_metrics: bool,
    /// AWS region override; the AWS default chain decides when unset
    pub aws_region: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "text" | "plain" => Some(LogFormat::Text),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

impl Default for RotatorConfig {
    fn default() -> Self {
        Self {
            network_timeout_ms: DEFAULT_NETWORK_TIMEOUT_MS,
            log_level: "INFO".to_string(),
            log_format: LogFormat::Text,
            enable_metrics: true,
            aws_region: None,
        }
    }
}

impl RotatorConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            network_timeout_ms: parsed_or_default(
                lookup("ROTATION_NETWORK_TIMEOUT_MS"),
                defaults.network_timeout_ms,
            ),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .as_deref()
                .and_then(LogFormat::parse)
                .unwrap_or(defaults.log_format),
            enable_metrics: lookup("ENABLE_METRICS")
                .map_or(defaults.enable_metrics, |v| parse_bool(&v)),
            aws_region: lookup("AWS_REGION").filter(|region| !region.trim().is_empty()),
        }
    }

    /// Get the per-call store timeout
    #[must_use]
    pub fn network_timeout(&self) -> Duration {
        if self.network_timeout_ms == 0 {
            Duration::from_millis(DEFAULT_NETWORK_TIMEOUT_MS)
        } else {
            Duration::from_millis(self.network_timeout_ms)
        }
    }
}

/// Parse a value or return the default
fn parsed_or_default<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Interpret common truthy spellings
fn parse_bool(value: &str) -> bool {
    let v_lower = value.to_lowercase();
    v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
}
