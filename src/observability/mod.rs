//! # Observability
//!
//! Observability modules for metrics and logging.
//!
//! - `logging`: tracing subscriber setup
//! - `metrics`: Prometheus metrics collection

pub mod logging;
pub mod metrics;
