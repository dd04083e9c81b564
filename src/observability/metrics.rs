//! # Metrics
//!
//! Prometheus metrics for monitoring rotations.
//!
//! ## Metrics Exposed
//!
//! - `secret_rotator_rotations_total{phase, outcome}` - Rotation steps by outcome (`performed`, `skipped`, `failed`)
//! - `secret_rotator_rotation_duration_seconds{phase}` - Duration of rotation steps
//! - `secret_rotator_rejected_requests_total` - Requests that failed to decode
//! - `secret_rotator_store_operations_total{operation}` - Secret store calls
//! - `secret_rotator_store_operation_errors_total{operation}` - Failed secret store calls
//! - `secret_rotator_capability_invocations_total{capability}` - Calls into the rotation service
//! - `secret_rotator_capability_failures_total{capability}` - Failed calls into the rotation service

use crate::rotation::Phase;
use crate::service::Capability;
use anyhow::Result;
use prometheus::{Encoder, HistogramVec, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static ROTATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_rotator_rotations_total",
            "Total number of rotation steps by phase and outcome",
        ),
        &["phase", "outcome"],
    )
    .expect("Failed to create ROTATIONS_TOTAL metric - this should never happen")
});

static ROTATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "secret_rotator_rotation_duration_seconds",
            "Duration of rotation steps in seconds by phase",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["phase"],
    )
    .expect("Failed to create ROTATION_DURATION metric - this should never happen")
});

static REJECTED_REQUESTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret_rotator_rejected_requests_total",
        "Total number of rotation requests that could not be decoded",
    )
    .expect("Failed to create REJECTED_REQUESTS_TOTAL metric - this should never happen")
});

static STORE_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_rotator_store_operations_total",
            "Total number of secret store operations by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create STORE_OPERATIONS_TOTAL metric - this should never happen")
});

static STORE_OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_rotator_store_operation_errors_total",
            "Total number of failed secret store operations by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create STORE_OPERATION_ERRORS_TOTAL metric - this should never happen")
});

static CAPABILITY_INVOCATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_rotator_capability_invocations_total",
            "Total number of rotation service capability invocations",
        ),
        &["capability"],
    )
    .expect("Failed to create CAPABILITY_INVOCATIONS_TOTAL metric - this should never happen")
});

static CAPABILITY_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_rotator_capability_failures_total",
            "Total number of failed rotation service capability invocations",
        ),
        &["capability"],
    )
    .expect("Failed to create CAPABILITY_FAILURES_TOTAL metric - this should never happen")
});

/// Register all metrics with the crate registry. Fails if called twice.
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(ROTATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ROTATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(REJECTED_REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STORE_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STORE_OPERATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CAPABILITY_INVOCATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CAPABILITY_FAILURES_TOTAL.clone()))?;

    Ok(())
}

/// Render registered metrics in the Prometheus text exposition format
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn gather_text() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn increment_rotations(phase: Phase, outcome: &str) {
    ROTATIONS_TOTAL
        .with_label_values(&[phase.as_str(), outcome])
        .inc();
}

pub fn observe_rotation_duration(phase: Phase, duration: f64) {
    ROTATION_DURATION
        .with_label_values(&[phase.as_str()])
        .observe(duration);
}

pub fn increment_rejected_requests() {
    REJECTED_REQUESTS_TOTAL.inc();
}

pub fn increment_store_operations(operation: &str) {
    STORE_OPERATIONS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

pub fn increment_store_operation_errors(operation: &str) {
    STORE_OPERATION_ERRORS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

pub fn increment_capability_invocations(capability: Capability) {
    CAPABILITY_INVOCATIONS_TOTAL
        .with_label_values(&[capability.as_str()])
        .inc();
}

pub fn increment_capability_failures(capability: Capability) {
    CAPABILITY_FAILURES_TOTAL
        .with_label_values(&[capability.as_str()])
        .inc();
}
