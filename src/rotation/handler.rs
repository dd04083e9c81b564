//! # Rotator
//!
//! Entry point for rotation requests. Dispatches each request to its step handler
//! and records the outcome.
//!
//! The rotator keeps no state between calls. Concurrent calls for the same secret are
//! safe as far as this crate is concerned: every step re-reads the staged versions and
//! only acts when they match the request token.

use crate::config::RotatorConfig;
use crate::observability::metrics;
use crate::rotation::error::RotationError;
use crate::rotation::request::{Phase, RotationRequest};
use crate::rotation::steps::{self, StepContext};
use crate::service::RotationService;
use crate::store::SecretStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};

/// Executes rotation steps against a secret store
#[derive(Clone)]
pub struct Rotator {
    store: Arc<dyn SecretStore>,
    service: RotationService,
    network_timeout: Duration,
}

impl std::fmt::Debug for Rotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rotator")
            .field("service", &self.service)
            .field("network_timeout", &self.network_timeout)
            .finish_non_exhaustive()
    }
}

impl Rotator {
    pub fn new(store: Arc<dyn SecretStore>, service: RotationService) -> Self {
        Self {
            store,
            service,
            network_timeout: RotatorConfig::default().network_timeout(),
        }
    }

    /// Build a rotator using the timeout from `config`
    pub fn from_config(
        store: Arc<dyn SecretStore>,
        service: RotationService,
        config: &RotatorConfig,
    ) -> Self {
        Self::new(store, service).with_network_timeout(config.network_timeout())
    }

    /// Timeout applied to each individual store call. A zero timeout keeps the default.
    #[must_use]
    pub fn with_network_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.network_timeout = timeout;
        }
        self
    }

    #[must_use]
    pub fn network_timeout(&self) -> Duration {
        self.network_timeout
    }

    /// Decode a JSON request and execute it
    ///
    /// An unknown step fails with [`RotationError::UnknownPhase`] before the store is
    /// touched.
    pub async fn handle_event(&self, event: &[u8]) -> Result<(), RotationError> {
        let request = RotationRequest::from_json(event).inspect_err(|e| {
            warn!(error = %e, "Rejected rotation request");
            metrics::increment_rejected_requests();
        })?;
        self.handle(&request).await
    }

    /// Execute one rotation step
    ///
    /// Returns `Ok(())` both when the step did its work and when it found nothing to
    /// do for this token.
    pub async fn handle(&self, request: &RotationRequest) -> Result<(), RotationError> {
        let span = info_span!(
            "rotation",
            secret.id = %request.secret_id,
            phase = %request.phase,
            request.token = %request.client_request_token
        );

        async move {
            info!(
                "Evaluating rotation for secret {} and version {}",
                request.secret_id, request.client_request_token
            );
            let start = Instant::now();

            let ctx = StepContext {
                store: self.store.as_ref(),
                service: &self.service,
                request,
                network_timeout: self.network_timeout,
            };

            let result = match request.phase {
                Phase::Generate => steps::generate(&ctx).await,
                Phase::Apply => steps::apply(&ctx).await,
                Phase::Validate => steps::validate(&ctx).await,
                Phase::Promote => steps::promote(&ctx).await,
            };

            metrics::observe_rotation_duration(request.phase, start.elapsed().as_secs_f64());
            match result {
                Ok(outcome) => {
                    metrics::increment_rotations(request.phase, outcome.as_str());
                    info!(outcome = outcome.as_str(), "Rotation step finished");
                    Ok(())
                }
                Err(e) => {
                    metrics::increment_rotations(request.phase, "failed");
                    warn!(error = %e, transient = e.is_transient(), "Rotation step failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}
