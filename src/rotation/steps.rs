//! # Rotation Steps
//!
//! One handler per [`Phase`](super::Phase). All of them follow the same shape:
//! read the staged versions they need, compare version ids against the request
//! token, hand decoded secrets to the service, and make at most one store write,
//! always last.
//!
//! Version comparisons use the version id the store reported, never the payload.

use crate::observability::metrics;
use crate::rotation::error::RotationError;
use crate::rotation::request::RotationRequest;
use crate::secret::Secret;
use crate::service::{Capability, RotationService};
use crate::store::{SecretStore, Stage, StagedSecret, StoreError};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// What a step did, for logs and metrics only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    Performed,
    Skipped,
}

impl StepOutcome {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            StepOutcome::Performed => "performed",
            StepOutcome::Skipped => "skipped",
        }
    }
}

/// Everything a step handler needs for one call
pub(crate) struct StepContext<'a> {
    pub(crate) store: &'a dyn SecretStore,
    pub(crate) service: &'a RotationService,
    pub(crate) request: &'a RotationRequest,
    pub(crate) network_timeout: Duration,
}

impl StepContext<'_> {
    fn secret_id(&self) -> &str {
        &self.request.secret_id
    }

    fn token(&self) -> &str {
        &self.request.client_request_token
    }

    fn is_requested_version(&self, staged: &StagedSecret) -> bool {
        staged.version_id == self.request.client_request_token
    }

    /// Run one store operation under its own timeout
    async fn store_call<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, RotationError> {
        metrics::increment_store_operations(operation);
        debug!(operation, "Calling secret store");

        let result = match tokio::time::timeout(self.network_timeout, call).await {
            Ok(result) => result,
            Err(_elapsed) => Err(StoreError::Timeout {
                operation,
                after: self.network_timeout,
            }),
        };

        result.map_err(|source| {
            metrics::increment_store_operation_errors(operation);
            RotationError::Store {
                operation,
                secret_id: self.secret_id().to_string(),
                source,
            }
        })
    }

    /// Fetch the version bearing `stage` and decode it if the service asks for that
    async fn fetch(&self, stage: Stage) -> Result<StagedSecret, RotationError> {
        let staged = self
            .store_call("fetch_staged", self.store.fetch_staged(self.secret_id(), stage))
            .await?;
        debug!(stage = %stage, version.id = %staged.version_id, "Fetched staged secret");
        self.decode(staged)
    }

    fn decode(&self, staged: StagedSecret) -> Result<StagedSecret, RotationError> {
        let Some(decoder) = self.service.decode() else {
            return Ok(staged);
        };

        let StagedSecret { version_id, secret } = staged;
        metrics::increment_capability_invocations(Capability::Decode);
        let secret = decoder
            .decode(secret)
            .map_err(|source| capability_failed(Capability::Decode, source))?;
        Ok(StagedSecret { version_id, secret })
    }

    async fn invoke<T>(
        &self,
        capability: Capability,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, RotationError> {
        metrics::increment_capability_invocations(capability);
        debug!(capability = capability.as_str(), "Invoking service capability");
        call.await
            .map_err(|source| capability_failed(capability, source))
    }

    async fn put_pending(&self, secret: &Secret) -> Result<(), RotationError> {
        self.store_call(
            "put_pending",
            self.store.put_pending(self.secret_id(), self.token(), secret),
        )
        .await
    }

    async fn promote_to_current(&self, old_version_id: &str) -> Result<(), RotationError> {
        self.store_call(
            "promote_to_current",
            self.store
                .promote_to_current(self.secret_id(), self.token(), old_version_id),
        )
        .await
    }
}

fn capability_failed(capability: Capability, source: anyhow::Error) -> RotationError {
    metrics::increment_capability_failures(capability);
    RotationError::Capability { capability, source }
}

/// Create the pending version, unless the requested version is already current
pub(crate) async fn generate(ctx: &StepContext<'_>) -> Result<StepOutcome, RotationError> {
    let current = ctx.fetch(Stage::Current).await?;
    if ctx.is_requested_version(&current) {
        info!("{} is already set to {}", Stage::Current, ctx.token());
        return Ok(StepOutcome::Skipped);
    }

    let pending = ctx
        .invoke(
            Capability::Generate,
            ctx.service.generate().generate(current.secret),
        )
        .await?;

    ctx.put_pending(&pending).await?;
    info!(
        binary = pending.is_binary(),
        "Stored version {} as {}",
        ctx.token(),
        Stage::Pending
    );
    Ok(StepOutcome::Performed)
}

/// Hand current and pending secrets to the service's apply capability
pub(crate) async fn apply(ctx: &StepContext<'_>) -> Result<StepOutcome, RotationError> {
    let Some(apply) = ctx.service.apply() else {
        info!("Service does not handle the {} step", ctx.request.phase);
        return Ok(StepOutcome::Skipped);
    };

    let current = ctx.fetch(Stage::Current).await?;
    if ctx.is_requested_version(&current) {
        info!("{} is already set to {}", Stage::Current, ctx.token());
        return Ok(StepOutcome::Skipped);
    }

    let pending = ctx.fetch(Stage::Pending).await?;
    if !ctx.is_requested_version(&pending) {
        info!(
            pending.version = %pending.version_id,
            "{} is not set to {}",
            Stage::Pending,
            ctx.token()
        );
        return Ok(StepOutcome::Skipped);
    }

    ctx.invoke(Capability::Apply, apply.apply(current.secret, pending.secret))
        .await?;
    Ok(StepOutcome::Performed)
}

/// Hand the pending secret to the service's validate capability
pub(crate) async fn validate(ctx: &StepContext<'_>) -> Result<StepOutcome, RotationError> {
    let Some(validate) = ctx.service.validate() else {
        info!("Service does not handle the {} step", ctx.request.phase);
        return Ok(StepOutcome::Skipped);
    };

    let pending = ctx.fetch(Stage::Pending).await?;
    if !ctx.is_requested_version(&pending) {
        info!(
            pending.version = %pending.version_id,
            "{} is not set to {}",
            Stage::Pending,
            ctx.token()
        );
        return Ok(StepOutcome::Skipped);
    }

    ctx.invoke(Capability::Validate, validate.validate(pending.secret))
        .await?;
    Ok(StepOutcome::Performed)
}

/// Run the optional promote hook, then move the current label to the requested version
pub(crate) async fn promote(ctx: &StepContext<'_>) -> Result<StepOutcome, RotationError> {
    if let Some(hook) = ctx.service.promote_hook() {
        let pending = ctx.fetch(Stage::Pending).await?;
        if ctx.is_requested_version(&pending) {
            ctx.invoke(Capability::PromoteHook, hook.before_promote(pending.secret))
                .await?;
        } else {
            info!(
                pending.version = %pending.version_id,
                "{} is not set to {}, skipping promote hook",
                Stage::Pending,
                ctx.token()
            );
        }
    } else {
        debug!("Service has no promote hook");
    }

    let current = ctx.fetch(Stage::Current).await?;
    ctx.promote_to_current(&current.version_id).await?;
    info!(
        previous.version = %current.version_id,
        "Moved {} to {}",
        Stage::Current,
        ctx.token()
    );
    Ok(StepOutcome::Performed)
}
