//! # Rotation Errors

use crate::service::Capability;
use crate::store::StoreError;
use thiserror::Error;

/// Failure of a single rotation call
///
/// Returned unchanged to the caller, which owns retry policy. Skipped steps are not
/// errors; they return `Ok(())`.
#[derive(Debug, Error)]
pub enum RotationError {
    /// The request named a step outside the four known literals
    #[error("unknown rotation step: {0}")]
    UnknownPhase(String),

    #[error("malformed rotation request: {0}")]
    MalformedRequest(#[source] serde_json::Error),

    #[error("secret store {operation} failed for {secret_id}: {source}")]
    Store {
        operation: &'static str,
        secret_id: String,
        #[source]
        source: StoreError,
    },

    #[error("{capability} capability failed: {source:#}")]
    Capability {
        capability: Capability,
        #[source]
        source: anyhow::Error,
    },
}

impl RotationError {
    /// Check if this error is transient (re-delivering the same request may succeed)
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            RotationError::UnknownPhase(_) | RotationError::MalformedRequest(_) => false,
            RotationError::Store { source, .. } => source.is_transient(),
            // Every step is safe to re-run, so let the caller decide
            RotationError::Capability { .. } => true,
        }
    }

    /// The store error behind this failure, if any
    #[must_use]
    pub fn as_store_error(&self) -> Option<&StoreError> {
        match self {
            RotationError::Store { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Which capability failed, if any
    #[must_use]
    pub fn capability(&self) -> Option<Capability> {
        match self {
            RotationError::Capability { capability, .. } => Some(*capability),
            _ => None,
        }
    }
}
