//! # Secret Store
//!
//! Abstraction over a versioned, staged secret backend.
//!
//! A secret id owns many versions. Each stage label is held by at most one version at
//! a time, while a version may hold any number of labels. The rotator only ever reads
//! [`Stage::Current`] and [`Stage::Pending`]; [`Stage::Previous`] is maintained by the
//! store when the current label moves.
//!
//! Implementations:
//! - [`AwsSecretsManagerStore`] - AWS Secrets Manager
//! - [`InMemorySecretStore`] - process-local store for tests and dry runs

use crate::secret::Secret;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub mod aws;
pub mod memory;

pub use aws::AwsSecretsManagerStore;
pub use memory::{InMemorySecretStore, StoreCall};

/// Staging label attached to a secret version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Current,
    Pending,
    Previous,
}

impl Stage {
    /// Label as understood by AWS Secrets Manager
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Current => crate::constants::STAGE_CURRENT,
            Stage::Pending => crate::constants::STAGE_PENDING,
            Stage::Previous => crate::constants::STAGE_PREVIOUS,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A secret version as returned by [`SecretStore::fetch_staged`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedSecret {
    pub version_id: String,
    pub secret: Secret,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no version of {secret_id} is labeled {stage}")]
    NotFound { secret_id: String, stage: Stage },
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
    #[error("malformed store response: {0}")]
    MalformedResponse(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    /// Check if this error is transient (re-delivering the request may succeed)
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Timeout { .. } | StoreError::Backend(_) => true,
            // A missing label may appear once an earlier step has run
            StoreError::NotFound { .. } => true,
            StoreError::MalformedResponse(_) => false,
        }
    }
}

/// Versioned, staged secret backend
///
/// Calls are issued one at a time by the rotator, each wrapped in its own timeout.
/// Dropping a returned future must abandon the underlying request.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the version currently bearing `stage`
    async fn fetch_staged(&self, secret_id: &str, stage: Stage) -> Result<StagedSecret, StoreError>;

    /// Create or overwrite `version_id`, labeling it pending
    async fn put_pending(
        &self,
        secret_id: &str,
        version_id: &str,
        secret: &Secret,
    ) -> Result<(), StoreError>;

    /// Move the current label from `old_version_id` to `new_version_id`
    async fn promote_to_current(
        &self,
        secret_id: &str,
        new_version_id: &str,
        old_version_id: &str,
    ) -> Result<(), StoreError>;
}
