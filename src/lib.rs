//! Secret Rotator Library
//!
//! Executes the four-step secret rotation protocol (generate, apply, validate,
//! promote) against a versioned secret store, delegating the domain-specific work
//! to a pluggable [`RotationService`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use secret_rotator::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = AwsSecretsManagerStore::from_env(None).await;
//! let service = RotationService::new(|_current: Secret| async move {
//!     Ok::<_, anyhow::Error>(Secret::from("new-password"))
//! });
//!
//! let rotator = Rotator::new(Arc::new(store), service);
//! rotator
//!     .handle(&RotationRequest::new("my-secret", "version-token", Phase::Generate))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! Tests are included in the module files and under `tests/`.

pub mod config;
pub mod constants;
pub mod json;
pub mod observability;
pub mod prelude;
pub mod rotation;
pub mod secret;
pub mod service;
pub mod store;

pub use rotation::{Phase, RotationError, RotationRequest, Rotator};
pub use secret::Secret;
pub use service::RotationService;
