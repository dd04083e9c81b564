//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use secret_rotator::prelude::*;
//! ```

// Rotation entry point and request types
pub use crate::rotation::{Phase, RotationError, RotationRequest, Rotator};

// Secret payloads
pub use crate::secret::Secret;

// Capability traits - needed for implementing rotation services
pub use crate::service::{
    Apply, Capability, CommandCapability, Decode, Generate, PromoteHook, RotationService, Validate,
};

// Store trait and implementations
pub use crate::store::{
    AwsSecretsManagerStore, InMemorySecretStore, SecretStore, Stage, StagedSecret, StoreError,
};

// Config types
pub use crate::config::RotatorConfig;
