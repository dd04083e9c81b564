//! # Rotation Service
//!
//! The domain-specific half of a rotation, supplied by whoever embeds the rotator.
//!
//! A [`RotationService`] always carries a [`Generate`] capability. [`Apply`],
//! [`Validate`], [`PromoteHook`] and [`Decode`] are optional and independent: a service
//! may validate without applying, decode without anything else, and so on. Each step
//! handler checks for the one slot it needs and skips its delegated work when the
//! slot is empty.
//!
//! Every capability trait is implemented for plain closures, so a service can be
//! assembled without defining any types:
//!
//! ```rust
//! use secret_rotator::{RotationService, Secret};
//!
//! let service = RotationService::new(|_current: Secret| async move {
//!     Ok::<_, anyhow::Error>(Secret::from("freshly-generated"))
//! })
//! .with_validate(|pending: Secret| async move {
//!     anyhow::ensure!(!pending.is_empty(), "pending secret is empty");
//!     Ok(())
//! });
//!
//! assert!(service.validate().is_some());
//! assert!(service.apply().is_none());
//! ```

use crate::secret::Secret;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

pub mod command;

pub use command::CommandCapability;

/// Produces the next secret value from the current one. Mandatory.
#[async_trait]
pub trait Generate: Send + Sync {
    async fn generate(&self, current: Secret) -> Result<Secret>;
}

/// Pushes the pending secret into the system that consumes it
#[async_trait]
pub trait Apply: Send + Sync {
    async fn apply(&self, current: Secret, pending: Secret) -> Result<()>;
}

/// Proves the pending secret works before it is promoted
#[async_trait]
pub trait Validate: Send + Sync {
    async fn validate(&self, pending: Secret) -> Result<()>;
}

/// Runs just before the pending version becomes current
#[async_trait]
pub trait PromoteHook: Send + Sync {
    async fn before_promote(&self, pending: Secret) -> Result<()>;
}

/// Converts a stored secret into the representation the other capabilities expect.
///
/// Applied to every secret fetched from the store, before any other capability
/// sees it.
pub trait Decode: Send + Sync {
    fn decode(&self, secret: Secret) -> Result<Secret>;
}

#[async_trait]
impl<F, Fut> Generate for F
where
    F: Fn(Secret) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Secret>> + Send + 'static,
{
    async fn generate(&self, current: Secret) -> Result<Secret> {
        self(current).await
    }
}

#[async_trait]
impl<F, Fut> Apply for F
where
    F: Fn(Secret, Secret) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn apply(&self, current: Secret, pending: Secret) -> Result<()> {
        self(current, pending).await
    }
}

/// Closure adapter for [`Validate`] and [`PromoteHook`], which share a signature
#[derive(Clone)]
pub struct FnCapability<F>(pub F);

impl<F> fmt::Debug for FnCapability<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnCapability")
    }
}

#[async_trait]
impl<F, Fut> Validate for FnCapability<F>
where
    F: Fn(Secret) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn validate(&self, pending: Secret) -> Result<()> {
        (self.0)(pending).await
    }
}

#[async_trait]
impl<F, Fut> PromoteHook for FnCapability<F>
where
    F: Fn(Secret) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn before_promote(&self, pending: Secret) -> Result<()> {
        (self.0)(pending).await
    }
}

impl<F> Decode for F
where
    F: Fn(Secret) -> Result<Secret> + Send + Sync,
{
    fn decode(&self, secret: Secret) -> Result<Secret> {
        self(secret)
    }
}

/// Names of the capabilities, used in errors, logs and metric labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Generate,
    Apply,
    Validate,
    PromoteHook,
    Decode,
}

impl Capability {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Generate => "generate",
            Capability::Apply => "apply",
            Capability::Validate => "validate",
            Capability::PromoteHook => "promote-hook",
            Capability::Decode => "decode",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mandatory generator plus four optional capability slots
#[derive(Clone)]
pub struct RotationService {
    generate: Arc<dyn Generate>,
    apply: Option<Arc<dyn Apply>>,
    validate: Option<Arc<dyn Validate>>,
    promote_hook: Option<Arc<dyn PromoteHook>>,
    decode: Option<Arc<dyn Decode>>,
}

impl fmt::Debug for RotationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotationService")
            .field("apply", &self.apply.is_some())
            .field("validate", &self.validate.is_some())
            .field("promote_hook", &self.promote_hook.is_some())
            .field("decode", &self.decode.is_some())
            .finish_non_exhaustive()
    }
}

impl RotationService {
    pub fn new(generate: impl Generate + 'static) -> Self {
        Self {
            generate: Arc::new(generate),
            apply: None,
            validate: None,
            promote_hook: None,
            decode: None,
        }
    }

    #[must_use]
    pub fn with_apply(mut self, apply: impl Apply + 'static) -> Self {
        self.apply = Some(Arc::new(apply));
        self
    }

    /// Closures are accepted directly; trait objects go through [`Self::with_validate_impl`]
    #[must_use]
    pub fn with_validate<F, Fut>(self, validate: F) -> Self
    where
        F: Fn(Secret) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.with_validate_impl(FnCapability(validate))
    }

    #[must_use]
    pub fn with_validate_impl(mut self, validate: impl Validate + 'static) -> Self {
        self.validate = Some(Arc::new(validate));
        self
    }

    #[must_use]
    pub fn with_promote_hook<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(Secret) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.with_promote_hook_impl(FnCapability(hook))
    }

    #[must_use]
    pub fn with_promote_hook_impl(mut self, hook: impl PromoteHook + 'static) -> Self {
        self.promote_hook = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn with_decode(mut self, decode: impl Decode + 'static) -> Self {
        self.decode = Some(Arc::new(decode));
        self
    }

    #[must_use]
    pub fn generate(&self) -> &dyn Generate {
        self.generate.as_ref()
    }

    #[must_use]
    pub fn apply(&self) -> Option<&dyn Apply> {
        self.apply.as_deref()
    }

    #[must_use]
    pub fn validate(&self) -> Option<&dyn Validate> {
        self.validate.as_deref()
    }

    #[must_use]
    pub fn promote_hook(&self) -> Option<&dyn PromoteHook> {
        self.promote_hook.as_deref()
    }

    #[must_use]
    pub fn decode(&self) -> Option<&dyn Decode> {
        self.decode.as_deref()
    }
}
