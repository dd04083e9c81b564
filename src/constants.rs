//! # Constants
//!
//! Shared constants used throughout the rotator.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default timeout applied to every individual secret store call (milliseconds)
pub const DEFAULT_NETWORK_TIMEOUT_MS: u64 = 1000;

/// Staging label of the version clients currently use
pub const STAGE_CURRENT: &str = "AWSCURRENT";

/// Staging label of the version being rotated in
pub const STAGE_PENDING: &str = "AWSPENDING";

/// Staging label the store gives the formerly current version after promotion
pub const STAGE_PREVIOUS: &str = "AWSPREVIOUS";

/// Environment variable telling a delegated process which capability it serves
pub const CAPABILITY_ENV_VAR: &str = "ROTATION_CAPABILITY";
