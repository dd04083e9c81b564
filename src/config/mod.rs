//! # Configuration
//!
//! Settings for the rotator process.

pub mod rotator;

pub use rotator::{LogFormat, RotatorConfig};
