//! # Rotation
//!
//! The four-step rotation protocol:
//!
//! 1. **createSecret** - generate a new secret and store it under the request token,
//!    labeled `AWSPENDING`
//! 2. **setSecret** - push the pending secret to the system that consumes it
//! 3. **testSecret** - check the pending secret against that system
//! 4. **finishSecret** - move `AWSCURRENT` to the pending version
//!
//! Every step can be delivered more than once and is a no-op when the store already
//! shows its work as done for the request token.

pub mod error;
pub mod handler;
pub mod request;
mod steps;

pub use error::RotationError;
pub use handler::Rotator;
pub use request::{Phase, RotationRequest};
