//! # Rotation Requests
//!
//! The request delivered for each rotation step, in the shape Secrets Manager sends
//! to rotation functions:
//!
//! ```json
//! { "SecretId": "arn:aws:secretsmanager:...", "ClientRequestToken": "<version id>", "Step": "createSecret" }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::RotationError;

/// One of the four rotation steps
///
/// 1. [`Phase::Generate`]
/// 2. [`Phase::Apply`]
/// 3. [`Phase::Validate`]
/// 4. [`Phase::Promote`]
///
/// Each step is invoked on its own and may be re-delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Create a new version of the secret, labeled pending
    #[serde(rename = "createSecret")]
    Generate,
    /// Push the pending version to the service that uses the secret
    #[serde(rename = "setSecret")]
    Apply,
    /// Check that the pending version works against that service
    #[serde(rename = "testSecret")]
    Validate,
    /// Move the current label to the pending version. The store keeps the old
    /// current version as previous.
    #[serde(rename = "finishSecret")]
    Promote,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Generate, Phase::Apply, Phase::Validate, Phase::Promote];

    /// Wire literal for this phase
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Generate => "createSecret",
            Phase::Apply => "setSecret",
            Phase::Validate => "testSecret",
            Phase::Promote => "finishSecret",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = RotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| RotationError::UnknownPhase(s.to_string()))
    }
}

/// A single rotation step to execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RotationRequest {
    /// Secret being rotated
    pub secret_id: String,
    /// Version id under rotation
    pub client_request_token: String,
    #[serde(rename = "Step")]
    pub phase: Phase,
}

/// Same fields with the step left undecoded, so an unknown step surfaces as
/// `UnknownPhase` rather than a generic decoding error
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawRequest {
    secret_id: String,
    client_request_token: String,
    step: String,
}

impl RotationRequest {
    pub fn new(
        secret_id: impl Into<String>,
        client_request_token: impl Into<String>,
        phase: Phase,
    ) -> Self {
        Self {
            secret_id: secret_id.into(),
            client_request_token: client_request_token.into(),
            phase,
        }
    }

    /// Decode a JSON request
    pub fn from_json(bytes: &[u8]) -> Result<Self, RotationError> {
        let raw: RawRequest =
            serde_json::from_slice(bytes).map_err(RotationError::MalformedRequest)?;
        let phase = raw.step.parse()?;
        Ok(Self {
            secret_id: raw.secret_id,
            client_request_token: raw.client_request_token,
            phase,
        })
    }
}
