//! # Process Capabilities
//!
//! Delegates a rotation capability to an external program.
//!
//! The program receives a JSON envelope on stdin and the capability name in the
//! `ROTATION_CAPABILITY` environment variable:
//!
//! ```json
//! { "capability": "apply", "current": { "text": "..." }, "pending": { "binary": "AQID" } }
//! ```
//!
//! A non-zero exit fails the capability with the program's stderr. For `generate` the
//! program must print the new secret as JSON (`{"text": ...}` or `{"binary": ...}`) on
//! stdout; other capabilities ignore stdout. Programs are free not to read stdin: the
//! exit status alone decides the outcome.
//!
//! Store calls are bounded by the rotator's network timeout, capabilities are not. A
//! program that never exits blocks the rotation unless [`CommandCapability::with_timeout`]
//! is set; on expiry the child is killed.

use crate::constants::CAPABILITY_ENV_VAR;
use crate::secret::Secret;
use crate::service::{Apply, Capability, Generate, PromoteHook, Validate};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use zeroize::Zeroizing;

#[derive(Serialize)]
struct Envelope<'a> {
    capability: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    current: Option<&'a Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pending: Option<&'a Secret>,
}

/// Runs `program args...` to serve one capability
#[derive(Debug, Clone)]
pub struct CommandCapability {
    capability: Capability,
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandCapability {
    pub fn new(capability: Capability, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            capability,
            program: program.into(),
            args,
            timeout: None,
        }
    }

    /// Kill the program and fail the capability if it runs longer than `timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Split a command line on whitespace. No shell quoting is interpreted.
    pub fn parse(capability: Capability, command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let Some(program) = parts.next() else {
            bail!("empty command for {capability} capability");
        };
        Ok(Self::new(capability, program, parts.collect()))
    }

    #[must_use]
    pub fn capability(&self) -> Capability {
        self.capability
    }

    async fn run(&self, current: Option<&Secret>, pending: Option<&Secret>) -> Result<Zeroizing<Vec<u8>>> {
        let Some(timeout) = self.timeout else {
            return self.execute(current, pending).await;
        };
        // Dropping the execution on expiry kills the child
        tokio::time::timeout(timeout, self.execute(current, pending))
            .await
            .map_err(|_elapsed| {
                anyhow!(
                    "{} command {} did not finish within {timeout:?}",
                    self.capability,
                    self.program
                )
            })?
    }

    async fn execute(
        &self,
        current: Option<&Secret>,
        pending: Option<&Secret>,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let envelope = Zeroizing::new(
            serde_json::to_vec(&Envelope {
                capability: self.capability.as_str(),
                current,
                pending,
            })
            .context("Failed to encode capability envelope")?,
        );

        debug!(
            capability = self.capability.as_str(),
            program = %self.program,
            "Running capability command"
        );

        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .env(CAPABILITY_ENV_VAR, self.capability.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn {} command {}", self.capability, self.program))?;

        let stdin = child.stdin.take();
        let write_envelope = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            let written = async {
                stdin.write_all(&envelope).await?;
                stdin.shutdown().await
            }
            .await;
            match written {
                // The program exited or closed stdin without reading it all
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!("Capability command closed stdin before reading the envelope");
                    Ok(())
                }
                result => result,
            }
        };

        // Feed stdin while draining stdout and stderr so neither side can block the other
        let (written, output) = tokio::join!(write_envelope, child.wait_with_output());
        let output =
            output.with_context(|| format!("Failed to wait for {} command", self.capability))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{} command {} exited with {}: {}",
                self.capability,
                self.program,
                output.status,
                stderr.trim()
            );
        }

        if let Err(e) = written {
            warn!(error = %e, "Failed to write capability envelope to stdin");
            return Err(e).context("Failed to write capability envelope to stdin");
        }

        Ok(Zeroizing::new(output.stdout))
    }
}

#[async_trait]
impl Generate for CommandCapability {
    async fn generate(&self, current: Secret) -> Result<Secret> {
        let stdout = self.run(Some(&current), None).await?;
        serde_json::from_slice(&stdout)
            .with_context(|| format!("{} command did not print a secret as JSON", self.capability))
    }
}

#[async_trait]
impl Apply for CommandCapability {
    async fn apply(&self, current: Secret, pending: Secret) -> Result<()> {
        self.run(Some(&current), Some(&pending)).await.map(drop)
    }
}

#[async_trait]
impl Validate for CommandCapability {
    async fn validate(&self, pending: Secret) -> Result<()> {
        self.run(None, Some(&pending)).await.map(drop)
    }
}

#[async_trait]
impl PromoteHook for CommandCapability {
    async fn before_promote(&self, pending: Secret) -> Result<()> {
        self.run(None, Some(&pending)).await.map(drop)
    }
}
