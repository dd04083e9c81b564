//! # Secret Rotator
//!
//! Runs one step of a secret rotation against AWS Secrets Manager.
//!
//! The rotation service is assembled from external commands: each capability is a
//! program that receives a JSON envelope on stdin. Only the generate command is
//! required.
//!
//! ## Usage
//!
//! ```bash
//! # Execute a rotation event as delivered by Secrets Manager
//! secret-rotator --event event.json --generate-cmd ./new-password.sh
//!
//! # Or spell the request out
//! secret-rotator --secret-id db-password --step setSecret \
//!     --token 6f1c2c5e-0000-4000-8000-000000000000 \
//!     --generate-cmd ./new-password.sh --apply-cmd ./alter-user.sh
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use secret_rotator::config::RotatorConfig;
use secret_rotator::observability::{logging, metrics};
use secret_rotator::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BUILD_GIT_HASH"),
    ", built ",
    env!("BUILD_DATETIME"),
    ")"
);

/// Execute a single secret rotation step
#[derive(Parser, Debug)]
#[command(name = "secret-rotator", version = VERSION, about, long_about = None)]
struct Cli {
    /// Rotation event as JSON (`SecretId`, `ClientRequestToken`, `Step`). Use `-` for stdin.
    #[arg(long, conflicts_with_all = ["secret_id", "token", "step"])]
    event: Option<PathBuf>,

    /// Secret to rotate
    #[arg(long, requires = "step")]
    secret_id: Option<String>,

    /// Version id of the rotation; a fresh UUID when omitted
    #[arg(long)]
    token: Option<String>,

    /// Rotation step (createSecret, setSecret, testSecret, finishSecret)
    #[arg(long)]
    step: Option<Phase>,

    /// Command producing the next secret version
    #[arg(long)]
    generate_cmd: String,

    /// Command installing the pending secret on the target system
    #[arg(long)]
    apply_cmd: Option<String>,

    /// Command checking that the pending secret works
    #[arg(long)]
    validate_cmd: Option<String>,

    /// Command run right before the pending version is promoted
    #[arg(long)]
    promote_hook_cmd: Option<String>,

    /// Require every stored secret to be JSON and canonicalize it before use
    #[arg(long)]
    decode_json: bool,

    /// AWS region override
    #[arg(long)]
    region: Option<String>,

    /// Per-call store timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Kill a capability command that runs longer than this many milliseconds
    #[arg(long)]
    command_timeout_ms: Option<u64>,

    /// Print collected metrics to stdout when done
    #[arg(long)]
    print_metrics: bool,
}

impl Cli {
    fn command(&self, capability: Capability, command_line: &str) -> Result<CommandCapability> {
        let command = CommandCapability::parse(capability, command_line)?;
        Ok(match self.command_timeout_ms {
            Some(ms) if ms > 0 => command.with_timeout(Duration::from_millis(ms)),
            _ => command,
        })
    }

    fn service(&self) -> Result<RotationService> {
        let mut service =
            RotationService::new(self.command(Capability::Generate, &self.generate_cmd)?);

        if let Some(cmd) = &self.apply_cmd {
            service = service.with_apply(self.command(Capability::Apply, cmd)?);
        }
        if let Some(cmd) = &self.validate_cmd {
            service = service.with_validate_impl(self.command(Capability::Validate, cmd)?);
        }
        if let Some(cmd) = &self.promote_hook_cmd {
            service = service.with_promote_hook_impl(self.command(Capability::PromoteHook, cmd)?);
        }
        if self.decode_json {
            service = service.with_decode(secret_rotator::json::decoder::<serde_json::Value>());
        }

        Ok(service)
    }

    fn request(&self) -> Result<Option<RotationRequest>> {
        if self.event.is_some() {
            return Ok(None);
        }
        let (Some(secret_id), Some(phase)) = (&self.secret_id, self.step) else {
            bail!("Either --event or both --secret-id and --step are required");
        };
        let token = self
            .token
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Ok(Some(RotationRequest::new(secret_id.clone(), token, phase)))
    }
}

fn read_event(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buffer = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buffer)
            .context("Failed to read rotation event from stdin")?;
        return Ok(buffer);
    }
    std::fs::read(path).with_context(|| format!("Failed to read rotation event {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = RotatorConfig::from_env();
    if let Some(region) = &cli.region {
        config.aws_region = Some(region.clone());
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.network_timeout_ms = timeout_ms;
    }

    logging::init_tracing(&config)?;
    if config.enable_metrics {
        metrics::register_metrics().context("Failed to register metrics")?;
    }

    info!(
        version = VERSION,
        timeout = ?config.network_timeout(),
        "Starting secret rotator"
    );

    let service = cli.service()?;
    let store = AwsSecretsManagerStore::from_env(config.aws_region.as_deref()).await;
    let rotator = Rotator::from_config(Arc::new(store), service, &config);

    let result = match cli.request()? {
        Some(request) => rotator.handle(&request).await,
        None => {
            let path = cli.event.as_ref().context("Missing --event")?;
            rotator.handle_event(&read_event(path)?).await
        }
    };

    if cli.print_metrics && config.enable_metrics {
        print!("{}", metrics::gather_text()?);
    }

    if let Err(e) = result {
        error!(error = %e, transient = e.is_transient(), "Rotation failed");
        std::process::exit(1);
    }

    Ok(())
}
