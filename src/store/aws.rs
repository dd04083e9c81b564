//! # AWS Secrets Manager Store
//!
//! [`SecretStore`] backed by AWS Secrets Manager.
//!
//! | Store operation        | Secrets Manager API                                      |
//! |------------------------|----------------------------------------------------------|
//! | `fetch_staged`         | `GetSecretValue` with `VersionStage`                      |
//! | `put_pending`          | `PutSecretValue` with `ClientRequestToken` + `AWSPENDING` |
//! | `promote_to_current`   | `UpdateSecretVersionStage` moving `AWSCURRENT`            |

use crate::secret::Secret;
use crate::store::{SecretStore, Stage, StagedSecret, StoreError};
use anyhow::anyhow;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::primitives::Blob;
use aws_sdk_secretsmanager::Client as SecretsManagerClient;
use tracing::{debug, debug_span, warn, Instrument};

/// AWS Secrets Manager implementation of [`SecretStore`]
pub struct AwsSecretsManagerStore {
    client: SecretsManagerClient,
}

impl std::fmt::Debug for AwsSecretsManagerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSecretsManagerStore")
            .field("region", &self.client.config().region())
            .finish_non_exhaustive()
    }
}

impl AwsSecretsManagerStore {
    /// Build a store from the default AWS credential chain
    ///
    /// `region` overrides the region the default chain would pick.
    pub async fn from_env(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region.to_string()));
        }
        let sdk_config = loader.load().await;
        Self::from_sdk_config(&sdk_config)
    }

    #[must_use]
    pub fn from_sdk_config(sdk_config: &SdkConfig) -> Self {
        Self::from_client(SecretsManagerClient::new(sdk_config))
    }

    #[must_use]
    pub fn from_client(client: SecretsManagerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for AwsSecretsManagerStore {
    async fn fetch_staged(&self, secret_id: &str, stage: Stage) -> Result<StagedSecret, StoreError> {
        let span = debug_span!("aws.secret.get_staged", secret.id = secret_id, stage = %stage);

        async move {
            let response = match self
                .client
                .get_secret_value()
                .secret_id(secret_id)
                .version_stage(stage.as_str())
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    let service_error = e.into_service_error();
                    if service_error.is_resource_not_found_exception() {
                        debug!("No version labeled {} for {}", stage, secret_id);
                        return Err(StoreError::NotFound {
                            secret_id: secret_id.to_string(),
                            stage,
                        });
                    }
                    warn!(
                        error = %DisplayErrorContext(&service_error),
                        "Failed to get AWS secret value"
                    );
                    return Err(StoreError::Backend(anyhow!(
                        "Failed to get {stage} version of AWS secret {secret_id}: {}",
                        DisplayErrorContext(&service_error)
                    )));
                }
            };

            let version_id = response
                .version_id()
                .ok_or_else(|| {
                    StoreError::MalformedResponse(format!(
                        "{stage} version of {secret_id} has no version id"
                    ))
                })?
                .to_string();

            let secret = if let Some(text) = response.secret_string() {
                Secret::Text(text.to_string())
            } else if let Some(blob) = response.secret_binary() {
                Secret::Binary(blob.as_ref().to_vec())
            } else {
                return Err(StoreError::MalformedResponse(format!(
                    "version {version_id} of {secret_id} has no string or binary value"
                )));
            };

            Ok(StagedSecret { version_id, secret })
        }
        .instrument(span)
        .await
    }

    async fn put_pending(
        &self,
        secret_id: &str,
        version_id: &str,
        secret: &Secret,
    ) -> Result<(), StoreError> {
        let span = debug_span!(
            "aws.secret.put_pending",
            secret.id = secret_id,
            version.id = version_id,
            binary = secret.is_binary()
        );

        async move {
            let mut request = self
                .client
                .put_secret_value()
                .secret_id(secret_id)
                .client_request_token(version_id)
                .version_stages(Stage::Pending.as_str());

            request = match secret.as_text() {
                Some(text) => request.secret_string(text),
                None => request.secret_binary(Blob::new(secret.value())),
            };

            request.send().await.map_err(|e| {
                StoreError::Backend(anyhow!(
                    "Failed to put pending version {version_id} of AWS secret {secret_id}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

            debug!("Stored version {} of {} as {}", version_id, secret_id, Stage::Pending);
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn promote_to_current(
        &self,
        secret_id: &str,
        new_version_id: &str,
        old_version_id: &str,
    ) -> Result<(), StoreError> {
        let span = debug_span!(
            "aws.secret.promote",
            secret.id = secret_id,
            version.new = new_version_id,
            version.old = old_version_id
        );

        async move {
            self.client
                .update_secret_version_stage()
                .secret_id(secret_id)
                .version_stage(Stage::Current.as_str())
                .move_to_version_id(new_version_id)
                .remove_from_version_id(old_version_id)
                .send()
                .await
                .map_err(|e| {
                    StoreError::Backend(anyhow!(
                        "Failed to move {} of AWS secret {secret_id} to {new_version_id}: {}",
                        Stage::Current,
                        DisplayErrorContext(&e)
                    ))
                })?;

            debug!(
                "Moved {} of {} from {} to {}",
                Stage::Current,
                secret_id,
                old_version_id,
                new_version_id
            );
            Ok(())
        }
        .instrument(span)
        .await
    }
}
