//! # In-Memory Store
//!
//! Process-local [`SecretStore`] that mirrors how Secrets Manager tracks versions and
//! staging labels. Every call is appended to a journal so tests can assert exactly
//! which store operations a rotation step issued.

use crate::secret::Secret;
use crate::store::{SecretStore, Stage, StagedSecret, StoreError};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// A store operation as recorded in the journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    FetchStaged {
        secret_id: String,
        stage: Stage,
    },
    PutPending {
        secret_id: String,
        version_id: String,
        secret: Secret,
    },
    PromoteToCurrent {
        secret_id: String,
        new_version_id: String,
        old_version_id: String,
    },
}

impl StoreCall {
    #[must_use]
    pub fn is_write(&self) -> bool {
        !matches!(self, StoreCall::FetchStaged { .. })
    }
}

#[derive(Debug, Default)]
struct StoredSecret {
    versions: HashMap<String, Secret>,
    labels: HashMap<Stage, String>,
}

#[derive(Debug, Default)]
struct State {
    secrets: HashMap<String, StoredSecret>,
    journal: Vec<StoreCall>,
}

/// In-memory implementation of [`SecretStore`]
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    state: Mutex<State>,
}

impl InMemorySecretStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a version and attach `stages` to it, taking each label from whichever
    /// version held it before. Seeding is not journaled.
    pub fn insert_version(
        &self,
        secret_id: &str,
        version_id: &str,
        secret: impl Into<Secret>,
        stages: &[Stage],
    ) {
        let mut state = self.lock();
        let stored = state.secrets.entry(secret_id.to_string()).or_default();
        stored.versions.insert(version_id.to_string(), secret.into());
        for stage in stages {
            stored.labels.insert(*stage, version_id.to_string());
        }
    }

    /// Version id currently bearing `stage`, if any
    #[must_use]
    pub fn version_for(&self, secret_id: &str, stage: Stage) -> Option<String> {
        self.lock()
            .secrets
            .get(secret_id)
            .and_then(|stored| stored.labels.get(&stage).cloned())
    }

    /// Payload of a specific version, if it exists
    #[must_use]
    pub fn secret_for(&self, secret_id: &str, version_id: &str) -> Option<Secret> {
        self.lock()
            .secrets
            .get(secret_id)
            .and_then(|stored| stored.versions.get(version_id).cloned())
    }

    /// Every store call made so far, oldest first
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().journal.clone()
    }

    /// Calls that mutated the store
    #[must_use]
    pub fn writes(&self) -> Vec<StoreCall> {
        self.lock()
            .journal
            .iter()
            .filter(|call| call.is_write())
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Poisoning only happens if a test panicked mid-call; the data is still usable
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn fetch_staged(&self, secret_id: &str, stage: Stage) -> Result<StagedSecret, StoreError> {
        let mut state = self.lock();
        state.journal.push(StoreCall::FetchStaged {
            secret_id: secret_id.to_string(),
            stage,
        });

        let not_found = || StoreError::NotFound {
            secret_id: secret_id.to_string(),
            stage,
        };
        let stored = state.secrets.get(secret_id).ok_or_else(not_found)?;
        let version_id = stored.labels.get(&stage).ok_or_else(not_found)?;
        let secret = stored.versions.get(version_id).ok_or_else(|| {
            StoreError::MalformedResponse(format!(
                "{stage} of {secret_id} points at missing version {version_id}"
            ))
        })?;

        Ok(StagedSecret {
            version_id: version_id.clone(),
            secret: secret.clone(),
        })
    }

    async fn put_pending(
        &self,
        secret_id: &str,
        version_id: &str,
        secret: &Secret,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.journal.push(StoreCall::PutPending {
            secret_id: secret_id.to_string(),
            version_id: version_id.to_string(),
            secret: secret.clone(),
        });

        let stored = state.secrets.get_mut(secret_id).ok_or_else(|| {
            StoreError::Backend(anyhow!("secret {secret_id} does not exist"))
        })?;
        stored
            .versions
            .insert(version_id.to_string(), secret.clone());
        stored
            .labels
            .insert(Stage::Pending, version_id.to_string());
        Ok(())
    }

    async fn promote_to_current(
        &self,
        secret_id: &str,
        new_version_id: &str,
        old_version_id: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.journal.push(StoreCall::PromoteToCurrent {
            secret_id: secret_id.to_string(),
            new_version_id: new_version_id.to_string(),
            old_version_id: old_version_id.to_string(),
        });

        let stored = state.secrets.get_mut(secret_id).ok_or_else(|| {
            StoreError::Backend(anyhow!("secret {secret_id} does not exist"))
        })?;
        if !stored.versions.contains_key(new_version_id) {
            return Err(StoreError::Backend(anyhow!(
                "version {new_version_id} of {secret_id} does not exist"
            )));
        }
        if stored.labels.get(&Stage::Current).map(String::as_str) != Some(old_version_id) {
            return Err(StoreError::Backend(anyhow!(
                "{} of {secret_id} is not attached to {old_version_id}",
                Stage::Current
            )));
        }

        if new_version_id != old_version_id {
            stored
                .labels
                .insert(Stage::Previous, old_version_id.to_string());
        }
        stored
            .labels
            .insert(Stage::Current, new_version_id.to_string());
        if stored.labels.get(&Stage::Pending).map(String::as_str) == Some(new_version_id) {
            stored.labels.remove(&Stage::Pending);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> InMemorySecretStore {
        let store = InMemorySecretStore::new();
        store.insert_version("db", "v1", "old", &[Stage::Current]);
        store
    }

    #[tokio::test]
    async fn test_fetch_staged_returns_labeled_version() {
        let store = seeded();
        let staged = store.fetch_staged("db", Stage::Current).await.unwrap();
        assert_eq!(staged.version_id, "v1");
        assert_eq!(staged.secret, Secret::from("old"));
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_staged_missing_label_is_not_found() {
        let store = seeded();
        let err = store.fetch_staged("db", Stage::Pending).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { stage: Stage::Pending, .. }));

        let err = store.fetch_staged("nope", Stage::Current).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_put_pending_moves_pending_label() {
        let store = seeded();
        store.insert_version("db", "v2", "stale", &[Stage::Pending]);

        store
            .put_pending("db", "v3", &Secret::from("new"))
            .await
            .unwrap();

        assert_eq!(store.version_for("db", Stage::Pending).as_deref(), Some("v3"));
        assert_eq!(store.version_for("db", Stage::Current).as_deref(), Some("v1"));
        assert_eq!(store.secret_for("db", "v3"), Some(Secret::from("new")));
    }

    #[tokio::test]
    async fn test_promote_marks_previous_and_clears_pending() {
        let store = seeded();
        store.insert_version("db", "v2", "new", &[Stage::Pending]);

        store.promote_to_current("db", "v2", "v1").await.unwrap();

        assert_eq!(store.version_for("db", Stage::Current).as_deref(), Some("v2"));
        assert_eq!(store.version_for("db", Stage::Previous).as_deref(), Some("v1"));
        assert_eq!(store.version_for("db", Stage::Pending), None);
    }

    #[tokio::test]
    async fn test_promote_rejects_wrong_old_version() {
        let store = seeded();
        store.insert_version("db", "v2", "new", &[Stage::Pending]);

        let err = store.promote_to_current("db", "v2", "v0").await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert_eq!(store.version_for("db", Stage::Current).as_deref(), Some("v1"));
    }
}
