//! Common test utilities for rotation tests
//!
//! Provides a seeded in-memory store and a rotation service whose capabilities
//! record every call they receive.

#![allow(dead_code, reason = "Each test binary uses a different subset of helpers")]

use secret_rotator::prelude::*;
use std::sync::{Arc, Mutex};

pub const SECRET_ID: &str = "s";

/// Capability calls in the order they happened, with the secrets each one received
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<(Capability, Vec<Secret>)>>>);

impl Calls {
    pub fn record(&self, capability: Capability, secrets: Vec<Secret>) {
        self.0.lock().unwrap().push((capability, secrets));
    }

    pub fn count(&self, capability: Capability) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == capability)
            .count()
    }

    pub fn total(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    /// Secrets received by each call to `capability`
    pub fn received(&self, capability: Capability) -> Vec<Vec<Secret>> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == capability)
            .map(|(_, secrets)| secrets.clone())
            .collect()
    }
}

/// Service with only the mandatory generate capability, which returns `next`
pub fn generate_only(calls: &Calls, next: impl Into<Secret>) -> RotationService {
    let calls = calls.clone();
    let next: Secret = next.into();
    RotationService::new(move |current: Secret| {
        calls.record(Capability::Generate, vec![current]);
        let next = next.clone();
        async move { Ok::<_, anyhow::Error>(next) }
    })
}

/// Service with generate, apply, validate and a promote hook, all succeeding
pub fn full_service(calls: &Calls, next: impl Into<Secret>) -> RotationService {
    let apply_calls = calls.clone();
    let validate_calls = calls.clone();
    let hook_calls = calls.clone();

    generate_only(calls, next)
        .with_apply(move |current: Secret, pending: Secret| {
            apply_calls.record(Capability::Apply, vec![current, pending]);
            async { Ok::<_, anyhow::Error>(()) }
        })
        .with_validate(move |pending: Secret| {
            validate_calls.record(Capability::Validate, vec![pending]);
            async { Ok::<_, anyhow::Error>(()) }
        })
        .with_promote_hook(move |pending: Secret| {
            hook_calls.record(Capability::PromoteHook, vec![pending]);
            async { Ok::<_, anyhow::Error>(()) }
        })
}

/// Store with `v1` ("old") as current
pub fn store_with_current() -> Arc<InMemorySecretStore> {
    let store = InMemorySecretStore::new();
    store.insert_version(SECRET_ID, "v1", "old", &[Stage::Current]);
    Arc::new(store)
}

/// Store with `v1` ("old") as current and `v2` ("new") as pending
pub fn store_with_pending() -> Arc<InMemorySecretStore> {
    let store = store_with_current();
    store.insert_version(SECRET_ID, "v2", "new", &[Stage::Pending]);
    store
}

pub fn rotator(store: &Arc<InMemorySecretStore>, service: RotationService) -> Rotator {
    Rotator::new(Arc::clone(store) as Arc<dyn SecretStore>, service)
}

pub fn request(token: &str, phase: Phase) -> RotationRequest {
    RotationRequest::new(SECRET_ID, token, phase)
}
