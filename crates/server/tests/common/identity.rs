//! Scripted identity provider.

use async_trait::async_trait;
use lfsgate_identity::{IdentityError, IdentityProvider, IdentityResult, Principal};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Token accepted for the `tester` subject.
#[allow(dead_code)]
pub const VALID_TOKEN: &str = "valid-token";
/// Token the provider cannot decide on.
#[allow(dead_code)]
pub const UNAVAILABLE_TOKEN: &str = "provider-down";
/// Token that takes longer to verify than any test deadline.
#[allow(dead_code)]
pub const SLOW_TOKEN: &str = "slow-token";

#[allow(dead_code)]
pub struct ScriptedIdentity {
    subjects: HashMap<String, String>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedIdentity {
    pub fn new() -> Self {
        let mut subjects = HashMap::new();
        subjects.insert(VALID_TOKEN.to_string(), "tester".to_string());
        subjects.insert(SLOW_TOKEN.to_string(), "sloth".to_string());
        Self {
            subjects,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for ScriptedIdentity {
    async fn verify(&self, token: &str) -> IdentityResult<Principal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if token == UNAVAILABLE_TOKEN {
            return Err(IdentityError::Unavailable("scripted outage".to_string()));
        }
        if token == SLOW_TOKEN {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        self.subjects
            .get(token)
            .map(|subject| Principal {
                subject: subject.clone(),
                user_id: None,
                provider: "scripted",
            })
            .ok_or(IdentityError::Invalid)
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}
