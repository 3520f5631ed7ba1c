//! Statically configured tokens.

use crate::error::{IdentityError, IdentityResult};
use crate::traits::{IdentityProvider, Principal};
use async_trait::async_trait;
use lfsgate_core::config::StaticTokenConfig;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// SHA-256 of a raw token as lowercase hex.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Verifies tokens against a fixed set of SHA-256 hashes.
///
/// Raw tokens are never stored; a presented token is hashed and looked up.
pub struct StaticIdentityProvider {
    subjects_by_hash: HashMap<String, String>,
}

impl StaticIdentityProvider {
    pub fn new(tokens: &[StaticTokenConfig]) -> IdentityResult<Self> {
        let mut subjects_by_hash = HashMap::with_capacity(tokens.len());
        for token in tokens {
            let hash = token.token_hash.to_ascii_lowercase();
            if lfsgate_core::validate_oid(&hash).is_err() {
                return Err(IdentityError::Config(format!(
                    "token_hash for subject {:?} is not a SHA-256 hex digest",
                    token.subject
                )));
            }
            if subjects_by_hash
                .insert(hash, token.subject.clone())
                .is_some()
            {
                return Err(IdentityError::Config(format!(
                    "duplicate token_hash for subject {:?}",
                    token.subject
                )));
            }
        }
        Ok(Self { subjects_by_hash })
    }

    /// Number of configured tokens.
    pub fn len(&self) -> usize {
        self.subjects_by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects_by_hash.is_empty()
    }
}

impl std::fmt::Debug for StaticIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticIdentityProvider")
            .field("tokens", &self.subjects_by_hash.len())
            .finish()
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn verify(&self, token: &str) -> IdentityResult<Principal> {
        if token.is_empty() {
            return Err(IdentityError::Invalid);
        }
        self.subjects_by_hash
            .get(&hash_token(token))
            .map(|subject| Principal {
                subject: subject.clone(),
                user_id: None,
                provider: "static",
            })
            .ok_or(IdentityError::Invalid)
    }

    fn provider_name(&self) -> &'static str {
        "static"
    }
}
