//! Identity provider trait.

use crate::error::IdentityResult;
use async_trait::async_trait;
use std::fmt;

/// A caller whose token has been verified.
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    /// Stable human-readable subject (a GitHub login, a static token name).
    pub subject: String,
    /// Numeric account id, when the provider has one.
    pub user_id: Option<u64>,
    /// Provider that verified the token.
    pub provider: &'static str,
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({}:{})", self.provider, self.subject)
    }
}

/// Verifies bearer tokens against an external identity source.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Verify a raw token.
    ///
    /// Returns [`IdentityError::Invalid`](crate::IdentityError::Invalid) for
    /// tokens the provider rejects and `Unavailable` when it cannot decide.
    async fn verify(&self, token: &str) -> IdentityResult<Principal>;

    /// Get the name of this provider, for metrics and logs.
    fn provider_name(&self) -> &'static str;
}
