//! Caller identity verification for lfsgate.
//!
//! The batch server hands every presented token to an [`IdentityProvider`]
//! and gets back a [`Principal`] or a rejection. Two providers exist:
//! - GitHub: `GET /user` on the GitHub REST API (github.com or Enterprise Server)
//! - Static: a fixed list of SHA-256 token hashes

pub mod error;
pub mod github;
pub mod static_tokens;
pub mod traits;

pub use error::{IdentityError, IdentityResult};
pub use github::GithubIdentityProvider;
pub use static_tokens::{StaticIdentityProvider, hash_token};
pub use traits::{IdentityProvider, Principal};

use lfsgate_core::config::IdentityConfig;
use std::sync::Arc;
use std::time::Duration;

/// Create an identity provider from configuration.
pub fn from_config(config: &IdentityConfig) -> IdentityResult<Arc<dyn IdentityProvider>> {
    config.validate().map_err(IdentityError::Config)?;

    match config {
        IdentityConfig::Github {
            api_url,
            timeout_secs,
            user_agent,
        } => Ok(Arc::new(GithubIdentityProvider::new(
            api_url,
            Duration::from_secs(*timeout_secs),
            user_agent,
        )?)),
        IdentityConfig::Static { tokens } => Ok(Arc::new(StaticIdentityProvider::new(tokens)?)),
    }
}
