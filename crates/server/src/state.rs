//! Application state shared across handlers.

use crate::auth::Authorizer;
use crate::issuer::UrlIssuer;
use lfsgate_core::config::AppConfig;
use lfsgate_identity::IdentityProvider;
use lfsgate_storage::ObjectStore;
use std::sync::Arc;

/// Application state.
///
/// Everything here is read-only after startup; requests share no mutable state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Object storage backend.
    pub storage: Arc<dyn ObjectStore>,
    /// Token verification and org allowlist.
    pub authorizer: Arc<Authorizer>,
    /// Presigned URL issuance.
    pub issuer: Arc<UrlIssuer>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Logs configuration warnings and errors. Refusing to start on an invalid
    /// configuration is up to the caller.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ObjectStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        match config.validate() {
            Ok(warnings) => {
                for warning in warnings {
                    tracing::warn!("Configuration warning: {}", warning);
                }
            }
            Err(e) => tracing::error!("Configuration error: {}", e),
        }

        let authorizer = Authorizer::new(identity, &config.auth);
        let issuer = UrlIssuer::new(storage.clone(), &config.lfs);

        Self {
            config: Arc::new(config),
            storage,
            authorizer: Arc::new(authorizer),
            issuer: Arc::new(issuer),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("authorizer", &self.authorizer)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}
