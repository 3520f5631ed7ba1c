//! Server test utilities.

use crate::common::identity::ScriptedIdentity;
use crate::common::storage::RecordingStore;
use lfsgate_core::config::AppConfig;
use lfsgate_server::{AppState, create_router};
use std::sync::Arc;

/// Org on the allowlist of every test server.
#[allow(dead_code)]
pub const TEST_ORG: &str = "test-org";
#[allow(dead_code)]
pub const TEST_REPO: &str = "test-repo";

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub storage: Arc<RecordingStore>,
    pub identity: Arc<ScriptedIdentity>,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with in-memory collaborators.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a test server with custom config modifications.
    pub fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        lfsgate_server::metrics::register_metrics();

        let mut config = AppConfig::for_testing();
        config.auth.allowed_orgs = vec![TEST_ORG.to_string()];
        modifier(&mut config);

        let storage = Arc::new(RecordingStore::new());
        let identity = Arc::new(ScriptedIdentity::new());
        let state = AppState::new(config, storage.clone(), identity.clone());
        let router = create_router(state.clone());

        Self {
            router,
            state,
            storage,
            identity,
        }
    }

    /// Batch endpoint for the default test repository.
    pub fn batch_uri(&self) -> String {
        batch_uri(TEST_ORG, &format!("{TEST_REPO}.git"))
    }
}

/// Batch endpoint for an arbitrary org and repo segment.
#[allow(dead_code)]
pub fn batch_uri(org: &str, repo_segment: &str) -> String {
    format!("/{org}/{repo_segment}/info/lfs/objects/batch")
}
