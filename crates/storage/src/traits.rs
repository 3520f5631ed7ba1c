//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// HTTP method a presigned URL grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresignMethod {
    /// Read the object (`GET`).
    Get,
    /// Write the object (`PUT`).
    Put,
}

impl PresignMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for PresignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time-limited URL granting a single operation on one object.
#[derive(Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    /// The URL, credentials included.
    pub url: String,
    /// Headers the client must send along with the request.
    pub headers: BTreeMap<String, String>,
    /// How long the URL stays valid.
    pub expires_in: Duration,
}

impl fmt::Debug for PresignedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The query string carries the signature.
        let base = self.url.split('?').next().unwrap_or_default();
        f.debug_struct("PresignedUrl")
            .field("url", &format_args!("{base}?<redacted>"))
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Object store collaborator for the batch API.
///
/// The server never moves object bytes itself; it only asks the store for
/// presigned URLs and, for uploads, whether an object is already present.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Check if an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Issue a presigned URL for `method` on `key`, valid for `expires_in`.
    async fn presign(
        &self,
        method: PresignMethod,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<PresignedUrl>;

    /// Get the name of this storage backend.
    ///
    /// Returns a static string identifier for the backend type (e.g., "s3").
    /// Used for metrics and logging.
    fn backend_name(&self) -> &'static str;

    /// Verify storage backend connectivity.
    ///
    /// Called once during server startup so a misconfigured bucket fails fast
    /// instead of on the first batch request.
    ///
    /// The default implementation returns Ok(()).
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
