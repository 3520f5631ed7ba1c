//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Longest presigned URL lifetime S3 accepts (7 days).
pub const MAX_URL_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Deadline for a whole batch request, including identity verification
    /// and URL issuance. Exceeding it yields 504.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    /// SECURITY: When enabled, ensure this endpoint is network-restricted
    /// to authorized Prometheus scraper IPs only at the infrastructure level.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout_secs: default_request_timeout_secs(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl ServerConfig {
    /// Get the request deadline as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Batch API behaviour.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LfsConfig {
    /// Lifetime of issued presigned URLs in seconds (default: 1 hour).
    #[serde(default = "default_url_expiry_secs")]
    pub url_expiry_secs: u64,
    /// Timeout for a single storage call (presign or existence check).
    #[serde(default = "default_storage_timeout_secs")]
    pub storage_timeout_secs: u64,
    /// Maximum concurrent storage calls per batch.
    #[serde(default = "default_issue_concurrency")]
    pub issue_concurrency: usize,
    /// Skip upload actions for objects already in storage (default: true).
    /// Downloads never check existence.
    #[serde(default = "default_check_existing_uploads")]
    pub check_existing_uploads: bool,
}

fn default_url_expiry_secs() -> u64 {
    3600
}

fn default_storage_timeout_secs() -> u64 {
    10
}

fn default_issue_concurrency() -> usize {
    16
}

fn default_check_existing_uploads() -> bool {
    true
}

impl Default for LfsConfig {
    fn default() -> Self {
        Self {
            url_expiry_secs: default_url_expiry_secs(),
            storage_timeout_secs: default_storage_timeout_secs(),
            issue_concurrency: default_issue_concurrency(),
            check_existing_uploads: default_check_existing_uploads(),
        }
    }
}

impl LfsConfig {
    /// Get the presigned URL lifetime as a Duration.
    pub fn url_expiry(&self) -> Duration {
        Duration::from_secs(self.url_expiry_secs)
    }

    /// Get the per-call storage timeout as a Duration.
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_timeout_secs)
    }

    /// Concurrency clamped to `1..=MAX_BATCH_OBJECTS`.
    pub fn effective_concurrency(&self) -> usize {
        self.issue_concurrency.clamp(1, crate::MAX_BATCH_OBJECTS)
    }

    /// Validate batch settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.url_expiry_secs == 0 || self.url_expiry_secs > MAX_URL_EXPIRY_SECS {
            return Err(format!(
                "lfs.url_expiry_secs must be between 1 and {MAX_URL_EXPIRY_SECS}, got {}",
                self.url_expiry_secs
            ));
        }
        if self.storage_timeout_secs == 0 {
            return Err("lfs.storage_timeout_secs cannot be 0".to_string());
        }
        Ok(())
    }
}

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// S3-compatible storage (AWS S3, Cloudflare R2, MinIO).
    S3 {
        /// Bucket name.
        bucket: String,
        /// Optional endpoint URL (for R2, MinIO, etc.).
        endpoint: Option<String>,
        /// Region. R2 expects "auto".
        region: Option<String>,
        /// Optional key prefix.
        prefix: Option<String>,
        /// Access key ID. Falls back to the ambient AWS credential chain if not set.
        /// WARNING: Prefer env vars or IAM roles over storing secrets in config files.
        access_key_id: Option<String>,
        /// Secret access key. Falls back to the ambient AWS credential chain if not set.
        /// WARNING: Prefer env vars or IAM roles over storing secrets in config files.
        secret_access_key: Option<String>,
        /// Force path-style URLs (`endpoint/bucket/key` instead of `bucket.endpoint/key`).
        /// Required for MinIO. Defaults to false (virtual-hosted style).
        #[serde(default)]
        force_path_style: bool,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::S3 {
            bucket: "lfs-objects".to_string(),
            endpoint: None,
            region: None,
            prefix: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StorageConfig::S3 {
                bucket,
                access_key_id,
                secret_access_key,
                ..
            } => {
                if bucket.is_empty() {
                    return Err("s3 config requires a bucket name".to_string());
                }
                match (access_key_id.as_ref(), secret_access_key.as_ref()) {
                    (Some(_), Some(_)) | (None, None) => Ok(()),
                    _ => Err(
                        "s3 config requires both access_key_id and secret_access_key when either is set"
                            .to_string(),
                    ),
                }
            }
        }
    }
}

/// Caller identity verification backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IdentityConfig {
    /// Verify tokens against the GitHub REST API (`GET /user`).
    Github {
        /// API base URL (GitHub Enterprise Server uses `https://HOST/api/v3`).
        #[serde(default = "default_github_api_url")]
        api_url: String,
        /// Timeout for a single verification call.
        #[serde(default = "default_identity_timeout_secs")]
        timeout_secs: u64,
        /// User-Agent header sent to the API (GitHub rejects requests without one).
        #[serde(default = "default_user_agent")]
        user_agent: String,
    },
    /// Fixed set of tokens, identified by SHA-256 hash.
    Static {
        #[serde(default)]
        tokens: Vec<StaticTokenConfig>,
    },
}

/// A statically configured token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaticTokenConfig {
    /// Subject reported for callers presenting this token.
    pub subject: String,
    /// Pre-computed SHA-256 of the token (64 hex characters).
    /// Generate with: `echo -n "your-secret-token" | sha256sum`
    pub token_hash: String,
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_identity_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!("lfsgate/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self::Github {
            api_url: default_github_api_url(),
            timeout_secs: default_identity_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl IdentityConfig {
    /// Validate identity configuration.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            IdentityConfig::Github {
                api_url,
                timeout_secs,
                ..
            } => {
                if !(api_url.starts_with("https://") || api_url.starts_with("http://")) {
                    return Err(format!(
                        "auth.identity.api_url must be an http(s) URL, got {api_url:?}"
                    ));
                }
                if *timeout_secs == 0 {
                    return Err("auth.identity.timeout_secs cannot be 0".to_string());
                }
                Ok(())
            }
            IdentityConfig::Static { tokens } => {
                for token in tokens {
                    if crate::oid::validate_oid(&token.token_hash.to_ascii_lowercase()).is_err() {
                        return Err(format!(
                            "token_hash for subject {:?} must be a 64-character SHA-256 hex digest",
                            token.subject
                        ));
                    }
                }
                Ok(())
            }
        }
    }
}

/// Authorization policy.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Organizations whose repositories this server serves.
    /// Compared case-insensitively.
    #[serde(default)]
    pub allowed_orgs: Vec<String>,
    /// How caller tokens are verified.
    #[serde(default)]
    pub identity: IdentityConfig,
}

impl AuthConfig {
    /// The allowlist normalised for case-insensitive lookup.
    pub fn allowed_org_set(&self) -> HashSet<String> {
        self.allowed_orgs
            .iter()
            .map(|org| org.trim().to_ascii_lowercase())
            .filter(|org| !org.is_empty())
            .collect()
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Batch API configuration.
    #[serde(default)]
    pub lfs: LfsConfig,
    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Authorization configuration.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Create a test configuration.
    ///
    /// **For testing only.** Allows the `test-org` organization and verifies
    /// tokens against an empty static token list.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            lfs: LfsConfig::default(),
            storage: StorageConfig::default(),
            auth: AuthConfig {
                allowed_orgs: vec!["test-org".to_string()],
                identity: IdentityConfig::Static { tokens: Vec::new() },
            },
        }
    }

    /// Validate the whole configuration.
    ///
    /// Returns warnings for settings that are allowed but probably wrong, and
    /// an error for settings the server cannot run with.
    pub fn validate(&self) -> Result<Vec<String>, String> {
        let mut warnings = Vec::new();

        if self.server.request_timeout_secs == 0 {
            return Err("server.request_timeout_secs cannot be 0".to_string());
        }
        self.lfs.validate()?;
        self.storage.validate()?;
        self.auth.identity.validate()?;

        if self.auth.allowed_org_set().is_empty() {
            warnings.push(
                "auth.allowed_orgs is empty; every authenticated batch request will be rejected with 403"
                    .to_string(),
            );
        }
        if self.lfs.issue_concurrency != self.lfs.effective_concurrency() {
            warnings.push(format!(
                "lfs.issue_concurrency={} is outside 1..={}, using {}",
                self.lfs.issue_concurrency,
                crate::MAX_BATCH_OBJECTS,
                self.lfs.effective_concurrency()
            ));
        }
        if self.lfs.storage_timeout_secs >= self.server.request_timeout_secs {
            warnings.push(format!(
                "lfs.storage_timeout_secs={} is not below server.request_timeout_secs={}; \
                 slow storage calls will fail the whole batch with 504",
                self.lfs.storage_timeout_secs, self.server.request_timeout_secs
            ));
        }

        Ok(warnings)
    }
}
