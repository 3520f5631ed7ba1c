//! Object storage collaborator for lfsgate.
//!
//! This crate provides:
//! - The `ObjectStore` trait the batch API issues URLs through
//! - Presigned GET/PUT URLs with bounded expiry
//! - Existence checks for upload dedup
//! - An S3-compatible backend (AWS S3, Cloudflare R2, MinIO)

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::s3::S3Backend;
pub use error::{StorageError, StorageResult};
pub use traits::{ObjectStore, PresignMethod, PresignedUrl};

use lfsgate_core::config::StorageConfig;
use std::sync::Arc;

/// Create an object store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    config.validate().map_err(StorageError::Config)?;

    match config {
        StorageConfig::S3 {
            bucket,
            endpoint,
            region,
            prefix,
            access_key_id,
            secret_access_key,
            force_path_style,
        } => {
            let backend = S3Backend::new(
                bucket,
                endpoint.clone(),
                region.clone(),
                prefix.clone(),
                access_key_id.clone(),
                secret_access_key.clone(),
                *force_path_style,
            )
            .await?;
            Ok(Arc::new(backend))
        }
    }
}
