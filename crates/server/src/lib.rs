//! HTTP server for the Git LFS Batch API.
//!
//! This crate provides:
//! - The batch endpoint (`POST /{org}/{repo}.git/info/lfs/objects/batch`)
//! - Caller authorization against an identity provider and org allowlist
//! - Presigned URL issuance through the storage collaborator
//! - Health and Prometheus metrics endpoints

pub mod auth;
pub mod error;
pub mod handlers;
pub mod issuer;
pub mod metrics;
pub mod routes;
pub mod state;

pub use auth::{Authorizer, TraceId};
pub use error::ApiError;
pub use issuer::UrlIssuer;
pub use routes::create_router;
pub use state::AppState;
