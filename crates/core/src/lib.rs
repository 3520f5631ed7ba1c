//! Core domain types for the lfsgate Git LFS batch server.
//!
//! This crate defines the request-scoped data model shared by the other crates:
//! - Object identifiers (SHA-256 OIDs) and their validation
//! - Repository references resolved from URL path segments
//! - Batch API wire types and the batch request validator
//! - Configuration types

pub mod batch;
pub mod config;
pub mod error;
pub mod oid;
pub mod repo;

pub use batch::{
    Action, Actions, BatchRequest, BatchResponse, ObjectError, ObjectRequest, ObjectResult, Operation,
    ValidatedBatch, ValidatedObject,
};
pub use error::{Error, Result};
pub use oid::{Oid, validate_oid};
pub use repo::RepositoryRef;

/// Media type for Git LFS API requests and responses.
pub const LFS_MEDIA_TYPE: &str = "application/vnd.git-lfs+json";

/// Maximum number of objects accepted in a single batch request.
pub const MAX_BATCH_OBJECTS: usize = 100;

/// The only hash algorithm this server negotiates.
pub const SUPPORTED_HASH_ALGO: &str = "sha256";

/// The only transfer adapter this server offers.
pub const BASIC_TRANSFER: &str = "basic";
