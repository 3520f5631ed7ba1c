//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
///
/// Every variant is an expected rejection of client input; none of them
/// indicate a server fault.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid oid: {0}")]
    InvalidOid(String),

    #[error("invalid repository name: {0}")]
    InvalidRepositoryName(String),

    #[error("{0}")]
    UnprocessableBatch(String),

    #[error("unsupported hash algorithm: {0}")]
    UnsupportedHashAlgorithm(String),

    #[error("batch contains {count} objects (max {max})")]
    PayloadTooLarge { count: usize, max: usize },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
