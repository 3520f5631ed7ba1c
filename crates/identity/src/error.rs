//! Identity verification errors.

use thiserror::Error;

/// Identity verification errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The token was checked and is not valid. Callers must not learn why.
    #[error("invalid credentials")]
    Invalid,

    /// The identity provider could not be reached or gave an unusable answer.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for identity operations.
pub type IdentityResult<T> = std::result::Result<T, IdentityError>;
