//! Error types for Chirpy.
//!
//! All errors are strongly typed and propagated without panicking.
//! Plaintext passwords and credential hashes are never included in
//! error messages.

use std::path::PathBuf;

/// Error taxonomy shared by the store, repository, and token service.
#[derive(Debug, thiserror::Error)]
pub enum ChirpyError {
    /// Caller input violates a documented constraint.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Account already exists for email: {0}")]
    DuplicateEmail(String),

    /// Bad, expired, or missing token, or a wrong password.
    #[error("Unauthorized: {0}")]
    Auth(String),

    /// The persisted document exists but is not a well-formed document.
    #[error("Corrupt document at {path}: {reason}")]
    Corruption { path: PathBuf, reason: String },

    #[error("Storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Process-level misconfiguration, surfaced at startup.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ChirpyError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// HTTP status code the boundary layer maps this error to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Auth(_) => 401,
            Self::NotFound(_) => 404,
            Self::DuplicateEmail(_) => 409,
            Self::Corruption { .. } | Self::Storage { .. } | Self::Config(_) => 500,
        }
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, ChirpyError>;
