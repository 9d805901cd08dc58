//! # Error Handling
//!
//! Error types for NearDB operations.
//!
//! Every request either succeeds completely or fails with one of these
//! variants; no partial results are returned. `IndexCorruption` is an
//! invariant violation and disables the affected collection.

use thiserror::Error;

/// Result type alias for NearDB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Primary error type for NearDB
#[derive(Error, Debug)]
pub enum Error {
    // Request errors
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Object not found: {id}")]
    NotFound { id: String },

    #[error("Object already exists: {id}")]
    AlreadyExists { id: String },

    #[error("Invalid vector: {message}")]
    InvalidVector { message: String },

    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    // Index errors
    #[error("Index corruption detected: {details}")]
    IndexCorruption { details: String },

    // System errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("IO error: {message}")]
    Io { message: String, source: std::io::Error },
}

impl Error {
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Error::DimensionMismatch { expected, actual }
    }

    pub fn not_found(id: impl ToString) -> Self {
        Error::NotFound { id: id.to_string() }
    }

    /// Check if error is recoverable
    ///
    /// Request errors are terminal for the triggering call but leave the
    /// collection usable. Corruption and I/O failures are not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::IndexCorruption { .. } => false,
            Error::Io { .. } => false,
            _ => true,
        }
    }

    /// Get error code for the transport layer
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::AlreadyExists { .. } => "ALREADY_EXISTS",
            Error::InvalidVector { .. } => "INVALID_VECTOR",
            Error::InvalidQuery { .. } => "INVALID_QUERY",
            Error::IndexCorruption { .. } => "INDEX_CORRUPTION",
            Error::Configuration { .. } => "CONFIG_ERROR",
            Error::Io { .. } => "IO_ERROR",
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}
