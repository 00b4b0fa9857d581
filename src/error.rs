//! Error types for Fathom.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is the [`FathomError`] enum. The variants follow the failure classes the
//! indexing and query core distinguishes:
//!
//! - **Validation** - malformed documents or policies, rejected before any I/O
//! - **NotFound** - a policy or document is absent
//! - **Persistence** / **Conflict** - the backing store failed or rejected a
//!   stale revision
//! - **Transform** - a single document could not be mapped into index fields
//!
//! # Examples
//!
//! ```
//! use fathom::error::{FathomError, Result};
//!
//! fn lookup() -> Result<()> {
//!     Err(FathomError::not_found("index_policy_for_books"))
//! }
//!
//! let err = lookup().unwrap_err();
//! assert!(err.is_not_found());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Fathom operations.
#[derive(Error, Debug)]
pub enum FathomError {
    /// I/O errors (bootstrap files, CLI input)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed document or policy input
    #[error("Validation error: {0}")]
    Validation(String),

    /// A policy, document, database or index does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backing store failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Optimistic revision check rejected a write
    #[error("Revision conflict for {database}/{id}")]
    Conflict { database: String, id: String },

    /// A document could not be mapped into index fields
    #[error("Transform error: {0}")]
    Transform(String),

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Query-related errors
    #[error("Query error: {0}")]
    Query(String),

    /// The index handle has been closed
    #[error("Index closed: {0}")]
    IndexClosed(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with FathomError.
pub type Result<T> = std::result::Result<T, FathomError>;

impl FathomError {
    /// Create a new validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        FathomError::Validation(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        FathomError::NotFound(msg.into())
    }

    /// Create a new persistence error.
    pub fn persistence<S: Into<String>>(msg: S) -> Self {
        FathomError::Persistence(msg.into())
    }

    /// Create a new revision conflict error.
    pub fn conflict<D: Into<String>, I: Into<String>>(database: D, id: I) -> Self {
        FathomError::Conflict {
            database: database.into(),
            id: id.into(),
        }
    }

    /// Create a new transform error.
    pub fn transform<S: Into<String>>(msg: S) -> Self {
        FathomError::Transform(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        FathomError::Analysis(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        FathomError::Query(msg.into())
    }

    /// Create a new index closed error.
    pub fn index_closed<S: Into<String>>(name: S) -> Self {
        FathomError::IndexClosed(name.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        FathomError::Config(msg.into())
    }

    /// Whether this error reports an absent policy, document or index.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FathomError::NotFound(_))
    }

    /// Whether this error came from the backing store, revision conflicts included.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            FathomError::Persistence(_) | FathomError::Conflict { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = FathomError::validation("database is required");
        assert_eq!(error.to_string(), "Validation error: database is required");

        let error = FathomError::conflict("books", "b1");
        assert_eq!(error.to_string(), "Revision conflict for books/b1");
        assert!(error.is_persistence());
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = FathomError::from(io_error);

        match error {
            FathomError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
