//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types shared by every credkit crate. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Canonicalization failures are hard failures and carry the offending
//!   construct or context URL. They are never silently recovered.
//! - Timestamp and document-shape failures include the rejected input.

use thiserror::Error;

/// Top-level error type for credkit core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A timestamp could not be parsed or constructed.
    #[error("invalid timestamp: {0}")]
    Timestamp(String),

    /// A document did not have the required shape.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// The requested algorithm has no backing implementation in this
    /// canonicalizer set (for example RDF normalization was not configured).
    #[error("canonicalization unavailable: {0}")]
    Unavailable(String),

    /// The input cannot be interpreted as valid linked data.
    #[error("invalid linked data: {0}")]
    Invalid(String),

    /// A context document could not be loaded.
    #[error("failed to load context {url}: {reason}")]
    ContextLoad {
        /// The context URL that failed to resolve.
        url: String,
        /// Why loading failed.
        reason: String,
    },

    /// Blank node canonicalization would have to explore more orderings of
    /// indistinguishable related nodes than the configured limit allows.
    #[error("blank node group of {size} exceeds the permutation limit of {limit}")]
    PermutationLimit {
        /// Number of related blank nodes sharing one hash.
        size: usize,
        /// The largest group that is explored.
        limit: usize,
    },

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

impl CanonicalizationError {
    /// Shorthand for [`CanonicalizationError::Invalid`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
