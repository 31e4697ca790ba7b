//! Error type for the status registry and bitstring codec.

use thiserror::Error;

/// Errors from status list and registry operations.
#[derive(Error, Debug)]
pub enum StatusError {
    /// A bit index lies beyond the end of the bitstring.
    #[error("index {index} out of range for bitstring of {capacity} bits")]
    IndexOutOfRange {
        /// Requested index.
        index: u64,
        /// Number of addressable bits.
        capacity: u64,
    },

    /// The identity has no registry entry.
    #[error("unknown credential identity: {0}")]
    UnknownIdentity(String),

    /// A rename target already exists.
    #[error("registry conflict: cannot rename {from} to {to}, target already exists")]
    Conflict {
        /// Source identity.
        from: String,
        /// Existing target identity.
        to: String,
    },

    /// An encoded list could not be decoded or encoded.
    #[error("status list encoding error: {0}")]
    Encoding(String),

    /// The registry file violates an index invariant.
    #[error("corrupt status registry: {0}")]
    CorruptRegistry(String),

    /// The registry lock was held by another writer for too long.
    #[error("timed out after {waited_secs}s waiting for registry lock {path}")]
    LockTimeout {
        /// Lock file path.
        path: String,
        /// Seconds waited.
        waited_secs: u64,
    },

    /// Registry JSON could not be parsed or written.
    #[error("registry serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
