//! Error type for key encoding, key files, and signature operations.

use thiserror::Error;

/// Errors from cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// A multibase token does not use the base58btc (`z`) encoding.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Decoded key bytes have the wrong multicodec header or length, or a
    /// key document is inconsistent.
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// A multibase signature could not be decoded into 64 bytes.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// The signature does not verify under the given key.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// A key file could not be read, parsed, or written.
    #[error("key file {path}: {reason}")]
    KeyFile {
        /// Path of the key file.
        path: String,
        /// What went wrong.
        reason: String,
    },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
