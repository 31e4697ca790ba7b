//! Error types for credential handling and Data Integrity proofs.

use thiserror::Error;

/// Failures of the proof engine.
///
/// Signature and structural failures are distinct variants so callers can
/// tell a tampered credential from a malformed one.
#[derive(Error, Debug)]
pub enum ProofError {
    /// The credential carries no `proof`.
    #[error("no proof found in credential")]
    MissingProof,

    /// `proof.type` is not `DataIntegrityProof`.
    #[error("unsupported proof type: {0}")]
    UnsupportedProofType(String),

    /// `proof.cryptosuite` is not a recognized cryptosuite.
    #[error("unsupported cryptosuite: {0}")]
    UnsupportedCryptosuite(String),

    /// `proof.proofValue` is absent or empty.
    #[error("no proofValue in proof")]
    MissingSignature,

    /// The proof object is present but structurally invalid.
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// The signature does not verify over the recomputed signing input.
    #[error("signature verification failed: {0}")]
    SignatureInvalid(String),

    /// Canonicalization of the credential or the proof options failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] credkit_core::CanonicalizationError),
}

/// Errors from credential construction, issuance, and verification
/// plumbing.
#[derive(Error, Debug)]
pub enum VcError {
    /// The document is not a well-formed credential.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// Proof construction or verification failed.
    #[error(transparent)]
    Proof(#[from] ProofError),

    /// Key decoding or key file failure.
    #[error(transparent)]
    Crypto(#[from] credkit_crypto::CryptoError),

    /// Status registry or bitstring failure.
    #[error(transparent)]
    Status(#[from] credkit_status::StatusError),

    /// Core failure (timestamps, documents).
    #[error(transparent)]
    Core(#[from] credkit_core::CoreError),

    /// A verification method could not be resolved to a public key.
    #[error("cannot resolve verification method {0}")]
    UnknownVerificationMethod(String),

    /// A remote status list could not be retrieved.
    #[error("status list fetch failed for {url}: {reason}")]
    Fetch {
        /// Status list URL.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<credkit_core::CanonicalizationError> for VcError {
    fn from(e: credkit_core::CanonicalizationError) -> Self {
        Self::Proof(ProofError::Canonicalization(e))
    }
}
