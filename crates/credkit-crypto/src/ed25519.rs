//! # Ed25519 Signing and Verification
//!
//! Provides Ed25519 key generation, signing, and verification for
//! Data Integrity proofs.
//!
//! ## Security Invariant
//!
//! - Signing input MUST be a [`SigningInput`]: the 64-byte concatenation
//!   `sha256(proof options) || sha256(document)`, built from two
//!   `ContentDigest`s. Raw documents cannot be signed, and both digests can
//!   only come from canonicalized bytes.
//! - Private keys are never serialized or logged. `Ed25519KeyPair` does not
//!   implement `Serialize`; the seed leaves this crate only through the
//!   Multikey key file writer.
//!
//! ## Serde
//!
//! - Public keys serialize as multibase (`z6Mk...`) strings.
//! - Signatures serialize as multibase (`z...`) strings with no header.

use credkit_core::ContentDigest;
use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CryptoError;
use crate::multikey::{self, KeyKind};

/// The fixed-size message a proof signature covers.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningInput([u8; 64]);

impl SigningInput {
    /// Concatenate the proof options digest and the document digest, in
    /// that order.
    pub fn new(proof_options: &ContentDigest, document: &ContentDigest) -> Self {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(proof_options.as_bytes());
        bytes[32..].copy_from_slice(document.as_bytes());
        Self(bytes)
    }

    /// The 64 bytes to sign.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl std::fmt::Debug for SigningInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningInput({}...)", hex_prefix(&self.0))
    }
}

/// An Ed25519 public key (32 bytes) for signature verification.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey([u8; 32]);

/// An Ed25519 signature (64 bytes).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ed25519Signature([u8; 64]);

/// An Ed25519 key pair for signing operations.
///
/// Does not implement `Serialize`. Private keys must not be accidentally
/// serialized into logs or credentials.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

// ---------------------------------------------------------------------------
// Ed25519PublicKey impls
// ---------------------------------------------------------------------------

impl Ed25519PublicKey {
    /// Create a public key from raw 32 bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the raw 32-byte public key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Multibase rendering with the `0xED01` header.
    pub fn to_multibase(&self) -> String {
        multikey::encode(KeyKind::Public, &self.0)
    }

    /// Parse a `publicKeyMultibase` token.
    pub fn from_multibase(token: &str) -> Result<Self, CryptoError> {
        multikey::decode(KeyKind::Public, token).map(Self)
    }

    /// Convert to an `ed25519_dalek::VerifyingKey`.
    pub fn to_verifying_key(&self) -> Result<ed25519_dalek::VerifyingKey, CryptoError> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|e| CryptoError::InvalidKeyFormat(format!("invalid public key: {e}")))
    }
}

impl Serialize for Ed25519PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_multibase())
    }
}

impl<'de> Deserialize<'de> for Ed25519PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Self::from_multibase(&token).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519PublicKey({}...)", hex_prefix(&self.0))
    }
}

impl std::fmt::Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_multibase())
    }
}

// ---------------------------------------------------------------------------
// Ed25519Signature impls
// ---------------------------------------------------------------------------

impl Ed25519Signature {
    /// Create a signature from raw 64 bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Return the raw 64-byte signature.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// `proofValue` rendering.
    pub fn to_multibase(&self) -> String {
        multikey::encode_signature(&self.0)
    }

    /// Parse a `proofValue`.
    pub fn from_multibase(token: &str) -> Result<Self, CryptoError> {
        multikey::decode_signature(token).map(Self)
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_multibase())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Self::from_multibase(&token).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signature({}...)", hex_prefix(&self.0))
    }
}

impl std::fmt::Display for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_multibase())
    }
}

// ---------------------------------------------------------------------------
// Ed25519KeyPair impls
// ---------------------------------------------------------------------------

impl Ed25519KeyPair {
    /// Generate a new random Ed25519 key pair.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        let signing_key = ed25519_dalek::SigningKey::generate(&mut csprng);
        Self { signing_key }
    }

    /// Create a key pair from a raw 32-byte private key seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = ed25519_dalek::SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Parse a `secretKeyMultibase` token.
    pub fn from_multibase(token: &str) -> Result<Self, CryptoError> {
        multikey::decode(KeyKind::Private, token).map(|seed| Self::from_seed(&seed))
    }

    /// Get the public key from this key pair.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a proof's signing input.
    ///
    /// # Security Invariant
    ///
    /// You cannot sign raw `&[u8]`. Only the digest concatenation of two
    /// canonicalized documents can be signed.
    pub fn sign(&self, input: &SigningInput) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(input.as_bytes()).to_bytes())
    }

    pub(crate) fn secret_multibase(&self) -> String {
        multikey::encode(KeyKind::Private, &self.signing_key.to_bytes())
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519KeyPair(<private>)")
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify an Ed25519 signature over a signing input.
///
/// Returns `Ok(())` if valid, `Err(CryptoError::VerificationFailed)` on a
/// mismatch and `Err(CryptoError::InvalidKeyFormat)` if the public key is
/// not a valid curve point.
pub fn verify(
    input: &SigningInput,
    signature: &Ed25519Signature,
    public_key: &Ed25519PublicKey,
) -> Result<(), CryptoError> {
    let vk = public_key.to_verifying_key()?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    vk.verify(input.as_bytes(), &sig)
        .map_err(|e| CryptoError::VerificationFailed(format!("Ed25519 verification failed: {e}")))
}

fn hex_prefix(bytes: &[u8]) -> String {
    bytes.iter().take(4).map(|b| format!("{b:02x}")).collect()
}
