//! # credkit-crypto: Cryptographic Primitives
//!
//! Provides the cryptographic building blocks for credential proofs:
//!
//! - **Ed25519** signing and verification over a [`SigningInput`], the
//!   64-byte concatenation of two SHA-256 digests of canonical bytes.
//! - **Key codec**: multibase/multicodec encoding of Ed25519 keys and
//!   signatures ([`multikey`]).
//! - **Multikey key files**: load, save, and generate key documents
//!   ([`keyfile`]).
//!
//! ## Crate Policy
//!
//! - Depends only on `credkit-core` internally.
//! - No mocking of cryptographic operations in tests. All tests use real
//!   canonical bytes, real SHA-256, real Ed25519.
//! - No `unsafe` code.

pub mod ed25519;
pub mod error;
pub mod keyfile;
pub mod multikey;

pub use ed25519::{verify, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, SigningInput};
pub use error::CryptoError;
pub use keyfile::{generate_key_files, GeneratedKeys, MultikeyDocument};
pub use multikey::KeyKind;
