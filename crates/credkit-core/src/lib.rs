//! # credkit-core: Foundational Types for credkit
//!
//! This crate defines the primitives every other credkit crate builds on:
//! canonical serialization, content digests, UTC timestamps, context
//! document loading, and the error hierarchy. It depends on no other
//! credkit crate.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** All digest computation flows through a
//!    canonicalizer. No raw `serde_json::to_vec()` for signing input.
//!
//! 2. **Two algorithms, no fallback.** JCS ([`JcsCanonicalizer`]) and
//!    URDNA2015 over JSON-LD ([`RdfCanonicalizer`]) are selected explicitly
//!    through [`Canonicalizers`]. A missing RDF normalizer is reported as
//!    `Unavailable`, never papered over with JCS.
//!
//! 3. **Offline-first contexts.** [`ContextCache`] serves well-known
//!    contexts from local files and only consults a fallback loader for
//!    URLs it does not hold.
//!
//! 4. **UTC-only timestamps.** [`Timestamp`] renders as
//!    `YYYY-MM-DDTHH:MM:SSZ`, the form stored in the status registry.
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod jsonld;
pub mod loader;
pub mod rdf;
pub mod temporal;
pub mod urdna2015;

// Re-export primary types for ergonomic imports.
pub use canonical::{
    CanonicalBytes, CanonicalizationAlgorithm, Canonicalizer, Canonicalizers, JcsCanonicalizer,
    RdfCanonicalizer,
};
pub use digest::{sha256_digest, sha256_hex, ContentDigest};
pub use error::{CanonicalizationError, CoreError};
pub use loader::{
    ContextCache, DocumentLoader, RemoteDocument, CREDENTIALS_V2_CONTEXT, DATA_INTEGRITY_V2_CONTEXT,
    KNOWN_CONTEXTS, OB_V3P0_CONTEXT, STATUS_LIST_2021_CONTEXT,
};
pub use temporal::Timestamp;
