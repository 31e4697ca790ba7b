//! # Canonical Serialization
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! that feed a digest, and the two canonicalization algorithms credentials
//! are signed over:
//!
//! - **JCS** (RFC 8785): sorted keys, compact separators, minimal numeric
//!   representation, non-ASCII text preserved. Used by `eddsa-jcs-2022`.
//! - **RDFC** (URDNA2015 over the JSON-LD dataset): context-aware
//!   normalization to canonical N-Quads. Used by `eddsa-rdfc-2022`.
//!
//! ## Security Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. It is constructed
//! by [`CanonicalBytes::new()`] (JCS) or by the RDF canonicalizer inside this
//! crate. Any function computing a digest for signing must accept
//! `&CanonicalBytes`, so the "wrong serialization path" defect class is
//! structurally impossible.
//!
//! Canonicalization failures are always errors. Nothing falls back from one
//! algorithm to the other.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CanonicalizationError;
use crate::jsonld;
use crate::loader::DocumentLoader;
use crate::urdna2015;

/// Bytes produced exclusively by a canonicalizer.
///
/// # Invariants
///
/// - JCS output: sorted keys, compact separators (RFC 8785).
/// - RDFC output: sorted canonical N-Quads with `_:c14nN` blank node labels.
/// - Always valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// JCS-canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if the value
    /// cannot be represented as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let text = serde_jcs::to_string(&value)?;
        Ok(Self(text.into_bytes()))
    }

    pub(crate) fn from_nquads(document: String) -> Self {
        Self(document.into_bytes())
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The canonical form as text.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Algorithms
// ---------------------------------------------------------------------------

/// A canonicalization algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalizationAlgorithm {
    /// JSON Canonicalization Scheme, RFC 8785.
    Jcs,
    /// RDF Dataset Canonicalization (URDNA2015).
    Rdfc,
}

impl CanonicalizationAlgorithm {
    /// Identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jcs => "JCS",
            Self::Rdfc => "RDFC-1.0",
        }
    }
}

impl std::fmt::Display for CanonicalizationAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Produces canonical bytes for a JSON document.
pub trait Canonicalizer: Send + Sync {
    /// The algorithm implemented.
    fn algorithm(&self) -> CanonicalizationAlgorithm;

    /// Canonicalize `document`.
    fn canonicalize(&self, document: &Value) -> Result<CanonicalBytes, CanonicalizationError>;
}

/// RFC 8785 canonicalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JcsCanonicalizer;

impl Canonicalizer for JcsCanonicalizer {
    fn algorithm(&self) -> CanonicalizationAlgorithm {
        CanonicalizationAlgorithm::Jcs
    }

    fn canonicalize(&self, document: &Value) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(document)
    }
}

/// URDNA2015 canonicalizer over the JSON-LD dataset of a document.
#[derive(Clone)]
pub struct RdfCanonicalizer {
    loader: Arc<dyn DocumentLoader>,
}

impl std::fmt::Debug for RdfCanonicalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RdfCanonicalizer").finish_non_exhaustive()
    }
}

impl RdfCanonicalizer {
    /// Canonicalizer resolving contexts through `loader`.
    pub fn new(loader: Arc<dyn DocumentLoader>) -> Self {
        Self { loader }
    }
}

impl Canonicalizer for RdfCanonicalizer {
    fn algorithm(&self) -> CanonicalizationAlgorithm {
        CanonicalizationAlgorithm::Rdfc
    }

    fn canonicalize(&self, document: &Value) -> Result<CanonicalBytes, CanonicalizationError> {
        if document.get("@context").is_none() {
            return Err(CanonicalizationError::invalid(
                "document declares no @context",
            ));
        }
        let quads = jsonld::to_rdf(document, self.loader.as_ref())?;
        if quads.is_empty() {
            return Err(CanonicalizationError::invalid(
                "document produced an empty RDF dataset",
            ));
        }
        let nquads = urdna2015::canonicalize(&quads)?;
        tracing::debug!(quads = quads.len(), bytes = nquads.len(), "rdf canonicalization complete");
        Ok(CanonicalBytes::from_nquads(nquads))
    }
}

/// The canonicalizers available to a proof engine. JCS is always present;
/// RDF normalization is present only when a document loader was supplied.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizers {
    jcs: JcsCanonicalizer,
    rdf: Option<RdfCanonicalizer>,
}

impl Canonicalizers {
    /// JCS only. Requests for RDFC fail with `Unavailable`.
    pub fn jcs_only() -> Self {
        Self::default()
    }

    /// JCS and RDFC, with RDFC resolving contexts through `loader`.
    pub fn with_rdf(loader: Arc<dyn DocumentLoader>) -> Self {
        Self {
            jcs: JcsCanonicalizer,
            rdf: Some(RdfCanonicalizer::new(loader)),
        }
    }

    /// Whether `algorithm` can be served.
    pub fn supports(&self, algorithm: CanonicalizationAlgorithm) -> bool {
        match algorithm {
            CanonicalizationAlgorithm::Jcs => true,
            CanonicalizationAlgorithm::Rdfc => self.rdf.is_some(),
        }
    }

    /// The canonicalizer for `algorithm`.
    pub fn get(
        &self,
        algorithm: CanonicalizationAlgorithm,
    ) -> Result<&dyn Canonicalizer, CanonicalizationError> {
        match algorithm {
            CanonicalizationAlgorithm::Jcs => Ok(&self.jcs),
            CanonicalizationAlgorithm::Rdfc => self
                .rdf
                .as_ref()
                .map(|r| r as &dyn Canonicalizer)
                .ok_or_else(|| {
                    CanonicalizationError::Unavailable(
                        "RDF dataset normalization is not configured".into(),
                    )
                }),
        }
    }

    /// Canonicalize `document` with `algorithm`.
    pub fn canonicalize(
        &self,
        algorithm: CanonicalizationAlgorithm,
        document: &Value,
    ) -> Result<CanonicalBytes, CanonicalizationError> {
        self.get(algorithm)?.canonicalize(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ContextCache;
    use serde_json::json;

    #[test]
    fn jcs_sorts_keys_and_compacts() {
        let cb = CanonicalBytes::new(&json!({"b": 1, "a": [true, null]})).unwrap();
        assert_eq!(cb.to_text(), r#"{"a":[true,null],"b":1}"#);
    }

    #[test]
    fn jcs_preserves_non_ascii() {
        let cb = CanonicalBytes::new(&json!({"name": "Zoë 日本"})).unwrap();
        assert_eq!(cb.to_text(), r#"{"name":"Zoë 日本"}"#);
    }

    #[test]
    fn jcs_minimal_numbers() {
        let cb = CanonicalBytes::new(&json!({"n": 1.0, "m": 1.5})).unwrap();
        assert_eq!(cb.to_text(), r#"{"m":1.5,"n":1}"#);
    }

    #[test]
    fn jcs_only_set_reports_rdf_unavailable() {
        let set = Canonicalizers::jcs_only();
        assert!(!set.supports(CanonicalizationAlgorithm::Rdfc));
        let err = set
            .canonicalize(CanonicalizationAlgorithm::Rdfc, &json!({"@context": {}}))
            .unwrap_err();
        assert!(matches!(err, CanonicalizationError::Unavailable(_)));
    }

    #[test]
    fn rdf_requires_context() {
        let set = Canonicalizers::with_rdf(Arc::new(ContextCache::new()));
        let err = set
            .canonicalize(CanonicalizationAlgorithm::Rdfc, &json!({"name": "x"}))
            .unwrap_err();
        assert!(matches!(err, CanonicalizationError::Invalid(_)));
    }

    #[test]
    fn rdf_is_key_order_independent() {
        let set = Canonicalizers::with_rdf(Arc::new(ContextCache::new()));
        let a = json!({
            "@context": {"@vocab": "https://ex.org/"},
            "@id": "urn:ex:1",
            "name": "A",
            "child": {"name": "B"}
        });
        let b = json!({
            "child": {"name": "B"},
            "name": "A",
            "@id": "urn:ex:1",
            "@context": {"@vocab": "https://ex.org/"}
        });
        let ca = set.canonicalize(CanonicalizationAlgorithm::Rdfc, &a).unwrap();
        let cb = set.canonicalize(CanonicalizationAlgorithm::Rdfc, &b).unwrap();
        assert_eq!(ca, cb);
        assert!(ca.to_text().contains("_:c14n0"));
    }

    #[test]
    fn rdf_missing_remote_context_fails() {
        let set = Canonicalizers::with_rdf(Arc::new(ContextCache::new()));
        let doc = json!({"@context": "https://example.org/unknown", "name": "x"});
        let err = set.canonicalize(CanonicalizationAlgorithm::Rdfc, &doc).unwrap_err();
        assert!(matches!(err, CanonicalizationError::ContextLoad { .. }));
    }
}
