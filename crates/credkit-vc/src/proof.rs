//! # Data Integrity Proof Types
//!
//! A proof is the proof options (`type`, `cryptosuite`,
//! `verificationMethod`, `created`, `proofPurpose`) plus `proofValue`, the
//! multibase-encoded Ed25519 signature.
//!
//! ## Cryptosuites
//!
//! - **eddsa-jcs-2022**: options and document canonicalized with JCS. The
//!   options carry no `@context`.
//! - **eddsa-rdfc-2022**: options and document canonicalized with
//!   URDNA2015. The options are canonicalized with an injected `@context`
//!   that is never written into the attached proof.
//!
//! ## Security Invariant
//!
//! `created` and the other option fields are kept as the exact strings
//! found in the proof. Verification re-canonicalizes what the signer
//! canonicalized, never a normalized rendition of it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use credkit_core::{CanonicalizationAlgorithm, Timestamp};

use crate::error::ProofError;

/// The only proof type produced and accepted.
pub const DATA_INTEGRITY_PROOF: &str = "DataIntegrityProof";

/// The proof purpose for issuer assertions.
pub const ASSERTION_METHOD: &str = "assertionMethod";

/// A Data Integrity cryptosuite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cryptosuite {
    /// JCS canonicalization, SHA-256, Ed25519.
    #[serde(rename = "eddsa-jcs-2022")]
    EddsaJcs2022,
    /// RDF dataset canonicalization, SHA-256, Ed25519.
    #[serde(rename = "eddsa-rdfc-2022")]
    EddsaRdfc2022,
}

impl Cryptosuite {
    /// The cryptosuite name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EddsaJcs2022 => "eddsa-jcs-2022",
            Self::EddsaRdfc2022 => "eddsa-rdfc-2022",
        }
    }

    /// The canonicalization algorithm this suite uses.
    pub fn algorithm(&self) -> CanonicalizationAlgorithm {
        match self {
            Self::EddsaJcs2022 => CanonicalizationAlgorithm::Jcs,
            Self::EddsaRdfc2022 => CanonicalizationAlgorithm::Rdfc,
        }
    }

    /// Whether proof options are canonicalized with an injected `@context`.
    pub fn injects_context(&self) -> bool {
        matches!(self, Self::EddsaRdfc2022)
    }
}

impl fmt::Display for Cryptosuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cryptosuite {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eddsa-jcs-2022" => Ok(Self::EddsaJcs2022),
            "eddsa-rdfc-2022" => Ok(Self::EddsaRdfc2022),
            other => Err(ProofError::UnsupportedCryptosuite(other.to_string())),
        }
    }
}

/// The proof options: every proof field except `proofValue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofOptions {
    /// Always `DataIntegrityProof`.
    #[serde(rename = "type")]
    pub proof_type: String,
    /// The cryptosuite.
    pub cryptosuite: Cryptosuite,
    /// Verification method id, `<controller>#<key-id>`.
    pub verification_method: String,
    /// Creation time, exactly as written by the signer.
    pub created: String,
    /// Always `assertionMethod` for credentials issued here.
    pub proof_purpose: String,
}

impl ProofOptions {
    /// Options for a new assertion proof created at `created`.
    pub fn new(cryptosuite: Cryptosuite, verification_method: impl Into<String>, created: Timestamp) -> Self {
        Self {
            proof_type: DATA_INTEGRITY_PROOF.to_string(),
            cryptosuite,
            verification_method: verification_method.into(),
            created: created.to_iso8601(),
            proof_purpose: ASSERTION_METHOD.to_string(),
        }
    }

    /// The options as a JSON object, with `@context` first when given.
    pub fn to_document(&self, context: Option<&Value>) -> Value {
        let mut doc = Map::new();
        if let Some(ctx) = context {
            doc.insert("@context".to_string(), ctx.clone());
        }
        doc.insert("type".to_string(), Value::String(self.proof_type.clone()));
        doc.insert(
            "cryptosuite".to_string(),
            Value::String(self.cryptosuite.as_str().to_string()),
        );
        doc.insert(
            "verificationMethod".to_string(),
            Value::String(self.verification_method.clone()),
        );
        doc.insert("created".to_string(), Value::String(self.created.clone()));
        doc.insert(
            "proofPurpose".to_string(),
            Value::String(self.proof_purpose.clone()),
        );
        Value::Object(doc)
    }
}

/// A complete proof as attached to a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// The signed options.
    #[serde(flatten)]
    pub options: ProofOptions,
    /// `z`-prefixed base58btc Ed25519 signature.
    pub proof_value: String,
}

impl Proof {
    /// Parse an attached proof value, reporting each structural failure
    /// distinctly.
    ///
    /// Checks run in order: object shape, `type`, `cryptosuite`,
    /// `proofValue`, then the remaining option fields. Fields other than
    /// the five options and `proofValue` are ignored.
    pub fn parse(value: &Value) -> Result<Self, ProofError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ProofError::MalformedProof("proof must be a single JSON object".into()))?;

        let field = |name: &str| obj.get(name).and_then(Value::as_str);

        let proof_type = field("type").unwrap_or_default();
        if proof_type != DATA_INTEGRITY_PROOF {
            return Err(ProofError::UnsupportedProofType(proof_type.to_string()));
        }
        let cryptosuite: Cryptosuite = field("cryptosuite").unwrap_or_default().parse()?;

        let proof_value = match field("proofValue") {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => return Err(ProofError::MissingSignature),
        };

        let required = |name: &str| {
            field(name)
                .map(str::to_string)
                .ok_or_else(|| ProofError::MalformedProof(format!("proof is missing {name}")))
        };

        Ok(Self {
            options: ProofOptions {
                proof_type: proof_type.to_string(),
                cryptosuite,
                verification_method: required("verificationMethod")?,
                created: required("created")?,
                proof_purpose: required("proofPurpose")?,
            },
            proof_value,
        })
    }

    /// The proof as attached to a credential. Never carries `@context`.
    pub fn to_value(&self) -> Value {
        let mut doc = self.options.to_document(None);
        if let Value::Object(map) = &mut doc {
            map.insert(
                "proofValue".to_string(),
                Value::String(self.proof_value.clone()),
            );
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn proof_json() -> Value {
        json!({
            "type": "DataIntegrityProof",
            "cryptosuite": "eddsa-jcs-2022",
            "verificationMethod": "https://issuer.example#key-1",
            "created": "2025-01-01T00:00:00Z",
            "proofPurpose": "assertionMethod",
            "proofValue": "z3abc"
        })
    }

    #[test]
    fn cryptosuite_names_roundtrip() {
        for suite in [Cryptosuite::EddsaJcs2022, Cryptosuite::EddsaRdfc2022] {
            assert_eq!(suite.as_str().parse::<Cryptosuite>().unwrap(), suite);
            assert_eq!(
                serde_json::to_value(suite).unwrap(),
                Value::String(suite.as_str().into())
            );
        }
        assert!(matches!(
            "ecdsa-rdfc-2019".parse::<Cryptosuite>(),
            Err(ProofError::UnsupportedCryptosuite(_))
        ));
    }

    #[test]
    fn only_rdfc_injects_context() {
        assert!(Cryptosuite::EddsaRdfc2022.injects_context());
        assert!(!Cryptosuite::EddsaJcs2022.injects_context());
        assert_eq!(Cryptosuite::EddsaRdfc2022.algorithm(), CanonicalizationAlgorithm::Rdfc);
    }

    #[test]
    fn parse_and_render_attached_proof() {
        let proof = Proof::parse(&proof_json()).unwrap();
        assert_eq!(proof.options.cryptosuite, Cryptosuite::EddsaJcs2022);
        assert_eq!(proof.options.created, "2025-01-01T00:00:00Z");
        assert_eq!(proof.to_value(), proof_json());
        assert_eq!(serde_json::to_value(&proof).unwrap(), proof_json());
    }

    #[test]
    fn parse_reports_each_failure() {
        let mut v = proof_json();
        v["type"] = json!("Ed25519Signature2020");
        assert!(matches!(Proof::parse(&v), Err(ProofError::UnsupportedProofType(_))));

        let mut v = proof_json();
        v["cryptosuite"] = json!("bbs-2023");
        assert!(matches!(Proof::parse(&v), Err(ProofError::UnsupportedCryptosuite(_))));

        let mut v = proof_json();
        v.as_object_mut().unwrap().remove("proofValue");
        assert!(matches!(Proof::parse(&v), Err(ProofError::MissingSignature)));

        let mut v = proof_json();
        v.as_object_mut().unwrap().remove("created");
        assert!(matches!(Proof::parse(&v), Err(ProofError::MalformedProof(_))));

        assert!(matches!(
            Proof::parse(&json!([proof_json()])),
            Err(ProofError::MalformedProof(_))
        ));
    }

    #[test]
    fn options_document_context_is_optional() {
        let opts = ProofOptions::new(
            Cryptosuite::EddsaRdfc2022,
            "did:ex#k",
            Timestamp::parse("2025-02-03T04:05:06Z").unwrap(),
        );
        let bare = opts.to_document(None);
        assert!(bare.get("@context").is_none());
        assert_eq!(bare["created"], "2025-02-03T04:05:06Z");
        let ctx = json!(["https://www.w3.org/ns/credentials/v2"]);
        assert_eq!(opts.to_document(Some(&ctx))["@context"], ctx);
    }
}
