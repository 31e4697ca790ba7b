//! # Verification Orchestrator
//!
//! Combines proof verification with revocation status into a single
//! verdict.
//!
//! ## Order of checks
//!
//! 1. The credential envelope and proof are parsed. Structural failures give
//!    [`VerificationStatus::Malformed`].
//! 2. The verification method is resolved and the signature checked.
//!    Failure gives [`VerificationStatus::SignatureInvalid`].
//! 3. Only after a valid signature is revocation consulted: the local
//!    registry first, then, if the registry does not know the credential,
//!    the remote status list through a [`StatusListFetcher`]. A revoked
//!    credential gives [`VerificationStatus::Revoked`] even though its
//!    signature is valid.
//!
//! Fetch failures and unsupported status entries produce warnings. They
//! never retract a valid signature.
//!
//! Every failed verdict also carries a [`FailureKind`] naming the check that
//! failed, so callers can branch without reading error strings.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use credkit_core::Timestamp;
use credkit_crypto::Ed25519PublicKey;
use credkit_status::StatusRegistry;

use crate::credential::{Credential, REVOCATION_PURPOSE, STATUS_ENTRY_TYPE};
use crate::error::{ProofError, VcError};
use crate::integrity::ProofEngine;
use crate::status::decode_status_list;

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Maps verification method ids to public keys.
pub trait KeyResolver {
    /// Resolve `verification_method`.
    fn resolve(&self, verification_method: &str) -> Result<Ed25519PublicKey, VcError>;
}

/// An explicit key answers for every verification method.
impl KeyResolver for Ed25519PublicKey {
    fn resolve(&self, _verification_method: &str) -> Result<Ed25519PublicKey, VcError> {
        Ok(self.clone())
    }
}

/// A fixed table of verification methods.
#[derive(Debug, Clone, Default)]
pub struct StaticKeyResolver {
    keys: HashMap<String, Ed25519PublicKey>,
}

impl StaticKeyResolver {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` under `verification_method`.
    pub fn insert(&mut self, verification_method: impl Into<String>, key: Ed25519PublicKey) {
        self.keys.insert(verification_method.into(), key);
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when no method is registered.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeyResolver for StaticKeyResolver {
    fn resolve(&self, verification_method: &str) -> Result<Ed25519PublicKey, VcError> {
        self.keys
            .get(verification_method)
            .cloned()
            .ok_or_else(|| VcError::UnknownVerificationMethod(verification_method.to_string()))
    }
}

/// Retrieves a published status list credential. Implementations bound the
/// request with their own timeout.
pub trait StatusListFetcher: Send + Sync {
    /// Fetch the status list credential at `url`.
    fn fetch(&self, url: &str) -> Result<Value, VcError>;
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// The verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Signature valid and not revoked.
    Verified,
    /// Signature valid, but the credential is revoked.
    Revoked,
    /// The signature does not verify.
    SignatureInvalid,
    /// The credential or its proof could not be interpreted.
    Malformed,
}

/// The check that produced a failed verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The credential envelope is not a credential.
    InvalidCredential,
    /// No `proof` is attached.
    MissingProof,
    /// `proof.type` is not `DataIntegrityProof`.
    UnsupportedProofType,
    /// `proof.cryptosuite` is not supported.
    UnsupportedCryptosuite,
    /// `proof.proofValue` is absent or empty.
    MissingSignature,
    /// The proof object is structurally invalid.
    MalformedProof,
    /// No key is known for `proof.verificationMethod`.
    UnknownVerificationMethod,
    /// The credential or proof options could not be canonicalized.
    Canonicalization,
    /// The signature does not verify.
    SignatureInvalid,
    /// The issuer has revoked the credential.
    Revoked,
}

impl From<&ProofError> for FailureKind {
    fn from(e: &ProofError) -> Self {
        match e {
            ProofError::MissingProof => Self::MissingProof,
            ProofError::UnsupportedProofType(_) => Self::UnsupportedProofType,
            ProofError::UnsupportedCryptosuite(_) => Self::UnsupportedCryptosuite,
            ProofError::MissingSignature => Self::MissingSignature,
            ProofError::MalformedProof(_) => Self::MalformedProof,
            ProofError::SignatureInvalid(_) => Self::SignatureInvalid,
            ProofError::Canonicalization(_) => Self::Canonicalization,
        }
    }
}

impl From<&VcError> for FailureKind {
    fn from(e: &VcError) -> Self {
        match e {
            VcError::Proof(p) => p.into(),
            VcError::UnknownVerificationMethod(_) | VcError::Crypto(_) => {
                Self::UnknownVerificationMethod
            }
            _ => Self::InvalidCredential,
        }
    }
}

/// Where a revocation status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSource {
    /// The local status registry.
    Registry,
    /// A fetched status list credential.
    StatusList,
}

/// Revocation outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RevocationStatus {
    /// Whether a status claim was present and checked.
    pub checked: bool,
    /// Whether the credential is revoked.
    pub revoked: bool,
    /// Revocation time, known only from the registry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<Timestamp>,
    /// Which source decided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<StatusSource>,
    /// Why the status could not be fully checked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of the attached proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofSummary {
    /// `proof.type`.
    #[serde(rename = "type")]
    pub proof_type: Option<String>,
    /// `proof.cryptosuite`.
    pub cryptosuite: Option<String>,
    /// `proof.created`.
    pub created: Option<String>,
    /// `proof.verificationMethod`.
    pub verification_method: Option<String>,
}

impl ProofSummary {
    fn from_value(proof: &Value) -> Self {
        let field = |name: &str| proof.get(name).and_then(Value::as_str).map(str::to_string);
        Self {
            proof_type: field("type"),
            cryptosuite: field("cryptosuite"),
            created: field("created"),
            verification_method: field("verificationMethod"),
        }
    }
}

/// Everything a verification run found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// The verdict.
    pub status: VerificationStatus,
    /// Which check failed, absent when verified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    /// Credential `id`, or `unknown`.
    pub credential_id: String,
    /// Issuer name, else issuer id.
    pub issuer: Option<String>,
    /// `credentialSubject.id`.
    pub subject: Option<String>,
    /// `credentialSubject.achievement.name`.
    pub achievement: Option<String>,
    /// The attached proof's metadata.
    pub proof: Option<ProofSummary>,
    /// Revocation outcome, present once the signature has been checked.
    pub revocation: Option<RevocationStatus>,
    /// Reasons for a failed verdict.
    pub errors: Vec<String>,
    /// Non-fatal findings.
    pub warnings: Vec<String>,
}

impl VerificationReport {
    fn new(credential: &Value) -> Self {
        let str_at = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);
        Self {
            status: VerificationStatus::Malformed,
            failure: None,
            credential_id: str_at(credential.get("id")).unwrap_or_else(|| "unknown".to_string()),
            issuer: None,
            subject: None,
            achievement: None,
            proof: credential.get("proof").map(ProofSummary::from_value),
            revocation: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn fail(
        mut self,
        status: VerificationStatus,
        kind: FailureKind,
        error: impl Into<String>,
    ) -> Self {
        self.status = status;
        self.failure = Some(kind);
        self.errors.push(error.into());
        self
    }

    fn malformed<E>(self, error: &E) -> Self
    where
        E: std::fmt::Display,
        for<'e> FailureKind: From<&'e E>,
    {
        self.fail(VerificationStatus::Malformed, FailureKind::from(error), error.to_string())
    }

    /// True only for [`VerificationStatus::Verified`].
    pub fn is_verified(&self) -> bool {
        self.status == VerificationStatus::Verified
    }
}

// ---------------------------------------------------------------------------
// Verifier
// ---------------------------------------------------------------------------

/// Verifies credentials against a proof engine and optional status sources.
pub struct Verifier<'a> {
    engine: &'a ProofEngine,
    registry: Option<&'a StatusRegistry>,
    fetcher: Option<&'a dyn StatusListFetcher>,
    profile_base_url: Option<String>,
}

impl<'a> Verifier<'a> {
    /// A verifier with no status sources.
    pub fn new(engine: &'a ProofEngine) -> Self {
        Self {
            engine,
            registry: None,
            fetcher: None,
            profile_base_url: None,
        }
    }

    /// Consult `registry` for revocation.
    pub fn with_registry(mut self, registry: &'a StatusRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Fall back to fetching the status list when the registry does not
    /// know the credential.
    pub fn with_fetcher(mut self, fetcher: &'a dyn StatusListFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Strip `prefix` from credential ids to form registry identities.
    pub fn with_profile_base_url(mut self, prefix: impl Into<String>) -> Self {
        self.profile_base_url = Some(prefix.into());
        self
    }

    /// Verify `credential`, resolving keys through `keys`.
    pub fn verify(&self, credential: &Value, keys: &dyn KeyResolver) -> VerificationReport {
        let mut report = VerificationReport::new(credential);

        if credential.get("proof").is_none() {
            return report.malformed(&ProofError::MissingProof);
        }
        let parsed = match Credential::from_value(credential.clone()) {
            Ok(c) => c,
            Err(e) => return report.malformed(&e),
        };
        let proof = match self.engine.parse_proof(&parsed) {
            Ok(p) => p,
            Err(e) => return report.malformed(&e),
        };
        let public_key = match keys.resolve(&proof.options.verification_method) {
            Ok(k) => k,
            Err(e) => return report.malformed(&e),
        };

        match self.engine.verify_parsed(&parsed, &proof, &public_key) {
            Ok(()) => {}
            Err(e @ ProofError::SignatureInvalid(_)) => {
                tracing::warn!(credential = parsed.id(), error = %e, "signature check failed");
                return report.fail(
                    VerificationStatus::SignatureInvalid,
                    FailureKind::SignatureInvalid,
                    e.to_string(),
                );
            }
            Err(e) => return report.malformed(&e),
        }

        let revocation = self.check_status(&parsed);
        if let Some(error) = &revocation.error {
            report
                .warnings
                .push(format!("could not verify revocation status: {error}"));
        }
        let revoked = revocation.revoked;
        let revoked_at = revocation.revoked_at;
        report.revocation = Some(revocation);

        if revoked {
            tracing::info!(credential = parsed.id(), "credential is revoked");
            report.status = VerificationStatus::Revoked;
            report.failure = Some(FailureKind::Revoked);
            report.errors.push("credential has been revoked".to_string());
            if let Some(at) = revoked_at {
                report.errors.push(format!("revoked at: {at}"));
            }
            return report;
        }

        report.status = VerificationStatus::Verified;
        report.issuer = parsed.issuer_display_name().map(str::to_string);
        report.subject = Some(parsed.subject_id().unwrap_or("unknown").to_string());
        report.achievement = Some(parsed.achievement_name().unwrap_or("unknown").to_string());
        report
    }

    /// Revocation status of a credential whose signature has been verified.
    fn check_status(&self, credential: &Credential) -> RevocationStatus {
        let mut result = RevocationStatus::default();
        let Some(status) = credential.credential_status_value() else {
            return result;
        };

        let status_type = status.get("type").and_then(Value::as_str).unwrap_or_default();
        if status_type != STATUS_ENTRY_TYPE {
            result.error = Some(format!("unsupported status type: {status_type}"));
            return result;
        }
        if status.get("statusPurpose").and_then(Value::as_str) != Some(REVOCATION_PURPOSE) {
            return result;
        }
        result.checked = true;

        let identity = self.registry_identity(credential.id());
        if let Some(entry) = self.registry.and_then(|r| r.get(identity)) {
            result.source = Some(StatusSource::Registry);
            result.revoked = entry.revoked;
            result.revoked_at = entry.revoked_at;
            return result;
        }

        let (Some(fetcher), Some(url)) = (
            self.fetcher,
            status.get("statusListCredential").and_then(Value::as_str),
        ) else {
            return result;
        };
        let index = match status_index(status) {
            Some(i) => i,
            None => {
                result.error = Some("invalid statusListIndex".to_string());
                return result;
            }
        };

        match fetcher
            .fetch(url)
            .and_then(|list| decode_status_list(&list))
            .and_then(|bits| bits.get(index).map_err(VcError::from))
        {
            Ok(revoked) => {
                result.source = Some(StatusSource::StatusList);
                result.revoked = revoked;
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "status list check failed");
                result.error = Some(e.to_string());
            }
        }
        result
    }

    fn registry_identity<'c>(&self, credential_id: &'c str) -> &'c str {
        self.profile_base_url
            .as_deref()
            .and_then(|prefix| credential_id.strip_prefix(prefix))
            .unwrap_or(credential_id)
    }
}

fn status_index(status: &Value) -> Option<u64> {
    match status.get("statusListIndex")? {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}
