//! # Credential Document Model
//!
//! Credentials are free-form JSON objects: achievements, issuers, and
//! subjects vary in shape between issuers. [`Credential`] keeps the document
//! as an ordered JSON map and validates only the envelope at the boundary:
//!
//! - `@context` is present,
//! - `id` is a non-empty string,
//! - `type` includes `VerifiableCredential`,
//! - `issuer` is a string or an object with a string `id`,
//! - `validFrom` is an ISO 8601 timestamp,
//! - `credentialSubject` is an object.
//!
//! `proof` and `credentialStatus` are optional.
//!
//! ## Security Invariant
//!
//! The document handed to canonicalization for signing and verification is
//! always [`Credential::without_proof`]. The `proof` key never contributes
//! to its own signing input.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use credkit_core::Timestamp;

use crate::error::VcError;

/// The base credential type every credential must declare.
pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// The `credentialStatus` type written by this crate.
pub const STATUS_ENTRY_TYPE: &str = "BitstringStatusListEntry";

/// The only status purpose this crate acts on.
pub const REVOCATION_PURPOSE: &str = "revocation";

/// A credential document with a validated envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Credential {
    doc: Map<String, Value>,
}

impl Credential {
    /// Validate `value` as a credential.
    pub fn from_value(value: Value) -> Result<Self, VcError> {
        let Value::Object(doc) = value else {
            return Err(invalid("credential must be a JSON object"));
        };
        let credential = Self { doc };
        credential.validate()?;
        Ok(credential)
    }

    fn validate(&self) -> Result<(), VcError> {
        if !self.doc.contains_key("@context") {
            return Err(invalid("missing @context"));
        }
        match self.doc.get("id") {
            Some(Value::String(s)) if !s.is_empty() => {}
            _ => return Err(invalid("id must be a non-empty string")),
        }
        if !self.types().iter().any(|t| *t == VERIFIABLE_CREDENTIAL_TYPE) {
            return Err(invalid("type must include VerifiableCredential"));
        }
        if self.issuer_id().is_none() {
            return Err(invalid("issuer must be a string or an object with an id"));
        }
        match self.doc.get("validFrom").and_then(Value::as_str) {
            Some(s) => {
                Timestamp::parse_lenient(s)
                    .map_err(|e| invalid(format!("validFrom: {e}")))?;
            }
            None => return Err(invalid("missing validFrom")),
        }
        if !self.doc.get("credentialSubject").is_some_and(Value::is_object) {
            return Err(invalid("credentialSubject must be an object"));
        }
        Ok(())
    }

    /// The credential identity (`id`).
    pub fn id(&self) -> &str {
        self.doc.get("id").and_then(Value::as_str).unwrap_or_default()
    }

    /// The declared `@context`.
    pub fn context(&self) -> Option<&Value> {
        self.doc.get("@context")
    }

    /// The declared types, whether `type` is a string or an array.
    pub fn types(&self) -> Vec<&str> {
        match self.doc.get("type") {
            Some(Value::String(s)) => vec![s.as_str()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// The issuer id, from a string issuer or `issuer.id`.
    pub fn issuer_id(&self) -> Option<&str> {
        match self.doc.get("issuer")? {
            Value::String(s) => Some(s),
            Value::Object(o) => o.get("id").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Issuer display name: `issuer.name`, else the issuer id.
    pub fn issuer_display_name(&self) -> Option<&str> {
        self.doc
            .get("issuer")
            .and_then(|i| i.get("name"))
            .and_then(Value::as_str)
            .or_else(|| self.issuer_id())
    }

    /// `validFrom`, parsed.
    pub fn valid_from(&self) -> Result<Timestamp, VcError> {
        let raw = self
            .doc
            .get("validFrom")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("missing validFrom"))?;
        Ok(Timestamp::parse_lenient(raw)?)
    }

    /// The subject claim.
    pub fn subject(&self) -> Option<&Map<String, Value>> {
        self.doc.get("credentialSubject").and_then(Value::as_object)
    }

    /// `credentialSubject.id`.
    pub fn subject_id(&self) -> Option<&str> {
        self.subject()?.get("id")?.as_str()
    }

    /// `credentialSubject.achievement.name`.
    pub fn achievement_name(&self) -> Option<&str> {
        self.subject()?.get("achievement")?.get("name")?.as_str()
    }

    /// The attached proof, if any.
    pub fn proof(&self) -> Option<&Value> {
        self.doc.get("proof")
    }

    /// Whether a proof is attached.
    pub fn is_signed(&self) -> bool {
        self.doc.contains_key("proof")
    }

    /// Attach `proof`, replacing any existing one.
    pub fn set_proof(&mut self, proof: Value) {
        self.doc.insert("proof".to_string(), proof);
    }

    /// Remove and return the proof.
    pub fn take_proof(&mut self) -> Option<Value> {
        self.doc.remove("proof")
    }

    /// The document with `proof` removed: the form that is canonicalized
    /// for signing and verification.
    pub fn without_proof(&self) -> Value {
        let mut doc = self.doc.clone();
        doc.remove("proof");
        Value::Object(doc)
    }

    /// The raw `credentialStatus` claim.
    pub fn credential_status_value(&self) -> Option<&Value> {
        self.doc.get("credentialStatus")
    }

    /// Set `credentialStatus`.
    pub fn set_credential_status(&mut self, status: &CredentialStatus) -> Result<(), VcError> {
        self.doc
            .insert("credentialStatus".to_string(), serde_json::to_value(status)?);
        Ok(())
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.doc
    }

    /// The full document, proof included.
    pub fn to_value(&self) -> Value {
        Value::Object(self.doc.clone())
    }

    /// Pretty-printed JSON, proof included.
    pub fn to_pretty_json(&self) -> Result<String, VcError> {
        Ok(serde_json::to_string_pretty(&self.doc)?)
    }
}

impl TryFrom<Value> for Credential {
    type Error = VcError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Credential> for Value {
    fn from(c: Credential) -> Self {
        Value::Object(c.doc)
    }
}

fn invalid(msg: impl Into<String>) -> VcError {
    VcError::InvalidCredential(msg.into())
}

// ---------------------------------------------------------------------------
// Status claim
// ---------------------------------------------------------------------------

/// A `credentialStatus` claim pointing at a bitstring status list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatus {
    /// `<statusListCredential>#<index>`.
    pub id: String,
    /// `BitstringStatusListEntry`.
    #[serde(rename = "type")]
    pub status_type: String,
    /// `revocation`.
    pub status_purpose: String,
    /// Bit position, as a decimal string.
    pub status_list_index: String,
    /// URL of the status list credential.
    pub status_list_credential: String,
}

impl CredentialStatus {
    /// A revocation entry for `index` in the list at `list_url`.
    pub fn revocation(list_url: &str, index: u64) -> Self {
        Self {
            id: format!("{list_url}#{index}"),
            status_type: STATUS_ENTRY_TYPE.to_string(),
            status_purpose: REVOCATION_PURPOSE.to_string(),
            status_list_index: index.to_string(),
            status_list_credential: list_url.to_string(),
        }
    }

    /// The bit position, parsed.
    pub fn index(&self) -> Option<u64> {
        self.status_list_index.trim().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "id": "https://creds.example/profile/w/a",
            "type": ["VerifiableCredential", "OpenBadgeCredential"],
            "issuer": {"id": "https://creds.example/issuer", "name": "Example Org"},
            "validFrom": "2025-01-01T00:00:00Z",
            "credentialSubject": {
                "id": "mailto:ada@example.com",
                "achievement": {"name": "Rust Basics"}
            }
        })
    }

    #[test]
    fn accepts_a_well_formed_credential() {
        let c = Credential::from_value(sample()).unwrap();
        assert_eq!(c.id(), "https://creds.example/profile/w/a");
        assert_eq!(c.issuer_id(), Some("https://creds.example/issuer"));
        assert_eq!(c.issuer_display_name(), Some("Example Org"));
        assert_eq!(c.subject_id(), Some("mailto:ada@example.com"));
        assert_eq!(c.achievement_name(), Some("Rust Basics"));
        assert!(!c.is_signed());
    }

    #[test]
    fn string_issuer_is_its_own_display_name() {
        let mut v = sample();
        v["issuer"] = json!("did:web:creds.example");
        let c = Credential::from_value(v).unwrap();
        assert_eq!(c.issuer_display_name(), Some("did:web:creds.example"));
    }

    #[test]
    fn rejects_missing_required_fields() {
        for key in ["@context", "id", "issuer", "validFrom", "credentialSubject"] {
            let mut v = sample();
            v.as_object_mut().unwrap().remove(key);
            assert!(
                matches!(Credential::from_value(v), Err(VcError::InvalidCredential(_))),
                "accepted credential without {key}"
            );
        }
    }

    #[test]
    fn rejects_wrong_type_and_bad_timestamp() {
        let mut v = sample();
        v["type"] = json!("OpenBadgeCredential");
        assert!(Credential::from_value(v).is_err());

        let mut v = sample();
        v["validFrom"] = json!("yesterday");
        assert!(Credential::from_value(v).is_err());

        assert!(Credential::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn without_proof_drops_only_the_proof() {
        let mut c = Credential::from_value(sample()).unwrap();
        let before = c.without_proof();
        c.set_proof(json!({"type": "DataIntegrityProof"}));
        assert!(c.is_signed());
        assert_eq!(c.without_proof(), before);
        assert!(c.to_value().get("proof").is_some());
    }

    #[test]
    fn status_claim_shape() {
        let s = CredentialStatus::revocation("https://creds.example/status/list", 42);
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(
            v,
            json!({
                "id": "https://creds.example/status/list#42",
                "type": "BitstringStatusListEntry",
                "statusPurpose": "revocation",
                "statusListIndex": "42",
                "statusListCredential": "https://creds.example/status/list"
            })
        );
        assert_eq!(s.index(), Some(42));
    }

    #[test]
    fn serde_goes_through_validation() {
        let c: Credential = serde_json::from_value(sample()).unwrap();
        assert_eq!(serde_json::to_value(&c).unwrap(), sample());
        assert!(serde_json::from_value::<Credential>(json!({"id": "x"})).is_err());
    }
}
