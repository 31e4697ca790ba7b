//! # Status List Credentials
//!
//! Builds the `credentialStatus` claims embedded in issued credentials and
//! the `BitstringStatusListCredential` published at the list URL.
//!
//! The list credential's subject is
//!
//! ```json
//! {
//!   "id": "<listUrl>#list",
//!   "type": "BitstringStatusList",
//!   "statusPurpose": "revocation",
//!   "encodedList": "<gzip + base64url, unpadded>"
//! }
//! ```
//!
//! and bit `i` of the decoded list is set exactly when the registry entry
//! holding index `i` is revoked.

use serde_json::{json, Value};

use credkit_core::{Timestamp, CREDENTIALS_V2_CONTEXT, STATUS_LIST_2021_CONTEXT};
use credkit_status::{Bitstring, StatusRegistry, DEFAULT_LIST_SIZE};

use crate::credential::{Credential, CredentialStatus, REVOCATION_PURPOSE};
use crate::error::VcError;

/// `type` of a status list credential.
pub const STATUS_LIST_CREDENTIAL_TYPE: &str = "BitstringStatusListCredential";

/// `type` of a status list credential's subject.
pub const STATUS_LIST_TYPE: &str = "BitstringStatusList";

/// Where the status list lives and how large it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusListConfig {
    /// URL of the published status list credential.
    pub url: String,
    /// List size in bytes.
    pub size_bytes: usize,
}

impl StatusListConfig {
    /// A list at `url` with the default size.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            size_bytes: DEFAULT_LIST_SIZE,
        }
    }

    /// Override the list size.
    pub fn with_size(mut self, size_bytes: usize) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    /// The subject id of the list credential.
    pub fn list_id(&self) -> String {
        format!("{}#list", self.url)
    }

    /// The status claim for `index`.
    pub fn entry(&self, index: u64) -> CredentialStatus {
        CredentialStatus::revocation(&self.url, index)
    }

    /// Number of addressable indices.
    pub fn capacity(&self) -> u64 {
        self.size_bytes as u64 * 8
    }
}

/// Build the unsigned status list credential for `registry`.
pub fn status_list_credential(
    registry: &StatusRegistry,
    config: &StatusListConfig,
    issuer: &str,
    valid_from: Timestamp,
) -> Result<Credential, VcError> {
    let bits = registry.to_bitstring(config.size_bytes)?;
    let encoded = bits.encode()?;
    tracing::info!(
        url = %config.url,
        revoked = bits.count_set(),
        capacity = bits.capacity(),
        "regenerated status list"
    );

    Credential::from_value(json!({
        "@context": [CREDENTIALS_V2_CONTEXT, STATUS_LIST_2021_CONTEXT],
        "id": config.url,
        "type": ["VerifiableCredential", STATUS_LIST_CREDENTIAL_TYPE],
        "issuer": issuer,
        "validFrom": valid_from.to_iso8601(),
        "credentialSubject": {
            "id": config.list_id(),
            "type": STATUS_LIST_TYPE,
            "statusPurpose": REVOCATION_PURPOSE,
            "encodedList": encoded,
        }
    }))
}

/// Decode the `encodedList` of a status list credential.
pub fn decode_status_list(list_credential: &Value) -> Result<Bitstring, VcError> {
    let encoded = list_credential
        .get("credentialSubject")
        .and_then(|s| s.get("encodedList"))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            VcError::InvalidCredential("status list credential has no encodedList".into())
        })?;
    Ok(Bitstring::decode(encoded)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> Timestamp {
        Timestamp::parse("2025-01-01T00:00:00Z").unwrap()
    }

    #[test]
    fn list_credential_shape() {
        let config = StatusListConfig::new("https://creds.example/status/revocation-list");
        let cred =
            status_list_credential(&StatusRegistry::new(), &config, "did:web:creds.example", ts())
                .unwrap();
        let v = cred.to_value();
        assert_eq!(v["id"], "https://creds.example/status/revocation-list");
        assert_eq!(v["type"][1], "BitstringStatusListCredential");
        assert_eq!(v["@context"][1], STATUS_LIST_2021_CONTEXT);
        assert_eq!(
            v["credentialSubject"]["id"],
            "https://creds.example/status/revocation-list#list"
        );
        assert_eq!(v["credentialSubject"]["type"], "BitstringStatusList");
        assert_eq!(v["credentialSubject"]["statusPurpose"], "revocation");

        let bits = decode_status_list(&v).unwrap();
        assert_eq!(bits.as_bytes().len(), DEFAULT_LIST_SIZE);
        assert_eq!(bits.count_set(), 0);
    }

    #[test]
    fn revoked_entries_set_their_bits() {
        let mut registry = StatusRegistry::new();
        for id in ["a", "b", "c"] {
            registry.allocate_index(id, ts());
        }
        registry.revoke("b", ts());
        let config = StatusListConfig::new("https://l.example").with_size(4);
        let cred = status_list_credential(&registry, &config, "did:ex", ts()).unwrap();
        let bits = decode_status_list(&cred.to_value()).unwrap();
        assert!(!bits.get(0).unwrap());
        assert!(bits.get(1).unwrap());
        assert!(!bits.get(2).unwrap());
    }

    #[test]
    fn entry_matches_list_url() {
        let config = StatusListConfig::new("https://l.example/list");
        let entry = config.entry(7);
        assert_eq!(entry.id, "https://l.example/list#7");
        assert_eq!(entry.status_list_credential, config.url);
        assert_eq!(config.capacity(), 131_072);
    }

    #[test]
    fn missing_encoded_list_is_invalid() {
        assert!(matches!(
            decode_status_list(&json!({"credentialSubject": {}})),
            Err(VcError::InvalidCredential(_))
        ));
    }
}
