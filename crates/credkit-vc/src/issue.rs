//! # Credential Issuance
//!
//! Builds an unsigned OpenBadgeCredential from an achievement template.
//! The achievement's own `issuer` (id and name) overrides the configured
//! issuer profile when present.
//!
//! Credential ids are chosen in this order: an explicit id, then
//! `<profile base URL><identity>` when both are known, then a fresh
//! `urn:uuid:`.

use serde_json::{json, Map, Value};
use uuid::Uuid;

use credkit_core::{Timestamp, CREDENTIALS_V2_CONTEXT, OB_V3P0_CONTEXT};

use crate::credential::Credential;
use crate::error::VcError;

/// The issuing organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerProfile {
    /// Issuer id (URL or DID).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Homepage.
    pub url: Option<String>,
    /// Logo image URL.
    pub image: Option<String>,
}

impl IssuerProfile {
    /// A profile with no homepage or image.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: None,
            image: None,
        }
    }

    fn to_value(&self) -> Value {
        let mut profile = Map::new();
        profile.insert("id".into(), json!(self.id));
        profile.insert("type".into(), json!(["Profile"]));
        profile.insert("name".into(), json!(self.name));
        if let Some(url) = &self.url {
            profile.insert("url".into(), json!(url));
        }
        if let Some(image) = &self.image {
            profile.insert("image".into(), json!({"id": image, "type": "Image"}));
        }
        Value::Object(profile)
    }
}

/// Inputs for one issuance.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    /// The achievement template (`id`, `name`, `description`, `criteria`,
    /// `image`, optional `issuer`).
    pub achievement: Value,
    /// Recipient id (DID, `mailto:` URI, or URL).
    pub recipient_id: String,
    /// Recipient display name.
    pub recipient_name: Option<String>,
    /// Explicit credential id.
    pub credential_id: Option<String>,
    /// Registry identity, conventionally `<wallet>/<achievement>`.
    pub identity: Option<String>,
    /// Issuance time.
    pub valid_from: Timestamp,
}

/// Builds credentials for one issuer.
#[derive(Debug, Clone)]
pub struct CredentialIssuer {
    issuer: IssuerProfile,
    profile_base_url: Option<String>,
}

impl CredentialIssuer {
    /// An issuer using `profile` unless the achievement names its own.
    pub fn new(profile: IssuerProfile) -> Self {
        Self {
            issuer: profile,
            profile_base_url: None,
        }
    }

    /// Derive credential ids from `<base><identity>`.
    pub fn with_profile_base_url(mut self, base: impl Into<String>) -> Self {
        self.profile_base_url = Some(base.into());
        self
    }

    /// The id the credential for `request` will carry.
    pub fn credential_id(&self, request: &IssueRequest) -> String {
        if let Some(id) = &request.credential_id {
            return id.clone();
        }
        match (&self.profile_base_url, &request.identity) {
            (Some(base), Some(identity)) => format!("{base}{identity}"),
            _ => format!("urn:uuid:{}", Uuid::new_v4()),
        }
    }

    /// Build the unsigned credential.
    pub fn create(&self, request: &IssueRequest) -> Result<Credential, VcError> {
        let achievement = request
            .achievement
            .as_object()
            .ok_or_else(|| VcError::InvalidCredential("achievement must be a JSON object".into()))?;
        let name = achievement
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| VcError::InvalidCredential("achievement has no name".into()))?;

        let mut issuer = self.issuer.clone();
        if let Some(declared) = achievement.get("issuer") {
            if let Some(id) = declared.get("id").and_then(Value::as_str) {
                issuer.id = id.to_string();
            }
            if let Some(n) = declared.get("name").and_then(Value::as_str) {
                issuer.name = n.to_string();
            }
        }

        let mut embedded = Map::new();
        if let Some(id) = achievement.get("id") {
            embedded.insert("id".into(), id.clone());
        }
        embedded.insert("type".into(), json!(["Achievement"]));
        embedded.insert("name".into(), json!(name));
        for field in ["description", "criteria", "image"] {
            if let Some(v) = achievement.get(field) {
                embedded.insert(field.into(), v.clone());
            }
        }
        embedded.insert(
            "issuer".into(),
            json!({"id": issuer.id, "type": ["Profile"], "name": issuer.name}),
        );

        let mut subject = Map::new();
        subject.insert("id".into(), json!(request.recipient_id));
        subject.insert("type".into(), json!(["AchievementSubject"]));
        if let Some(recipient) = &request.recipient_name {
            subject.insert("name".into(), json!(recipient));
        }
        subject.insert("achievement".into(), Value::Object(embedded));

        let id = self.credential_id(request);
        tracing::info!(credential = %id, achievement = name, "created credential");

        Credential::from_value(json!({
            "@context": [CREDENTIALS_V2_CONTEXT, OB_V3P0_CONTEXT],
            "id": id,
            "type": ["VerifiableCredential", "OpenBadgeCredential"],
            "name": name,
            "issuer": issuer.to_value(),
            "validFrom": request.valid_from.to_iso8601(),
            "credentialSubject": Value::Object(subject),
        }))
    }
}
