//! # Issue, sign, revoke, verify
//!
//! Cross-crate scenarios: credentials are issued with a status claim from a
//! file-backed registry, signed under both cryptosuites, revoked, and
//! verified against the registry and against a published status list.

use std::sync::Arc;

use credkit_core::{Canonicalizers, ContextCache, Timestamp, CREDENTIALS_V2_CONTEXT, OB_V3P0_CONTEXT};
use credkit_crypto::{generate_key_files, Ed25519KeyPair, MultikeyDocument};
use credkit_status::RegistryStore;
use credkit_vc::{
    status_list_credential, Credential, CredentialIssuer, Cryptosuite, IssueRequest, IssuerProfile,
    ProofEngine, ProofError, StaticKeyResolver, StatusListConfig, StatusListFetcher, VcError,
    VerificationStatus, Verifier,
};
use proptest::prelude::*;
use serde_json::{json, Value};

const PROFILE: &str = "https://creds.example/profile/";
const LIST_URL: &str = "https://creds.example/status/revocation-list";
const VM: &str = "https://creds.example/issuer#key-1";

fn ts(s: &str) -> Timestamp {
    Timestamp::parse(s).unwrap()
}

/// A reduced credentials context covering the terms these tests use.
fn credentials_context() -> Value {
    let cred = "https://www.w3.org/2018/credentials#";
    let sec = "https://w3id.org/security#";
    json!({
        "@context": {
            "id": "@id",
            "type": "@type",
            "VerifiableCredential": format!("{cred}VerifiableCredential"),
            "OpenBadgeCredential": "https://purl.imsglobal.org/spec/vc/ob/vocab.html#OpenBadgeCredential",
            "issuer": {"@id": format!("{cred}issuer"), "@type": "@id"},
            "validFrom": {"@id": format!("{cred}validFrom"), "@type": "http://www.w3.org/2001/XMLSchema#dateTime"},
            "credentialSubject": {"@id": format!("{cred}credentialSubject"), "@type": "@id"},
            "credentialStatus": {"@id": format!("{cred}credentialStatus"), "@type": "@id"},
            "name": "https://schema.org/name",
            "DataIntegrityProof": format!("{sec}DataIntegrityProof"),
            "cryptosuite": format!("{sec}cryptosuite"),
            "verificationMethod": {"@id": format!("{sec}verificationMethod"), "@type": "@id"},
            "created": {"@id": "http://purl.org/dc/terms/created", "@type": "http://www.w3.org/2001/XMLSchema#dateTime"},
            "proofPurpose": {"@id": format!("{sec}proofPurpose"), "@type": "@vocab"},
            "assertionMethod": {"@id": format!("{sec}assertionMethod"), "@type": "@id"},
            "BitstringStatusListEntry": "https://www.w3.org/ns/credentials/status#BitstringStatusListEntry",
            "statusPurpose": "https://www.w3.org/ns/credentials/status#statusPurpose",
            "statusListIndex": "https://www.w3.org/ns/credentials/status#statusListIndex",
            "statusListCredential": {"@id": "https://www.w3.org/ns/credentials/status#statusListCredential", "@type": "@id"}
        }
    })
}

fn open_badges_context() -> Value {
    json!({
        "@context": {
            "AchievementSubject": "https://purl.imsglobal.org/spec/vc/ob/vocab.html#AchievementSubject",
            "Achievement": "https://purl.imsglobal.org/spec/vc/ob/vocab.html#Achievement",
            "Profile": "https://purl.imsglobal.org/spec/vc/ob/vocab.html#Profile",
            "achievement": {"@id": "https://purl.imsglobal.org/spec/vc/ob/vocab.html#achievement", "@type": "@id"},
            "description": "https://schema.org/description",
            "url": {"@id": "https://schema.org/url", "@type": "@id"}
        }
    })
}

fn rdf_engine() -> ProofEngine {
    let cache = ContextCache::new()
        .with_document(CREDENTIALS_V2_CONTEXT, credentials_context())
        .with_document(OB_V3P0_CONTEXT, open_badges_context());
    ProofEngine::new(Canonicalizers::with_rdf(Arc::new(cache)))
}

fn issue(store: &RegistryStore, identity: &str) -> Credential {
    let config = StatusListConfig::new(LIST_URL);
    let issuer = CredentialIssuer::new(IssuerProfile::new("https://creds.example/issuer", "Example Org"))
        .with_profile_base_url(PROFILE);
    let now = ts("2025-05-01T00:00:00Z");
    let mut credential = issuer
        .create(&IssueRequest {
            achievement: json!({"id": "https://creds.example/a/rust", "name": "Rust", "description": "Rust track"}),
            recipient_id: format!("mailto:{}@example.com", identity.replace('/', ".")),
            recipient_name: None,
            credential_id: None,
            identity: Some(identity.to_string()),
            valid_from: now,
        })
        .unwrap();
    let index = store.update(|r| Ok(r.allocate_index(identity, now))).unwrap();
    credential.set_credential_status(&config.entry(index)).unwrap();
    credential
}

#[test]
fn rdfc_sign_verify_and_proof_has_no_context() {
    let engine = rdf_engine();
    let dir = tempfile::tempdir().unwrap();
    let store = RegistryStore::new(dir.path().join("status-registry.json"));
    let kp = Ed25519KeyPair::from_seed(&[11u8; 32]);

    let credential = issue(&store, "ada/rust");
    let signed = engine
        .sign(&credential, &kp, VM, Cryptosuite::EddsaRdfc2022, ts("2025-05-01T00:00:00Z"))
        .unwrap();
    assert!(signed.proof().unwrap().get("@context").is_none());
    assert_eq!(signed.proof().unwrap()["cryptosuite"], "eddsa-rdfc-2022");

    engine.verify(&signed, &kp.public_key()).unwrap();

    let mut v = signed.to_value();
    v["credentialSubject"]["achievement"]["name"] = json!("Go");
    let tampered = Credential::from_value(v).unwrap();
    assert!(matches!(
        engine.verify(&tampered, &kp.public_key()),
        Err(ProofError::SignatureInvalid(_))
    ));
}

#[test]
fn jcs_signature_does_not_verify_as_rdfc() {
    let engine = rdf_engine();
    let dir = tempfile::tempdir().unwrap();
    let store = RegistryStore::new(dir.path().join("reg.json"));
    let kp = Ed25519KeyPair::from_seed(&[12u8; 32]);
    let signed = engine
        .sign(&issue(&store, "w/x"), &kp, VM, Cryptosuite::EddsaJcs2022, ts("2025-05-01T00:00:00Z"))
        .unwrap();

    let mut v = signed.to_value();
    v["proof"]["cryptosuite"] = json!("eddsa-rdfc-2022");
    let relabeled = Credential::from_value(v).unwrap();
    assert!(engine.verify(&relabeled, &kp.public_key()).is_err());
}

#[test]
fn revocation_lifecycle_against_registry_and_published_list() {
    let engine = rdf_engine();
    let dir = tempfile::tempdir().unwrap();
    let store = RegistryStore::new(dir.path().join("status-registry.json"));
    let keys = generate_key_files(&dir.path().join("keys"), "https://creds.example/issuer", "key-1").unwrap();
    let keypair = MultikeyDocument::load(&keys.private_path).unwrap().keypair().unwrap();
    let mut resolver = StaticKeyResolver::new();
    resolver.insert(
        keys.verification_method.clone(),
        MultikeyDocument::load(&keys.public_path).unwrap().public_key().unwrap(),
    );

    let created = ts("2025-05-02T00:00:00Z");
    let first = engine
        .sign(&issue(&store, "ada/rust"), &keypair, &keys.verification_method, Cryptosuite::EddsaRdfc2022, created)
        .unwrap()
        .to_value();
    let second = engine
        .sign(&issue(&store, "bob/rust"), &keypair, &keys.verification_method, Cryptosuite::EddsaJcs2022, created)
        .unwrap()
        .to_value();
    assert_eq!(first["credentialStatus"]["statusListIndex"], "0");
    assert_eq!(second["credentialStatus"]["statusListIndex"], "1");

    assert!(store.update(|r| Ok(r.revoke("bob/rust", created))).unwrap());
    let registry = store.load().unwrap();

    let local = Verifier::new(&engine)
        .with_registry(&registry)
        .with_profile_base_url(PROFILE);
    assert_eq!(local.verify(&first, &resolver).status, VerificationStatus::Verified);
    assert_eq!(local.verify(&second, &resolver).status, VerificationStatus::Revoked);

    // A verifier without the registry learns the same from the published list.
    let list = status_list_credential(&registry, &StatusListConfig::new(LIST_URL), "https://creds.example/issuer", created)
        .unwrap();
    let published = engine
        .sign(&list, &keypair, &keys.verification_method, Cryptosuite::EddsaJcs2022, created)
        .unwrap();
    assert!(engine.verify(&published, &keypair.public_key()).is_ok());

    struct Published(Value);
    impl StatusListFetcher for Published {
        fn fetch(&self, url: &str) -> Result<Value, VcError> {
            assert_eq!(url, LIST_URL);
            Ok(self.0.clone())
        }
    }
    let fetcher = Published(published.to_value());
    let remote = Verifier::new(&engine).with_fetcher(&fetcher);
    assert_eq!(remote.verify(&first, &resolver).status, VerificationStatus::Verified);
    assert_eq!(remote.verify(&second, &resolver).status, VerificationStatus::Revoked);

    // Unrevoking restores a verified verdict.
    assert!(store.update(|r| Ok(r.unrevoke("bob/rust"))).unwrap());
    let registry = store.load().unwrap();
    let local = Verifier::new(&engine)
        .with_registry(&registry)
        .with_profile_base_url(PROFILE);
    assert!(local.verify(&second, &resolver).is_verified());
}

fn arb_subject() -> impl Strategy<Value = Value> {
    (
        "[a-z]{1,10}",
        prop::collection::btree_map("[a-zA-Z]{1,8}", "[ -~]{0,16}", 0..6),
        any::<i32>(),
    )
        .prop_map(|(id, claims, n)| {
            let mut subject = serde_json::Map::new();
            subject.insert("id".into(), json!(format!("did:example:{id}")));
            subject.insert("n".into(), json!(n));
            for (k, v) in claims {
                subject.entry(k).or_insert(json!(v));
            }
            Value::Object(subject)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn jcs_sign_verify_roundtrip(subject in arb_subject(), seed in any::<[u8; 32]>()) {
        let engine = ProofEngine::default();
        let kp = Ed25519KeyPair::from_seed(&seed);
        let credential = Credential::from_value(json!({
            "@context": [CREDENTIALS_V2_CONTEXT],
            "id": "urn:uuid:00000000-0000-4000-8000-000000000000",
            "type": ["VerifiableCredential"],
            "issuer": "did:example:issuer",
            "validFrom": "2025-01-01T00:00:00Z",
            "credentialSubject": subject
        })).unwrap();
        let signed = engine
            .sign(&credential, &kp, "did:example:issuer#k", Cryptosuite::EddsaJcs2022, ts("2025-01-01T00:00:00Z"))
            .unwrap();
        prop_assert!(engine.verify(&signed, &kp.public_key()).is_ok());

        let mut v = signed.to_value();
        v["credentialSubject"]["n"] = json!(subject["n"].as_i64().unwrap_or(0) + 1);
        let tampered = Credential::from_value(v).unwrap();
        prop_assert!(
            matches!(engine.verify(&tampered, &kp.public_key()), Err(ProofError::SignatureInvalid(_))),
            "tampered credential verified"
        );
    }
}
