//! # Multikey Key Files
//!
//! Keys are stored as Multikey JSON documents:
//!
//! ```json
//! {
//!   "id": "https://issuer.example/#key-1",
//!   "type": "Multikey",
//!   "controller": "https://issuer.example/",
//!   "publicKeyMultibase": "z6Mk...",
//!   "secretKeyMultibase": "z3u2..."
//! }
//! ```
//!
//! `secretKeyMultibase` is present only in private key files, which are
//! written with owner-only permissions on Unix.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ed25519::{Ed25519KeyPair, Ed25519PublicKey};
use crate::error::CryptoError;

/// The `type` of every key document.
pub const MULTIKEY_TYPE: &str = "Multikey";

/// A Multikey verification method document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultikeyDocument {
    /// Verification method id, `<controller>#<key-id>`.
    pub id: String,
    /// Always `Multikey`.
    #[serde(rename = "type")]
    pub key_type: String,
    /// The issuer that controls the key.
    pub controller: String,
    /// Public key token.
    pub public_key_multibase: String,
    /// Private seed token, private key files only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key_multibase: Option<String>,
}

impl MultikeyDocument {
    /// A public key document.
    pub fn public(id: impl Into<String>, controller: impl Into<String>, key: &Ed25519PublicKey) -> Self {
        Self {
            id: id.into(),
            key_type: MULTIKEY_TYPE.to_string(),
            controller: controller.into(),
            public_key_multibase: key.to_multibase(),
            secret_key_multibase: None,
        }
    }

    /// A private key document carrying both halves of `keypair`.
    pub fn private(id: impl Into<String>, controller: impl Into<String>, keypair: &Ed25519KeyPair) -> Self {
        Self {
            secret_key_multibase: Some(keypair.secret_multibase()),
            ..Self::public(id, controller, &keypair.public_key())
        }
    }

    /// Decode the public key.
    pub fn public_key(&self) -> Result<Ed25519PublicKey, CryptoError> {
        self.check_type()?;
        Ed25519PublicKey::from_multibase(&self.public_key_multibase)
    }

    /// Decode the keypair. The embedded public key must match the seed.
    pub fn keypair(&self) -> Result<Ed25519KeyPair, CryptoError> {
        self.check_type()?;
        let secret = self.secret_key_multibase.as_deref().ok_or_else(|| {
            CryptoError::InvalidKeyFormat(format!("{} has no secretKeyMultibase", self.id))
        })?;
        let keypair = Ed25519KeyPair::from_multibase(secret)?;
        if keypair.public_key() != self.public_key()? {
            return Err(CryptoError::InvalidKeyFormat(format!(
                "{}: publicKeyMultibase does not match the private seed",
                self.id
            )));
        }
        Ok(keypair)
    }

    fn check_type(&self) -> Result<(), CryptoError> {
        if self.key_type != MULTIKEY_TYPE {
            return Err(CryptoError::InvalidKeyFormat(format!(
                "key document type is {:?}, expected {MULTIKEY_TYPE:?}",
                self.key_type
            )));
        }
        Ok(())
    }

    /// Read a key document from disk.
    pub fn load(path: &Path) -> Result<Self, CryptoError> {
        let raw = fs::read_to_string(path).map_err(|e| key_file_error(path, e))?;
        serde_json::from_str(&raw).map_err(|e| key_file_error(path, e))
    }

    /// Write the document as pretty JSON. Documents with a secret are
    /// created with mode `0600` on Unix.
    pub fn save(&self, path: &Path) -> Result<(), CryptoError> {
        let mut body = serde_json::to_string_pretty(self).map_err(|e| key_file_error(path, e))?;
        body.push('\n');

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            if self.secret_key_multibase.is_some() {
                options.mode(0o600);
            }
        }
        let mut file = options.open(path).map_err(|e| key_file_error(path, e))?;
        file.write_all(body.as_bytes()).map_err(|e| key_file_error(path, e))?;

        // An existing file keeps its old mode on truncate.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if self.secret_key_multibase.is_some() {
                fs::set_permissions(path, fs::Permissions::from_mode(0o600))
                    .map_err(|e| key_file_error(path, e))?;
            }
        }
        Ok(())
    }
}

fn key_file_error(path: &Path, e: impl std::fmt::Display) -> CryptoError {
    CryptoError::KeyFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

/// Paths and identifiers produced by [`generate_key_files`].
#[derive(Debug, Clone)]
pub struct GeneratedKeys {
    /// Verification method id, `<issuer>#<key-id>`.
    pub verification_method: String,
    /// `<key-id>-public.json`.
    pub public_path: PathBuf,
    /// `<key-id>-private.json`.
    pub private_path: PathBuf,
    /// The generated public key.
    pub public_key: Ed25519PublicKey,
}

/// Generate a fresh keypair and write `<key-id>-public.json` and
/// `<key-id>-private.json` into `dir`.
pub fn generate_key_files(dir: &Path, issuer: &str, key_id: &str) -> Result<GeneratedKeys, CryptoError> {
    fs::create_dir_all(dir)?;
    let keypair = Ed25519KeyPair::generate();
    let verification_method = format!("{issuer}#{key_id}");

    let public_path = dir.join(format!("{key_id}-public.json"));
    let private_path = dir.join(format!("{key_id}-private.json"));
    MultikeyDocument::public(&verification_method, issuer, &keypair.public_key()).save(&public_path)?;
    MultikeyDocument::private(&verification_method, issuer, &keypair).save(&private_path)?;

    tracing::info!(
        verification_method = %verification_method,
        public = %public_path.display(),
        "generated Ed25519 key pair"
    );
    Ok(GeneratedKeys {
        verification_method,
        public_path,
        private_path,
        public_key: keypair.public_key(),
    })
}
