//! # CLI Configuration
//!
//! `credkit` reads an optional YAML file into [`CliConfig`]. The file is
//! taken from `--config`, else `credkit.yaml` in the working directory when
//! present, else every field takes its default.
//!
//! ```yaml
//! issuer_id: did:web:credentials.example.org
//! issuer_name: Example Academy
//! status_list_url: https://credentials.example.org/status/revocation-list
//! profile_base_url: https://credentials.example.org/profile/
//! registry_path: status-registry.json
//! ```
//!
//! Unknown keys are rejected.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use credkit_status::{RegistryStore, DEFAULT_LIST_SIZE, DEFAULT_STALE_LOCK_AGE};
use credkit_vc::{IssuerProfile, StatusListConfig};

/// File consulted when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "credkit.yaml";

/// Settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Issuer id (URL or DID) placed in issued credentials and the status list.
    pub issuer_id: String,
    /// Issuer display name.
    pub issuer_name: String,
    /// Issuer homepage.
    pub issuer_url: Option<String>,
    /// Issuer logo URL.
    pub issuer_image: Option<String>,
    /// Public URL of the status list credential.
    pub status_list_url: String,
    /// Status list size in bytes.
    pub status_list_size: usize,
    /// Status registry file.
    pub registry_path: PathBuf,
    /// Where the regenerated status list credential is written.
    pub status_list_output: PathBuf,
    /// Directory of cached JSON-LD context documents.
    pub contexts_dir: PathBuf,
    /// Timeout for status list and context fetches.
    pub fetch_timeout_secs: u64,
    /// How long to wait for the registry lock.
    pub lock_timeout_secs: u64,
    /// Age after which a registry lock left by another process is removed.
    pub stale_lock_secs: u64,
    /// Prefix of credential ids derived from registry identities.
    pub profile_base_url: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            issuer_id: "did:web:credentials.example.org".to_string(),
            issuer_name: "Example Issuer".to_string(),
            issuer_url: None,
            issuer_image: None,
            status_list_url: "https://credentials.example.org/status/revocation-list".to_string(),
            status_list_size: DEFAULT_LIST_SIZE,
            registry_path: PathBuf::from("status-registry.json"),
            status_list_output: PathBuf::from("docs/status/revocation-list"),
            contexts_dir: PathBuf::from("contexts"),
            fetch_timeout_secs: 10,
            lock_timeout_secs: 10,
            stale_lock_secs: DEFAULT_STALE_LOCK_AGE.as_secs(),
            profile_base_url: None,
        }
    }
}

impl CliConfig {
    /// Load `explicit`, else [`DEFAULT_CONFIG_FILE`] if it exists, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::load(default)
                } else {
                    tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("invalid config: {}", path.display()))?;
        anyhow::ensure!(
            config.status_list_size > 0,
            "status_list_size must be greater than zero"
        );
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// The configured issuer profile.
    pub fn issuer_profile(&self) -> IssuerProfile {
        let mut profile = IssuerProfile::new(&self.issuer_id, &self.issuer_name);
        profile.url = self.issuer_url.clone();
        profile.image = self.issuer_image.clone();
        profile
    }

    /// Where the status list lives and how large it is.
    pub fn status_list(&self) -> StatusListConfig {
        StatusListConfig::new(&self.status_list_url).with_size(self.status_list_size)
    }

    /// The lock-guarded registry file.
    pub fn registry_store(&self) -> RegistryStore {
        RegistryStore::new(self.registry_path.clone())
            .with_lock_timeout(Duration::from_secs(self.lock_timeout_secs))
            .with_stale_lock_age(Duration::from_secs(self.stale_lock_secs))
    }

    /// Network timeout for fetches.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = CliConfig::default();
        assert_eq!(c.status_list_size, 16_384);
        assert_eq!(c.status_list().capacity(), 131_072);
        assert_eq!(c.registry_path, PathBuf::from("status-registry.json"));
        assert_eq!(c.status_list_output, PathBuf::from("docs/status/revocation-list"));
        assert_eq!(c.fetch_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credkit.yaml");
        std::fs::write(
            &path,
            "issuer_name: Academy\nprofile_base_url: https://c.example/profile/\n",
        )
        .unwrap();
        let c = CliConfig::load(&path).unwrap();
        assert_eq!(c.issuer_name, "Academy");
        assert_eq!(c.profile_base_url.as_deref(), Some("https://c.example/profile/"));
        assert_eq!(c.lock_timeout_secs, 10);
        assert_eq!(c.stale_lock_secs, 600);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credkit.yaml");
        std::fs::write(&path, "issuer_nmae: typo\n").unwrap();
        assert!(CliConfig::load(&path).is_err());
    }

    #[test]
    fn zero_list_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credkit.yaml");
        std::fs::write(&path, "status_list_size: 0\n").unwrap();
        assert!(CliConfig::load(&path).is_err());
    }

    #[test]
    fn issuer_profile_carries_optional_fields() {
        let c = CliConfig {
            issuer_url: Some("https://example.org".into()),
            ..CliConfig::default()
        };
        let p = c.issuer_profile();
        assert_eq!(p.url.as_deref(), Some("https://example.org"));
        assert!(p.image.is_none());
    }
}
