//! # Status Subcommand
//!
//! Regenerates the published `BitstringStatusListCredential` from the
//! registry and prints registry statistics.
//!
//! ```bash
//! credkit status update -k keys/key-1-private.json
//! credkit status stats --json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use credkit_core::Timestamp;
use credkit_status::StatusError;
use credkit_vc::{status_list_credential, Cryptosuite};

use crate::config::CliConfig;
use crate::keys::load_signing_key;
use crate::{proof_engine, write_json};

/// Arguments for `credkit status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(subcommand)]
    pub command: StatusCommand,
}

/// Status subcommands.
#[derive(Subcommand, Debug)]
pub enum StatusCommand {
    /// Regenerate the status list credential from the registry.
    Update {
        /// Private key file used to sign the list. Unsigned when omitted.
        #[arg(long, short)]
        key: Option<PathBuf>,
        /// Cryptosuite for the list's proof.
        #[arg(long, default_value_t = Cryptosuite::EddsaRdfc2022)]
        cryptosuite: Cryptosuite,
    },

    /// Show registry statistics.
    Stats {
        /// Emit JSON instead of text.
        #[arg(long, short)]
        json: bool,
    },
}

/// Execute `credkit status`.
pub fn run_status(args: &StatusArgs, config: &CliConfig) -> Result<u8> {
    match &args.command {
        StatusCommand::Update { key, cryptosuite } => {
            let path = publish_status_list(config, key.as_deref(), *cryptosuite)?;
            println!("Status list saved to: {}", path.display());
            Ok(0)
        }
        StatusCommand::Stats { json } => {
            let stats = config.registry_store().load()?.stats();
            if *json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Total credentials: {}", stats.total);
                println!("Revoked: {}", stats.revoked);
                println!("Active: {}", stats.active);
                println!("Next index: {}", stats.next_index);
            }
            Ok(0)
        }
    }
}

/// Reserve the status index for `identity`, refusing indices beyond the
/// configured list capacity. An identity that already has an index keeps it.
pub fn reserve_index(config: &CliConfig, identity: &str, now: Timestamp) -> Result<u64> {
    let capacity = config.status_list().capacity();
    let index = config.registry_store().update(|r| {
        let index = r.index_of(identity).unwrap_or_else(|| r.next_index());
        if index >= capacity {
            return Err(StatusError::IndexOutOfRange { index, capacity });
        }
        Ok(r.allocate_index(identity, now))
    })?;
    Ok(index)
}

/// Rebuild the status list credential from the current registry, sign it
/// when `key` is given, and write it to `status_list_output`.
pub fn publish_status_list(
    config: &CliConfig,
    key: Option<&Path>,
    cryptosuite: Cryptosuite,
) -> Result<PathBuf> {
    let registry = config.registry_store().load()?;
    let mut list = status_list_credential(
        &registry,
        &config.status_list(),
        &config.issuer_id,
        Timestamp::now(),
    )
    .context("failed to build status list credential")?;

    match key {
        Some(key_path) => {
            let (keypair, vm) = load_signing_key(key_path)?;
            let engine = proof_engine(config)?;
            list = engine
                .sign(&list, &keypair, &vm, cryptosuite, Timestamp::now())
                .context("failed to sign status list credential")?;
        }
        None => tracing::warn!("no signing key given, publishing an unsigned status list"),
    }

    write_json(&config.status_list_output, &list.to_value())?;
    tracing::info!(path = %config.status_list_output.display(), "published status list");
    Ok(config.status_list_output.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use credkit_vc::decode_status_list;

    fn config(dir: &Path) -> CliConfig {
        CliConfig {
            registry_path: dir.join("status-registry.json"),
            status_list_output: dir.join("docs/status/revocation-list"),
            status_list_size: 8,
            contexts_dir: dir.join("contexts"),
            ..CliConfig::default()
        }
    }

    #[test]
    fn unsigned_list_reflects_registry() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let now = Timestamp::now();
        config
            .registry_store()
            .update(|r| {
                r.allocate_index("a/x", now);
                r.allocate_index("b/y", now);
                Ok(r.revoke("b/y", now))
            })
            .unwrap();

        let path = publish_status_list(&config, None, Cryptosuite::EddsaJcs2022).unwrap();
        let list = crate::read_json(&path).unwrap();
        assert!(list.get("proof").is_none());
        let bits = decode_status_list(&list).unwrap();
        assert_eq!(bits.as_bytes().len(), 8);
        assert!(!bits.get(0).unwrap());
        assert!(bits.get(1).unwrap());
    }

    #[test]
    fn jcs_signed_list_carries_a_proof() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let keys = credkit_crypto::generate_key_files(&dir.path().join("keys"), &config.issuer_id, "key-1")
            .unwrap();
        let path =
            publish_status_list(&config, Some(&keys.private_path), Cryptosuite::EddsaJcs2022).unwrap();
        let list = crate::read_json(&path).unwrap();
        assert_eq!(list["proof"]["cryptosuite"], "eddsa-jcs-2022");
        assert_eq!(list["proof"]["verificationMethod"], keys.verification_method);
    }

    #[test]
    fn reserve_index_respects_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            status_list_size: 1,
            ..config(dir.path())
        };
        let now = Timestamp::now();
        for i in 0..8 {
            assert_eq!(reserve_index(&config, &format!("w/{i}"), now).unwrap(), i);
        }
        assert_eq!(reserve_index(&config, "w/3", now).unwrap(), 3);
        assert!(reserve_index(&config, "w/8", now).is_err());
        assert!(!config.registry_store().load().unwrap().contains("w/8"));
    }

    #[test]
    fn stats_on_missing_registry_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let args = StatusArgs {
            command: StatusCommand::Stats { json: true },
        };
        assert_eq!(run_status(&args, &config(dir.path())).unwrap(), 0);
    }
}
