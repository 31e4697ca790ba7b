//! # Revocation Subcommands
//!
//! `revoke`, `unrevoke`, and `list` over the status registry.
//!
//! Revoking an identity that is already revoked (or unrevoking an active
//! one) is reported as a no-op and leaves the registry and the published
//! list untouched. Unknown identities fail. Every effective change is
//! followed by regenerating the status list.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use credkit_core::Timestamp;
use credkit_status::StatusError;
use credkit_vc::Cryptosuite;

use crate::config::CliConfig;
use crate::status::publish_status_list;

/// Arguments shared by `credkit revoke` and `credkit unrevoke`.
#[derive(Args, Debug)]
pub struct RevokeArgs {
    /// Registry identity (`<wallet>/<achievement>`) or the full credential id.
    pub identity: String,

    /// Private key file used to sign the regenerated status list.
    #[arg(long, short)]
    pub key: Option<PathBuf>,

    /// Cryptosuite for the status list's proof.
    #[arg(long, default_value_t = Cryptosuite::EddsaRdfc2022)]
    pub cryptosuite: Cryptosuite,

    /// Show what would change without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for `credkit list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit JSON instead of a table.
    #[arg(long, short)]
    pub json: bool,
}

/// What a revoke or unrevoke did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The entry changed state.
    Changed,
    /// The entry was already in the requested state.
    Unchanged,
}

/// Strip the configured profile base URL so a full credential id can be
/// given where an identity is expected.
pub fn registry_identity<'a>(config: &CliConfig, input: &'a str) -> &'a str {
    config
        .profile_base_url
        .as_deref()
        .and_then(|base| input.strip_prefix(base))
        .unwrap_or(input)
}

/// Set the revocation state of `identity` to `revoked`.
pub fn set_revoked(config: &CliConfig, identity: &str, revoked: bool) -> Result<Outcome> {
    let now = Timestamp::now();
    let outcome = config.registry_store().update(|r| {
        match r.is_revoked(identity) {
            None => Err(StatusError::UnknownIdentity(identity.to_string())),
            Some(current) if current == revoked => Ok(Outcome::Unchanged),
            Some(_) => {
                if revoked {
                    r.revoke(identity, now);
                } else {
                    r.unrevoke(identity);
                }
                Ok(Outcome::Changed)
            }
        }
    })?;
    Ok(outcome)
}

/// Execute `credkit revoke`.
pub fn run_revoke(args: &RevokeArgs, config: &CliConfig) -> Result<u8> {
    apply(args, config, true)
}

/// Execute `credkit unrevoke`.
pub fn run_unrevoke(args: &RevokeArgs, config: &CliConfig) -> Result<u8> {
    apply(args, config, false)
}

fn apply(args: &RevokeArgs, config: &CliConfig, revoke: bool) -> Result<u8> {
    let identity = registry_identity(config, &args.identity);
    let verb = if revoke { "revoke" } else { "unrevoke" };

    if args.dry_run {
        let registry = config.registry_store().load()?;
        match registry.is_revoked(identity) {
            None => {
                eprintln!("Credential not found: {identity}");
                return Ok(1);
            }
            Some(current) if current == revoke => {
                println!("No change: {identity} is already {}", state_word(current));
            }
            Some(_) => println!("Would {verb}: {identity}"),
        }
        return Ok(0);
    }

    match set_revoked(config, identity, revoke)? {
        Outcome::Unchanged => {
            println!("No change: {identity} is already {}", state_word(revoke));
        }
        Outcome::Changed => {
            println!("{}: {identity}", if revoke { "Revoked" } else { "Unrevoked" });
            let path = publish_status_list(config, args.key.as_deref(), args.cryptosuite)?;
            println!("Status list updated: {}", path.display());
        }
    }
    Ok(0)
}

fn state_word(revoked: bool) -> &'static str {
    if revoked {
        "revoked"
    } else {
        "active"
    }
}

/// Execute `credkit list`.
pub fn run_list(args: &ListArgs, config: &CliConfig) -> Result<u8> {
    let registry = config.registry_store().load()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&registry)?);
        return Ok(0);
    }

    println!(
        "{:<50} {:<8} {:<10} {}",
        "Credential", "Index", "Status", "Revoked at"
    );
    println!("{}", "-".repeat(90));
    for (identity, entry) in registry.entries() {
        let revoked_at = entry
            .revoked_at
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        let status = if entry.revoked { "REVOKED" } else { "Active" };
        println!("{identity:<50} {:<8} {status:<10} {revoked_at}", entry.index);
    }
    let stats = registry.stats();
    println!();
    println!("Total: {} credential(s)", stats.total);
    println!("Revoked: {}", stats.revoked);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn config(dir: &Path) -> CliConfig {
        CliConfig {
            registry_path: dir.join("status-registry.json"),
            status_list_output: dir.join("revocation-list"),
            status_list_size: 16,
            contexts_dir: dir.join("contexts"),
            profile_base_url: Some("https://c.example/profile/".into()),
            ..CliConfig::default()
        }
    }

    fn args(identity: &str, dry_run: bool) -> RevokeArgs {
        RevokeArgs {
            identity: identity.to_string(),
            key: None,
            cryptosuite: Cryptosuite::EddsaJcs2022,
            dry_run,
        }
    }

    fn seed(config: &CliConfig, ids: &[&str]) {
        let now = Timestamp::now();
        config
            .registry_store()
            .update(|r| {
                for id in ids {
                    r.allocate_index(id, now);
                }
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn revoke_publishes_and_second_revoke_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        seed(&config, &["ada/rust"]);

        assert_eq!(run_revoke(&args("ada/rust", false), &config).unwrap(), 0);
        assert!(config.status_list_output.exists());
        let first = config.registry_store().load().unwrap();
        assert_eq!(first.is_revoked("ada/rust"), Some(true));

        std::fs::remove_file(&config.status_list_output).unwrap();
        assert_eq!(set_revoked(&config, "ada/rust", true).unwrap(), Outcome::Unchanged);
        assert_eq!(run_revoke(&args("ada/rust", false), &config).unwrap(), 0);
        assert!(!config.status_list_output.exists());
        assert_eq!(config.registry_store().load().unwrap(), first);
    }

    #[test]
    fn full_credential_id_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        seed(&config, &["ada/rust"]);
        run_revoke(&args("https://c.example/profile/ada/rust", false), &config).unwrap();
        assert_eq!(
            config.registry_store().load().unwrap().is_revoked("ada/rust"),
            Some(true)
        );
    }

    #[test]
    fn unknown_identity_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        assert!(run_revoke(&args("nobody/x", false), &config).is_err());
        assert_eq!(run_revoke(&args("nobody/x", true), &config).unwrap(), 1);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        seed(&config, &["ada/rust"]);
        run_revoke(&args("ada/rust", true), &config).unwrap();
        assert_eq!(
            config.registry_store().load().unwrap().is_revoked("ada/rust"),
            Some(false)
        );
        assert!(!config.status_list_output.exists());
    }

    #[test]
    fn unrevoke_restores_active() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        seed(&config, &["ada/rust"]);
        set_revoked(&config, "ada/rust", true).unwrap();
        assert_eq!(run_unrevoke(&args("ada/rust", false), &config).unwrap(), 0);
        let registry = config.registry_store().load().unwrap();
        assert_eq!(registry.is_revoked("ada/rust"), Some(false));
        assert!(registry.get("ada/rust").unwrap().revoked_at.is_none());
    }

    #[test]
    fn list_runs_on_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(run_list(&ListArgs { json: false }, &config(dir.path())).unwrap(), 0);
    }
}
