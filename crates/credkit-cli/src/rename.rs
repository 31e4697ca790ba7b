//! # Rename Subcommand
//!
//! Moves registry entries to new identities, keeping their index and
//! revocation state. With `--prefix`, every identity under the old prefix
//! moves (a wallet rename). Bit positions do not change, so the published
//! list stays valid and is not regenerated.

use anyhow::Result;
use clap::Args;

use crate::config::CliConfig;

/// Arguments for `credkit rename`.
#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Current identity, or prefix with `--prefix`.
    pub from: String,

    /// New identity, or prefix with `--prefix`.
    pub to: String,

    /// Treat `from` and `to` as identity prefixes (e.g. `old-wallet/`).
    #[arg(long)]
    pub prefix: bool,

    /// Show what would change without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute `credkit rename`.
pub fn run_rename(args: &RenameArgs, config: &CliConfig) -> Result<u8> {
    let store = config.registry_store();

    if args.dry_run {
        let registry = store.load()?;
        let affected: Vec<&str> = registry
            .entries()
            .map(|(id, _)| id)
            .filter(|id| {
                if args.prefix {
                    id.starts_with(&args.from)
                } else {
                    *id == args.from
                }
            })
            .collect();
        if affected.is_empty() {
            println!("Nothing to rename for {}", args.from);
        }
        for id in affected {
            let target = format!("{}{}", args.to, &id[args.from.len()..]);
            let note = if registry.contains(&target) && target != id {
                " (conflict: target exists)"
            } else {
                ""
            };
            println!("Would rename: {id} -> {target}{note}");
        }
        return Ok(0);
    }

    if args.prefix {
        let moved = store.update(|r| Ok(r.rename_all_with_prefix(&args.from, &args.to)))?;
        println!("Renamed {moved} registry entries from {} to {}", args.from, args.to);
    } else {
        store.update(|r| r.rename_identity(&args.from, &args.to))?;
        println!("Renamed: {} -> {}", args.from, args.to);
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use credkit_core::Timestamp;
    use std::path::Path;

    fn config(dir: &Path) -> CliConfig {
        let config = CliConfig {
            registry_path: dir.join("status-registry.json"),
            ..CliConfig::default()
        };
        let now = Timestamp::now();
        config
            .registry_store()
            .update(|r| {
                for id in ["a/x", "a/y", "b/z"] {
                    r.allocate_index(id, now);
                }
                Ok(r.revoke("a/y", now))
            })
            .unwrap();
        config
    }

    fn args(from: &str, to: &str, prefix: bool, dry_run: bool) -> RenameArgs {
        RenameArgs {
            from: from.into(),
            to: to.into(),
            prefix,
            dry_run,
        }
    }

    #[test]
    fn prefix_rename_keeps_indices_and_state() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        run_rename(&args("a/", "c/", true, false), &config).unwrap();
        let r = config.registry_store().load().unwrap();
        assert_eq!(r.index_of("c/x"), Some(0));
        assert_eq!(r.index_of("c/y"), Some(1));
        assert_eq!(r.is_revoked("c/y"), Some(true));
        assert_eq!(r.index_of("b/z"), Some(2));
        assert!(!r.contains("a/x"));
    }

    #[test]
    fn single_rename_conflict_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let before = std::fs::read(&config.registry_path).unwrap();
        assert!(run_rename(&args("a/x", "b/z", false, false), &config).is_err());
        assert_eq!(std::fs::read(&config.registry_path).unwrap(), before);
    }

    #[test]
    fn dry_run_leaves_registry_alone() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        run_rename(&args("a/", "c/", true, true), &config).unwrap();
        assert!(config.registry_store().load().unwrap().contains("a/x"));
    }
}
