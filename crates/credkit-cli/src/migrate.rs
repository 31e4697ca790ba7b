//! # Migrate Subcommand
//!
//! Adds `credentialStatus` to credentials issued before revocation support.
//! Credentials are found at `<profiles>/<wallet>/<achievement>/credential.json`;
//! each one without a status claim gets an index reserved for
//! `<wallet>/<achievement>`, loses its old proof, and is re-signed in place.
//! The status list is regenerated once at the end.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use credkit_core::Timestamp;
use credkit_vc::Cryptosuite;

use crate::config::CliConfig;
use crate::keys::load_signing_key;
use crate::status::{publish_status_list, reserve_index};
use crate::{proof_engine, read_credential, write_json};

/// Arguments for `credkit migrate`.
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Directory holding `<wallet>/<achievement>/credential.json` files.
    #[arg(long, default_value = "docs/profile")]
    pub profiles: PathBuf,

    /// Private key file used to re-sign credentials and the status list.
    #[arg(long, short)]
    pub key: PathBuf,

    /// Cryptosuite for the new proofs.
    #[arg(long, default_value_t = Cryptosuite::EddsaRdfc2022)]
    pub cryptosuite: Cryptosuite,

    /// List what would be migrated without changing anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Counts from one migration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    /// Credentials given a status claim.
    pub migrated: usize,
    /// Credentials that already had one.
    pub skipped: usize,
}

/// Every `credential.json` exactly two levels below `root`, sorted.
pub fn find_credentials(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let read = |dir: &Path| -> Result<Vec<PathBuf>> {
        let mut dirs: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read {}", dir.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();
        Ok(dirs)
    };
    for wallet in read(root)? {
        for achievement in read(&wallet)? {
            let file = achievement.join("credential.json");
            if file.is_file() {
                found.push(file);
            }
        }
    }
    Ok(found)
}

/// `<wallet>/<achievement>` from a `.../<wallet>/<achievement>/credential.json` path.
fn identity_for(path: &Path) -> Option<String> {
    let achievement_dir = path.parent()?;
    let achievement = achievement_dir.file_name()?.to_str()?;
    let wallet = achievement_dir.parent()?.file_name()?.to_str()?;
    Some(format!("{wallet}/{achievement}"))
}

/// Migrate every credential under `args.profiles`.
pub fn migrate(args: &MigrateArgs, config: &CliConfig) -> Result<MigrationSummary> {
    let files = find_credentials(&args.profiles)?;
    println!("Found {} credential(s)", files.len());

    let signer = if args.dry_run {
        None
    } else {
        let (keypair, vm) = load_signing_key(&args.key)?;
        Some((keypair, vm, proof_engine(config)?))
    };

    let now = Timestamp::now();
    let mut summary = MigrationSummary::default();
    for file in files {
        let mut credential = read_credential(&file)?;
        if credential.credential_status_value().is_some() {
            println!("  Skipping (already has status): {}", file.display());
            summary.skipped += 1;
            continue;
        }
        let identity = identity_for(&file)
            .with_context(|| format!("cannot derive identity from {}", file.display()))?;
        println!("  Migrating: {identity}");
        summary.migrated += 1;

        let Some((keypair, vm, engine)) = &signer else {
            continue;
        };
        let index = reserve_index(config, &identity, now)?;
        credential.take_proof();
        credential.set_credential_status(&config.status_list().entry(index))?;
        let signed = engine
            .sign(&credential, keypair, vm, args.cryptosuite, now)
            .with_context(|| format!("failed to re-sign {}", file.display()))?;
        write_json(&file, &signed.to_value())?;
        tracing::info!(identity = %identity, index, "migrated credential");
    }
    Ok(summary)
}

/// Execute `credkit migrate`.
pub fn run_migrate(args: &MigrateArgs, config: &CliConfig) -> Result<u8> {
    if args.dry_run {
        println!("DRY RUN - no changes will be made");
    }
    let summary = migrate(args, config)?;
    println!();
    println!("Migration complete:");
    println!("  Migrated: {}", summary.migrated);
    println!("  Skipped:  {}", summary.skipped);

    if !args.dry_run && summary.migrated > 0 {
        let path = publish_status_list(config, Some(&args.key), args.cryptosuite)?;
        println!("Status list saved to: {}", path.display());
    }
    Ok(0)
}
