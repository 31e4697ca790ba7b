//! # Keygen Subcommand and Key Files
//!
//! `credkit keygen` writes `<key-id>-public.json` and `<key-id>-private.json`
//! Multikey documents. The loaders here turn those files back into signing
//! keys and verification-method resolvers for the other subcommands.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use credkit_crypto::{generate_key_files, Ed25519KeyPair, MultikeyDocument};
use credkit_vc::StaticKeyResolver;

use crate::config::CliConfig;

/// Arguments for `credkit keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Output directory for the key files.
    #[arg(long, short, default_value = "keys")]
    pub out: PathBuf,

    /// Key identifier, the fragment of the verification method id.
    #[arg(long, default_value = "key-1")]
    pub key_id: String,

    /// Controller of the key. Defaults to the configured issuer id.
    #[arg(long)]
    pub issuer: Option<String>,

    /// Replace existing key files.
    #[arg(long)]
    pub force: bool,
}

/// Execute `credkit keygen`.
pub fn run_keygen(args: &KeygenArgs, config: &CliConfig) -> Result<u8> {
    let issuer = args.issuer.as_deref().unwrap_or(&config.issuer_id);
    let private = args.out.join(format!("{}-private.json", args.key_id));
    if private.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to replace it",
            private.display()
        );
    }

    let keys = generate_key_files(&args.out, issuer, &args.key_id)
        .with_context(|| format!("failed to write keys to {}", args.out.display()))?;

    println!("Generated Ed25519 key pair:");
    println!("  verification method: {}", keys.verification_method);
    println!("  public key:          {}", keys.public_key.to_multibase());
    println!("  public file:         {}", keys.public_path.display());
    println!("  private file:        {}", keys.private_path.display());
    println!();
    println!("Keep the private file secret. Publish the public key in the issuer's DID document.");
    Ok(0)
}

/// Load a private key file: the key pair and its verification method id.
pub fn load_signing_key(path: &Path) -> Result<(Ed25519KeyPair, String)> {
    let doc = MultikeyDocument::load(path)
        .with_context(|| format!("failed to load key file {}", path.display()))?;
    let keypair = doc
        .keypair()
        .with_context(|| format!("{} is not a usable private key", path.display()))?;
    tracing::debug!(verification_method = %doc.id, "loaded signing key");
    Ok((keypair, doc.id))
}

/// Build a resolver from a public key file, or from every `*-public.json`
/// in a directory.
pub fn load_key_resolver(path: &Path) -> Result<StaticKeyResolver> {
    let mut resolver = StaticKeyResolver::new();
    if path.is_dir() {
        let mut files: Vec<PathBuf> = std::fs::read_dir(path)
            .with_context(|| format!("failed to read {}", path.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with("-public.json"))
            })
            .collect();
        files.sort();
        for file in files {
            add_public_key(&mut resolver, &file)?;
        }
        if resolver.is_empty() {
            bail!("no *-public.json key files in {}", path.display());
        }
    } else {
        add_public_key(&mut resolver, path)?;
    }
    Ok(resolver)
}

fn add_public_key(resolver: &mut StaticKeyResolver, path: &Path) -> Result<()> {
    let doc = MultikeyDocument::load(path)
        .with_context(|| format!("failed to load key file {}", path.display()))?;
    let key = doc
        .public_key()
        .with_context(|| format!("{} has an invalid public key", path.display()))?;
    tracing::debug!(verification_method = %doc.id, file = %path.display(), "loaded public key");
    resolver.insert(doc.id, key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use credkit_vc::KeyResolver;

    fn keygen(dir: &Path, key_id: &str, force: bool) -> Result<u8> {
        let args = KeygenArgs {
            out: dir.to_path_buf(),
            key_id: key_id.to_string(),
            issuer: Some("did:web:issuer.example".into()),
            force,
        };
        run_keygen(&args, &CliConfig::default())
    }

    #[test]
    fn keygen_then_load_both_halves() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(keygen(dir.path(), "key-1", false).unwrap(), 0);

        let (keypair, vm) = load_signing_key(&dir.path().join("key-1-private.json")).unwrap();
        assert_eq!(vm, "did:web:issuer.example#key-1");

        let resolver = load_key_resolver(&dir.path().join("key-1-public.json")).unwrap();
        assert_eq!(resolver.resolve(&vm).unwrap(), keypair.public_key());
    }

    #[test]
    fn keygen_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        keygen(dir.path(), "key-1", false).unwrap();
        assert!(keygen(dir.path(), "key-1", false).is_err());
        assert!(keygen(dir.path(), "key-1", true).is_ok());
    }

    #[test]
    fn directory_resolver_collects_every_public_key() {
        let dir = tempfile::tempdir().unwrap();
        keygen(dir.path(), "key-1", false).unwrap();
        keygen(dir.path(), "key-2", false).unwrap();
        let resolver = load_key_resolver(dir.path()).unwrap();
        assert_eq!(resolver.len(), 2);
        assert!(resolver.resolve("did:web:issuer.example#key-2").is_ok());
    }

    #[test]
    fn empty_key_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_key_resolver(dir.path()).is_err());
    }

    #[test]
    fn public_file_is_not_a_signing_key() {
        let dir = tempfile::tempdir().unwrap();
        keygen(dir.path(), "key-1", false).unwrap();
        assert!(load_signing_key(&dir.path().join("key-1-public.json")).is_err());
    }
}
