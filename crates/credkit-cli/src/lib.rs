//! # credkit-cli: Credential Tooling
//!
//! Provides the `credkit` command-line interface over the library crates.
//!
//! ## Subcommands
//!
//! - `credkit keygen`: Ed25519 Multikey key pair generation.
//! - `credkit issue`: OpenBadgeCredential issuance from an achievement template.
//! - `credkit sign`: Attach a Data Integrity proof to a credential.
//! - `credkit verify`: Signature and revocation verification with a report.
//! - `credkit revoke` / `unrevoke` / `list`: Revocation management.
//! - `credkit status`: Status list regeneration and statistics.
//! - `credkit rename`: Move registry identities without losing their index.
//! - `credkit migrate`: Add status claims to previously issued credentials.
//!
//! ## Crate Policy
//!
//! Handlers return `anyhow::Result<u8>`; the `u8` is the process exit code.
//! Every mutation of the status registry goes through
//! [`credkit_status::RegistryStore::update`], and every effective change is
//! followed by regenerating the published status list.
//!
//! ```bash
//! credkit keygen --issuer did:web:credentials.example.org --out keys
//! credkit issue achievements/rust.json -r mailto:ada@example.com -k keys/key-1-private.json \
//!     --wallet ada --achievement-id rust
//! credkit verify credential.json -k keys/key-1-public.json
//! credkit revoke ada/rust -k keys/key-1-private.json
//! ```

pub mod config;
pub mod fetch;
pub mod issue;
pub mod keys;
pub mod migrate;
pub mod rename;
pub mod revoke;
pub mod sign;
pub mod status;
pub mod verify;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use credkit_core::{Canonicalizers, ContextCache};
use credkit_vc::{Credential, ProofEngine};

use crate::config::CliConfig;
use crate::fetch::HttpDocumentLoader;

/// Build the proof engine: cached contexts from `contexts_dir`, with an
/// HTTP fallback for anything not cached. Fetched contexts are kept for the
/// engine's lifetime.
pub fn proof_engine(config: &CliConfig) -> Result<ProofEngine> {
    let cache = if config.contexts_dir.is_dir() {
        ContextCache::from_dir(&config.contexts_dir).with_context(|| {
            format!("failed to load contexts from {}", config.contexts_dir.display())
        })?
    } else {
        tracing::debug!(dir = %config.contexts_dir.display(), "contexts directory not found");
        ContextCache::new()
    };
    let fallback = HttpDocumentLoader::new(config.fetch_timeout())
        .context("failed to build HTTP client")?;
    let cache = cache.with_fallback(Arc::new(fallback));
    Ok(ProofEngine::new(Canonicalizers::with_rdf(Arc::new(cache))))
}

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Read a credential file, validating its envelope.
pub fn read_credential(path: &Path) -> Result<Credential> {
    let value = read_json(path)?;
    Credential::from_value(value).with_context(|| format!("invalid credential: {}", path.display()))
}

/// Write `value` as pretty JSON with a trailing newline, creating parent
/// directories.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    std::fs::write(path, out).with_context(|| format!("failed to write {}", path.display()))
}
