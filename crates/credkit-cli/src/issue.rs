//! # Issue Subcommand
//!
//! Builds an OpenBadgeCredential from an achievement template, optionally
//! reserves a status index for `<wallet>/<achievement>`, and signs it.
//!
//! ```bash
//! credkit issue achievements/rust.json -r mailto:ada@example.com \
//!     --recipient-name "Ada" -k keys/key-1-private.json --wallet ada -o ada-rust.json
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use credkit_core::Timestamp;
use credkit_vc::{Credential, CredentialIssuer, Cryptosuite, IssueRequest};

use crate::config::CliConfig;
use crate::keys::load_signing_key;
use crate::status::reserve_index;
use crate::{proof_engine, read_json, write_json};

/// Arguments for `credkit issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Achievement definition JSON file.
    pub achievement: PathBuf,

    /// Recipient identifier (DID, `mailto:` URI, or URL).
    #[arg(long, short)]
    pub recipient: String,

    /// Recipient display name.
    #[arg(long)]
    pub recipient_name: Option<String>,

    /// Private key file. Required unless `--unsigned`.
    #[arg(long, short, required_unless_present = "unsigned")]
    pub key: Option<PathBuf>,

    /// Explicit credential id.
    #[arg(long)]
    pub credential_id: Option<String>,

    /// Wallet slug. When set, a status index is reserved for
    /// `<wallet>/<achievement-id>` and embedded as `credentialStatus`.
    #[arg(long)]
    pub wallet: Option<String>,

    /// Achievement slug for the registry identity. Defaults to the
    /// achievement file's stem.
    #[arg(long, requires = "wallet")]
    pub achievement_id: Option<String>,

    /// Output path. Prints to stdout when omitted.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Cryptosuite for the proof.
    #[arg(long, default_value_t = Cryptosuite::EddsaRdfc2022)]
    pub cryptosuite: Cryptosuite,

    /// Emit the credential without a proof.
    #[arg(long)]
    pub unsigned: bool,
}

impl IssueArgs {
    /// `<wallet>/<achievement-id>` when a wallet is given.
    pub fn identity(&self) -> Result<Option<String>> {
        let Some(wallet) = &self.wallet else {
            return Ok(None);
        };
        let achievement = match &self.achievement_id {
            Some(id) => id.clone(),
            None => self
                .achievement
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
                .context("cannot derive --achievement-id from the achievement file name")?,
        };
        if wallet.is_empty() || wallet.contains('/') {
            bail!("invalid wallet slug: {wallet:?}");
        }
        Ok(Some(format!("{wallet}/{achievement}")))
    }
}

/// Execute `credkit issue`.
pub fn run_issue(args: &IssueArgs, config: &CliConfig) -> Result<u8> {
    let credential = issue_credential(args, config)?;
    match &args.output {
        Some(path) => {
            write_json(path, &credential.to_value())?;
            println!("Credential saved to: {}", path.display());
        }
        None => println!("{}", credential.to_pretty_json()?),
    }
    Ok(0)
}

/// Build, register, and sign the credential described by `args`.
pub fn issue_credential(args: &IssueArgs, config: &CliConfig) -> Result<Credential> {
    let achievement = read_json(&args.achievement)?;
    let identity = args.identity()?;
    let signer = match (&args.key, args.unsigned) {
        (Some(path), false) => Some(load_signing_key(path)?),
        _ => None,
    };

    let mut issuer = CredentialIssuer::new(config.issuer_profile());
    if let Some(base) = &config.profile_base_url {
        issuer = issuer.with_profile_base_url(base);
    }
    let now = Timestamp::now();
    let mut credential = issuer
        .create(&IssueRequest {
            achievement,
            recipient_id: args.recipient.clone(),
            recipient_name: args.recipient_name.clone(),
            credential_id: args.credential_id.clone(),
            identity: identity.clone(),
            valid_from: now,
        })
        .with_context(|| format!("invalid achievement: {}", args.achievement.display()))?;

    if let Some(identity) = &identity {
        let index = reserve_index(config, identity, now)?;
        credential.set_credential_status(&config.status_list().entry(index))?;
        tracing::info!(identity = %identity, index, "reserved status index");
    }

    match signer {
        Some((keypair, vm)) => {
            let engine = proof_engine(config)?;
            Ok(engine
                .sign(&credential, &keypair, &vm, args.cryptosuite, now)
                .context("failed to sign credential")?)
        }
        None => Ok(credential),
    }
}
