//! # Sign Subcommand
//!
//! Attaches a Data Integrity proof to an unsigned credential. An existing
//! proof is replaced.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use credkit_core::Timestamp;
use credkit_vc::Cryptosuite;

use crate::config::CliConfig;
use crate::keys::load_signing_key;
use crate::{proof_engine, read_credential, write_json};

/// Arguments for `credkit sign`.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Credential JSON file.
    pub credential: PathBuf,

    /// Private key file.
    #[arg(long, short)]
    pub key: PathBuf,

    /// Output path. Prints to stdout when omitted.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Cryptosuite for the proof.
    #[arg(long, default_value_t = Cryptosuite::EddsaRdfc2022)]
    pub cryptosuite: Cryptosuite,
}

/// Execute `credkit sign`.
pub fn run_sign(args: &SignArgs, config: &CliConfig) -> Result<u8> {
    let mut credential = read_credential(&args.credential)?;
    if credential.take_proof().is_some() {
        tracing::info!(credential = credential.id(), "replacing existing proof");
    }
    let (keypair, vm) = load_signing_key(&args.key)?;
    let engine = proof_engine(config)?;
    let signed = engine
        .sign(&credential, &keypair, &vm, args.cryptosuite, Timestamp::now())
        .with_context(|| format!("failed to sign {}", args.credential.display()))?;

    match &args.output {
        Some(path) => {
            write_json(path, &signed.to_value())?;
            println!("Signed credential saved to: {}", path.display());
        }
        None => println!("{}", signed.to_pretty_json()?),
    }
    Ok(0)
}
