//! # Verify Subcommand
//!
//! Checks a credential's signature and revocation state and prints a
//! report. The local registry is consulted when its file exists; the
//! published status list is fetched for identities the registry does not
//! know, unless `--offline` is set.
//!
//! Exit code 0 means verified; anything else (revoked, bad signature,
//! malformed) exits 1.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use credkit_vc::{VerificationReport, VerificationStatus, Verifier};

use crate::config::CliConfig;
use crate::fetch::HttpStatusListFetcher;
use crate::keys::load_key_resolver;
use crate::{proof_engine, read_json};

/// Arguments for `credkit verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Signed credential JSON file.
    pub credential: PathBuf,

    /// Public key file, or a directory of `*-public.json` files.
    #[arg(long, short)]
    pub key: PathBuf,

    /// Emit the report as JSON.
    #[arg(long, short)]
    pub json: bool,

    /// Do not consult the local status registry.
    #[arg(long)]
    pub no_registry: bool,

    /// Do not fetch the published status list.
    #[arg(long)]
    pub offline: bool,
}

/// Execute `credkit verify`.
pub fn run_verify(args: &VerifyArgs, config: &CliConfig) -> Result<u8> {
    let credential = read_json(&args.credential)?;
    let keys = load_key_resolver(&args.key)?;
    let engine = proof_engine(config)?;

    let registry = if args.no_registry || !config.registry_path.exists() {
        None
    } else {
        Some(config.registry_store().load()?)
    };
    let fetcher = if args.offline {
        None
    } else {
        Some(HttpStatusListFetcher::new(config.fetch_timeout()).context("failed to build HTTP client")?)
    };

    let mut verifier = Verifier::new(&engine);
    if let Some(registry) = &registry {
        verifier = verifier.with_registry(registry);
    }
    if let Some(fetcher) = &fetcher {
        verifier = verifier.with_fetcher(fetcher);
    }
    if let Some(base) = &config.profile_base_url {
        verifier = verifier.with_profile_base_url(base);
    }

    let report = verifier.verify(&credential, &keys);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(if report.is_verified() { 0 } else { 1 })
}

/// Human-readable rendering of a report.
pub fn render_text(report: &VerificationReport) -> String {
    let mut out = String::new();
    let mut line = |s: String| {
        out.push_str(&s);
        out.push('\n');
    };

    if report.is_verified() {
        line("✓ Credential verified successfully!".into());
        line(format!("  Credential ID: {}", report.credential_id));
        line(format!("  Issuer: {}", report.issuer.as_deref().unwrap_or("unknown")));
        line(format!("  Subject: {}", report.subject.as_deref().unwrap_or("unknown")));
        line(format!("  Achievement: {}", report.achievement.as_deref().unwrap_or("N/A")));
        if let Some(proof) = &report.proof {
            line(format!(
                "  Signed: {} ({})",
                proof.created.as_deref().unwrap_or("unknown"),
                proof.cryptosuite.as_deref().unwrap_or("unknown")
            ));
        }
        match &report.revocation {
            Some(r) if r.checked && !r.revoked => line("  Status: Active (not revoked)".into()),
            _ => line("  Status: not checked".into()),
        }
        for warning in &report.warnings {
            line(format!("  Warning: {warning}"));
        }
    } else {
        let headline = match report.status {
            VerificationStatus::Revoked => "✗ Credential has been revoked!",
            VerificationStatus::SignatureInvalid => "✗ Credential signature is invalid!",
            _ => "✗ Credential verification failed!",
        };
        line(headline.into());
        line(format!("  Credential ID: {}", report.credential_id));
        for error in &report.errors {
            line(format!("  Error: {error}"));
        }
        for warning in &report.warnings {
            line(format!("  Warning: {warning}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use credkit_core::Timestamp;
    use credkit_vc::{Credential, Cryptosuite};
    use serde_json::json;
    use std::path::Path;

    struct Fixture {
        _dir: tempfile::TempDir,
        config: CliConfig,
        key_dir: PathBuf,
        credential: PathBuf,
    }

    fn fixture(with_status: bool) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let config = CliConfig {
            registry_path: root.join("status-registry.json"),
            contexts_dir: root.join("contexts"),
            profile_base_url: Some("https://c.example/profile/".into()),
            status_list_url: "http://127.0.0.1:9/status".into(),
            fetch_timeout_secs: 1,
            ..CliConfig::default()
        };
        let key_dir = root.join("keys");
        let keys = credkit_crypto::generate_key_files(&key_dir, "did:web:i.example", "key-1").unwrap();

        let mut doc = json!({
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "id": "https://c.example/profile/ada/rust",
            "type": ["VerifiableCredential"],
            "issuer": {"id": "did:web:i.example", "name": "Example"},
            "validFrom": "2025-01-01T00:00:00Z",
            "credentialSubject": {"id": "mailto:ada@example.com", "achievement": {"name": "Rust"}}
        });
        if with_status {
            let index = config
                .registry_store()
                .update(|r| Ok(r.allocate_index("ada/rust", Timestamp::now())))
                .unwrap();
            doc["credentialStatus"] = serde_json::to_value(config.status_list().entry(index)).unwrap();
        }
        let (keypair, vm) = crate::keys::load_signing_key(&keys.private_path).unwrap();
        let signed = credkit_vc::ProofEngine::default()
            .sign(
                &Credential::from_value(doc).unwrap(),
                &keypair,
                &vm,
                Cryptosuite::EddsaJcs2022,
                Timestamp::now(),
            )
            .unwrap();
        let credential = root.join("credential.json");
        crate::write_json(&credential, &signed.to_value()).unwrap();
        Fixture {
            config,
            key_dir,
            credential,
            _dir: dir,
        }
    }

    fn args(f: &Fixture, key: &Path) -> VerifyArgs {
        VerifyArgs {
            credential: f.credential.clone(),
            key: key.to_path_buf(),
            json: false,
            no_registry: false,
            offline: true,
        }
    }

    #[test]
    fn verified_credential_exits_zero() {
        let f = fixture(true);
        assert_eq!(run_verify(&args(&f, &f.key_dir), &f.config).unwrap(), 0);
    }

    #[test]
    fn revoked_credential_exits_one() {
        let f = fixture(true);
        f.config
            .registry_store()
            .update(|r| Ok(r.revoke("ada/rust", Timestamp::now())))
            .unwrap();
        assert_eq!(run_verify(&args(&f, &f.key_dir), &f.config).unwrap(), 1);
    }

    #[test]
    fn wrong_key_exits_one() {
        let f = fixture(false);
        let other = f.key_dir.join("other");
        let keys = credkit_crypto::generate_key_files(&other, "did:web:i.example", "key-1").unwrap();
        assert_eq!(run_verify(&args(&f, &keys.public_path), &f.config).unwrap(), 1);
    }

    #[test]
    fn unreachable_list_is_only_a_warning() {
        let f = fixture(true);
        let mut a = args(&f, &f.key_dir);
        a.no_registry = true;
        a.offline = false;
        assert_eq!(run_verify(&a, &f.config).unwrap(), 0);
    }

    #[test]
    fn text_report_names_the_verdict() {
        let f = fixture(false);
        let engine = proof_engine(&f.config).unwrap();
        let keys = load_key_resolver(&f.key_dir).unwrap();
        let report = Verifier::new(&engine).verify(&read_json(&f.credential).unwrap(), &keys);
        let text = render_text(&report);
        assert!(text.contains("verified successfully"));
        assert!(text.contains("Achievement: Rust"));
        assert!(text.contains("Status: not checked"));
    }
}
