//! # credkit CLI entry point
//!
//! Parses command-line arguments, loads configuration, and dispatches to
//! the subcommand handlers in the library crate.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use credkit_cli::config::CliConfig;
use credkit_cli::issue::{run_issue, IssueArgs};
use credkit_cli::keys::{run_keygen, KeygenArgs};
use credkit_cli::migrate::{run_migrate, MigrateArgs};
use credkit_cli::rename::{run_rename, RenameArgs};
use credkit_cli::revoke::{run_list, run_revoke, run_unrevoke, ListArgs, RevokeArgs};
use credkit_cli::sign::{run_sign, SignArgs};
use credkit_cli::status::{run_status, StatusArgs};
use credkit_cli::verify::{run_verify, VerifyArgs};

/// credkit: issue, sign, verify, and revoke verifiable credentials.
///
/// Credentials carry Data Integrity proofs (`eddsa-rdfc-2022` or
/// `eddsa-jcs-2022`) and revocation is published as a bitstring status list.
#[derive(Parser, Debug)]
#[command(name = "credkit", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file. Defaults to ./credkit.yaml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an Ed25519 key pair as Multikey documents.
    Keygen(KeygenArgs),

    /// Issue an OpenBadgeCredential from an achievement template.
    Issue(IssueArgs),

    /// Sign a credential with a Data Integrity proof.
    Sign(SignArgs),

    /// Verify a credential's signature and revocation status.
    Verify(VerifyArgs),

    /// Revoke a credential and regenerate the status list.
    Revoke(RevokeArgs),

    /// Clear a credential's revocation and regenerate the status list.
    Unrevoke(RevokeArgs),

    /// List registry entries and their revocation state.
    List(ListArgs),

    /// Status list regeneration and statistics.
    Status(StatusArgs),

    /// Rename registry identities, keeping their status index.
    Rename(RenameArgs),

    /// Add status claims to credentials that lack them and re-sign.
    Migrate(MigrateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "credkit starting");

    let config = match CliConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            return ExitCode::from(1);
        }
    };

    let result = match &cli.command {
        Commands::Keygen(args) => run_keygen(args, &config),
        Commands::Issue(args) => run_issue(args, &config),
        Commands::Sign(args) => run_sign(args, &config),
        Commands::Verify(args) => run_verify(args, &config),
        Commands::Revoke(args) => run_revoke(args, &config),
        Commands::Unrevoke(args) => run_unrevoke(args, &config),
        Commands::List(args) => run_list(args, &config),
        Commands::Status(args) => run_status(args, &config),
        Commands::Rename(args) => run_rename(args, &config),
        Commands::Migrate(args) => run_migrate(args, &config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credkit_cli::status::StatusCommand;
    use credkit_vc::Cryptosuite;

    #[test]
    fn cli_parse_keygen_defaults() {
        let cli = Cli::try_parse_from(["credkit", "keygen"]).unwrap();
        if let Commands::Keygen(args) = cli.command {
            assert_eq!(args.out, PathBuf::from("keys"));
            assert_eq!(args.key_id, "key-1");
            assert!(args.issuer.is_none());
            assert!(!args.force);
        } else {
            panic!("expected keygen");
        }
    }

    #[test]
    fn cli_parse_issue_with_wallet() {
        let cli = Cli::try_parse_from([
            "credkit",
            "issue",
            "achievements/rust.json",
            "-r",
            "mailto:ada@example.com",
            "-k",
            "keys/key-1-private.json",
            "--wallet",
            "ada",
            "--cryptosuite",
            "eddsa-jcs-2022",
        ])
        .unwrap();
        if let Commands::Issue(args) = cli.command {
            assert_eq!(args.wallet.as_deref(), Some("ada"));
            assert_eq!(args.cryptosuite, Cryptosuite::EddsaJcs2022);
            assert_eq!(args.identity().unwrap().as_deref(), Some("ada/rust"));
        } else {
            panic!("expected issue");
        }
    }

    #[test]
    fn cli_parse_issue_requires_key_unless_unsigned() {
        assert!(Cli::try_parse_from(["credkit", "issue", "a.json", "-r", "did:ex:1"]).is_err());
        assert!(
            Cli::try_parse_from(["credkit", "issue", "a.json", "-r", "did:ex:1", "--unsigned"]).is_ok()
        );
    }

    #[test]
    fn cli_parse_achievement_id_requires_wallet() {
        assert!(Cli::try_parse_from([
            "credkit", "issue", "a.json", "-r", "did:ex:1", "--unsigned", "--achievement-id", "x"
        ])
        .is_err());
    }

    #[test]
    fn cli_parse_sign_default_cryptosuite_is_rdfc() {
        let cli = Cli::try_parse_from(["credkit", "sign", "c.json", "-k", "k.json"]).unwrap();
        if let Commands::Sign(args) = cli.command {
            assert_eq!(args.cryptosuite, Cryptosuite::EddsaRdfc2022);
            assert!(args.output.is_none());
        } else {
            panic!("expected sign");
        }
    }

    #[test]
    fn cli_parse_rejects_unknown_cryptosuite() {
        assert!(Cli::try_parse_from([
            "credkit", "sign", "c.json", "-k", "k.json", "--cryptosuite", "ecdsa-2019"
        ])
        .is_err());
    }

    #[test]
    fn cli_parse_verify_flags() {
        let cli = Cli::try_parse_from([
            "credkit", "verify", "c.json", "-k", "keys", "--json", "--offline",
        ])
        .unwrap();
        if let Commands::Verify(args) = cli.command {
            assert!(args.json);
            assert!(args.offline);
            assert!(!args.no_registry);
        } else {
            panic!("expected verify");
        }
    }

    #[test]
    fn cli_parse_revoke_and_unrevoke() {
        let cli = Cli::try_parse_from(["credkit", "revoke", "ada/rust", "--dry-run"]).unwrap();
        assert!(matches!(&cli.command, Commands::Revoke(a) if a.dry_run && a.identity == "ada/rust"));
        let cli = Cli::try_parse_from(["credkit", "unrevoke", "ada/rust"]).unwrap();
        assert!(matches!(cli.command, Commands::Unrevoke(_)));
    }

    #[test]
    fn cli_parse_status_subcommands() {
        let cli = Cli::try_parse_from(["credkit", "status", "stats", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Status(StatusArgs { command: StatusCommand::Stats { json: true } })
        ));
        let cli = Cli::try_parse_from(["credkit", "status", "update", "-k", "k.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Status(StatusArgs { command: StatusCommand::Update { key: Some(_), .. } })
        ));
    }

    #[test]
    fn cli_parse_rename_prefix() {
        let cli = Cli::try_parse_from(["credkit", "rename", "old/", "new/", "--prefix"]).unwrap();
        if let Commands::Rename(args) = cli.command {
            assert!(args.prefix);
            assert_eq!(args.from, "old/");
        } else {
            panic!("expected rename");
        }
    }

    #[test]
    fn cli_parse_migrate_requires_key() {
        assert!(Cli::try_parse_from(["credkit", "migrate"]).is_err());
        let cli = Cli::try_parse_from(["credkit", "migrate", "-k", "k.json", "--dry-run"]).unwrap();
        if let Commands::Migrate(args) = cli.command {
            assert!(args.dry_run);
            assert_eq!(args.profiles, PathBuf::from("docs/profile"));
        } else {
            panic!("expected migrate");
        }
    }

    #[test]
    fn cli_parse_global_flags() {
        let cli = Cli::try_parse_from(["credkit", "list", "-vv", "--config", "c.yaml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("c.yaml")));
    }
}
