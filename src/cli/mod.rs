//! CLI argument parsing for leasehold.
//!
//! Uses clap derive macros for declarative argument definitions.
//! Implementations live in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::types::{DEFAULT_STORE_DIR, STORE_DIR_ENV};

/// Leasehold: time-bounded exclusive leases backed by a shared store.
///
/// Each lease lives in the store directory as one record per
/// resource/attribute pair. Every successful acquire or renewal prints a new
/// fencing token; pass the last token back with `--token` to renew or release.
#[derive(Parser, Debug)]
#[command(name = "leasehold")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Store directory shared by every participant.
    #[arg(long, global = true, env = STORE_DIR_ENV, default_value = DEFAULT_STORE_DIR)]
    pub store: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install the conditional operations into the store.
    ///
    /// Other commands do this on first use; running it explicitly is only
    /// needed to prepare a store ahead of time.
    Install,

    /// Acquire a lease, or renew it with `--token`.
    ///
    /// Prints `{"token", "remaining_ms"}` on success, or `false` (exit 2)
    /// when someone else holds an unexpired lease.
    Acquire(AcquireArgs),

    /// Release a lease held with `--token`.
    ///
    /// Always prints `true`; a lease already taken over is left untouched.
    Release(ReleaseArgs),

    /// Show the stored record for a lease.
    Status(StatusArgs),

    /// Print the store's transaction log.
    History(HistoryArgs),

    /// Hold a lease for a while, renewing it periodically, then release it.
    ///
    /// Exits 2 if the lease cannot be obtained or is lost mid-way.
    Hold(HoldArgs),
}

/// Arguments identifying a lease record.
#[derive(clap::Args, Debug, Clone)]
pub struct LeaseTarget {
    /// Resource the lease guards.
    pub resource: String,

    /// Attribute of the resource holding the lease (default from config).
    #[arg(short, long)]
    pub attribute: Option<String>,
}

/// Arguments for the `acquire` command.
#[derive(Parser, Debug)]
pub struct AcquireArgs {
    #[command(flatten)]
    pub target: LeaseTarget,

    /// Lease TTL in milliseconds (default from config).
    #[arg(long)]
    pub ttl_ms: Option<u64>,

    /// Token from a previous acquire, to renew instead of competing.
    #[arg(long)]
    pub token: Option<Uuid>,
}

/// Arguments for the `release` command.
#[derive(Parser, Debug)]
pub struct ReleaseArgs {
    #[command(flatten)]
    pub target: LeaseTarget,

    /// Token returned by the last successful acquire.
    #[arg(long)]
    pub token: Uuid,
}

/// Arguments for the `status` command.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: LeaseTarget,

    /// TTL used to judge expiry (default from config).
    #[arg(long)]
    pub ttl_ms: Option<u64>,
}

/// Arguments for the `history` command.
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Only show events for this resource.
    #[arg(long)]
    pub resource: Option<String>,

    /// Show at most this many of the most recent events.
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for the `hold` command.
#[derive(Parser, Debug)]
pub struct HoldArgs {
    #[command(flatten)]
    pub target: LeaseTarget,

    /// Lease TTL in milliseconds (default from config).
    #[arg(long)]
    pub ttl_ms: Option<u64>,

    /// Renewal interval in milliseconds (default: a third of the TTL).
    #[arg(long)]
    pub renew_every_ms: Option<u64>,

    /// How long to hold the lease before releasing it.
    #[arg(long)]
    pub for_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_acquire_with_token() {
        let token = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "leasehold",
            "--store",
            "/tmp/leases",
            "acquire",
            "db-primary",
            "--attribute",
            "leader",
            "--ttl-ms",
            "5000",
            "--token",
            &token.to_string(),
        ])
        .unwrap();

        assert_eq!(cli.store, PathBuf::from("/tmp/leases"));
        let Command::Acquire(args) = cli.command else {
            panic!("expected acquire");
        };
        assert_eq!(args.target.resource, "db-primary");
        assert_eq!(args.target.attribute.as_deref(), Some("leader"));
        assert_eq!(args.ttl_ms, Some(5000));
        assert_eq!(args.token, Some(token));
    }

    #[test]
    fn release_requires_token() {
        assert!(Cli::try_parse_from(["leasehold", "release", "db-primary"]).is_err());
    }

    #[test]
    fn rejects_malformed_token() {
        let result =
            Cli::try_parse_from(["leasehold", "acquire", "db-primary", "--token", "nope"]);
        assert!(result.is_err());
    }

    #[test]
    fn hold_requires_duration() {
        assert!(Cli::try_parse_from(["leasehold", "hold", "db-primary"]).is_err());

        let cli =
            Cli::try_parse_from(["leasehold", "hold", "db-primary", "--for-ms", "100"]).unwrap();
        assert!(matches!(cli.command, Command::Hold(HoldArgs { for_ms: 100, .. })));
    }
}
