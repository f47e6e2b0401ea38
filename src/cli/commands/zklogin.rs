//! Chain, prover, and salt-service arguments.

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

pub const ARG_RPC_URL: &str = "rpc-url";
pub const ARG_RPC_TIMEOUT_SECONDS: &str = "rpc-timeout-seconds";
pub const ARG_PROVER_URL: &str = "prover-url";
pub const ARG_PROVER_TIMEOUT_SECONDS: &str = "prover-timeout-seconds";
pub const ARG_SALT_URL: &str = "salt-url";
pub const ARG_SALT_TIMEOUT_SECONDS: &str = "salt-timeout-seconds";
pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_PACKAGE_ID: &str = "package-id";
pub const ARG_SESSION_TTL_EPOCHS: &str = "session-ttl-epochs";
pub const ARG_SESSION_SNAPSHOT_PATH: &str = "session-snapshot-path";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_RPC_URL)
                .long(ARG_RPC_URL)
                .help("JSON-RPC endpoint of the target network")
                .env("ESUSU_RPC_URL")
                .default_value("https://fullnode.testnet.sui.io:443"),
        )
        .arg(
            Arg::new(ARG_RPC_TIMEOUT_SECONDS)
                .long(ARG_RPC_TIMEOUT_SECONDS)
                .help("Timeout for chain RPC calls")
                .env("ESUSU_RPC_TIMEOUT_SECONDS")
                .default_value("15")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_PROVER_URL)
                .long(ARG_PROVER_URL)
                .help("Zero-knowledge prover service endpoint")
                .env("ESUSU_PROVER_URL")
                .default_value("https://prover-dev.mystenlabs.com/v1"),
        )
        .arg(
            Arg::new(ARG_PROVER_TIMEOUT_SECONDS)
                .long(ARG_PROVER_TIMEOUT_SECONDS)
                .help("Timeout for proof generation; proofs routinely take tens of seconds")
                .env("ESUSU_PROVER_TIMEOUT_SECONDS")
                .default_value("45")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_SALT_URL)
                .long(ARG_SALT_URL)
                .help("Deterministic salt service base URL")
                .env("ESUSU_SALT_URL")
                .default_value("http://localhost:5002"),
        )
        .arg(
            Arg::new(ARG_SALT_TIMEOUT_SECONDS)
                .long(ARG_SALT_TIMEOUT_SECONDS)
                .help("Timeout for salt service calls")
                .env("ESUSU_SALT_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL; drives the OAuth redirect URI and CORS origin")
                .env("ESUSU_FRONTEND_BASE_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new(ARG_PACKAGE_ID)
                .long(ARG_PACKAGE_ID)
                .help("On-chain package id invoked by savings-circle transactions")
                .env("ESUSU_PACKAGE_ID")
                .required(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_EPOCHS)
                .long(ARG_SESSION_TTL_EPOCHS)
                .help("Epochs past the current one for which a login stays valid")
                .env("ESUSU_SESSION_TTL_EPOCHS")
                .default_value("2")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_SESSION_SNAPSHOT_PATH)
                .long(ARG_SESSION_SNAPSHOT_PATH)
                .help("Development-only session snapshot file; off by default")
                .env("ESUSU_SESSION_SNAPSHOT_PATH"),
        )
}

#[derive(Debug, Clone)]
pub struct Options {
    pub rpc_url: String,
    pub rpc_timeout_seconds: u64,
    pub prover_url: String,
    pub prover_timeout_seconds: u64,
    pub salt_url: String,
    pub salt_timeout_seconds: u64,
    pub frontend_base_url: String,
    pub package_id: String,
    pub session_ttl_epochs: u64,
    pub session_snapshot_path: Option<String>,
}

impl Options {
    /// # Errors
    /// Returns an error when a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            rpc_url: matches
                .get_one::<String>(ARG_RPC_URL)
                .cloned()
                .context("missing required argument: --rpc-url")?,
            rpc_timeout_seconds: matches
                .get_one::<u64>(ARG_RPC_TIMEOUT_SECONDS)
                .copied()
                .unwrap_or(15),
            prover_url: matches
                .get_one::<String>(ARG_PROVER_URL)
                .cloned()
                .context("missing required argument: --prover-url")?,
            prover_timeout_seconds: matches
                .get_one::<u64>(ARG_PROVER_TIMEOUT_SECONDS)
                .copied()
                .unwrap_or(45),
            salt_url: matches
                .get_one::<String>(ARG_SALT_URL)
                .cloned()
                .context("missing required argument: --salt-url")?,
            salt_timeout_seconds: matches
                .get_one::<u64>(ARG_SALT_TIMEOUT_SECONDS)
                .copied()
                .unwrap_or(10),
            frontend_base_url: matches
                .get_one::<String>(ARG_FRONTEND_BASE_URL)
                .cloned()
                .context("missing required argument: --frontend-base-url")?,
            package_id: matches
                .get_one::<String>(ARG_PACKAGE_ID)
                .cloned()
                .context("missing required argument: --package-id")?,
            session_ttl_epochs: matches
                .get_one::<u64>(ARG_SESSION_TTL_EPOCHS)
                .copied()
                .unwrap_or(2),
            session_snapshot_path: matches
                .get_one::<String>(ARG_SESSION_SNAPSHOT_PATH)
                .cloned(),
        })
    }
}
