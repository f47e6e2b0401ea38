//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the
//! appropriate action, such as starting the API server with its full
//! configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{oauth, zklogin};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let zklogin_opts = zklogin::Options::parse(matches)?;
    let oauth_opts = oauth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        rpc_url: zklogin_opts.rpc_url,
        rpc_timeout_seconds: zklogin_opts.rpc_timeout_seconds,
        prover_url: zklogin_opts.prover_url,
        prover_timeout_seconds: zklogin_opts.prover_timeout_seconds,
        salt_url: zklogin_opts.salt_url,
        salt_timeout_seconds: zklogin_opts.salt_timeout_seconds,
        frontend_base_url: zklogin_opts.frontend_base_url,
        package_id: zklogin_opts.package_id,
        session_ttl_epochs: zklogin_opts.session_ttl_epochs,
        session_snapshot_path: zklogin_opts.session_snapshot_path,
        google_client_id: oauth_opts.google_client_id,
        facebook_client_id: oauth_opts.facebook_client_id,
        apple_client_id: oauth_opts.apple_client_id,
    }))
}
