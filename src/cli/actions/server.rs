use crate::api;
use crate::api::handlers::zklogin::{ZkLoginConfig, ZkLoginState};
use crate::zklogin::chain::RpcChainClient;
use crate::zklogin::oauth::OAuthConfig;
use crate::zklogin::prover::ProverClient;
use crate::zklogin::salt::SaltClient;
use crate::zklogin::session::SessionStore;
use anyhow::Result;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
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
    pub google_client_id: Option<String>,
    pub facebook_client_id: Option<String>,
    pub apple_client_id: Option<String>,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if a client cannot be constructed or the server fails to
/// start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let config = ZkLoginConfig::new(args.frontend_base_url.clone(), args.package_id)
        .with_session_ttl_epochs(args.session_ttl_epochs);

    // All providers redirect back to the same frontend callback route.
    let redirect_uri = format!(
        "{}/auth/callback",
        args.frontend_base_url.trim_end_matches('/')
    );
    let oauth = OAuthConfig::new(redirect_uri)
        .with_google_client_id(args.google_client_id)
        .with_facebook_client_id(args.facebook_client_id)
        .with_apple_client_id(args.apple_client_id);

    let mut store = SessionStore::new();
    if let Some(path) = args.session_snapshot_path {
        info!("Development session snapshot enabled: {path}");
        store = store.with_snapshot_path(PathBuf::from(path));
    }

    let salt = SaltClient::new(
        args.salt_url,
        Duration::from_secs(args.salt_timeout_seconds),
    )?;
    let prover = ProverClient::new(
        args.prover_url,
        Duration::from_secs(args.prover_timeout_seconds),
    )?;
    let chain = RpcChainClient::new(args.rpc_url, Duration::from_secs(args.rpc_timeout_seconds))?;

    let state = Arc::new(ZkLoginState::new(
        config,
        oauth,
        store,
        Arc::new(salt),
        Arc::new(prover),
        Arc::new(chain),
    ));

    api::new(args.port, state).await
}
