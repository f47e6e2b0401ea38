//! zkLogin endpoint configuration and shared state.

use std::sync::Arc;

use crate::zklogin::chain::ChainClient;
use crate::zklogin::oauth::OAuthConfig;
use crate::zklogin::prover::ProofService;
use crate::zklogin::salt::SaltService;
use crate::zklogin::session::SessionStore;

/// Slack added to the current epoch at begin-login; the session stays valid
/// until the network passes `current + ttl` epochs.
const DEFAULT_SESSION_TTL_EPOCHS: u64 = 2;

#[derive(Clone, Debug)]
pub struct ZkLoginConfig {
    frontend_base_url: String,
    package_id: String,
    session_ttl_epochs: u64,
}

impl ZkLoginConfig {
    #[must_use]
    pub fn new(frontend_base_url: String, package_id: String) -> Self {
        Self {
            frontend_base_url,
            package_id,
            session_ttl_epochs: DEFAULT_SESSION_TTL_EPOCHS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_epochs(mut self, epochs: u64) -> Self {
        self.session_ttl_epochs = epochs;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    /// On-chain package invoked by circle transactions.
    #[must_use]
    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    #[must_use]
    pub fn session_ttl_epochs(&self) -> u64 {
        self.session_ttl_epochs
    }

    /// Only mark cookies secure when the frontend is served over HTTPS.
    pub(crate) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

/// Everything the zkLogin handlers need, injected once at server start.
pub struct ZkLoginState {
    config: ZkLoginConfig,
    oauth: OAuthConfig,
    store: SessionStore,
    salt: Arc<dyn SaltService>,
    prover: Arc<dyn ProofService>,
    chain: Arc<dyn ChainClient>,
}

impl ZkLoginState {
    #[must_use]
    pub fn new(
        config: ZkLoginConfig,
        oauth: OAuthConfig,
        store: SessionStore,
        salt: Arc<dyn SaltService>,
        prover: Arc<dyn ProofService>,
        chain: Arc<dyn ChainClient>,
    ) -> Self {
        Self {
            config,
            oauth,
            store,
            salt,
            prover,
            chain,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ZkLoginConfig {
        &self.config
    }

    #[must_use]
    pub fn oauth(&self) -> &OAuthConfig {
        &self.oauth
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub(crate) fn salt(&self) -> &dyn SaltService {
        self.salt.as_ref()
    }

    pub(crate) fn prover(&self) -> &dyn ProofService {
        self.prover.as_ref()
    }

    pub(crate) fn chain(&self) -> &dyn ChainClient {
        self.chain.as_ref()
    }
}
