//! Per-action orchestration of the zkLogin protocol.
//!
//! These functions own the ordering constraints between the protocol core and
//! the session store; the handler in `mod.rs` only deals with cookies and
//! status codes. A mid-flow failure after setup exists but before the account
//! is attached leaves the session in its prior state, so retrying the
//! callback with the same session id is safe.

use serde_json::{Value, json};
use tracing::{info, instrument};

use crate::zklogin::address::derive_address;
use crate::zklogin::error::ZkLoginError;
use crate::zklogin::oauth::{Provider, build_login_url};
use crate::zklogin::session::AccountData;
use crate::zklogin::signer::{TransactionData, sign_and_submit};
use crate::zklogin::{jwt, nonce};

use super::state::ZkLoginState;
use super::types::CallbackResponse;

/// Start a login: bind fresh ephemeral material to a validity epoch and
/// return the provider redirect URL.
///
/// # Errors
/// `InvalidInput` for unknown/unconfigured providers, `Internal` if the
/// randomness source or epoch poll fails.
#[instrument(skip(state))]
pub(super) async fn begin_login(
    state: &ZkLoginState,
    session_id: &str,
    provider_name: &str,
) -> Result<String, ZkLoginError> {
    let provider = Provider::parse(provider_name)?;

    let current_epoch = state.chain().current_epoch().await?;
    let max_epoch = current_epoch + state.config().session_ttl_epochs();

    let setup = nonce::begin_setup(provider, max_epoch)?;
    let login_url = build_login_url(state.oauth(), provider, &setup.nonce)?;

    state.store().create(session_id, setup).await;
    info!("Began {provider} login valid through epoch {max_epoch}");
    Ok(login_url)
}

/// Resolve the OAuth callback: validate the token, fetch salt and proof,
/// derive the address, and complete the session.
///
/// # Errors
/// `SessionNotFound` without a prior begin-login, `InvalidToken` for
/// structural claim failures, and the salt/prover error taxonomy on upstream
/// failures — none of which mutate the session.
#[instrument(skip_all)]
pub(super) async fn handle_callback(
    state: &ZkLoginState,
    session_id: &str,
    token: &str,
) -> Result<CallbackResponse, ZkLoginError> {
    let session = state
        .store()
        .get(session_id)
        .await
        .ok_or(ZkLoginError::SessionNotFound)?;
    let setup = session.setup;

    let claims = jwt::decode_and_validate(token)?;

    let salt_grant = state.salt().get_salt(token).await?;
    let proofs = state
        .prover()
        .request_proof(
            token,
            &setup.ephemeral.public_key_bytes(),
            &setup.randomness,
            setup.max_epoch,
        )
        .await?;

    let address = derive_address(&claims.aud, &claims.sub, salt_grant.salt);

    let account = AccountData {
        provider: setup.provider,
        user_addr: address.clone(),
        zk_proofs: proofs,
        ephemeral: setup.ephemeral,
        user_salt: salt_grant.salt.to_string(),
        sub: claims.sub.clone(),
        aud: claims.aud.clone(),
        max_epoch: setup.max_epoch,
        picture: claims.picture.clone(),
        name: claims.name.clone(),
    };
    state.store().attach_account(session_id, account).await?;

    info!("Completed login for {address}");
    Ok(CallbackResponse {
        address,
        sub: claims.sub,
        aud: claims.aud,
        name: claims.name,
        picture: claims.picture,
    })
}

/// Sign and submit a savings-circle transaction for a valid session.
///
/// # Errors
/// `SessionNotFound`/`SessionExpired`/`InvalidProof` from validation,
/// `InvalidInput` without circle data, then the signer's submit taxonomy.
#[instrument(skip_all)]
pub(super) async fn send_transaction(
    state: &ZkLoginState,
    session_id: &str,
    circle_data: Option<&Value>,
) -> Result<String, ZkLoginError> {
    let current_epoch = state.chain().current_epoch().await?;
    let account = state.store().validate(session_id, current_epoch).await?;

    let circle_data = circle_data
        .ok_or_else(|| ZkLoginError::InvalidInput("missing circleData".to_string()))?
        .clone();
    let package_id = state.config().package_id().to_string();

    sign_and_submit(
        &account,
        move |account| build_circle_transaction(&package_id, account, &circle_data),
        state.chain(),
    )
    .await
}

pub(super) async fn logout(state: &ZkLoginState, session_id: &str) {
    state.store().delete(session_id).await;
}

/// Wrap the caller's circle payload into the on-chain call envelope.
fn build_circle_transaction(
    package_id: &str,
    account: &AccountData,
    circle_data: &Value,
) -> Result<TransactionData, ZkLoginError> {
    TransactionData::from_payload(&json!({
        "packageId": package_id,
        "sender": account.user_addr,
        "gasBudget": circle_data.get("gasBudget").cloned().unwrap_or(json!(10_000_000)),
        "call": circle_data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::zklogin::state::ZkLoginConfig;
    use crate::zklogin::chain::ChainClient;
    use crate::zklogin::jwt::{IdTokenClaims, encode_for_tests};
    use crate::zklogin::oauth::OAuthConfig;
    use crate::zklogin::prover::{IssBase64Details, ProofPoints, ProofService, ZkProofs};
    use crate::zklogin::salt::{SaltGrant, SaltService};
    use crate::zklogin::session::SessionStore;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct StubSalt {
        salt: u128,
    }

    #[async_trait]
    impl SaltService for StubSalt {
        async fn get_salt(&self, _jwt: &str) -> Result<SaltGrant, ZkLoginError> {
            Ok(SaltGrant {
                salt: self.salt,
                exp: 0,
                iat: 0,
            })
        }
    }

    struct StubProver;

    #[async_trait]
    impl ProofService for StubProver {
        async fn request_proof(
            &self,
            _jwt: &str,
            _ephemeral_public_key: &[u8; 32],
            _randomness: &[u8; 16],
            _max_epoch: u64,
        ) -> Result<ZkProofs, ZkLoginError> {
            Ok(ZkProofs {
                proof_points: ProofPoints {
                    a: vec!["11".to_string()],
                    b: vec![vec!["21".to_string()]],
                    c: vec!["31".to_string()],
                },
                iss_base64_details: IssBase64Details {
                    value: "aXNz".to_string(),
                    index_mod_4: 2,
                },
                header_base64: "aGVhZGVy".to_string(),
            })
        }
    }

    struct StubChain {
        epoch: u64,
    }

    #[async_trait]
    impl ChainClient for StubChain {
        async fn current_epoch(&self) -> Result<u64, ZkLoginError> {
            Ok(self.epoch)
        }

        async fn execute_transaction(
            &self,
            _tx_bytes_b64: &str,
            _signature_b64: &str,
        ) -> Result<String, ZkLoginError> {
            Ok("digest-1".to_string())
        }
    }

    fn state_with_epoch(epoch: u64) -> ZkLoginState {
        let config = ZkLoginConfig::new("https://esusu.app".to_string(), "0xpkg".to_string());
        let oauth = OAuthConfig::new("https://esusu.app/auth/callback".to_string())
            .with_google_client_id(Some("google-client".to_string()));
        ZkLoginState::new(
            config,
            oauth,
            SessionStore::new(),
            Arc::new(StubSalt { salt: 42 }),
            Arc::new(StubProver),
            Arc::new(StubChain { epoch }),
        )
    }

    fn token_for(aud: &str, sub: &str) -> String {
        encode_for_tests(&IdTokenClaims {
            iss: "https://accounts.google.com".to_string(),
            sub: sub.to_string(),
            aud: aud.to_string(),
            exp: i64::MAX,
            iat: 1,
            email: None,
            name: Some("Alice".to_string()),
            picture: None,
        })
    }

    #[tokio::test]
    async fn begin_login_creates_session_and_url() -> Result<(), ZkLoginError> {
        let state = state_with_epoch(100);
        let url = begin_login(&state, "sid-1", "google").await?;
        assert!(url.contains("nonce="));

        let session = state.store().get("sid-1").await.expect("session created");
        // max epoch = polled epoch + configured slack.
        assert_eq!(session.setup.max_epoch, 102);
        assert!(session.account.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn begin_login_rejects_unknown_provider() {
        let state = state_with_epoch(100);
        let err = begin_login(&state, "sid-1", "github").await.err();
        assert!(matches!(err, Some(ZkLoginError::InvalidInput(_))));
        assert!(state.store().get("sid-1").await.is_none());
    }

    #[tokio::test]
    async fn callback_without_setup_is_session_not_found() {
        let state = state_with_epoch(100);
        let err = handle_callback(&state, "missing", &token_for("aud", "sub"))
            .await
            .err();
        assert!(matches!(err, Some(ZkLoginError::SessionNotFound)));
    }

    #[tokio::test]
    async fn callback_round_trips_token_claims() -> Result<(), ZkLoginError> {
        let state = state_with_epoch(100);
        begin_login(&state, "sid-1", "google").await?;

        let response = handle_callback(&state, "sid-1", &token_for("client-1", "subject-1")).await?;
        assert_eq!(response.sub, "subject-1");
        assert_eq!(response.aud, "client-1");
        assert!(response.address.starts_with("0x"));

        let account = state
            .store()
            .get("sid-1")
            .await
            .and_then(|session| session.account)
            .expect("account attached");
        assert_eq!(account.sub, "subject-1");
        assert_eq!(account.aud, "client-1");
        assert_eq!(account.user_salt, "42");
        assert_eq!(account.user_addr, response.address);
        Ok(())
    }

    #[tokio::test]
    async fn callback_with_bad_token_leaves_session_untouched() -> Result<(), ZkLoginError> {
        let state = state_with_epoch(100);
        begin_login(&state, "sid-1", "google").await?;

        // Token missing exp fails structural validation.
        let token = encode_for_tests(&IdTokenClaims {
            sub: "subject-1".to_string(),
            aud: "client-1".to_string(),
            iat: 1,
            ..IdTokenClaims::default()
        });
        let err = handle_callback(&state, "sid-1", &token).await.err();
        assert!(matches!(err, Some(ZkLoginError::InvalidToken(_))));

        let session = state.store().get("sid-1").await.expect("session kept");
        assert!(session.account.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn send_transaction_happy_path() -> Result<(), ZkLoginError> {
        let state = state_with_epoch(100);
        begin_login(&state, "sid-1", "google").await?;
        handle_callback(&state, "sid-1", &token_for("client-1", "subject-1")).await?;

        let digest = send_transaction(
            &state,
            "sid-1",
            Some(&json!({ "function": "contribute", "amount": 10 })),
        )
        .await?;
        assert_eq!(digest, "digest-1");
        Ok(())
    }

    #[tokio::test]
    async fn send_transaction_requires_circle_data() -> Result<(), ZkLoginError> {
        let state = state_with_epoch(100);
        begin_login(&state, "sid-1", "google").await?;
        handle_callback(&state, "sid-1", &token_for("client-1", "subject-1")).await?;

        let err = send_transaction(&state, "sid-1", None).await.err();
        assert!(matches!(err, Some(ZkLoginError::InvalidInput(_))));
        Ok(())
    }

    #[tokio::test]
    async fn logout_deletes_the_session() -> Result<(), ZkLoginError> {
        let state = state_with_epoch(100);
        begin_login(&state, "sid-1", "google").await?;
        logout(&state, "sid-1").await;
        assert!(state.store().get("sid-1").await.is_none());
        Ok(())
    }
}
