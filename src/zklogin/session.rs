//! Session records and the store that owns them.
//!
//! The store is the single source of truth for session validity. Callers
//! only ever hold a session id; every read and write goes through the store's
//! own lock, so concurrent requests for one session are serialized here.
//! Deleting a session drops its ephemeral key material through a zeroizing
//! wrapper, so the secret bytes are scrubbed rather than dereferenced.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::ZkLoginError;
use super::nonce::{EphemeralKeyPair, SetupData};
use super::oauth::Provider;
use super::prover::ZkProofs;

/// Completed account state created when the OAuth callback resolves.
///
/// Immutable once created; carried unchanged into transaction signing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountData {
    pub provider: Provider,
    pub user_addr: String,
    pub zk_proofs: ZkProofs,
    pub ephemeral: EphemeralKeyPair,
    /// Decimal salt as returned by the salt service.
    pub user_salt: String,
    pub sub: String,
    pub aud: String,
    pub max_epoch: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A session as stored: setup state, later enriched with the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub setup: SetupData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountData>,
}

/// In-memory session store keyed by the opaque cookie value.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    snapshot_path: Option<PathBuf>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            snapshot_path: None,
        }
    }

    /// Enable the development snapshot and load any previous one.
    ///
    /// The snapshot is a convenience for restarts during development, not a
    /// durability contract; a missing or unreadable file starts empty.
    #[must_use]
    pub fn with_snapshot_path(mut self, path: PathBuf) -> Self {
        match load_snapshot(&path) {
            Ok(Some(sessions)) => {
                info!("Loaded {} session(s) from snapshot", sessions.len());
                self.sessions = Mutex::new(sessions);
            }
            Ok(None) => {}
            Err(err) => warn!("Ignoring unreadable session snapshot: {err}"),
        }
        self.snapshot_path = Some(path);
        self
    }

    /// Mint a fresh opaque session identifier for the cookie.
    #[must_use]
    pub fn generate_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Create a session holding only setup state, replacing any previous
    /// in-flight login under the same id.
    pub async fn create(&self, session_id: &str, setup: SetupData) {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            session_id.to_string(),
            Session {
                setup,
                account: None,
            },
        );
    }

    /// Attach completed account state to an existing session.
    ///
    /// # Errors
    /// `SessionNotFound` when no setup state exists for the id; the store is
    /// left untouched in that case.
    pub async fn attach_account(
        &self,
        session_id: &str,
        account: AccountData,
    ) -> Result<(), ZkLoginError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or(ZkLoginError::SessionNotFound)?;
        session.account = Some(account);
        Ok(())
    }

    pub async fn get(&self, session_id: &str) -> Option<Session> {
        let sessions = self.sessions.lock().await;
        sessions.get(session_id).cloned()
    }

    /// Validate a session for an authenticated action.
    ///
    /// Requires setup and account state, non-empty proof points, and a
    /// validity window that has not closed: sessions expire once the current
    /// network epoch passes `max_epoch`, at which point the record is deleted
    /// and its key material scrubbed.
    ///
    /// # Errors
    /// `SessionNotFound`, `InvalidProof`, or `SessionExpired` accordingly.
    pub async fn validate(
        &self,
        session_id: &str,
        current_epoch: u64,
    ) -> Result<AccountData, ZkLoginError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get(session_id)
            .ok_or(ZkLoginError::SessionNotFound)?;

        let Some(account) = &session.account else {
            return Err(ZkLoginError::SessionNotFound);
        };

        if !account.zk_proofs.is_complete() {
            return Err(ZkLoginError::InvalidProof);
        }

        if current_epoch > account.max_epoch {
            // Dropping the record zeroizes the ephemeral secret.
            sessions.remove(session_id);
            return Err(ZkLoginError::SessionExpired);
        }

        Ok(account.clone())
    }

    /// Delete a session, scrubbing its ephemeral key material.
    pub async fn delete(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(session_id);
    }

    /// Persist current sessions if a snapshot path was configured.
    ///
    /// # Errors
    /// Returns an error when serialization or the write fails.
    pub async fn save_snapshot(&self) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let sessions = self.sessions.lock().await;
        let json =
            serde_json::to_vec_pretty(&*sessions).context("failed to serialize sessions")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write session snapshot: {}", path.display()))?;
        info!("Saved {} session(s) to snapshot", sessions.len());
        Ok(())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn load_snapshot(path: &Path) -> Result<Option<HashMap<String, Session>>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = std::fs::read(path)
        .with_context(|| format!("failed to read session snapshot: {}", path.display()))?;
    let sessions =
        serde_json::from_slice(&json).context("failed to deserialize session snapshot")?;
    Ok(Some(sessions))
}
