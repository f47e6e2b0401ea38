//! Client for the external zero-knowledge prover service.
//!
//! The prover independently re-verifies the JWT signature against the
//! issuer's keys and re-derives the nonce from the ephemeral public key,
//! randomness, and epoch; a mismatch with the nonce inside the token rejects
//! the request. Proof generation is slow, hence the generous default timeout.
//! Failures are surfaced once and never retried here; the caller may retry
//! the whole login.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{error, instrument};

use super::error::ZkLoginError;
use super::nonce::RANDOMNESS_LEN;

/// Proof generation regularly takes tens of seconds.
pub const DEFAULT_PROVER_TIMEOUT_SECONDS: u64 = 45;

/// Ed25519 scheme flag prefixed to the ephemeral key on the wire.
const ED25519_SCHEME_FLAG: u8 = 0x00;

/// Source of zero-knowledge proofs binding id tokens to ephemeral keys.
#[async_trait]
pub trait ProofService: Send + Sync {
    /// Request a proof for the given token and ephemeral material.
    async fn request_proof(
        &self,
        jwt: &str,
        ephemeral_public_key: &[u8; 32],
        randomness: &[u8; RANDOMNESS_LEN],
        max_epoch: u64,
    ) -> Result<ZkProofs, ZkLoginError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofPoints {
    pub a: Vec<String>,
    pub b: Vec<Vec<String>>,
    pub c: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssBase64Details {
    pub value: String,
    pub index_mod_4: u8,
}

/// Structured prover output carried in `AccountData` and later folded into
/// the composite transaction signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkProofs {
    pub proof_points: ProofPoints,
    pub iss_base64_details: IssBase64Details,
    pub header_base64: String,
}

impl ZkProofs {
    /// All three proof-point groups must be non-empty for the proof to be
    /// usable in a signature.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.proof_points.a.is_empty()
            && !self.proof_points.b.is_empty()
            && !self.proof_points.c.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ProverClient {
    client: Client,
    url: String,
}

impl ProverClient {
    /// # Errors
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(url: String, timeout: Duration) -> Result<Self, ZkLoginError> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| ZkLoginError::Internal(format!("prover client build failed: {err}")))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl ProofService for ProverClient {
    /// Request a proof binding the id token to the ephemeral key.
    ///
    /// Any timeout, transport failure, non-success status, or malformed body
    /// is `ProofGenerationFailed`.
    #[instrument(skip_all, fields(max_epoch))]
    async fn request_proof(
        &self,
        jwt: &str,
        ephemeral_public_key: &[u8; 32],
        randomness: &[u8; RANDOMNESS_LEN],
        max_epoch: u64,
    ) -> Result<ZkProofs, ZkLoginError> {
        let payload = json!({
            "jwt": jwt,
            "extendedEphemeralPublicKey": extended_ephemeral_public_key(ephemeral_public_key),
            "jwtRandomness": u128::from_be_bytes(*randomness).to_string(),
            "maxEpoch": max_epoch,
            "keyClaimName": "sub",
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                error!("Prover request failed: {err}");
                ZkLoginError::ProofGenerationFailed(err.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body: Value = response.json().await.unwrap_or_default();
            let message = body
                .get("message")
                .or_else(|| body.get("error"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            error!("Prover returned {status}: {message}");
            return Err(ZkLoginError::ProofGenerationFailed(format!(
                "{status}, {message}"
            )));
        }

        let proofs: ZkProofs = response.json().await.map_err(|err| {
            error!("Prover returned malformed body: {err}");
            ZkLoginError::ProofGenerationFailed(err.to_string())
        })?;

        if !proofs.is_complete() {
            return Err(ZkLoginError::ProofGenerationFailed(
                "prover returned empty proof points".to_string(),
            ));
        }

        Ok(proofs)
    }
}

/// Scheme-flagged base64 form of the ephemeral public key the prover expects.
#[must_use]
pub fn extended_ephemeral_public_key(public_key: &[u8; 32]) -> String {
    let mut extended = Vec::with_capacity(1 + public_key.len());
    extended.push(ED25519_SCHEME_FLAG);
    extended.extend_from_slice(public_key);
    STANDARD.encode(extended)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extended_key_carries_scheme_flag() {
        let encoded = extended_ephemeral_public_key(&[7u8; 32]);
        let decoded = STANDARD.decode(encoded).expect("valid base64");
        assert_eq!(decoded.len(), 33);
        assert_eq!(decoded[0], ED25519_SCHEME_FLAG);
        assert_eq!(&decoded[1..], &[7u8; 32]);
    }

    #[test]
    fn proofs_complete_requires_all_groups() {
        let mut proofs = ZkProofs {
            proof_points: ProofPoints {
                a: vec!["1".to_string()],
                b: vec![vec!["2".to_string(), "3".to_string()]],
                c: vec!["4".to_string()],
            },
            ..ZkProofs::default()
        };
        assert!(proofs.is_complete());

        proofs.proof_points.a.clear();
        assert!(!proofs.is_complete());
    }

    #[test]
    fn prover_response_shape_deserializes() {
        let body = json!({
            "proofPoints": {
                "a": ["11", "12", "1"],
                "b": [["21", "22"], ["23", "24"], ["1", "0"]],
                "c": ["31", "32", "1"]
            },
            "issBase64Details": { "value": "aXNz", "indexMod4": 2 },
            "headerBase64": "aGVhZGVy"
        });
        let proofs: ZkProofs = serde_json::from_value(body).expect("deserialize");
        assert!(proofs.is_complete());
        assert_eq!(proofs.iss_base64_details.index_mod_4, 2);
        assert_eq!(proofs.header_base64, "aGVhZGVy");
    }

    #[test]
    fn randomness_encodes_as_decimal() {
        let mut randomness = [0u8; RANDOMNESS_LEN];
        randomness[RANDOMNESS_LEN - 1] = 7;
        assert_eq!(u128::from_be_bytes(randomness).to_string(), "7");
    }
}
