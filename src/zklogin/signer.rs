//! Transaction signing with the composite zkLogin signature.
//!
//! The submitted signature combines the ephemeral Ed25519 signature with the
//! zero-knowledge proof material: the network checks the proof binds the
//! ephemeral key to the derived address, then checks the ephemeral signature
//! over the transaction. Proof-point validation happens before any I/O so a
//! broken account never reaches the network.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use super::chain::ChainClient;
use super::error::ZkLoginError;
use super::prover::{IssBase64Details, ProofPoints};
use super::session::AccountData;

type Blake2b256 = Blake2b<U32>;

/// zkLogin composite-signature scheme flag.
const ZKLOGIN_SIGNATURE_FLAG: u8 = 0x05;
/// Ed25519 scheme flag inside the user-signature envelope.
const ED25519_FLAG: u8 = 0x00;
/// Intent prefix for transaction signing payloads.
const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

/// An encoded application transaction ready for signing and submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionData {
    tx_bytes: Vec<u8>,
}

impl TransactionData {
    /// Encode a JSON transaction payload into its canonical byte form.
    ///
    /// # Errors
    /// Returns `InvalidInput` when the payload cannot be serialized.
    pub fn from_payload(payload: &Value) -> Result<Self, ZkLoginError> {
        let tx_bytes = serde_json::to_vec(payload)
            .map_err(|err| ZkLoginError::InvalidInput(format!("bad transaction: {err}")))?;
        Ok(Self { tx_bytes })
    }

    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.tx_bytes)
    }

    /// Signing payload: BLAKE2b-256 over the intent prefix and the bytes.
    #[must_use]
    pub fn signing_digest(&self) -> [u8; 32] {
        let mut hasher = Blake2b256::new();
        hasher.update(TRANSACTION_INTENT);
        hasher.update(&self.tx_bytes);
        hasher.finalize().into()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignatureInputs<'a> {
    proof_points: &'a ProofPoints,
    iss_base64_details: &'a IssBase64Details,
    header_base64: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ZkLoginSignature<'a> {
    inputs: SignatureInputs<'a>,
    max_epoch: u64,
    user_signature: String,
}

/// Sign and submit a transaction on behalf of a completed account.
///
/// The builder produces the application transaction; signing and signature
/// composition happen here so callers never touch key material.
///
/// # Errors
/// `InvalidProof` for incomplete proof points (checked before any network
/// attempt), builder errors verbatim, and the chain client's
/// `SubmissionFailed`/`ExecutionFailed` on submit.
#[instrument(skip_all, fields(user_addr = %account.user_addr))]
pub async fn sign_and_submit<F>(
    account: &AccountData,
    build: F,
    chain: &dyn ChainClient,
) -> Result<String, ZkLoginError>
where
    F: FnOnce(&AccountData) -> Result<TransactionData, ZkLoginError>,
{
    if !account.zk_proofs.is_complete() {
        return Err(ZkLoginError::InvalidProof);
    }

    let transaction = build(account)?;
    let signature = account.ephemeral.sign(&transaction.signing_digest());
    let composite = compose_signature(account, &signature.to_bytes())?;

    let digest = chain
        .execute_transaction(&transaction.to_base64(), &composite)
        .await?;
    info!("Submitted transaction {digest}");
    Ok(digest)
}

/// Fold the proof material and the ephemeral signature into the wire form.
///
/// # Errors
/// Returns `Internal` if the envelope cannot be serialized.
pub fn compose_signature(
    account: &AccountData,
    ephemeral_signature: &[u8; 64],
) -> Result<String, ZkLoginError> {
    let mut user_signature = Vec::with_capacity(1 + 64 + 32);
    user_signature.push(ED25519_FLAG);
    user_signature.extend_from_slice(ephemeral_signature);
    user_signature.extend_from_slice(&account.ephemeral.public_key_bytes());

    let envelope = ZkLoginSignature {
        inputs: SignatureInputs {
            proof_points: &account.zk_proofs.proof_points,
            iss_base64_details: &account.zk_proofs.iss_base64_details,
            header_base64: &account.zk_proofs.header_base64,
        },
        max_epoch: account.max_epoch,
        user_signature: STANDARD.encode(user_signature),
    };

    let envelope_bytes = serde_json::to_vec(&envelope)
        .map_err(|err| ZkLoginError::Internal(format!("signature envelope: {err}")))?;

    let mut framed = Vec::with_capacity(1 + envelope_bytes.len());
    framed.push(ZKLOGIN_SIGNATURE_FLAG);
    framed.extend_from_slice(&envelope_bytes);
    Ok(STANDARD.encode(framed))
}
