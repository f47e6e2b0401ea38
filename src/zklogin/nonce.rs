//! Ephemeral key material and nonce binding for login setup.
//!
//! The nonce computed here is embedded in the OAuth authorization request and
//! later recomputed by the prover from the same inputs. The hash layout is
//! part of the wire contract: any change breaks proof generation, not this
//! module.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::{Signature, Signer, SigningKey};
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::error::ZkLoginError;
use super::oauth::Provider;

const NONCE_DOMAIN: &[u8] = b"zklogin-nonce-v1";

/// Blinding value length, 128 bits of entropy.
pub const RANDOMNESS_LEN: usize = 16;

/// Ephemeral Ed25519 keypair generated per login attempt.
///
/// Only the 32-byte seed is held, wrapped so the memory is scrubbed when the
/// session is deleted or the process shuts down. The raw value is only sent
/// to the prover in its public extended form and never logged.
pub struct EphemeralKeyPair {
    secret: Zeroizing<[u8; 32]>,
}

impl EphemeralKeyPair {
    /// Generate a fresh keypair from the OS randomness source.
    ///
    /// # Errors
    /// Fails only on randomness-source exhaustion, which is fatal.
    pub fn generate() -> Result<Self, ZkLoginError> {
        let mut secret = Zeroizing::new([0u8; 32]);
        OsRng
            .try_fill_bytes(secret.as_mut_slice())
            .map_err(|err| ZkLoginError::Internal(format!("randomness source failed: {err}")))?;
        Ok(Self { secret })
    }

    #[must_use]
    pub fn from_bytes(secret: [u8; 32]) -> Self {
        Self {
            secret: Zeroizing::new(secret),
        }
    }

    #[must_use]
    pub fn public_key_bytes(&self) -> [u8; 32] {
        SigningKey::from_bytes(&self.secret)
            .verifying_key()
            .to_bytes()
    }

    /// Sign a transaction payload with the ephemeral key.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        SigningKey::from_bytes(&self.secret).sign(message)
    }
}

impl Clone for EphemeralKeyPair {
    fn clone(&self) -> Self {
        Self {
            secret: Zeroizing::new(*self.secret),
        }
    }
}

impl std::fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("secret", &"***")
            .field("public", &hex_lower(&self.public_key_bytes()))
            .finish()
    }
}

// Serde is only exercised by the opt-in development snapshot.
impl Serialize for EphemeralKeyPair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(self.secret.as_ref());
        serializer.serialize_str(&encoded)
    }
}

impl<'de> Deserialize<'de> for EphemeralKeyPair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)?;
        let secret: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("ephemeral key must be 32 bytes"))?;
        Ok(Self::from_bytes(secret))
    }
}

/// In-flight login state created at begin-login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupData {
    pub provider: Provider,
    pub ephemeral: EphemeralKeyPair,
    pub randomness: [u8; RANDOMNESS_LEN],
    pub max_epoch: u64,
    pub nonce: String,
}

/// Generate fresh ephemeral material and compute the bound nonce.
///
/// # Errors
/// Fails only if the OS randomness source is exhausted.
pub fn begin_setup(provider: Provider, target_epoch: u64) -> Result<SetupData, ZkLoginError> {
    let ephemeral = EphemeralKeyPair::generate()?;
    let mut randomness = [0u8; RANDOMNESS_LEN];
    OsRng
        .try_fill_bytes(&mut randomness)
        .map_err(|err| ZkLoginError::Internal(format!("randomness source failed: {err}")))?;

    let nonce = compute_nonce(&ephemeral.public_key_bytes(), target_epoch, &randomness);

    Ok(SetupData {
        provider,
        ephemeral,
        randomness,
        max_epoch: target_epoch,
        nonce,
    })
}

/// Deterministic nonce over (ephemeral public key, target epoch, randomness).
///
/// `SHA-256(domain || pk || be64(epoch) || randomness)`, base64url without
/// padding. The prover recomputes this from the same inputs and rejects the
/// proof request on mismatch.
#[must_use]
pub fn compute_nonce(
    public_key: &[u8; 32],
    target_epoch: u64,
    randomness: &[u8; RANDOMNESS_LEN],
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(NONCE_DOMAIN);
    hasher.update(public_key);
    hasher.update(target_epoch.to_be_bytes());
    hasher.update(randomness);
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

pub(crate) fn hex_lower(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_is_deterministic_for_fixed_inputs() {
        let pair = EphemeralKeyPair::from_bytes([7u8; 32]);
        let randomness = [3u8; RANDOMNESS_LEN];
        let first = compute_nonce(&pair.public_key_bytes(), 100, &randomness);
        let second = compute_nonce(&pair.public_key_bytes(), 100, &randomness);
        assert_eq!(first, second);
    }

    #[test]
    fn nonce_changes_with_any_input() {
        let pair = EphemeralKeyPair::from_bytes([7u8; 32]);
        let other = EphemeralKeyPair::from_bytes([8u8; 32]);
        let randomness = [3u8; RANDOMNESS_LEN];
        let base = compute_nonce(&pair.public_key_bytes(), 100, &randomness);

        assert_ne!(
            base,
            compute_nonce(&other.public_key_bytes(), 100, &randomness)
        );
        assert_ne!(
            base,
            compute_nonce(&pair.public_key_bytes(), 101, &randomness)
        );
        assert_ne!(
            base,
            compute_nonce(&pair.public_key_bytes(), 100, &[4u8; RANDOMNESS_LEN])
        );
    }

    #[test]
    fn begin_setup_binds_nonce_to_generated_material() -> Result<(), ZkLoginError> {
        let setup = begin_setup(Provider::Google, 100)?;
        let recomputed = compute_nonce(
            &setup.ephemeral.public_key_bytes(),
            setup.max_epoch,
            &setup.randomness,
        );
        assert_eq!(setup.nonce, recomputed);
        assert_eq!(setup.max_epoch, 100);
        Ok(())
    }

    #[test]
    fn fresh_setups_never_share_material() -> Result<(), ZkLoginError> {
        let first = begin_setup(Provider::Google, 50)?;
        let second = begin_setup(Provider::Google, 50)?;
        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.randomness, second.randomness);
        assert_ne!(
            first.ephemeral.public_key_bytes(),
            second.ephemeral.public_key_bytes()
        );
        Ok(())
    }

    #[test]
    fn signature_verifies_against_public_key() {
        use ed25519_dalek::{Verifier, VerifyingKey};

        let pair = EphemeralKeyPair::from_bytes([9u8; 32]);
        let signature = pair.sign(b"payload");
        let verifying =
            VerifyingKey::from_bytes(&pair.public_key_bytes()).expect("valid public key");
        assert!(verifying.verify(b"payload", &signature).is_ok());
    }

    #[test]
    fn debug_redacts_secret() {
        let pair = EphemeralKeyPair::from_bytes([1u8; 32]);
        let rendered = format!("{pair:?}");
        assert!(rendered.contains("***"));
    }

    #[test]
    fn serde_round_trip_preserves_key() {
        let pair = EphemeralKeyPair::from_bytes([5u8; 32]);
        let json = serde_json::to_string(&pair).expect("serialize");
        let decoded: EphemeralKeyPair = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(pair.public_key_bytes(), decoded.public_key_bytes());
    }
}
