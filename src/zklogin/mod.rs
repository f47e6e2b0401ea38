//! zkLogin protocol core.
//!
//! The multi-party flow in one place: nonce binding, provider redirect URLs,
//! id-token validation, salt and proof acquisition, address derivation,
//! session ownership, and composite transaction signing. The HTTP layer in
//! [`crate::api`] orchestrates these pieces per request; nothing here touches
//! cookies or status codes.
//!
//! Ordering matters: a login begins with [`nonce::begin_setup`], whose nonce
//! rides through the provider redirect inside the id token. The prover will
//! only produce a proof if it can re-derive that nonce from the ephemeral
//! key, randomness, and epoch it is handed, which is what makes the token
//! replay-resistant and epoch-bounded.

pub mod address;
pub mod chain;
pub mod error;
pub mod jwt;
pub mod nonce;
pub mod oauth;
pub mod prover;
pub mod salt;
pub mod session;
pub mod signer;

pub use error::ZkLoginError;
