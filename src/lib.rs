//! # Esusu auth (zkLogin authority)
//!
//! `esusu` is the authentication service of the Esusu savings-circle
//! application. It owns the zkLogin protocol end to end: binding an ephemeral
//! signing key to an OAuth identity token through a cryptographic nonce,
//! coordinating the external prover and salt services, deriving the account
//! address, and managing the epoch-bounded session later used to co-sign
//! savings-circle transactions.
//!
//! ## Login flow
//!
//! 1. `beginLogin` generates an ephemeral keypair and blinding randomness,
//!    computes the bound nonce, and returns the provider authorization URL.
//! 2. The provider redirects back with an id token carrying the nonce.
//! 3. `handleCallback` validates the token's structure, fetches the
//!    deterministic per-identity salt, requests a zero-knowledge proof, and
//!    derives the stable account address.
//! 4. `sendTransaction` validates the session against the current network
//!    epoch and submits a transaction under the composite zkLogin signature.
//!
//! ## Trust model
//!
//! The id token's signature is **not** verified locally; the prover service
//! re-verifies it against the issuer's published keys and re-derives the
//! nonce, so a forged or replayed token can never yield a proof. Sessions are
//! server-side only; clients hold an opaque cookie. Ephemeral secret keys are
//! zeroized on session deletion.

pub mod api;
pub mod cli;
pub mod zklogin;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
