//! Client for the external deterministic-salt service.
//!
//! The service returns the same salt for the same (sub, aud) identity on
//! every call; address stability across logins depends on it. This client
//! only enforces the range contract and surfaces outages, it never retries.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{error, instrument};

use super::error::ZkLoginError;

pub const DEFAULT_SALT_TIMEOUT_SECONDS: u64 = 10;

/// Source of deterministic per-identity salts.
#[async_trait]
pub trait SaltService: Send + Sync {
    /// Fetch the salt for the identity carried in `jwt`.
    async fn get_salt(&self, jwt: &str) -> Result<SaltGrant, ZkLoginError>;
}

/// Raw wire response from `POST /get-salt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SaltResponse {
    salt: String,
    #[serde(default)]
    exp: i64,
    #[serde(default)]
    iat: i64,
}

/// A validated salt grant: the decimal salt parsed into range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaltGrant {
    pub salt: u128,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone)]
pub struct SaltClient {
    client: Client,
    base_url: String,
}

impl SaltClient {
    /// # Errors
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ZkLoginError> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| ZkLoginError::Internal(format!("salt client build failed: {err}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SaltService for SaltClient {
    /// Fetch the deterministic salt for the identity carried in `jwt`.
    ///
    /// `SaltServiceUnavailable` on network failure or non-success status,
    /// `SaltOutOfRange` when the returned salt violates `0 < salt <= 2^128-1`.
    #[instrument(skip_all)]
    async fn get_salt(&self, jwt: &str) -> Result<SaltGrant, ZkLoginError> {
        let url = format!("{}/get-salt", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "token": jwt }))
            .send()
            .await
            .map_err(|err| {
                error!("Salt service request failed: {err}");
                ZkLoginError::SaltServiceUnavailable(err.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body: Value = response.json().await.unwrap_or_default();
            let message = service_error_message(&body);
            error!("Salt service returned {status}: {message}");
            return Err(ZkLoginError::SaltServiceUnavailable(format!(
                "{status}, {message}"
            )));
        }

        let body: SaltResponse = response.json().await.map_err(|err| {
            error!("Salt service returned malformed body: {err}");
            ZkLoginError::SaltServiceUnavailable(err.to_string())
        })?;

        let salt = parse_salt(&body.salt)?;
        Ok(SaltGrant {
            salt,
            exp: body.exp,
            iat: body.iat,
        })
    }
}

/// Enforce the client-side range contract `0 < salt <= 2^128 - 1`.
///
/// A salt outside this range is a service-integrity failure, not retried.
///
/// # Errors
/// Returns `SaltOutOfRange` for zero, non-decimal, or oversized values.
pub fn parse_salt(decimal: &str) -> Result<u128, ZkLoginError> {
    let trimmed = decimal.trim();
    let salt = trimmed
        .parse::<u128>()
        .map_err(|_| ZkLoginError::SaltOutOfRange(trimmed.to_string()))?;
    if salt == 0 {
        return Err(ZkLoginError::SaltOutOfRange(trimmed.to_string()));
    }
    Ok(salt)
}

fn service_error_message(body: &Value) -> &str {
    body.get("error")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_salt_accepts_full_range() -> Result<(), ZkLoginError> {
        assert_eq!(parse_salt("1")?, 1);
        assert_eq!(parse_salt(" 42 ")?, 42);
        // 2^128 - 1 is the inclusive upper bound.
        assert_eq!(
            parse_salt("340282366920938463463374607431768211455")?,
            u128::MAX
        );
        Ok(())
    }

    #[test]
    fn parse_salt_rejects_zero() {
        assert!(matches!(
            parse_salt("0"),
            Err(ZkLoginError::SaltOutOfRange(_))
        ));
    }

    #[test]
    fn parse_salt_rejects_overflow_and_garbage() {
        // 2^128 exactly, one past the bound.
        assert!(matches!(
            parse_salt("340282366920938463463374607431768211456"),
            Err(ZkLoginError::SaltOutOfRange(_))
        ));
        assert!(matches!(
            parse_salt("-5"),
            Err(ZkLoginError::SaltOutOfRange(_))
        ));
        assert!(matches!(
            parse_salt("not-a-number"),
            Err(ZkLoginError::SaltOutOfRange(_))
        ));
    }

    #[test]
    fn parse_salt_is_deterministic() -> Result<(), ZkLoginError> {
        assert_eq!(parse_salt("123456789")?, parse_salt("123456789")?);
        Ok(())
    }

    #[test]
    fn service_error_message_walks_known_fields() {
        let body = json!({ "error": "bad token" });
        assert_eq!(service_error_message(&body), "bad token");
        let body = json!({ "message": "overloaded" });
        assert_eq!(service_error_message(&body), "overloaded");
        assert_eq!(service_error_message(&json!({})), "");
    }

    #[test]
    fn client_normalizes_trailing_slash() -> Result<(), ZkLoginError> {
        let client = SaltClient::new(
            "http://localhost:5002/".to_string(),
            Duration::from_secs(1),
        )?;
        assert_eq!(client.base_url, "http://localhost:5002");
        Ok(())
    }
}
