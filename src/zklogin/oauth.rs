//! Supported identity providers and authorization-request URLs.
//!
//! Every provider embeds the same `nonce` parameter so the id token it issues
//! is bound to the ephemeral key from [`super::nonce::begin_setup`].

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::ZkLoginError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Facebook,
    Apple,
}

impl Provider {
    /// Parse a provider name from a request body.
    ///
    /// # Errors
    /// Unknown names are an invalid-input error, never a panic.
    pub fn parse(name: &str) -> Result<Self, ZkLoginError> {
        match name.trim().to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "facebook" => Ok(Self::Facebook),
            "apple" => Ok(Self::Apple),
            other => Err(ZkLoginError::InvalidInput(format!(
                "unsupported provider: {other}"
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Facebook => "facebook",
            Self::Apple => "apple",
        }
    }

    const fn authorization_endpoint(self) -> &'static str {
        match self {
            Self::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Self::Facebook => "https://www.facebook.com/v17.0/dialog/oauth",
            Self::Apple => "https://appleid.apple.com/auth/authorize",
        }
    }

    const fn scope(self) -> &'static str {
        match self {
            Self::Google => "openid email profile",
            Self::Facebook | Self::Apple => "openid email",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-provider client registration plus the shared callback URL.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    redirect_uri: String,
    google_client_id: Option<String>,
    facebook_client_id: Option<String>,
    apple_client_id: Option<String>,
}

impl OAuthConfig {
    #[must_use]
    pub fn new(redirect_uri: String) -> Self {
        Self {
            redirect_uri,
            google_client_id: None,
            facebook_client_id: None,
            apple_client_id: None,
        }
    }

    #[must_use]
    pub fn with_google_client_id(mut self, client_id: Option<String>) -> Self {
        self.google_client_id = client_id;
        self
    }

    #[must_use]
    pub fn with_facebook_client_id(mut self, client_id: Option<String>) -> Self {
        self.facebook_client_id = client_id;
        self
    }

    #[must_use]
    pub fn with_apple_client_id(mut self, client_id: Option<String>) -> Self {
        self.apple_client_id = client_id;
        self
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    fn client_id(&self, provider: Provider) -> Result<&str, ZkLoginError> {
        let client_id = match provider {
            Provider::Google => self.google_client_id.as_deref(),
            Provider::Facebook => self.facebook_client_id.as_deref(),
            Provider::Apple => self.apple_client_id.as_deref(),
        };
        client_id.ok_or_else(|| {
            ZkLoginError::InvalidInput(format!("provider not configured: {provider}"))
        })
    }
}

/// Build the provider-specific authorization URL embedding the nonce.
///
/// Pure function of its inputs; the only failure modes are an unsupported or
/// unconfigured provider.
///
/// # Errors
/// Returns `InvalidInput` when the provider has no registered client id.
pub fn build_login_url(
    config: &OAuthConfig,
    provider: Provider,
    nonce: &str,
) -> Result<String, ZkLoginError> {
    let client_id = config.client_id(provider)?;
    let mut url = Url::parse(provider.authorization_endpoint())
        .map_err(|err| ZkLoginError::Internal(format!("bad authorization endpoint: {err}")))?;

    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("response_type", "id_token")
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("scope", provider.scope())
        .append_pair("nonce", nonce);

    Ok(url.into())
}
