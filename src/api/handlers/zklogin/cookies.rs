//! Session cookie helpers.
//!
//! The session id is the only thing the client ever holds; it is delivered in
//! an HTTP-only `SameSite=Lax` cookie so scripts cannot read it and
//! cross-site posts do not carry it.

use axum::http::{HeaderMap, HeaderValue, header::InvalidHeaderValue};

use super::state::ZkLoginConfig;

pub(crate) const SESSION_COOKIE_NAME: &str = "session-id";

/// Build the session cookie for a freshly created session.
pub(super) fn session_cookie(
    config: &ZkLoginConfig,
    session_id: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}={session_id}; Path=/; HttpOnly; SameSite=Lax");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Expire the session cookie (logout and session-expired responses).
pub(super) fn clear_session_cookie(
    config: &ZkLoginConfig,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn extract_session_id(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    fn https_config() -> ZkLoginConfig {
        ZkLoginConfig::new("https://esusu.app".to_string(), "0xpkg".to_string())
    }

    #[test]
    fn cookie_is_http_only_lax_and_secure_on_https() {
        let cookie = session_cookie(&https_config(), "sid-1").expect("valid cookie");
        let rendered = cookie.to_str().expect("ascii");
        assert!(rendered.starts_with("session-id=sid-1"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Secure"));
    }

    #[test]
    fn cookie_omits_secure_on_plain_http() {
        let config = ZkLoginConfig::new("http://localhost:3000".to_string(), "0xpkg".to_string());
        let cookie = session_cookie(&config, "sid-1").expect("valid cookie");
        assert!(!cookie.to_str().expect("ascii").contains("Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie(&https_config()).expect("valid cookie");
        assert!(cookie.to_str().expect("ascii").contains("Max-Age=0"));
    }

    #[test]
    fn extract_finds_session_id_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; session-id=abc-123; lang=en"),
        );
        assert_eq!(extract_session_id(&headers), Some("abc-123".to_string()));
    }

    #[test]
    fn extract_ignores_empty_or_missing_cookie() {
        let headers = HeaderMap::new();
        assert_eq!(extract_session_id(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session-id="));
        assert_eq!(extract_session_id(&headers), None);
    }
}
