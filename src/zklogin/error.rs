//! Error taxonomy for the zkLogin flow.
//!
//! Every failure path in the protocol maps to one of these variants so the
//! HTTP layer can tell retryable (upstream/network) conditions apart from
//! non-retryable (invalid, expired) ones without string matching.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZkLoginError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("session not found")]
    SessionNotFound,
    #[error("invalid identity token: {0}")]
    InvalidToken(String),
    #[error("salt out of range: {0}")]
    SaltOutOfRange(String),
    #[error("session expired")]
    SessionExpired,
    #[error("salt service unavailable: {0}")]
    SaltServiceUnavailable(String),
    #[error("proof generation failed: {0}")]
    ProofGenerationFailed(String),
    #[error("proof points are missing or empty")]
    InvalidProof,
    #[error("transaction submission failed: {0}")]
    SubmissionFailed(String),
    // The abort reason is passed through unmodified for caller-side diagnosis.
    #[error("transaction execution failed: {0}")]
    ExecutionFailed(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ZkLoginError {
    /// Stable machine-readable code included in error responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::SessionNotFound => "session_not_found",
            Self::InvalidToken(_) => "invalid_token",
            Self::SaltOutOfRange(_) => "salt_out_of_range",
            Self::SessionExpired => "session_expired",
            Self::SaltServiceUnavailable(_) => "salt_service_unavailable",
            Self::ProofGenerationFailed(_) => "proof_generation_failed",
            Self::InvalidProof => "invalid_proof",
            Self::SubmissionFailed(_) => "submission_failed",
            Self::ExecutionFailed(_) => "execution_failed",
            Self::Internal(_) => "internal",
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_)
            | Self::SessionNotFound
            | Self::InvalidToken(_)
            | Self::SaltOutOfRange(_)
            | Self::InvalidProof => StatusCode::BAD_REQUEST,
            Self::SessionExpired => StatusCode::UNAUTHORIZED,
            Self::SaltServiceUnavailable(_) | Self::ProofGenerationFailed(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::SubmissionFailed(_) | Self::ExecutionFailed(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether retrying the same login attempt can succeed.
    ///
    /// Upstream outages are retryable; structural failures and expiry are not.
    #[must_use]
    pub const fn retryable(&self) -> bool {
        matches!(
            self,
            Self::SaltServiceUnavailable(_)
                | Self::ProofGenerationFailed(_)
                | Self::SubmissionFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_taxonomy() {
        assert_eq!(
            ZkLoginError::InvalidInput("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ZkLoginError::SessionNotFound.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ZkLoginError::SessionExpired.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ZkLoginError::SaltServiceUnavailable("down".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ZkLoginError::ProofGenerationFailed("timeout".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ZkLoginError::ExecutionFailed("MoveAbort(3)".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn retryable_only_for_upstream_failures() {
        assert!(ZkLoginError::SaltServiceUnavailable("x".into()).retryable());
        assert!(ZkLoginError::ProofGenerationFailed("x".into()).retryable());
        assert!(ZkLoginError::SubmissionFailed("x".into()).retryable());
        assert!(!ZkLoginError::SessionExpired.retryable());
        assert!(!ZkLoginError::InvalidToken("x".into()).retryable());
        assert!(!ZkLoginError::SaltOutOfRange("0".into()).retryable());
    }

    #[test]
    fn execution_failure_keeps_abort_reason_verbatim() {
        let err = ZkLoginError::ExecutionFailed("MoveAbort(circle::join, 7)".into());
        assert!(err.to_string().contains("MoveAbort(circle::join, 7)"));
    }
}
