//! The multiplexed zkLogin action endpoint.
//!
//! A single `POST /api/zkLogin` drives the whole lifecycle: `beginLogin`,
//! `handleCallback`, `sendTransaction`, and `logout`. The session rides an
//! HTTP-only cookie created on the first unauthenticated begin-login.

mod cookies;
mod flow;
mod state;
mod types;

pub use state::{ZkLoginConfig, ZkLoginState};
pub use types::{
    BeginLoginResponse, CallbackResponse, ErrorResponse, TransactionResponse, ZkLoginAction,
    ZkLoginRequest,
};

use axum::{
    Extension, Json,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, warn};

use crate::zklogin::ZkLoginError;
use crate::zklogin::session::SessionStore;

#[utoipa::path(
    post,
    path = "/api/zkLogin",
    request_body = ZkLoginRequest,
    responses(
        (status = 200, description = "Action completed", body = BeginLoginResponse),
        (status = 204, description = "Logged out"),
        (status = 400, description = "Invalid input, unknown session, or invalid token", body = ErrorResponse),
        (status = 401, description = "Session expired; cookie cleared", body = ErrorResponse),
        (status = 502, description = "Salt service or prover unavailable", body = ErrorResponse),
        (status = 500, description = "Submission or execution failure", body = ErrorResponse)
    ),
    tag = "zklogin"
)]
pub async fn zklogin(
    headers: HeaderMap,
    state: Extension<Arc<ZkLoginState>>,
    Json(request): Json<ZkLoginRequest>,
) -> Response {
    let existing_session = cookies::extract_session_id(&headers);

    match request.action {
        ZkLoginAction::BeginLogin => {
            let Some(provider) = request.provider.as_deref() else {
                return error_response(
                    &state,
                    &ZkLoginError::InvalidInput("missing provider".to_string()),
                );
            };
            // Reuse the cookie's session id so a repeated begin-login replaces
            // the in-flight setup instead of orphaning it.
            let (session_id, fresh_cookie) = match existing_session {
                Some(session_id) => (session_id, false),
                None => (SessionStore::generate_session_id(), true),
            };
            match flow::begin_login(&state, &session_id, provider).await {
                Ok(login_url) => {
                    let mut response =
                        (StatusCode::OK, Json(BeginLoginResponse { login_url })).into_response();
                    if fresh_cookie {
                        match cookies::session_cookie(state.config(), &session_id) {
                            Ok(cookie) => {
                                response.headers_mut().insert(SET_COOKIE, cookie);
                            }
                            Err(err) => error!("Failed to build session cookie: {err}"),
                        }
                    }
                    response
                }
                Err(err) => error_response(&state, &err),
            }
        }
        ZkLoginAction::HandleCallback => {
            let Some(session_id) = existing_session else {
                return error_response(&state, &ZkLoginError::SessionNotFound);
            };
            let Some(jwt) = request.jwt.as_deref() else {
                return error_response(
                    &state,
                    &ZkLoginError::InvalidInput("missing jwt".to_string()),
                );
            };
            match flow::handle_callback(&state, &session_id, jwt).await {
                Ok(callback) => (StatusCode::OK, Json(callback)).into_response(),
                Err(err) => error_response(&state, &err),
            }
        }
        ZkLoginAction::SendTransaction => {
            let Some(session_id) = existing_session else {
                return error_response(&state, &ZkLoginError::SessionNotFound);
            };
            match flow::send_transaction(&state, &session_id, request.circle_data.as_ref()).await {
                Ok(digest) => (StatusCode::OK, Json(TransactionResponse { digest })).into_response(),
                Err(err) => error_response(&state, &err),
            }
        }
        ZkLoginAction::Logout => {
            if let Some(session_id) = existing_session {
                flow::logout(&state, &session_id).await;
            }
            // Always clear the cookie, even if no session record existed.
            let mut response = StatusCode::NO_CONTENT.into_response();
            match cookies::clear_session_cookie(state.config()) {
                Ok(cookie) => {
                    response.headers_mut().insert(SET_COOKIE, cookie);
                }
                Err(err) => error!("Failed to build clearing cookie: {err}"),
            }
            response
        }
    }
}

fn error_response(state: &ZkLoginState, err: &ZkLoginError) -> Response {
    let status = err.status();
    if status.is_server_error() {
        error!("zkLogin action failed: {err}");
    } else {
        warn!("zkLogin action rejected: {err}");
    }

    let body = ErrorResponse {
        error: err.code().to_string(),
        message: err.to_string(),
        retryable: err.retryable(),
    };
    let mut response = (status, Json(body)).into_response();

    // An expired session is gone for good; make the client drop its cookie.
    if matches!(err, ZkLoginError::SessionExpired) {
        match cookies::clear_session_cookie(state.config()) {
            Ok(cookie) => {
                response.headers_mut().insert(SET_COOKIE, cookie);
            }
            Err(cookie_err) => error!("Failed to build clearing cookie: {cookie_err}"),
        }
    }
    response
}
