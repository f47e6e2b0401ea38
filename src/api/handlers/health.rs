use axum::{
    Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::GIT_COMMIT_HASH;

use super::zklogin::ZkLoginState;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    chain: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Chain RPC endpoint is reachable", body = Health),
        (status = 503, description = "Chain RPC endpoint is unreachable", body = Health)
    ),
    tag = "health"
)]
pub async fn health(state: Extension<Arc<ZkLoginState>>) -> impl IntoResponse {
    let chain = match state.chain().current_epoch().await {
        Ok(_) => "ok",
        Err(err) => {
            error!("Chain health probe failed: {err}");
            "error"
        }
    };

    let status = if chain == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chain: chain.to_string(),
    };

    (status, Json(body))
}
