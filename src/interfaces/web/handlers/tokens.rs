use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use super::super::AppState;
use super::super::auth::AuthContext;

#[derive(Deserialize)]
pub struct CreateTokenRequest {
    name: String,
    #[serde(default)]
    plan: Option<String>,
}

/// Mint an API token. Only the operator (internal token, or loopback access
/// before any tokens exist) can do this; bearer callers cannot mint peers.
pub async fn create_token_endpoint(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<CreateTokenRequest>,
) -> axum::response::Response {
    if ctx.caller != "internal" && ctx.caller != "local" {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "success": false, "error": "Token creation requires operator access" })),
        )
            .into_response();
    }

    let plan = payload.plan.as_deref().unwrap_or("pro");
    match state.store.create_api_token(&payload.name, plan).await {
        Ok(token) => Json(serde_json::json!({ "success": true, "token": token })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "success": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}
