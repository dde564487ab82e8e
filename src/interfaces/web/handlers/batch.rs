use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::warn;

use super::super::AppState;
use crate::core::batch::run_batch;

/// Triggered by the external cron (shared secret) or by internal tooling
/// (internal token). Runs the backlog loop to completion or deadline and
/// answers with aggregate counts only; per-job error detail lives on the
/// job rows.
pub async fn run_batch_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> axum::response::Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    };

    let internal_ok = header("x-tenderlens-internal-token") == state.internal_token;
    let cron_ok = !state.cron_secret.is_empty() && header("x-cron-secret") == state.cron_secret;
    if !internal_ok && !cron_ok {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Batch trigger requires the internal token or cron secret" })),
        )
            .into_response();
    }

    match run_batch(
        &state.store,
        &state.cascade,
        state.extractor.as_ref(),
        state.fetcher.as_ref(),
        &state.batch,
    )
    .await
    {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => {
            warn!("Batch run failed before the job loop: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "success": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
