use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use super::super::AppState;

#[derive(Deserialize)]
pub struct SeedJobRequest {
    tender_id: String,
    #[serde(default)]
    tender_deadline: Option<String>,
}

/// Seed the batch backlog with a tender to analyze. Idempotent: re-seeding
/// never resets a finished job.
pub async fn seed_job_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<SeedJobRequest>,
) -> axum::response::Response {
    match state
        .store
        .upsert_pending(&payload.tender_id, payload.tender_deadline.as_deref())
        .await
    {
        Ok(()) => Json(serde_json::json!({ "success": true })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "success": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

pub async fn get_job_endpoint(
    State(state): State<AppState>,
    Path(tender_id): Path<String>,
) -> axum::response::Response {
    match state.store.get_job(&tender_id).await {
        Ok(Some(job)) => Json(job).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "success": false, "error": "Job not found" })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "success": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}
