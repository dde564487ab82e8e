use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    response::sse::{Event, Sse},
};
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::super::AppState;
use super::super::auth::{AuthContext, plan_allows_analysis};
use crate::core::pipeline::events::EventSink;
use crate::core::pipeline::run_pipeline;
use crate::core::pipeline::types::{CompanyProfile, GenerationOptions, PipelineRun};

/// Sentinel frame closing every analysis stream, success or failure, so the
/// consumer can always detect completion.
const DONE_SENTINEL: &str = "[DONE]";

/// Multipart upload (document + profile + optional options) answered with a
/// live SSE stream of pipeline events. Client disconnects cancel the run
/// cooperatively.
pub async fn analyze_endpoint(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    mut multipart: Multipart,
) -> axum::response::Response {
    if !plan_allows_analysis(&ctx.plan) {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "success": false,
                "error": "Document analysis is not included in this plan"
            })),
        )
            .into_response();
    }

    let mut document: Option<Vec<u8>> = None;
    let mut profile: Option<CompanyProfile> = None;
    let mut options = GenerationOptions::default();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "document" => {
                document = field.bytes().await.ok().map(|b| b.to_vec());
            }
            "profile" => {
                if let Ok(text) = field.text().await {
                    profile = serde_json::from_str(&text).ok();
                }
            }
            "options" => {
                if let Ok(text) = field.text().await {
                    if let Ok(parsed) = serde_json::from_str(&text) {
                        options = parsed;
                    }
                }
            }
            _ => {}
        }
    }

    let Some(bytes) = document else {
        return bad_request("Missing 'document' part");
    };
    let Some(profile) = profile else {
        return bad_request("Missing or invalid 'profile' part");
    };

    let extracted = match state.extractor.extract(&bytes) {
        Ok(doc) => doc,
        Err(e) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "success": false, "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let cancel = CancellationToken::new();
    let run = PipelineRun::new(
        extracted.text,
        bytes.len(),
        profile,
        options,
        ctx.caller,
        ctx.plan,
        cancel.clone(),
    );
    info!("Starting analysis run [{}]", run.run_id);

    let (tx, rx) = tokio::sync::mpsc::channel(EventSink::CHANNEL_CAPACITY);
    let sink = EventSink::new(tx, cancel);
    tokio::spawn(run_pipeline(run, state.cascade.clone(), sink));

    let stream = tokio_stream::wrappers::ReceiverStream::new(rx)
        .map(|event| {
            Event::default().data(serde_json::to_string(&event).unwrap_or_else(|_| "{}".into()))
        })
        .chain(tokio_stream::once(
            Event::default().event("done").data(DONE_SENTINEL),
        ))
        .map(Ok::<_, Infallible>);

    Sse::new(stream).into_response()
}

fn bad_request(message: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "success": false, "error": message })),
    )
        .into_response()
}
