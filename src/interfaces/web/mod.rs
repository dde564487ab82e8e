pub(crate) mod auth;
mod handlers;
mod router;

use anyhow::Result;
use axum::{Json, extract::State, response::IntoResponse};
use std::sync::Arc;
use tracing::info;

use crate::core::batch::BatchConfig;
use crate::core::extract::DocumentExtractor;
use crate::core::fetch::TenderFetcher;
use crate::core::llm::ProviderCascade;
use crate::core::store::AnalysisStore;

pub struct ApiServer {
    store: Arc<AnalysisStore>,
    cascade: Arc<ProviderCascade>,
    extractor: Arc<dyn DocumentExtractor>,
    fetcher: Arc<dyn TenderFetcher>,
    batch: BatchConfig,
    api_host: String,
    api_port: u16,
    internal_token: String,
    cron_secret: String,
}

pub struct ApiServerConfig {
    pub store: Arc<AnalysisStore>,
    pub cascade: Arc<ProviderCascade>,
    pub extractor: Arc<dyn DocumentExtractor>,
    pub fetcher: Arc<dyn TenderFetcher>,
    pub batch: BatchConfig,
    pub api_host: String,
    pub api_port: u16,
    pub internal_token: String,
    pub cron_secret: String,
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<AnalysisStore>,
    pub(crate) cascade: Arc<ProviderCascade>,
    pub(crate) extractor: Arc<dyn DocumentExtractor>,
    pub(crate) fetcher: Arc<dyn TenderFetcher>,
    pub(crate) batch: BatchConfig,
    pub(crate) api_host: String,
    pub(crate) api_port: u16,
    pub(crate) internal_token: String,
    pub(crate) cron_secret: String,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig) -> Self {
        Self {
            store: config.store,
            cascade: config.cascade,
            extractor: config.extractor,
            fetcher: config.fetcher,
            batch: config.batch,
            api_host: config.api_host,
            api_port: config.api_port,
            internal_token: config.internal_token,
            cron_secret: config.cron_secret,
        }
    }

    pub async fn serve(self) -> Result<()> {
        let addr = format!("{}:{}", self.api_host, self.api_port);
        let state = AppState {
            store: self.store,
            cascade: self.cascade,
            extractor: self.extractor,
            fetcher: self.fetcher,
            batch: self.batch,
            api_host: self.api_host,
            api_port: self.api_port,
            internal_token: self.internal_token,
            cron_secret: self.cron_secret,
        };
        let app = router::build_api_router(state);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("API Server running at http://{addr}");
        axum::serve(listener, app).await?;
        Ok(())
    }
}

// --- Health (used by router) ---

async fn health_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let providers: Vec<serde_json::Value> = state
        .cascade
        .availability()
        .into_iter()
        .map(|(name, available)| serde_json::json!({ "name": name, "available": available }))
        .collect();

    Json(serde_json::json!({
        "status": "ok",
        "providers": providers,
    }))
}
