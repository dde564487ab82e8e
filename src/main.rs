mod config;
mod core;
mod interfaces;

use std::sync::Arc;

use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::core::extract::PlainTextExtractor;
use crate::core::fetch::HttpTenderFetcher;
use crate::core::llm::{GenerationProvider, ProviderCascade};
use crate::core::llm::providers::{GeminiProvider, OpenAiCompatProvider};
use crate::core::store::AnalysisStore;
use crate::interfaces::web::{ApiServer, ApiServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let config = Config::from_env();
    info!("Tenderlens starting on {}:{}", config.api_host, config.api_port);

    let store = Arc::new(AnalysisStore::new(&config.db_path).await?);

    let p = &config.providers;
    let providers: Vec<Arc<dyn GenerationProvider>> = vec![
        Arc::new(OpenAiCompatProvider::new(
            "openai",
            &p.openai_base_url,
            &p.openai_model,
            p.openai_api_key.clone(),
        )),
        Arc::new(OpenAiCompatProvider::new(
            "mistral",
            &p.mistral_base_url,
            &p.mistral_model,
            p.mistral_api_key.clone(),
        )),
        Arc::new(GeminiProvider::new(
            &p.gemini_base_url,
            &p.gemini_model,
            p.gemini_api_key.clone(),
        )),
    ];
    let cascade = Arc::new(ProviderCascade::new(providers));
    for (name, available) in cascade.availability() {
        info!(
            "Provider [{}] {}",
            name,
            if available { "configured" } else { "not configured (skipped)" }
        );
    }

    let server = ApiServer::new(ApiServerConfig {
        store,
        cascade,
        extractor: Arc::new(PlainTextExtractor),
        fetcher: Arc::new(HttpTenderFetcher::new(&config.tender_base_url)),
        batch: config.batch.clone(),
        api_host: config.api_host.clone(),
        api_port: config.api_port,
        internal_token: config.internal_token.clone(),
        cron_secret: config.cron_secret.clone(),
    });
    server.serve().await
}
