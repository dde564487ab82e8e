use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::batch::BatchConfig;

/// One text-generation backend's connection settings. A backend with no
/// API key is registered but reported unavailable, so the cascade skips it.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub mistral_api_key: Option<String>,
    pub mistral_base_url: String,
    pub mistral_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_host: String,
    pub api_port: u16,
    pub db_path: PathBuf,
    /// Shared secret for service-to-service calls (batch trigger, ops tooling).
    pub internal_token: String,
    /// Secret presented by the external cron trigger on /api/batch/run.
    pub cron_secret: String,
    /// URL template for fetching tender documents; `{id}` is substituted.
    pub tender_base_url: String,
    pub providers: ProviderSettings,
    pub batch: BatchConfig,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_secs(key: &str, default: u64) -> Duration {
    let secs = env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}

impl Config {
    pub fn from_env() -> Self {
        let batch = BatchConfig {
            max_duration: env_secs("TENDERLENS_BATCH_MAX_SECS", 300),
            safety_margin: env_secs("TENDERLENS_BATCH_MARGIN_SECS", 10),
            item_cap: env_secs("TENDERLENS_BATCH_ITEM_CAP_SECS", 60),
            pacing_delay: env_secs("TENDERLENS_BATCH_PACING_SECS", 2),
            max_retries: env::var("TENDERLENS_BATCH_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        };

        Self {
            api_host: env_or("TENDERLENS_API_HOST", "127.0.0.1"),
            api_port: env::var("TENDERLENS_API_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7430),
            db_path: PathBuf::from(env_or("TENDERLENS_DB_PATH", "tenderlens.db")),
            internal_token: env_opt("TENDERLENS_INTERNAL_TOKEN")
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            cron_secret: env_or("TENDERLENS_CRON_SECRET", ""),
            tender_base_url: env_or(
                "TENDERLENS_TENDER_BASE_URL",
                "https://www.boamp.fr/telechargements/{id}",
            ),
            providers: ProviderSettings {
                openai_api_key: env_opt("OPENAI_API_KEY"),
                openai_base_url: env_or(
                    "OPENAI_BASE_URL",
                    "https://api.openai.com/v1/chat/completions",
                ),
                openai_model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
                mistral_api_key: env_opt("MISTRAL_API_KEY"),
                mistral_base_url: env_or(
                    "MISTRAL_BASE_URL",
                    "https://api.mistral.ai/v1/chat/completions",
                ),
                mistral_model: env_or("MISTRAL_MODEL", "mistral-large-latest"),
                gemini_api_key: env_opt("GEMINI_API_KEY"),
                gemini_base_url: env_or(
                    "GEMINI_BASE_URL",
                    "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent",
                ),
                gemini_model: env_or("GEMINI_MODEL", "gemini-2.0-flash"),
            },
            batch,
        }
    }
}
