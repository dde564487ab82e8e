use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::super::GenerationProvider;

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiResContent,
}

#[derive(Deserialize)]
struct GeminiResContent {
    parts: Vec<GeminiResPart>,
}

#[derive(Deserialize)]
struct GeminiResPart {
    text: String,
}

/// Gemini backend. The API key travels as a query parameter and the model id
/// is substituted into the URL.
pub struct GeminiProvider {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl GeminiProvider {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.to_string(),
            model: model.to_string(),
            api_key,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, prompt: &str, cancel: &CancellationToken) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("Gemini API key not configured"))?;

        let req = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let base = self.base_url.replace("{model}", &self.model);
        let url = format!("{}?key={}", base, api_key);

        let res = tokio::select! {
            res = self.client.post(&url).json(&req).send() => res?,
            _ = cancel.cancelled() => return Err(anyhow!("request canceled")),
        };

        if !res.status().is_success() {
            return Err(anyhow!(
                "Gemini API Error: {}",
                res.text().await.unwrap_or_default()
            ));
        }

        let parsed: GeminiResponse = res.json().await?;
        Ok(parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default())
    }
}
