use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::super::GenerationProvider;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage<'a>>,
}

#[derive(Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Backend speaking the OpenAI chat-completions wire format. Covers OpenAI
/// itself and Mistral, which differ only in base URL, model and key.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(name: &str, base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            model: model.to_string(),
            api_key,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl GenerationProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, prompt: &str, cancel: &CancellationToken) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("{} API key not configured", self.name))?;

        let req = ChatRequest {
            model: &self.model,
            messages: vec![ChatRequestMessage {
                role: "user",
                content: prompt,
            }],
        };

        let request = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&req);

        let res = tokio::select! {
            res = request.send() => res?,
            _ = cancel.cancelled() => return Err(anyhow!("request canceled")),
        };

        if !res.status().is_success() {
            return Err(anyhow!(
                "{} API Error: {}",
                self.name,
                res.text().await.unwrap_or_default()
            ));
        }

        let parsed: ChatResponse = res.json().await?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }
}
