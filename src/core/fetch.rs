use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub bytes: Vec<u8>,
    /// Provenance recorded on the job row ("http", "upload", ...).
    pub method: String,
}

#[async_trait]
pub trait TenderFetcher: Send + Sync {
    async fn fetch(&self, tender_id: &str, cancel: &CancellationToken) -> Result<FetchedDocument>;
}

/// Fetches tender dossiers over HTTP from a URL template with an `{id}`
/// placeholder.
pub struct HttpTenderFetcher {
    base_url: String,
    client: Client,
}

impl HttpTenderFetcher {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl TenderFetcher for HttpTenderFetcher {
    async fn fetch(&self, tender_id: &str, cancel: &CancellationToken) -> Result<FetchedDocument> {
        let url = self.base_url.replace("{id}", tender_id);

        let res = tokio::select! {
            res = self.client.get(&url).send() => res?,
            _ = cancel.cancelled() => return Err(anyhow!("fetch canceled")),
        };

        if !res.status().is_success() {
            return Err(anyhow!("tender fetch failed: HTTP {} for {}", res.status(), url));
        }

        let bytes = res.bytes().await?.to_vec();
        Ok(FetchedDocument {
            bytes,
            method: "http".to_string(),
        })
    }
}
