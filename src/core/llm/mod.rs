mod cascade;
pub mod providers;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use cascade::{CascadeError, ProviderCascade};

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Whether credentials/config for this backend are present.
    fn available(&self) -> bool;

    /// Execute one prompt against the backend. Implementations must stop
    /// waiting on the request once `cancel` fires.
    async fn generate(&self, prompt: &str, cancel: &CancellationToken) -> Result<String>;
}
