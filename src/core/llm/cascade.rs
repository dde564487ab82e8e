use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::GenerationProvider;

#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("generation canceled")]
    Canceled,
    #[error("no generation provider is configured")]
    NoneAvailable,
    #[error("all generation providers failed (last: {last_error})")]
    Exhausted { last_error: String },
}

/// Ordered fallback across interchangeable generation backends. Unavailable
/// providers are skipped; a failing or empty attempt falls through to the
/// next. Cascading is the retry strategy: no provider is tried twice.
pub struct ProviderCascade {
    providers: Vec<Arc<dyn GenerationProvider>>,
}

impl ProviderCascade {
    pub fn new(providers: Vec<Arc<dyn GenerationProvider>>) -> Self {
        Self { providers }
    }

    /// Availability snapshot in cascade order, for health reporting.
    pub fn availability(&self) -> Vec<(String, bool)> {
        self.providers
            .iter()
            .map(|p| (p.name().to_string(), p.available()))
            .collect()
    }

    pub async fn run(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, CascadeError> {
        let mut last_error: Option<String> = None;

        for provider in &self.providers {
            if cancel.is_cancelled() {
                return Err(CascadeError::Canceled);
            }
            if !provider.available() {
                debug!("Provider [{}] unavailable, skipping", provider.name());
                continue;
            }

            let started = Instant::now();
            match provider.generate(prompt, cancel).await {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(
                        "Provider [{}] succeeded in {}ms",
                        provider.name(),
                        started.elapsed().as_millis()
                    );
                    return Ok(text);
                }
                Ok(_) => {
                    warn!("Provider [{}] returned an empty completion", provider.name());
                    last_error = Some(format!(
                        "{} returned an empty completion",
                        provider.name()
                    ));
                }
                Err(e) => {
                    if cancel.is_cancelled() {
                        return Err(CascadeError::Canceled);
                    }
                    warn!(
                        "Provider [{}] failed after {}ms: {}",
                        provider.name(),
                        started.elapsed().as_millis(),
                        e
                    );
                    last_error = Some(format!("{}: {}", provider.name(), e));
                }
            }
        }

        match last_error {
            Some(last_error) => Err(CascadeError::Exhausted { last_error }),
            None => Err(CascadeError::NoneAvailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;
    use async_trait::async_trait;

    use super::*;

    enum Behavior {
        Succeed(&'static str),
        Empty,
        Fail(&'static str),
    }

    struct FakeProvider {
        name: &'static str,
        available: bool,
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(name: &'static str, available: bool, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                name,
                available,
                behavior,
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationProvider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn available(&self) -> bool {
            self.available
        }

        async fn generate(
            &self,
            _prompt: &str,
            _cancel: &CancellationToken,
        ) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Succeed(text) => Ok(text.to_string()),
                Behavior::Empty => Ok("   ".to_string()),
                Behavior::Fail(msg) => Err(anyhow!("{}", msg)),
            }
        }
    }

    fn cascade_of(providers: &[Arc<FakeProvider>]) -> ProviderCascade {
        ProviderCascade::new(
            providers
                .iter()
                .map(|p| p.clone() as Arc<dyn GenerationProvider>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn first_available_success_wins() {
        let first = FakeProvider::new("first", true, Behavior::Succeed("alpha"));
        let second = FakeProvider::new("second", true, Behavior::Succeed("beta"));
        let cascade = cascade_of(&[first.clone(), second.clone()]);

        let out = cascade
            .run("prompt", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out, "alpha");
        assert_eq!(first.call_count(), 1);
        assert_eq!(second.call_count(), 0);
    }

    #[tokio::test]
    async fn unavailable_then_failing_falls_through_to_next() {
        let skipped = FakeProvider::new("skipped", false, Behavior::Succeed("never"));
        let failing = FakeProvider::new("failing", true, Behavior::Fail("boom"));
        let winner = FakeProvider::new("winner", true, Behavior::Succeed("gamma"));
        let cascade = cascade_of(&[skipped.clone(), failing.clone(), winner.clone()]);

        let out = cascade
            .run("prompt", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out, "gamma");
        assert_eq!(skipped.call_count(), 0);
        assert_eq!(failing.call_count(), 1);
        assert_eq!(winner.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_completion_counts_as_failure() {
        let empty = FakeProvider::new("empty", true, Behavior::Empty);
        let winner = FakeProvider::new("winner", true, Behavior::Succeed("text"));
        let cascade = cascade_of(&[empty.clone(), winner.clone()]);

        let out = cascade
            .run("prompt", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out, "text");
        assert_eq!(empty.call_count(), 1);
    }

    #[tokio::test]
    async fn all_failures_surface_one_aggregate_error_with_last_message() {
        let a = FakeProvider::new("a", true, Behavior::Fail("first error"));
        let b = FakeProvider::new("b", true, Behavior::Fail("second error"));
        let cascade = cascade_of(&[a, b]);

        let err = cascade
            .run("prompt", &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            CascadeError::Exhausted { last_error } => {
                assert!(last_error.contains("second error"), "got: {last_error}");
                assert!(last_error.contains("b:"));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_available_provider_is_its_own_error() {
        let a = FakeProvider::new("a", false, Behavior::Succeed("x"));
        let cascade = cascade_of(&[a.clone()]);

        let err = cascade
            .run("prompt", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CascadeError::NoneAvailable));
        assert_eq!(a.call_count(), 0);
    }

    #[tokio::test]
    async fn pre_canceled_token_invokes_no_provider() {
        let a = FakeProvider::new("a", true, Behavior::Succeed("x"));
        let cascade = cascade_of(&[a.clone()]);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = cascade.run("prompt", &cancel).await.unwrap_err();
        assert!(matches!(err, CascadeError::Canceled));
        assert_eq!(a.call_count(), 0);
    }
}
