use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::extract::DocumentExtractor;
use crate::core::fetch::TenderFetcher;
use crate::core::llm::ProviderCascade;
use crate::core::pipeline::prompts;
use crate::core::pipeline::stages::parse_llm_json;
use crate::core::pipeline::types::TenderAnalysis;
use crate::core::store::AnalysisStore;

#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Wall-clock budget for one invocation; mirrors the host's execution cap.
    pub max_duration: Duration,
    /// Reserved at the end of the budget to flush final job state.
    pub safety_margin: Duration,
    /// Per-job analysis cap.
    pub item_cap: Duration,
    /// Fixed delay between jobs; keeps us under provider requests-per-minute
    /// ceilings without a concurrent limiter.
    pub pacing_delay: Duration,
    /// Poison-pill cutoff: a job failing this many times is never retried.
    pub max_retries: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_secs(300),
            safety_margin: Duration::from_secs(10),
            item_cap: Duration::from_secs(60),
            pacing_delay: Duration::from_secs(2),
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: u64,
    pub failed: u64,
    /// Jobs still eligible when the budget ran out; the next invocation
    /// picks them up.
    pub remaining: u64,
}

/// Work through the backlog until the deadline budget is spent. Strictly
/// sequential; job-level errors are persisted on the row and never abort the
/// loop. Hitting the deadline is a normal exit, not an error.
pub async fn run_batch(
    store: &AnalysisStore,
    cascade: &ProviderCascade,
    extractor: &dyn DocumentExtractor,
    fetcher: &dyn TenderFetcher,
    config: &BatchConfig,
) -> Result<BatchSummary> {
    let started = Instant::now();
    let budget = config.max_duration.saturating_sub(config.safety_margin);
    let function_deadline = started + budget;

    let jobs = store.eligible_jobs(config.max_retries).await?;
    info!(
        "Batch run starting: {} eligible jobs, {}s budget",
        jobs.len(),
        budget.as_secs()
    );

    let mut processed = 0u64;
    let mut failed = 0u64;

    for (idx, job) in jobs.iter().enumerate() {
        if Instant::now() >= function_deadline {
            info!("Batch deadline reached, leaving the rest for the next run");
            break;
        }

        let item_deadline = std::cmp::min(Instant::now() + config.item_cap, function_deadline);
        match process_job(store, cascade, extractor, fetcher, &job.tender_id, item_deadline).await
        {
            Ok(()) => {
                processed += 1;
            }
            Err(e) => {
                warn!("Job [{}] failed: {}", job.tender_id, e);
                store.mark_failed(&job.tender_id, &e.to_string()).await?;
                failed += 1;
            }
        }

        // Pacing goes between jobs, not after the last one.
        if idx + 1 < jobs.len() {
            tokio::time::sleep(config.pacing_delay).await;
        }
    }

    let remaining = store.count_eligible(config.max_retries).await?;
    let summary = BatchSummary {
        processed,
        failed,
        remaining,
    };
    info!(
        "Batch run finished in {}ms: {} processed, {} failed, {} remaining",
        started.elapsed().as_millis(),
        summary.processed,
        summary.failed,
        summary.remaining
    );
    Ok(summary)
}

async fn process_job(
    store: &AnalysisStore,
    cascade: &ProviderCascade,
    extractor: &dyn DocumentExtractor,
    fetcher: &dyn TenderFetcher,
    tender_id: &str,
    item_deadline: Instant,
) -> Result<()> {
    let cancel = CancellationToken::new();

    store.mark_fetching(tender_id).await?;
    let document = fetcher
        .fetch(tender_id, &cancel)
        .await
        .with_context(|| format!("fetching tender {tender_id}"))?;
    let size_bytes = document.bytes.len() as i64;
    let extracted = extractor.extract(&document.bytes)?;

    store
        .mark_analyzing(tender_id, &document.method, size_bytes)
        .await?;

    let remaining = item_deadline.saturating_duration_since(Instant::now());
    let analysis = match tokio::time::timeout(
        remaining,
        single_pass_analysis(cascade, &extracted.text, &cancel),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => {
            // Signal any in-flight provider call, then give up on the item.
            cancel.cancel();
            return Err(anyhow!("analysis exceeded the item deadline"));
        }
    };

    store
        .mark_done(tender_id, &serde_json::to_string(&analysis)?)
        .await?;
    Ok(())
}

/// One condensed generation call instead of the five-stage pipeline; the
/// unattended path trades depth for throughput.
async fn single_pass_analysis(
    cascade: &ProviderCascade,
    document_text: &str,
    cancel: &CancellationToken,
) -> Result<TenderAnalysis> {
    let prompt = prompts::batch_analysis_prompt(document_text);
    let raw = cascade.run(&prompt, cancel).await?;
    let mut analysis: TenderAnalysis =
        parse_llm_json(&raw).context("batch analysis returned malformed output")?;
    analysis.fit_score = analysis.fit_score.min(100);
    Ok(analysis)
}
