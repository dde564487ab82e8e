use anyhow::{Context, Result};

use super::parse_llm_json;
use crate::core::llm::ProviderCascade;
use crate::core::pipeline::prompts;
use crate::core::pipeline::types::{ParsedDocument, PipelineRun, ReviewReport};

/// Judge completeness and quality of the drafted sections. Failure is
/// degradable; the caller renders the draft without a review.
pub async fn run_reviewer(
    run: &PipelineRun,
    parsed: &ParsedDocument,
    cascade: &ProviderCascade,
) -> Result<ReviewReport> {
    let drafted: Vec<(String, String)> = run
        .sections
        .iter()
        .filter(|(_, s)| s.error.is_none())
        .map(|(name, s)| (name.clone(), s.text.clone()))
        .collect();

    let prompt = prompts::reviewer_prompt(parsed, &drafted);
    let raw = cascade.run(&prompt, &run.cancel).await?;
    let mut review: ReviewReport =
        parse_llm_json(&raw).context("reviewer agent returned malformed output")?;
    review.completeness_score = review.completeness_score.min(100);
    Ok(review)
}
