use anyhow::{Context, Result};

use super::parse_llm_json;
use crate::core::llm::ProviderCascade;
use crate::core::pipeline::prompts;
use crate::core::pipeline::types::{ParsedDocument, PipelineRun, TenderAnalysis};

/// Score the fit between the company profile and the tender. Works with or
/// without market intelligence.
pub async fn run_analyst(
    run: &PipelineRun,
    parsed: &ParsedDocument,
    cascade: &ProviderCascade,
) -> Result<TenderAnalysis> {
    let prompt = prompts::analyst_prompt(parsed, run.intelligence.as_ref(), &run.profile);
    let raw = cascade.run(&prompt, &run.cancel).await?;
    let mut analysis: TenderAnalysis =
        parse_llm_json(&raw).context("analyst agent returned malformed output")?;
    analysis.fit_score = analysis.fit_score.min(100);
    Ok(analysis)
}
