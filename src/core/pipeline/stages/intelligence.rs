use anyhow::{Context, Result};

use super::parse_llm_json;
use crate::core::llm::ProviderCascade;
use crate::core::pipeline::prompts;
use crate::core::pipeline::types::{MarketIntelligence, ParsedDocument, PipelineRun};

/// Enrich the parsed tender with buyer/sector market context. Failure is
/// degradable: the run continues without it.
pub async fn run_intelligence(
    run: &PipelineRun,
    parsed: &ParsedDocument,
    cascade: &ProviderCascade,
) -> Result<MarketIntelligence> {
    let prompt = prompts::intelligence_prompt(parsed);
    let raw = cascade.run(&prompt, &run.cancel).await?;
    parse_llm_json(&raw).context("intelligence agent returned malformed output")
}
