use anyhow::{Context, Result};

use super::parse_llm_json;
use crate::core::llm::ProviderCascade;
use crate::core::pipeline::prompts;
use crate::core::pipeline::types::{ParsedDocument, PipelineRun};

/// Normalize the raw tender text into a structured record. The pipeline
/// cannot proceed without it, so a failure here is fatal to the run.
pub async fn run_parser(run: &PipelineRun, cascade: &ProviderCascade) -> Result<ParsedDocument> {
    let prompt = prompts::parser_prompt(&run.document_text, &run.options);
    let raw = cascade.run(&prompt, &run.cancel).await?;
    let mut parsed: ParsedDocument =
        parse_llm_json(&raw).context("parser agent returned malformed output")?;

    if parsed.response_sections.is_empty() {
        // A tender without identified sections still needs a drafted core.
        parsed.response_sections = vec![
            "Company presentation".to_string(),
            "Technical approach".to_string(),
            "Pricing overview".to_string(),
        ];
    }
    Ok(parsed)
}
