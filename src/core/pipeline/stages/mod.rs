mod analyst;
mod intelligence;
mod parser;
mod reviewer;
mod writer;

pub use analyst::run_analyst;
pub use intelligence::run_intelligence;
pub use parser::run_parser;
pub use reviewer::run_reviewer;
pub use writer::run_writer;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Parse a JSON payload out of a model completion, tolerating markdown code
/// fences and prose around the object.
pub fn parse_llm_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let trimmed = raw.trim();
    let body = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest.trim_end_matches("```").trim()
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest.trim_end_matches("```").trim()
    } else {
        trimmed
    };

    if let Ok(parsed) = serde_json::from_str(body) {
        return Ok(parsed);
    }

    // Fall back to the outermost braces for completions that wrap the
    // object in prose.
    let start = body.find('{');
    let end = body.rfind('}');
    match (start, end) {
        (Some(s), Some(e)) if e > s => {
            serde_json::from_str(&body[s..=e]).context("completion contained malformed JSON")
        }
        _ => anyhow::bail!("completion contained no JSON object"),
    }
}
