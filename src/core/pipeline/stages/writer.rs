use anyhow::{Context, Result};
use tracing::warn;

use crate::core::llm::{CascadeError, ProviderCascade};
use crate::core::pipeline::events::{AnalysisEvent, EventSink};
use crate::core::pipeline::prompts;
use crate::core::pipeline::types::{DraftedSection, PipelineRun};

/// Size of one streamed text chunk. Sections arrive incrementally even
/// though the provider returns them whole.
const CHUNK_CHARS: usize = 600;

/// Draft every identified response section, one cascade call each, strictly
/// sequential to stay under provider rate limits. A failed section is
/// recorded and skipped; the remaining sections are still drafted.
pub async fn run_writer(
    run: &mut PipelineRun,
    cascade: &ProviderCascade,
    events: &EventSink,
) -> Result<()> {
    let parsed = run
        .parsed
        .clone()
        .context("writer requires a parsed document")?;

    for section in &parsed.response_sections {
        if run.cancel.is_cancelled() {
            break;
        }

        let prompt = prompts::writer_prompt(
            section,
            &parsed,
            run.analysis.as_ref(),
            &run.profile,
            &run.options,
        );

        match cascade.run(&prompt, &run.cancel).await {
            Ok(text) => {
                let mut consumer_gone = false;
                for chunk in chunk_text(&text) {
                    let event = AnalysisEvent::SectionChunk {
                        section: section.clone(),
                        text: chunk,
                    };
                    if !events.emit(event).await {
                        consumer_gone = true;
                        break;
                    }
                }
                if consumer_gone {
                    break;
                }

                let word_count = text.split_whitespace().count();
                run.sections.push((
                    section.clone(),
                    DraftedSection {
                        text,
                        word_count,
                        error: None,
                    },
                ));
                let done = AnalysisEvent::SectionDone {
                    section: section.clone(),
                    word_count,
                };
                if !events.emit(done).await {
                    break;
                }
            }
            Err(CascadeError::Canceled) => break,
            Err(e) => {
                warn!("Section [{}] draft failed: {}", section, e);
                run.sections.push((
                    section.clone(),
                    DraftedSection {
                        text: String::new(),
                        word_count: 0,
                        error: Some(e.to_string()),
                    },
                ));
                let failed = AnalysisEvent::SectionFailed {
                    section: section.clone(),
                    message: e.to_string(),
                };
                if !events.emit(failed).await {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn chunk_text(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for para in text.split_inclusive("\n\n") {
        if !current.is_empty() && current.len() + para.len() > CHUNK_CHARS {
            chunks.push(std::mem::take(&mut current));
        }
        if para.len() > CHUNK_CHARS {
            let mut rest = para;
            while rest.len() > CHUNK_CHARS {
                let mut idx = CHUNK_CHARS;
                while !rest.is_char_boundary(idx) {
                    idx -= 1;
                }
                chunks.push(rest[..idx].to_string());
                rest = &rest[idx..];
            }
            current.push_str(rest);
        } else {
            current.push_str(para);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_reassemble_to_original() {
        let text = "para one\n\n".repeat(40) + "tail";
        let chunks = chunk_text(&text);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|c| c.len() <= 2 * CHUNK_CHARS));
    }

    #[test]
    fn oversized_paragraph_is_hard_split() {
        let text = "x".repeat(3 * CHUNK_CHARS);
        let chunks = chunk_text(&text);
        assert_eq!(chunks.concat(), text);
        assert!(chunks.len() >= 3);
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_text("hello"), vec!["hello".to_string()]);
    }
}
