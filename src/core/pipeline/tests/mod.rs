mod driver;

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::core::llm::{GenerationProvider, ProviderCascade};
use crate::core::pipeline::events::{AnalysisEvent, EventSink};
use crate::core::pipeline::run_pipeline;
use crate::core::pipeline::types::{CompanyProfile, GenerationOptions, PipelineRun};

/// Answers one scripted completion per generate call, in order.
pub(crate) struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedProvider {
    pub(crate) fn new(script: Vec<Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
        })
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn available(&self) -> bool {
        true
    }

    async fn generate(
        &self,
        _prompt: &str,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<String> {
        let mut script = self.script.lock().await;
        match script.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow!("{}", message)),
            None => Err(anyhow!("script exhausted")),
        }
    }
}

pub(crate) fn scripted_cascade(script: Vec<Result<String, String>>) -> Arc<ProviderCascade> {
    Arc::new(ProviderCascade::new(vec![ScriptedProvider::new(script)]))
}

pub(crate) fn parser_json(sections: &[&str]) -> String {
    let sections_json: Vec<String> = sections.iter().map(|s| format!("\"{s}\"")).collect();
    format!(
        r#"{{"title": "Road maintenance 2026", "buyer": "City of Lyon",
            "sector": "public works", "deadline": "2026-10-15",
            "summary": "Annual road maintenance framework",
            "response_sections": [{}], "entities": ["Lyon"]}}"#,
        sections_json.join(", ")
    )
}

pub(crate) const INTELLIGENCE_JSON: &str = r#"{"buyer_profile": "mid-size city",
    "sector_trends": "stable", "competitors": ["Colas"], "notes": ""}"#;

pub(crate) const ANALYSIS_JSON: &str = r#"{"fit_score": 81, "go_no_go": "go",
    "strengths": ["regional references"], "risks": ["tight deadline"],
    "summary": "strong fit"}"#;

pub(crate) const REVIEW_JSON: &str = r#"{"completeness_score": 90,
    "issues": [], "verdict": "ready to submit"}"#;

pub(crate) fn test_run(cancel: CancellationToken) -> PipelineRun {
    PipelineRun::new(
        "CONSULTATION REGLEMENT: road maintenance tender".to_string(),
        64,
        CompanyProfile {
            name: "Asphalt SARL".to_string(),
            sector: "public works".to_string(),
            ..CompanyProfile::default()
        },
        GenerationOptions::default(),
        "caller-1".to_string(),
        "pro".to_string(),
        cancel,
    )
}

/// Drive a run to completion while draining the bus; returns the settled
/// run and every event the consumer saw.
pub(crate) async fn run_and_collect(
    run: PipelineRun,
    cascade: Arc<ProviderCascade>,
) -> (PipelineRun, Vec<AnalysisEvent>) {
    let (tx, mut rx) = mpsc::channel(EventSink::CHANNEL_CAPACITY);
    let sink = EventSink::new(tx, run.cancel.clone());
    let handle = tokio::spawn(run_pipeline(run, cascade, sink));

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    let run = handle.await.expect("pipeline task panicked");
    (run, events)
}
