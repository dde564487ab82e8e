pub mod events;
pub mod prompts;
pub mod stages;
pub mod types;

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::core::llm::ProviderCascade;
use events::{AnalysisEvent, EventSink};
use types::{AgentKind, AgentState, PipelineRun};

/// Drive one interactive analysis run through the five agents, emitting
/// progress on the event bus as each settles.
///
/// Stages run strictly in order. Only a parser failure aborts the run;
/// later stages degrade to a partial result. Cancellation is checked before
/// each stage and before each event; once observed the driver stops
/// scheduling work and returns without a terminal event.
pub async fn run_pipeline(
    mut run: PipelineRun,
    cascade: Arc<ProviderCascade>,
    events: EventSink,
) -> PipelineRun {
    let started = Instant::now();
    info!(
        "Pipeline run [{}] started for caller [{}] ({} bytes)",
        run.run_id, run.caller, run.size_bytes
    );

    // ── Parser: fatal on failure ──

    if !begin_stage(&mut run, AgentKind::Parser, &events).await {
        return run;
    }
    let stage_started = Instant::now();
    let parsed = match stages::run_parser(&run, &cascade).await {
        Ok(parsed) => {
            run.parsed = Some(parsed.clone());
            let ready = AnalysisEvent::DocumentParsed {
                document: parsed.clone(),
            };
            if !events.emit(ready).await
                || !settle_ok(&mut run, AgentKind::Parser, stage_started, &events).await
            {
                return run;
            }
            parsed
        }
        Err(e) => {
            if run.cancel.is_cancelled() {
                return run;
            }
            settle_err(&mut run, AgentKind::Parser, e.to_string(), &events).await;
            let terminal = AnalysisEvent::PipelineFailed {
                message: format!("document parsing failed: {e}"),
            };
            events.emit(terminal).await;
            return run;
        }
    };

    // ── Intelligence: degradable ──

    if !begin_stage(&mut run, AgentKind::Intelligence, &events).await {
        return run;
    }
    let stage_started = Instant::now();
    match stages::run_intelligence(&run, &parsed, &cascade).await {
        Ok(intelligence) => {
            run.intelligence = Some(intelligence.clone());
            let ready = AnalysisEvent::IntelligenceReady { intelligence };
            if !events.emit(ready).await
                || !settle_ok(&mut run, AgentKind::Intelligence, stage_started, &events).await
            {
                return run;
            }
        }
        Err(e) => {
            if run.cancel.is_cancelled() {
                return run;
            }
            if !settle_err(&mut run, AgentKind::Intelligence, e.to_string(), &events).await {
                return run;
            }
        }
    }

    // ── Analyst: degradable, consumes stages 1-2 ──

    if !begin_stage(&mut run, AgentKind::Analyst, &events).await {
        return run;
    }
    let stage_started = Instant::now();
    match stages::run_analyst(&run, &parsed, &cascade).await {
        Ok(analysis) => {
            run.analysis = Some(analysis.clone());
            let ready = AnalysisEvent::AnalysisReady { analysis };
            if !events.emit(ready).await
                || !settle_ok(&mut run, AgentKind::Analyst, stage_started, &events).await
            {
                return run;
            }
        }
        Err(e) => {
            if run.cancel.is_cancelled() {
                return run;
            }
            if !settle_err(&mut run, AgentKind::Analyst, e.to_string(), &events).await {
                return run;
            }
        }
    }

    // ── Writer: per-section isolation inside the stage ──

    if !begin_stage(&mut run, AgentKind::Writer, &events).await {
        return run;
    }
    let stage_started = Instant::now();
    match stages::run_writer(&mut run, &cascade, &events).await {
        Ok(()) => {
            if run.cancel.is_cancelled() {
                return run;
            }
            if !settle_ok(&mut run, AgentKind::Writer, stage_started, &events).await {
                return run;
            }
        }
        Err(e) => {
            if !settle_err(&mut run, AgentKind::Writer, e.to_string(), &events).await {
                return run;
            }
        }
    }

    // ── Reviewer: degradable ──

    if !begin_stage(&mut run, AgentKind::Reviewer, &events).await {
        return run;
    }
    let stage_started = Instant::now();
    match stages::run_reviewer(&run, &parsed, &cascade).await {
        Ok(review) => {
            run.review = Some(review.clone());
            let ready = AnalysisEvent::ReviewReady { review };
            if !events.emit(ready).await
                || !settle_ok(&mut run, AgentKind::Reviewer, stage_started, &events).await
            {
                return run;
            }
        }
        Err(e) => {
            if run.cancel.is_cancelled() {
                return run;
            }
            if !settle_err(&mut run, AgentKind::Reviewer, e.to_string(), &events).await {
                return run;
            }
        }
    }

    if run.cancel.is_cancelled() {
        return run;
    }
    let duration_ms = started.elapsed().as_millis() as u64;
    info!("Pipeline run [{}] completed in {}ms", run.run_id, duration_ms);
    events.emit(AnalysisEvent::PipelineDone { duration_ms }).await;
    run
}

async fn begin_stage(run: &mut PipelineRun, kind: AgentKind, events: &EventSink) -> bool {
    if run.cancel.is_cancelled() {
        return false;
    }
    run.set_agent_state(kind, AgentState::Running);
    events.emit(AnalysisEvent::AgentStarted { agent: kind }).await
}

async fn settle_ok(
    run: &mut PipelineRun,
    kind: AgentKind,
    stage_started: Instant,
    events: &EventSink,
) -> bool {
    let duration_ms = stage_started.elapsed().as_millis() as u64;
    run.set_agent_state(kind, AgentState::Done { duration_ms });
    events
        .emit(AnalysisEvent::AgentFinished {
            agent: kind,
            duration_ms,
        })
        .await
}

async fn settle_err(
    run: &mut PipelineRun,
    kind: AgentKind,
    message: String,
    events: &EventSink,
) -> bool {
    run.set_agent_state(
        kind,
        AgentState::Error {
            message: message.clone(),
        },
    );
    events
        .emit(AnalysisEvent::AgentFailed {
            agent: kind,
            message,
        })
        .await
}

#[cfg(test)]
mod tests;
