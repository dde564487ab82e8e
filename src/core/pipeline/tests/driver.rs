use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::core::pipeline::types::{AgentKind, AgentState};

#[tokio::test]
async fn happy_path_settles_every_agent_and_emits_terminal_done() {
    let sections = ["Company presentation", "Technical approach"];
    let cascade = scripted_cascade(vec![
        Ok(parser_json(&sections)),
        Ok(INTELLIGENCE_JSON.to_string()),
        Ok(ANALYSIS_JSON.to_string()),
        Ok("We present our company.".to_string()),
        Ok("Our technical approach is sound.".to_string()),
        Ok(REVIEW_JSON.to_string()),
    ]);

    let (run, events) = run_and_collect(test_run(CancellationToken::new()), cascade).await;

    for kind in AgentKind::ALL {
        assert!(
            matches!(run.agent_state(kind), AgentState::Done { .. }),
            "agent {:?} not done: {:?}",
            kind,
            run.agent_state(kind)
        );
    }
    assert!(run.parsed.is_some());
    assert!(run.intelligence.is_some());
    assert!(run.analysis.is_some());
    assert_eq!(run.sections.len(), 2);
    assert!(run.review.is_some());

    assert!(matches!(
        events.last(),
        Some(AnalysisEvent::PipelineDone { .. })
    ));
}

#[tokio::test]
async fn parser_failure_short_circuits_the_whole_run() {
    let cascade = scripted_cascade(vec![Err("model refused".to_string())]);

    let (run, events) = run_and_collect(test_run(CancellationToken::new()), cascade).await;

    assert!(matches!(
        run.agent_state(AgentKind::Parser),
        AgentState::Error { .. }
    ));
    for kind in [
        AgentKind::Intelligence,
        AgentKind::Analyst,
        AgentKind::Writer,
        AgentKind::Reviewer,
    ] {
        assert_eq!(*run.agent_state(kind), AgentState::Pending);
    }

    assert!(matches!(
        events.last(),
        Some(AnalysisEvent::PipelineFailed { .. })
    ));
    let started: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            AnalysisEvent::AgentStarted { agent } => Some(*agent),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec![AgentKind::Parser]);
}

#[tokio::test]
async fn intelligence_failure_degrades_but_run_still_completes() {
    let sections = ["Company presentation"];
    let cascade = scripted_cascade(vec![
        Ok(parser_json(&sections)),
        Err("market feed down".to_string()),
        Ok(ANALYSIS_JSON.to_string()),
        Ok("Draft text.".to_string()),
        Ok(REVIEW_JSON.to_string()),
    ]);

    let (run, events) = run_and_collect(test_run(CancellationToken::new()), cascade).await;

    assert!(matches!(
        run.agent_state(AgentKind::Intelligence),
        AgentState::Error { .. }
    ));
    assert!(run.intelligence.is_none());
    // Analyst still ran, without market context.
    assert!(matches!(
        run.agent_state(AgentKind::Analyst),
        AgentState::Done { .. }
    ));
    assert!(run.analysis.is_some());
    assert!(matches!(
        events.last(),
        Some(AnalysisEvent::PipelineDone { .. })
    ));
}

#[tokio::test]
async fn one_failing_section_does_not_abort_the_others() {
    let sections = ["S1", "S2", "S3", "S4", "S5"];
    let cascade = scripted_cascade(vec![
        Ok(parser_json(&sections)),
        Ok(INTELLIGENCE_JSON.to_string()),
        Ok(ANALYSIS_JSON.to_string()),
        Ok("Draft one.".to_string()),
        Ok("Draft two.".to_string()),
        Err("rate limited".to_string()),
        Ok("Draft four.".to_string()),
        Ok("Draft five.".to_string()),
        Ok(REVIEW_JSON.to_string()),
    ]);

    let (run, events) = run_and_collect(test_run(CancellationToken::new()), cascade).await;

    let done_count = events
        .iter()
        .filter(|e| matches!(e, AnalysisEvent::SectionDone { .. }))
        .count();
    let failed_count = events
        .iter()
        .filter(|e| matches!(e, AnalysisEvent::SectionFailed { .. }))
        .count();
    assert_eq!(done_count, 4);
    assert_eq!(failed_count, 1);

    assert_eq!(run.sections.len(), 5);
    assert_eq!(run.sections.iter().filter(|(_, s)| s.error.is_some()).count(), 1);
    let (name, broken) = run
        .sections
        .iter()
        .find(|(_, s)| s.error.is_some())
        .expect("one section marked error");
    assert_eq!(name, "S3");
    assert_eq!(broken.word_count, 0);

    assert!(matches!(
        run.agent_state(AgentKind::Writer),
        AgentState::Done { .. }
    ));
    assert!(matches!(
        events.last(),
        Some(AnalysisEvent::PipelineDone { .. })
    ));
}

#[tokio::test]
async fn pre_canceled_run_emits_nothing() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let cascade = scripted_cascade(vec![Ok(parser_json(&["S1"]))]);

    let (run, events) = run_and_collect(test_run(cancel), cascade).await;

    assert!(events.is_empty());
    assert_eq!(*run.agent_state(AgentKind::Parser), AgentState::Pending);
}

#[tokio::test]
async fn consumer_disconnect_cancels_the_run_without_terminal_event() {
    let sections = ["S1", "S2"];
    let cascade = scripted_cascade(vec![
        Ok(parser_json(&sections)),
        Ok(INTELLIGENCE_JSON.to_string()),
        Ok(ANALYSIS_JSON.to_string()),
        Ok("Draft one.".to_string()),
        Ok("Draft two.".to_string()),
        Ok(REVIEW_JSON.to_string()),
    ]);

    let run = test_run(CancellationToken::new());
    let cancel = run.cancel.clone();
    let (tx, rx) = mpsc::channel(EventSink::CHANNEL_CAPACITY);
    let sink = EventSink::new(tx, cancel.clone());
    // Hang up before the first event is delivered.
    drop(rx);

    let run = tokio::spawn(run_pipeline(run, cascade, sink))
        .await
        .expect("pipeline task panicked");

    assert!(cancel.is_cancelled());
    assert!(run.review.is_none());
}
