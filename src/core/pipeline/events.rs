use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::types::{
    AgentKind, MarketIntelligence, ParsedDocument, ReviewReport, TenderAnalysis,
};

/// One frame of pipeline progress. Serialized as a tagged JSON object and
/// framed onto the live connection by the transport layer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisEvent {
    AgentStarted {
        agent: AgentKind,
    },
    AgentFinished {
        agent: AgentKind,
        duration_ms: u64,
    },
    AgentFailed {
        agent: AgentKind,
        message: String,
    },
    DocumentParsed {
        document: ParsedDocument,
    },
    IntelligenceReady {
        intelligence: MarketIntelligence,
    },
    AnalysisReady {
        analysis: TenderAnalysis,
    },
    SectionChunk {
        section: String,
        text: String,
    },
    SectionDone {
        section: String,
        word_count: usize,
    },
    SectionFailed {
        section: String,
        message: String,
    },
    ReviewReady {
        review: ReviewReport,
    },
    PipelineDone {
        duration_ms: u64,
    },
    PipelineFailed {
        message: String,
    },
}

/// Single-producer side of the event bus. A send failing means the consumer
/// hung up, which is treated the same as an explicit cancellation.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<AnalysisEvent>,
    cancel: CancellationToken,
}

impl EventSink {
    pub const CHANNEL_CAPACITY: usize = 32;

    pub fn new(tx: mpsc::Sender<AnalysisEvent>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }

    /// Emit one event. Returns false once the run is canceled or the
    /// consumer has disconnected; callers stop scheduling work on false.
    pub async fn emit(&self, event: AnalysisEvent) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        if self.tx.send(event).await.is_err() {
            self.cancel.cancel();
            return false;
        }
        true
    }
}
