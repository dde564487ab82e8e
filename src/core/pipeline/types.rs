use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Parser,
    Intelligence,
    Analyst,
    Writer,
    Reviewer,
}

impl AgentKind {
    pub const ALL: [AgentKind; 5] = [
        AgentKind::Parser,
        AgentKind::Intelligence,
        AgentKind::Analyst,
        AgentKind::Writer,
        AgentKind::Reviewer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AgentKind::Parser => "parser",
            AgentKind::Intelligence => "intelligence",
            AgentKind::Analyst => "analyst",
            AgentKind::Writer => "writer",
            AgentKind::Reviewer => "reviewer",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentState {
    Pending,
    Running,
    Done { duration_ms: u64 },
    Error { message: String },
}

impl AgentState {
    pub fn is_settled(&self) -> bool {
        matches!(self, AgentState::Done { .. } | AgentState::Error { .. })
    }
}

/// The bidder's profile uploaded alongside the document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub reference_projects: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub max_sections: Option<usize>,
}

/// Normalized view of the tender produced by the parser agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub title: String,
    #[serde(default)]
    pub buyer: String,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub summary: String,
    /// Sections the response document is expected to contain.
    #[serde(default)]
    pub response_sections: Vec<String>,
    #[serde(default)]
    pub entities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketIntelligence {
    #[serde(default)]
    pub buyer_profile: String,
    #[serde(default)]
    pub sector_trends: String,
    #[serde(default)]
    pub competitors: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenderAnalysis {
    pub fit_score: u8,
    #[serde(default)]
    pub go_no_go: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct DraftedSection {
    pub text: String,
    pub word_count: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewReport {
    pub completeness_score: u8,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub verdict: String,
}

/// State for one interactive analysis invocation. Lives only as long as the
/// response stream; never persisted.
pub struct PipelineRun {
    pub run_id: String,
    pub document_text: String,
    pub size_bytes: usize,
    pub profile: CompanyProfile,
    pub options: GenerationOptions,
    pub caller: String,
    pub plan: String,
    pub cancel: CancellationToken,
    agent_states: HashMap<AgentKind, AgentState>,
    pub parsed: Option<ParsedDocument>,
    pub intelligence: Option<MarketIntelligence>,
    pub analysis: Option<TenderAnalysis>,
    /// Drafted sections in the order the writer produced them.
    pub sections: Vec<(String, DraftedSection)>,
    pub review: Option<ReviewReport>,
}

impl PipelineRun {
    pub fn new(
        document_text: String,
        size_bytes: usize,
        profile: CompanyProfile,
        options: GenerationOptions,
        caller: String,
        plan: String,
        cancel: CancellationToken,
    ) -> Self {
        let agent_states = AgentKind::ALL
            .iter()
            .map(|k| (*k, AgentState::Pending))
            .collect();
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            document_text,
            size_bytes,
            profile,
            options,
            caller,
            plan,
            cancel,
            agent_states,
            parsed: None,
            intelligence: None,
            analysis: None,
            sections: Vec::new(),
            review: None,
        }
    }

    pub fn agent_state(&self, kind: AgentKind) -> &AgentState {
        self.agent_states
            .get(&kind)
            .expect("all agent kinds are seeded at construction")
    }

    pub fn set_agent_state(&mut self, kind: AgentKind, state: AgentState) {
        self.agent_states.insert(kind, state);
    }
}
