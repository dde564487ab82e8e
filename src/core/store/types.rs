use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Fetching,
    Analyzing,
    Done,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Fetching => "fetching",
            JobStatus::Analyzing => "analyzing",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    pub fn from_status(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(JobStatus::Pending),
            "fetching" => Some(JobStatus::Fetching),
            "analyzing" => Some(JobStatus::Analyzing),
            "done" => Some(JobStatus::Done),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

/// One persisted unit of batch analysis work, keyed by tender id.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisJob {
    pub tender_id: String,
    pub status: JobStatus,
    pub retry_count: u32,
    pub error_message: Option<String>,
    /// JSON analysis payload, set once the job is done.
    pub result: Option<String>,
    pub fetch_method: Option<String>,
    pub size_bytes: Option<i64>,
    /// Submission deadline of the underlying tender; batch ordering key.
    pub tender_deadline: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub analyzed_at: Option<String>,
}
