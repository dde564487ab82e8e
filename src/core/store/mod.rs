pub mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use rusqlite::{Connection, params};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::info;

pub use types::{AnalysisJob, JobStatus};

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_raw_token() -> String {
    format!("tlk_{}", uuid::Uuid::new_v4().simple())
}

fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnalysisJob> {
    let status_raw: String = row.get(1)?;
    let status = JobStatus::from_status(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown job status: {status_raw}").into(),
        )
    })?;
    Ok(AnalysisJob {
        tender_id: row.get(0)?,
        status,
        retry_count: row.get(2)?,
        error_message: row.get(3)?,
        result: row.get(4)?,
        fetch_method: row.get(5)?,
        size_bytes: row.get(6)?,
        tender_deadline: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        analyzed_at: row.get(10)?,
    })
}

const JOB_COLUMNS: &str = "tender_id, status, retry_count, error_message, result, \
     fetch_method, size_bytes, tender_deadline, created_at, updated_at, analyzed_at";

/// Persistent backlog of analysis jobs plus the API token table, one sqlite
/// file for both.
pub struct AnalysisStore {
    db: Arc<Mutex<Connection>>,
}

impl AnalysisStore {
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db = Connection::open(db_path.as_ref())?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS analysis_jobs (
                tender_id TEXT PRIMARY KEY,
                status TEXT NOT NULL DEFAULT 'pending',
                retry_count INTEGER NOT NULL DEFAULT 0,
                error_message TEXT,
                result TEXT,
                fetch_method TEXT,
                size_bytes INTEGER,
                tender_deadline DATETIME,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                analyzed_at DATETIME
            )",
            [],
        )?;
        db.execute(
            "CREATE INDEX IF NOT EXISTS idx_analysis_jobs_status
             ON analysis_jobs (status, retry_count)",
            [],
        )?;
        db.execute(
            "CREATE TABLE IF NOT EXISTS api_tokens (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                plan TEXT NOT NULL DEFAULT 'pro',
                token_hash TEXT NOT NULL UNIQUE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        info!("Analysis store ready at {:?}", db_path.as_ref());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    // ── Jobs ──

    /// Seed or refresh a backlog entry. Never touches the status of an
    /// existing row, so a done job stays done.
    pub async fn upsert_pending(
        &self,
        tender_id: &str,
        tender_deadline: Option<&str>,
    ) -> Result<()> {
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO analysis_jobs (tender_id, status, tender_deadline)
             VALUES (?1, 'pending', ?2)
             ON CONFLICT(tender_id) DO UPDATE SET
                tender_deadline = excluded.tender_deadline,
                updated_at = CURRENT_TIMESTAMP",
            params![tender_id, tender_deadline],
        )?;
        Ok(())
    }

    /// Jobs the scheduler may pick up: pending, or failed with retries left.
    /// Most urgent tender deadline first; undated tenders go last. Rows in
    /// `fetching`/`analyzing` are deliberately absent from this set.
    pub async fn eligible_jobs(&self, max_retries: u32) -> Result<Vec<AnalysisJob>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT {JOB_COLUMNS} FROM analysis_jobs
             WHERE status = 'pending' OR (status = 'failed' AND retry_count < ?1)
             ORDER BY (tender_deadline IS NULL) ASC, tender_deadline ASC"
        ))?;
        let rows = stmt.query_map(params![max_retries], row_to_job)?;

        let mut jobs = Vec::new();
        for row in rows {
            jobs.push(row?);
        }
        Ok(jobs)
    }

    pub async fn count_eligible(&self, max_retries: u32) -> Result<u64> {
        let db = self.db.lock().await;
        let count: i64 = db.query_row(
            "SELECT COUNT(*) FROM analysis_jobs
             WHERE status = 'pending' OR (status = 'failed' AND retry_count < ?1)",
            params![max_retries],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub async fn get_job(&self, tender_id: &str) -> Result<Option<AnalysisJob>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT {JOB_COLUMNS} FROM analysis_jobs WHERE tender_id = ?1"
        ))?;
        let mut rows = stmt.query_map(params![tender_id], row_to_job)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub async fn mark_fetching(&self, tender_id: &str) -> Result<()> {
        self.set_status(tender_id, JobStatus::Fetching).await
    }

    pub async fn mark_analyzing(
        &self,
        tender_id: &str,
        fetch_method: &str,
        size_bytes: i64,
    ) -> Result<()> {
        let db = self.db.lock().await;
        db.execute(
            "UPDATE analysis_jobs SET status = 'analyzing', fetch_method = ?2,
                size_bytes = ?3, updated_at = CURRENT_TIMESTAMP
             WHERE tender_id = ?1",
            params![tender_id, fetch_method, size_bytes],
        )?;
        Ok(())
    }

    /// Terminal success: stores the result, clears any stale error and
    /// stamps analyzed_at.
    pub async fn mark_done(&self, tender_id: &str, result_json: &str) -> Result<()> {
        let db = self.db.lock().await;
        db.execute(
            "UPDATE analysis_jobs SET status = 'done', result = ?2,
                error_message = NULL, analyzed_at = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
             WHERE tender_id = ?1",
            params![tender_id, result_json],
        )?;
        Ok(())
    }

    /// Records the failure and burns one retry.
    pub async fn mark_failed(&self, tender_id: &str, message: &str) -> Result<()> {
        let db = self.db.lock().await;
        db.execute(
            "UPDATE analysis_jobs SET status = 'failed',
                retry_count = retry_count + 1, error_message = ?2,
                updated_at = CURRENT_TIMESTAMP
             WHERE tender_id = ?1",
            params![tender_id, message],
        )?;
        Ok(())
    }

    async fn set_status(&self, tender_id: &str, status: JobStatus) -> Result<()> {
        let db = self.db.lock().await;
        db.execute(
            "UPDATE analysis_jobs SET status = ?2, updated_at = CURRENT_TIMESTAMP
             WHERE tender_id = ?1",
            params![tender_id, status.as_str()],
        )?;
        Ok(())
    }

    // ── API tokens ──

    pub async fn create_api_token(&self, name: &str, plan: &str) -> Result<String> {
        let raw_token = generate_raw_token();
        let token_hash = hash_token(&raw_token);
        let id = uuid::Uuid::new_v4().to_string();

        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO api_tokens (id, name, plan, token_hash) VALUES (?1, ?2, ?3, ?4)",
            params![id, name, plan, token_hash],
        )?;
        Ok(raw_token)
    }

    /// Returns the plan tier behind a valid token, None otherwise.
    pub async fn validate_api_token(&self, raw_token: &str) -> Result<Option<String>> {
        let token_hash = hash_token(raw_token);
        let db = self.db.lock().await;
        let mut stmt = db.prepare("SELECT plan FROM api_tokens WHERE token_hash = ?1")?;
        let mut rows = stmt.query_map(params![token_hash], |row| row.get::<_, String>(0))?;
        match rows.next() {
            Some(plan) => Ok(Some(plan?)),
            None => Ok(None),
        }
    }

    pub async fn has_any_api_tokens(&self) -> Result<bool> {
        let db = self.db.lock().await;
        let count: i64 = db.query_row("SELECT COUNT(*) FROM api_tokens", [], |row| row.get(0))?;
        Ok(count > 0)
    }
}
