//! Conversion job lifecycle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::format::Format;

/// Progress reported once the parser has been entered.
pub const PROGRESS_PARSING: u8 = 25;

/// Progress of a completed job.
pub const PROGRESS_DONE: u8 = 100;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, not started
    Pending,
    /// Parser or renderer running
    Processing,
    /// Output produced
    Completed,
    /// Ended with an error
    Failed,
}

impl JobStatus {
    /// Lowercase name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Completed and failed jobs never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    fn can_move_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Pending, JobStatus::Failed)
                | (JobStatus::Processing, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One conversion request and its state.
///
/// Jobs are created by [`Engine::start`](super::Engine::start) and moved
/// through their states only by the engine. The payload is released once the
/// job reaches a terminal state.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    id: Uuid,
    source: Format,
    target: Format,
    content: Vec<u8>,
    input_bytes: usize,
    status: JobStatus,
    progress: u8,
    error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConversionJob {
    pub(crate) fn new(content: Vec<u8>, source: Format, target: Format) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            source,
            target,
            input_bytes: content.len(),
            content,
            status: JobStatus::Pending,
            progress: 0,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A job whose input arrives in several parts, parsed separately.
    pub(crate) fn for_parts(input_bytes: usize, source: Format, target: Format) -> Self {
        let mut job = Self::new(Vec::new(), source, target);
        job.input_bytes = input_bytes;
        job
    }

    /// Job id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Source format.
    pub fn source(&self) -> Format {
        self.source
    }

    /// Target format.
    pub fn target(&self) -> Format {
        self.target
    }

    /// Input payload (empty once the job has finished).
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Size of the input payload in bytes.
    pub fn input_bytes(&self) -> usize {
        self.input_bytes
    }

    /// Current status.
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Progress percentage, 0-100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Error message, present iff the job failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time of the last transition.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Source and target are the same format.
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }

    /// Content-free view of the job.
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            source: self.source,
            target: self.target,
            status: self.status,
            progress: self.progress,
            error: self.error.clone(),
            input_bytes: self.input_bytes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// pending -> processing, progress 0.
    pub(crate) fn begin(&mut self) -> Result<()> {
        self.transition(JobStatus::Processing)?;
        self.progress = 0;
        Ok(())
    }

    /// Raise progress while processing. Never lowers it and never reaches
    /// 100 before completion.
    pub(crate) fn advance(&mut self, progress: u8) -> Result<()> {
        self.transition(JobStatus::Processing)?;
        self.progress = self.progress.max(progress.min(PROGRESS_DONE - 1));
        Ok(())
    }

    /// processing -> completed, progress 100.
    pub(crate) fn complete(&mut self) -> Result<()> {
        self.transition(JobStatus::Completed)?;
        self.progress = PROGRESS_DONE;
        self.content = Vec::new();
        Ok(())
    }

    /// pending/processing -> failed with a message.
    pub(crate) fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        self.transition(JobStatus::Failed)?;
        let message = message.into();
        self.error = Some(if message.trim().is_empty() {
            "conversion failed".to_string()
        } else {
            message
        });
        self.content = Vec::new();
        Ok(())
    }

    /// Move the payload out, leaving the job empty.
    pub(crate) fn take_content(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.content)
    }

    fn transition(&mut self, next: JobStatus) -> Result<()> {
        if !self.status.can_move_to(next) {
            return Err(Error::InvalidTransition {
                id: self.id,
                status: self.status.to_string(),
                requested: next.to_string(),
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Serializable, content-free copy of a job's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Job id
    pub id: Uuid,
    /// Source format
    pub source: Format,
    /// Target format
    pub target: Format,
    /// Status at the time of the snapshot
    pub status: JobStatus,
    /// Progress percentage, 0-100
    pub progress: u8,
    /// Error message of a failed job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Input size in bytes
    pub input_bytes: usize,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Time of the last transition
    pub updated_at: DateTime<Utc>,
}

impl JobSnapshot {
    /// Check if the job has finished.
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> ConversionJob {
        ConversionJob::new(b"# hi".to_vec(), Format::Markdown, Format::Html)
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = job();
        assert_eq!(job.status(), JobStatus::Pending);
        assert_eq!(job.progress(), 0);
        assert_eq!(job.input_bytes(), 4);
        assert_eq!(job.id().get_version_num(), 4);
        assert!(job.error().is_none());
    }

    #[test]
    fn test_successful_lifecycle() {
        let mut job = job();
        job.begin().unwrap();
        assert_eq!(job.status(), JobStatus::Processing);
        job.advance(PROGRESS_PARSING).unwrap();
        job.advance(10).unwrap();
        assert_eq!(job.progress(), PROGRESS_PARSING);
        job.advance(100).unwrap();
        assert_eq!(job.progress(), 99);
        job.complete().unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.progress(), 100);
        assert!(job.content().is_empty());
        assert!(job.updated_at() >= job.created_at());
    }

    #[test]
    fn test_failed_lifecycle() {
        let mut job = job();
        job.begin().unwrap();
        job.advance(PROGRESS_PARSING).unwrap();
        job.fail("").unwrap();
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.error(), Some("conversion failed"));
        assert!(job.progress() < 100);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut job = job();
        job.begin().unwrap();
        job.complete().unwrap();
        assert!(matches!(job.begin(), Err(Error::InvalidTransition { .. })));
        assert!(matches!(job.fail("late"), Err(Error::InvalidTransition { .. })));
        assert!(job.advance(50).is_err());
        assert_eq!(job.status(), JobStatus::Completed);
        assert!(job.error().is_none());

        let mut failed = ConversionJob::new(Vec::new(), Format::Html, Format::Pdf);
        failed.fail("boom").unwrap();
        assert!(failed.complete().is_err());
        assert_eq!(failed.error(), Some("boom"));
    }

    #[test]
    fn test_cannot_complete_without_processing() {
        let mut job = job();
        assert!(job.complete().is_err());
        assert_eq!(job.status(), JobStatus::Pending);
    }

    #[test]
    fn test_snapshot_serialization() {
        let mut job = job();
        job.begin().unwrap();
        let snapshot = job.snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "processing");
        assert_eq!(json["source"], "markdown");
        assert!(json.get("error").is_none());
        assert!(!snapshot.is_finished());
    }
}
