use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies exactly one backend job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle {
    task_id: String,
}

impl JobHandle {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.task_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Started,
    Success,
    /// The backend reported that the job itself failed.
    Failure,
    /// The status channel failed; the job's real state is unknown.
    PollError,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Success | JobStatus::Failure | JobStatus::PollError
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Started => "Running",
            JobStatus::Success => "Success",
            JobStatus::Failure => "Failed",
            JobStatus::PollError => "Status unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: JobStatus,
    /// Always within `0..=100`.
    pub progress_percent: u8,
    pub current_step: Option<String>,
    pub processed_count: Option<u64>,
    pub total_to_process: Option<u64>,
    pub result_summary: Option<String>,
    pub error_message: Option<String>,
    /// Raw failure payload reported by the backend, kept for display.
    pub failure_detail: Option<serde_json::Value>,
}

impl StatusSnapshot {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            progress_percent: if status == JobStatus::Success { 100 } else { 0 },
            current_step: None,
            processed_count: None,
            total_to_process: None,
            result_summary: None,
            error_message: None,
            failure_detail: None,
        }
    }

    /// Terminal snapshot for a failed status query.
    ///
    /// Progress information from `previous` is carried over so the display does
    /// not jump back to zero.
    pub fn poll_error(previous: Option<&StatusSnapshot>, message: impl Into<String>) -> Self {
        let mut snapshot = previous.cloned().unwrap_or_else(|| Self::new(JobStatus::Pending));
        snapshot.status = JobStatus::PollError;
        snapshot.error_message = Some(message.into());
        snapshot.failure_detail = None;
        snapshot
    }

    pub fn with_progress(mut self, percent: i64) -> Self {
        self.progress_percent = percent.clamp(0, 100) as u8;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
