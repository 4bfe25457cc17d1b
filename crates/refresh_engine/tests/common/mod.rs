#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, Once};
use std::time::Duration;

use refresh_core::{
    ChannelSummary, JobHandle, JobSpec, JobStatus, StatusSnapshot, SubmissionError,
};
use refresh_engine::{BackendError, JobBackend, SubmissionAck};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(refresh_logging::initialize_for_tests);
}

/// In-memory backend that replays scripted responses.
///
/// Status queries for a task pop the next scripted result; once the script
/// runs out the task reports `Pending` forever.
#[derive(Default)]
pub struct ScriptedBackend {
    submissions: Mutex<VecDeque<Result<SubmissionAck, SubmissionError>>>,
    statuses: Mutex<HashMap<String, VecDeque<Result<StatusSnapshot, BackendError>>>>,
    channels: Mutex<Option<Result<Vec<ChannelSummary>, BackendError>>>,
    query_delay: Duration,
    submitted: Mutex<Vec<JobSpec>>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = delay;
        self
    }

    pub fn accept(self, task_id: &str) -> Self {
        self.submissions.lock().unwrap().push_back(Ok(SubmissionAck {
            handle: JobHandle::new(task_id),
            message: Some("started".to_string()),
            details: None,
        }));
        self
    }

    pub fn reject(self, error: SubmissionError) -> Self {
        self.submissions.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn status(self, task_id: &str, result: Result<StatusSnapshot, BackendError>) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .entry(task_id.to_string())
            .or_default()
            .push_back(result);
        self
    }

    pub fn channels(self, result: Result<Vec<ChannelSummary>, BackendError>) -> Self {
        *self.channels.lock().unwrap() = Some(result);
        self
    }

    pub fn submitted(&self) -> Vec<JobSpec> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn queries_for(&self, task_id: &str) -> usize {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == task_id)
            .count()
    }
}

#[async_trait::async_trait]
impl JobBackend for ScriptedBackend {
    async fn submit_job(&self, spec: &JobSpec) -> Result<SubmissionAck, SubmissionError> {
        self.submitted.lock().unwrap().push(spec.clone());
        let next = self.submissions.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(SubmissionAck {
            handle: JobHandle::new("unscripted"),
            message: None,
            details: None,
        }))
    }

    async fn query_job_status(&self, handle: &JobHandle) -> Result<StatusSnapshot, BackendError> {
        self.queries
            .lock()
            .unwrap()
            .push(handle.task_id().to_string());
        if !self.query_delay.is_zero() {
            tokio::time::sleep(self.query_delay).await;
        }
        let next = self
            .statuses
            .lock()
            .unwrap()
            .get_mut(handle.task_id())
            .and_then(VecDeque::pop_front);
        next.unwrap_or_else(|| Ok(StatusSnapshot::new(JobStatus::Pending)))
    }

    async fn fetch_channels(&self) -> Result<Vec<ChannelSummary>, BackendError> {
        self.channels
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn channel(id: i64, title: &str, is_active: bool) -> ChannelSummary {
    ChannelSummary {
        id,
        title: title.to_string(),
        username: None,
        is_active,
    }
}

pub fn success(summary: &str) -> StatusSnapshot {
    let mut snapshot = StatusSnapshot::new(JobStatus::Success);
    snapshot.result_summary = Some(summary.to_string());
    snapshot
}
