use std::sync::Arc;
use std::time::Duration;

use refresh_core::{JobHandle, Msg, PollerId, StatusSnapshot};
use refresh_logging::{refresh_debug, refresh_info, refresh_warn};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::JobBackend;

#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Delay between the end of one status query and the start of the next.
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Active,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerEvent {
    Status {
        poller: PollerId,
        snapshot: StatusSnapshot,
    },
    /// The status query failed; the poller has stopped.
    Failed { poller: PollerId, message: String },
}

impl From<PollerEvent> for Msg {
    fn from(event: PollerEvent) -> Self {
        match event {
            PollerEvent::Status { poller, snapshot } => Msg::StatusReceived { poller, snapshot },
            PollerEvent::Failed { poller, message } => Msg::PollFailed { poller, message },
        }
    }
}

pub trait PollerSink: Send + Sync {
    fn emit(&self, event: PollerEvent);
}

impl PollerSink for mpsc::UnboundedSender<Msg> {
    fn emit(&self, event: PollerEvent) {
        let _ = self.send(event.into());
    }
}

/// Starts pollers bound to a single job handle each.
#[derive(Clone)]
pub struct TaskProgressPoller {
    backend: Arc<dyn JobBackend>,
    settings: PollSettings,
}

impl TaskProgressPoller {
    pub fn new(backend: Arc<dyn JobBackend>, settings: PollSettings) -> Self {
        Self { backend, settings }
    }

    /// Spawns the polling task on the current Tokio runtime.
    ///
    /// The first query is issued immediately. Polling stops on a terminal
    /// snapshot, a failed query, or cancellation.
    pub fn start(
        &self,
        poller: PollerId,
        handle: JobHandle,
        sink: Arc<dyn PollerSink>,
    ) -> PollerHandle {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(PollerState::Idle);
        let run = PollRun {
            poller,
            handle: handle.clone(),
            backend: self.backend.clone(),
            interval: self.settings.interval,
            sink,
            cancel: cancel.clone(),
        };
        refresh_info!("Starting {poller} for task {handle}");
        tokio::spawn(async move {
            let _ = state_tx.send(PollerState::Active);
            run.poll_until_stopped().await;
            let _ = state_tx.send(PollerState::Stopped);
        });
        PollerHandle {
            poller,
            handle,
            cancel,
            state: state_rx,
        }
    }
}

struct PollRun {
    poller: PollerId,
    handle: JobHandle,
    backend: Arc<dyn JobBackend>,
    interval: Duration,
    sink: Arc<dyn PollerSink>,
    cancel: CancellationToken,
}

impl PollRun {
    async fn poll_until_stopped(self) {
        let mut queries = 0usize;
        loop {
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                result = self.backend.query_job_status(&self.handle) => result,
            };
            queries += 1;
            if self.cancel.is_cancelled() {
                break;
            }

            match result {
                Ok(snapshot) => {
                    let terminal = snapshot.is_terminal();
                    refresh_debug!(
                        "{} task {}: {} {}%",
                        self.poller,
                        self.handle,
                        snapshot.status.label(),
                        snapshot.progress_percent
                    );
                    self.sink.emit(PollerEvent::Status {
                        poller: self.poller,
                        snapshot,
                    });
                    if terminal {
                        break;
                    }
                }
                Err(err) => {
                    refresh_warn!(
                        "{} status query for task {} failed: {err}",
                        self.poller,
                        self.handle
                    );
                    self.sink.emit(PollerEvent::Failed {
                        poller: self.poller,
                        message: err.to_string(),
                    });
                    break;
                }
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        if self.cancel.is_cancelled() {
            refresh_info!("{} cancelled after {queries} queries", self.poller);
        } else {
            refresh_info!("{} stopped after {queries} queries", self.poller);
        }
    }
}

/// Owner side of a running poller. Dropping the handle cancels the poller.
#[derive(Debug)]
pub struct PollerHandle {
    poller: PollerId,
    handle: JobHandle,
    cancel: CancellationToken,
    state: watch::Receiver<PollerState>,
}

impl PollerHandle {
    pub fn id(&self) -> PollerId {
        self.poller
    }

    pub fn job(&self) -> &JobHandle {
        &self.handle
    }

    /// Idempotent; any in-flight query result is discarded.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn state(&self) -> PollerState {
        if self.cancel.is_cancelled() {
            return PollerState::Stopped;
        }
        *self.state.borrow()
    }

    /// Waits until the polling task has finished.
    pub async fn stopped(&mut self) {
        let _ = self
            .state
            .wait_for(|state| *state == PollerState::Stopped)
            .await;
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
