use std::sync::Arc;

use refresh_core::{
    update, AppState, AppViewModel, ConfigField, Effect, JobKind, JobSpec, Msg, PollerId,
};
use refresh_logging::{refresh_debug, refresh_info, refresh_warn};
use tokio::sync::mpsc;

use crate::poller::{PollSettings, PollerHandle, PollerState, TaskProgressPoller};
use crate::JobBackend;

/// Runs the pure state machine and executes its effects against a backend.
///
/// Background work (catalog load, submission, polling) reports back through an
/// internal message queue that [`Self::process_next`] drains. All methods that
/// execute effects must be called from within a Tokio runtime.
pub struct JobLifecycleController {
    state: AppState,
    backend: Arc<dyn JobBackend>,
    pollers: TaskProgressPoller,
    poller: Option<PollerHandle>,
    msg_tx: mpsc::UnboundedSender<Msg>,
    msg_rx: mpsc::UnboundedReceiver<Msg>,
}

impl JobLifecycleController {
    pub fn new(backend: Arc<dyn JobBackend>, state: AppState, poll_settings: PollSettings) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        Self {
            state,
            pollers: TaskProgressPoller::new(backend.clone(), poll_settings),
            backend,
            poller: None,
            msg_tx,
            msg_rx,
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<Msg> {
        self.msg_tx.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn consume_dirty(&mut self) -> bool {
        self.state.consume_dirty()
    }

    /// The poller currently owned by the controller, if it is still running.
    pub fn active_poller(&self) -> Option<PollerId> {
        self.poller
            .as_ref()
            .filter(|poller| poller.state() != PollerState::Stopped)
            .map(PollerHandle::id)
    }

    pub fn open_form(&mut self) {
        self.dispatch(Msg::FormOpened);
    }

    pub fn select_kind(&mut self, kind: JobKind) {
        self.dispatch(Msg::JobKindChanged(kind));
    }

    pub fn apply_field(&mut self, field: ConfigField) {
        self.dispatch(Msg::FieldEdited(field));
    }

    pub fn submit(&mut self) {
        self.dispatch(Msg::SubmitClicked);
    }

    pub fn dispatch(&mut self, msg: Msg) {
        if let Msg::StatusReceived { poller, .. } | Msg::PollFailed { poller, .. } = &msg {
            let live = self.state.job().filter(|job| job.polling).map(|job| job.poller);
            if live != Some(*poller) {
                refresh_debug!("Dropping late result from {poller}");
                return;
            }
        }

        let state = std::mem::take(&mut self.state);
        let (next, effects) = update(state, msg);
        self.state = next;
        for effect in effects {
            self.run_effect(effect);
        }
    }

    /// Waits for one background message and applies it.
    ///
    /// Returns false if the queue is closed.
    pub async fn process_next(&mut self) -> bool {
        match self.msg_rx.recv().await {
            Some(msg) => {
                self.dispatch(msg);
                true
            }
            None => false,
        }
    }

    /// Applies background messages until no catalog load, submission, or
    /// poller is outstanding.
    pub async fn run_until_idle(&mut self) {
        while self.is_busy() {
            if !self.process_next().await {
                break;
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy() || self.state.is_catalog_loading()
    }

    /// Stops the poller and ignores everything that arrives afterwards.
    pub fn teardown(&mut self) {
        if self.state.is_torn_down() {
            return;
        }
        self.dispatch(Msg::Teardown);
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
        refresh_info!("Job controller torn down");
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::LoadChannels => {
                let backend = self.backend.clone();
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let msg = match backend.fetch_channels().await {
                        Ok(channels) => Msg::ChannelsLoaded(channels),
                        Err(err) => {
                            refresh_warn!("Channel catalog unavailable: {err}");
                            Msg::ChannelsLoadFailed(err.to_string())
                        }
                    };
                    let _ = tx.send(msg);
                });
            }
            Effect::SubmitJob { spec } => self.spawn_submission(spec),
            Effect::StartPolling { poller, handle } => {
                if let Some(previous) = self.poller.take() {
                    previous.cancel();
                }
                let sink = Arc::new(self.msg_tx.clone());
                self.poller = Some(self.pollers.start(poller, handle, sink));
            }
            Effect::StopPolling { poller } => {
                if self.poller.as_ref().is_some_and(|current| current.id() == poller) {
                    if let Some(current) = self.poller.take() {
                        refresh_debug!("Cancelling {poller}");
                        current.cancel();
                    }
                }
            }
        }
    }

    fn spawn_submission(&self, spec: JobSpec) {
        let backend = self.backend.clone();
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let msg = match backend.submit_job(&spec).await {
                Ok(ack) => Msg::SubmissionSucceeded {
                    handle: ack.handle,
                    details: ack.details,
                },
                Err(err) => Msg::SubmissionFailed(err),
            };
            let _ = tx.send(msg);
        });
    }
}

impl Drop for JobLifecycleController {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
    }
}
