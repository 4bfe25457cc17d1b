use std::fmt;

use crate::view_model::{self, AppViewModel};
use crate::{
    validate, ChannelSelectionSet, FormOptions, JobConfiguration, JobHandle, JobKind, JobSpec,
    StatusSnapshot, SubmissionError, ValidationError,
};

/// Lifecycle of the refresh form and the job it launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Configuring,
    Submitting,
    Polling,
    Terminal,
}

/// Generation number handed to each poller.
///
/// Messages carrying a stale id are dropped, which is how late responses for
/// a superseded job are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PollerId(pub u64);

impl fmt::Display for PollerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "poller#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveJob {
    pub poller: PollerId,
    pub handle: JobHandle,
    /// Specification echoed back by the backend on submission.
    pub details: Option<serde_json::Value>,
    pub snapshot: Option<StatusSnapshot>,
    pub polling: bool,
}

/// User-facing message about the last action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Validation(ValidationError),
    Submission(SubmissionError),
    Submitted { task_id: String },
    CatalogUnavailable(String),
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::Validation(err) => format!("Invalid configuration: {err}"),
            Notice::Submission(err) => {
                let mut text = format!("Could not start the job: {err}");
                for field_error in &err.field_errors {
                    text.push_str(&format!("\n  {}: {}", field_error.field, field_error.message));
                }
                text
            }
            Notice::Submitted { task_id } => format!("Task started. Task id: {task_id}"),
            Notice::CatalogUnavailable(reason) => {
                format!("Could not load the channel list: {reason}")
            }
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Notice::Submitted { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub(crate) options: FormOptions,
    pub(crate) config: JobConfiguration,
    pub(crate) channels: ChannelSelectionSet,
    pub(crate) catalog_loading: bool,
    pub(crate) phase: Phase,
    pub(crate) job: Option<ActiveJob>,
    pub(crate) next_poller: u64,
    pub(crate) notice: Option<Notice>,
    pub(crate) torn_down: bool,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_options(FormOptions::standard(), JobKind::default())
    }

    pub fn with_options(options: FormOptions, kind: JobKind) -> Self {
        let config = options.defaults_for(kind);
        Self {
            options,
            config,
            channels: ChannelSelectionSet::new(),
            catalog_loading: false,
            phase: Phase::Configuring,
            job: None,
            next_poller: 0,
            notice: None,
            torn_down: false,
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        view_model::build(self, self.dirty)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &JobConfiguration {
        &self.config
    }

    pub fn channels(&self) -> &ChannelSelectionSet {
        &self.channels
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn job(&self) -> Option<&ActiveJob> {
        self.job.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_catalog_loading(&self) -> bool {
        self.catalog_loading
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// True while a submission or a poller is outstanding.
    pub fn is_busy(&self) -> bool {
        !self.torn_down
            && (self.phase == Phase::Submitting || self.job.as_ref().is_some_and(|job| job.polling))
    }

    pub fn can_submit(&self) -> bool {
        !self.torn_down && self.phase != Phase::Submitting && validate(&self.config).is_ok()
    }

    /// Returns whether the state changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn sync_channel_ids(&mut self) {
        self.config.channel_ids = self.channels.channel_ids();
    }

    /// The user changed something on the form.
    pub(crate) fn reconfigured(&mut self) {
        if self.phase == Phase::Terminal {
            self.phase = Phase::Configuring;
        }
        if matches!(self.notice, Some(Notice::Validation(_))) {
            self.notice = None;
        }
        self.mark_dirty();
    }

    /// Payload for the current configuration, with unset limits taken from the
    /// kind profile.
    pub(crate) fn submission_payload(&self) -> JobSpec {
        let kind = self.config.kind;
        let mut spec = self.config.to_submission_payload();
        if self.config.post_limit_per_channel.is_none() {
            spec.post_limit_per_channel = self.options.default_post_limit(kind);
        }
        if self.config.comment_limit_per_post.is_none() {
            spec.comment_limit_per_post = self.options.default_comment_limit(kind);
        }
        spec
    }

    pub(crate) fn allocate_poller(&mut self) -> PollerId {
        self.next_poller += 1;
        PollerId(self.next_poller)
    }

    /// Applies a snapshot if it belongs to the live poller.
    ///
    /// Returns false when the snapshot is stale and was dropped.
    pub(crate) fn apply_snapshot(&mut self, poller: PollerId, snapshot: StatusSnapshot) -> bool {
        let Some(job) = self.job.as_mut() else {
            return false;
        };
        if job.poller != poller || !job.polling {
            return false;
        }
        let terminal = snapshot.is_terminal();
        job.snapshot = Some(snapshot);
        if terminal {
            job.polling = false;
            if self.phase == Phase::Polling {
                self.phase = Phase::Terminal;
            }
        }
        self.mark_dirty();
        true
    }

    pub(crate) fn last_snapshot_of(&self, poller: PollerId) -> Option<&StatusSnapshot> {
        self.job
            .as_ref()
            .filter(|job| job.poller == poller)
            .and_then(|job| job.snapshot.as_ref())
    }
}
