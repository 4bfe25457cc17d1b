use crate::{
    ChannelId, ChannelSummary, ConfigField, JobHandle, JobKind, PollerId, StatusSnapshot,
    SubmissionError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The refresh form was opened; resets to defaults and loads the catalog.
    FormOpened,
    /// User switched the job kind.
    JobKindChanged(JobKind),
    /// User edited one configuration field.
    FieldEdited(ConfigField),
    /// Channel catalog arrived from the backend.
    ChannelsLoaded(Vec<ChannelSummary>),
    /// Channel catalog could not be loaded.
    ChannelsLoadFailed(String),
    SelectAllChannels,
    DeselectAllChannels,
    ToggleChannels(Vec<ChannelId>),
    /// User asked to launch the job.
    SubmitClicked,
    /// Backend accepted the job.
    SubmissionSucceeded {
        handle: JobHandle,
        details: Option<serde_json::Value>,
    },
    /// Backend rejected the job or could not be reached.
    SubmissionFailed(SubmissionError),
    /// Poller delivered a status snapshot.
    StatusReceived {
        poller: PollerId,
        snapshot: StatusSnapshot,
    },
    /// Poller's status query failed; the poller has stopped.
    PollFailed { poller: PollerId, message: String },
    /// Controller is being destroyed.
    Teardown,
    NoOp,
}
