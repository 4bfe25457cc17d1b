//! Refresh core: job configuration model and the pure controller state machine.
mod channels;
mod config;
mod effect;
mod error;
mod msg;
mod options;
mod state;
mod status;
mod update;
mod view_model;

pub use channels::{ChannelId, ChannelSelectionSet, ChannelSummary};
pub use config::{
    apply_field, field_state, validate, CommentRefreshMode, ConfigField, FieldId, FieldState,
    JobConfiguration, JobKind, JobSpec, PostRefreshMode,
};
pub use effect::Effect;
pub use error::{
    FieldError, FieldParseError, SubmissionError, SubmissionErrorKind, ValidationError,
};
pub use msg::Msg;
pub use options::{FormOptions, KindProfile, ModeOption};
pub use state::{ActiveJob, AppState, Notice, Phase, PollerId};
pub use status::{JobHandle, JobStatus, StatusSnapshot};
pub use update::update;
pub use view_model::{
    AppViewModel, ChannelRowView, ChannelSelectionView, FieldRowView, JobView,
    SELECTION_PREVIEW_LIMIT,
};
