//! Refresh engine: backend client, status polling, and effect execution.
mod backend;
mod controller;
mod poller;
mod types;
mod wire;

pub use backend::{BackendSettings, JobBackend, ReqwestBackend};
pub use controller::JobLifecycleController;
pub use poller::{
    PollSettings, PollerEvent, PollerHandle, PollerSink, PollerState, TaskProgressPoller,
};
pub use types::{BackendError, BackendFailure, SubmissionAck};
