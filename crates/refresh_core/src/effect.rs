use crate::{JobHandle, JobSpec, PollerId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadChannels,
    SubmitJob { spec: JobSpec },
    /// Replace whatever poller is running with one bound to `handle`.
    StartPolling { poller: PollerId, handle: JobHandle },
    StopPolling { poller: PollerId },
}
