use crate::state::{ActiveJob, Notice, Phase};
use crate::{apply_field, validate, AppState, Effect, Msg, StatusSnapshot};

pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    if state.torn_down {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::FormOpened => {
            state.config = state.options.defaults_for(state.config.kind);
            state.sync_channel_ids();
            state.catalog_loading = true;
            state.notice = None;
            state.reconfigured();
            vec![Effect::LoadChannels]
        }
        Msg::JobKindChanged(kind) => {
            state.config = state.options.defaults_for(kind);
            state.sync_channel_ids();
            state.reconfigured();
            Vec::new()
        }
        Msg::FieldEdited(field) => {
            let config = std::mem::take(&mut state.config);
            state.config = apply_field(config, field);
            state.reconfigured();
            Vec::new()
        }
        Msg::ChannelsLoaded(catalog) => {
            state.channels.replace_catalog(catalog);
            state.sync_channel_ids();
            state.catalog_loading = false;
            if matches!(state.notice, Some(Notice::CatalogUnavailable(_))) {
                state.notice = None;
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::ChannelsLoadFailed(reason) => {
            state.catalog_loading = false;
            state.notice = Some(Notice::CatalogUnavailable(reason));
            state.mark_dirty();
            Vec::new()
        }
        Msg::SelectAllChannels => {
            state.channels.select_all();
            state.sync_channel_ids();
            state.reconfigured();
            Vec::new()
        }
        Msg::DeselectAllChannels => {
            state.channels.deselect_all();
            state.sync_channel_ids();
            state.reconfigured();
            Vec::new()
        }
        Msg::ToggleChannels(ids) => {
            if state.channels.toggle(&ids) > 0 {
                state.sync_channel_ids();
                state.reconfigured();
            }
            Vec::new()
        }
        Msg::SubmitClicked => submit(&mut state),
        Msg::SubmissionSucceeded { handle, details } => {
            if state.phase != Phase::Submitting {
                return (state, Vec::new());
            }
            let mut effects = Vec::with_capacity(2);
            if let Some(previous) = state.job.as_ref().filter(|job| job.polling) {
                effects.push(Effect::StopPolling {
                    poller: previous.poller,
                });
            }
            let poller = state.allocate_poller();
            state.notice = Some(Notice::Submitted {
                task_id: handle.task_id().to_string(),
            });
            state.job = Some(ActiveJob {
                poller,
                handle: handle.clone(),
                details,
                snapshot: None,
                polling: true,
            });
            state.phase = Phase::Polling;
            state.mark_dirty();
            effects.push(Effect::StartPolling { poller, handle });
            effects
        }
        Msg::SubmissionFailed(error) => {
            if state.phase == Phase::Submitting {
                state.phase = Phase::Configuring;
                state.notice = Some(Notice::Submission(error));
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::StatusReceived { poller, snapshot } => {
            state.apply_snapshot(poller, snapshot);
            Vec::new()
        }
        Msg::PollFailed { poller, message } => {
            let snapshot = StatusSnapshot::poll_error(state.last_snapshot_of(poller), message);
            state.apply_snapshot(poller, snapshot);
            Vec::new()
        }
        Msg::Teardown => {
            state.torn_down = true;
            state.catalog_loading = false;
            state.mark_dirty();
            match state.job.as_mut().filter(|job| job.polling) {
                Some(job) => {
                    job.polling = false;
                    vec![Effect::StopPolling { poller: job.poller }]
                }
                None => Vec::new(),
            }
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    if state.phase == Phase::Submitting {
        return Vec::new();
    }
    state.mark_dirty();
    if let Err(err) = validate(&state.config) {
        state.notice = Some(Notice::Validation(err));
        return Vec::new();
    }
    let spec = state.submission_payload();
    state.phase = Phase::Submitting;
    state.notice = None;
    vec![Effect::SubmitJob { spec }]
}
