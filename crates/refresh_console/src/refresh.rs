//! One-shot subcommands: `refresh` and `channels`.

use std::collections::BTreeSet;

use anyhow::Result;
use refresh_core::{AppViewModel, ChannelId, JobStatus, Msg, Notice};
use refresh_engine::JobLifecycleController;
use refresh_logging::refresh_info;

use crate::cli::RefreshArgs;
use crate::render;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_JOB_FAILED: u8 = 1;
pub const EXIT_NOT_STARTED: u8 = 2;

/// Exit code for the final view of a one-shot run.
pub fn exit_code(view: &AppViewModel) -> u8 {
    match view.job.as_ref().and_then(|job| job.status) {
        Some(JobStatus::Success) => EXIT_SUCCESS,
        Some(JobStatus::Failure | JobStatus::PollError) => EXIT_JOB_FAILED,
        Some(JobStatus::Pending | JobStatus::Started) | None => EXIT_NOT_STARTED,
    }
}

/// Distinct channel ids from `--channel`, in ascending order.
///
/// Toggling flips membership, so a repeated id must only be toggled once.
pub fn requested_channels(args: &RefreshArgs) -> Vec<ChannelId> {
    args.channels
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub async fn run_refresh(
    controller: &mut JobLifecycleController,
    args: &RefreshArgs,
) -> Result<u8> {
    if let Some(kind) = args.kind {
        controller.select_kind(kind);
    }
    controller.open_form();
    controller.run_until_idle().await;

    let requested = requested_channels(args);
    if !requested.is_empty() {
        if let Some(Notice::CatalogUnavailable(reason)) = controller.state().notice() {
            eprintln!("Cannot select channels, the channel list is unavailable: {reason}");
            return Ok(EXIT_NOT_STARTED);
        }
        controller.dispatch(Msg::ToggleChannels(requested.clone()));
        let channels = controller.state().channels();
        let missing: Vec<String> = requested
            .iter()
            .filter(|id| !channels.is_selected(**id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            eprintln!("Not active channel id(s): {}", missing.join(", "));
            return Ok(EXIT_NOT_STARTED);
        }
    }
    for edit in args.edits() {
        controller.apply_field(edit);
    }

    let view = controller.view();
    if let Some(err) = view.validation {
        eprintln!("Invalid configuration: {err}");
        return Ok(EXIT_NOT_STARTED);
    }
    println!("{}", render::render_form(&view));

    controller.submit();
    let mut last_line = None;
    while controller.is_busy() {
        if !controller.process_next().await {
            break;
        }
        if !controller.consume_dirty() {
            continue;
        }
        let line = controller.view().job.as_ref().map(render::render_job);
        if line.is_some() && line != last_line {
            if let Some(text) = &line {
                println!("{}", render::timestamped(text));
            }
            last_line = line;
        }
    }

    let view = controller.view();
    if let Some(notice @ Notice::Submission(_)) = controller.state().notice() {
        eprintln!("{}", notice.message());
        return Ok(EXIT_NOT_STARTED);
    }
    if let Some(detail) = view.job.as_ref().and_then(|job| job.failure_detail.as_ref()) {
        eprintln!("Failure details:\n{detail}");
    }
    let code = exit_code(&view);
    refresh_info!("Refresh run finished with exit code {code}");
    Ok(code)
}

pub async fn run_channels(controller: &mut JobLifecycleController) -> Result<u8> {
    controller.open_form();
    controller.run_until_idle().await;
    if let Some(Notice::CatalogUnavailable(reason)) = controller.state().notice() {
        eprintln!("Could not load the channel list: {reason}");
        return Ok(EXIT_JOB_FAILED);
    }
    println!("{}", render::render_channels(&controller.view().channels));
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use refresh_core::{
        update, AppState, ChannelSummary, JobHandle, Msg, StatusSnapshot, SubmissionError,
        SubmissionErrorKind,
    };

    use super::*;

    fn submitted() -> AppState {
        let (state, _) = update(AppState::new(), Msg::SubmitClicked);
        let (state, _) = update(
            state,
            Msg::SubmissionSucceeded {
                handle: JobHandle::new("abc123"),
                details: None,
            },
        );
        state
    }

    fn finished(status: JobStatus) -> AppState {
        let state = submitted();
        let poller = state.job().map(|job| job.poller).unwrap();
        let (state, _) = update(
            state,
            Msg::StatusReceived {
                poller,
                snapshot: StatusSnapshot::new(status),
            },
        );
        state
    }

    #[test]
    fn exit_codes_follow_terminal_status() {
        assert_eq!(exit_code(&finished(JobStatus::Success).view()), EXIT_SUCCESS);
        assert_eq!(exit_code(&finished(JobStatus::Failure).view()), EXIT_JOB_FAILED);
        assert_eq!(exit_code(&finished(JobStatus::PollError).view()), EXIT_JOB_FAILED);
    }

    #[test]
    fn jobs_that_never_started_exit_with_two() {
        let (state, _) = update(AppState::new(), Msg::SubmitClicked);
        let (state, _) = update(
            state,
            Msg::SubmissionFailed(SubmissionError::new(SubmissionErrorKind::Network, "down")),
        );
        assert_eq!(exit_code(&state.view()), EXIT_NOT_STARTED);
        assert_eq!(exit_code(&submitted().view()), EXIT_NOT_STARTED);
    }

    #[test]
    fn repeated_channel_ids_select_the_channel_once() {
        let args = RefreshArgs {
            channels: vec![4, 9, 4],
            ..RefreshArgs::default()
        };
        assert_eq!(requested_channels(&args), vec![4, 9]);

        let catalog = [4, 9]
            .into_iter()
            .map(|id| ChannelSummary {
                id,
                title: format!("Channel {id}"),
                username: None,
                is_active: true,
            })
            .collect();
        let (state, _) = update(AppState::new(), Msg::ChannelsLoaded(catalog));
        let (state, _) = update(state, Msg::ToggleChannels(requested_channels(&args)));
        assert!(state.channels().is_selected(4));
        assert!(state.channels().is_selected(9));
    }
}
