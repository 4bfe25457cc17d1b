use std::fmt::Write;

use chrono::Local;
use refresh_core::{
    AppViewModel, ChannelSelectionView, FieldId, FieldState, JobStatus, JobView, Phase,
};

const PROGRESS_BAR_WIDTH: usize = 20;

pub fn render_form(view: &AppViewModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ({}) ==", view.kind_label, phase_label(view.phase));
    let _ = writeln!(out, "  {:<28} {}", "Channels", view.channels.summary());
    for field in view.fields.iter().filter(|f| f.id != FieldId::ChannelIds) {
        let marker = match field.state {
            FieldState::Hidden => continue,
            FieldState::Editable => "",
            FieldState::Fixed => " (fixed)",
        };
        let value = if field.value.is_empty() {
            "-"
        } else {
            field.value.as_str()
        };
        let _ = writeln!(out, "  {:<28} {value}{marker}", field.label);
    }
    match &view.validation {
        Some(err) => {
            let _ = writeln!(out, "  ! {err}");
        }
        None if view.can_submit => {
            let _ = writeln!(out, "  Ready to submit.");
        }
        None => {}
    }
    if let Some(job) = &view.job {
        let _ = writeln!(out, "  Last job: {}", render_job(job));
    }
    out
}

pub fn render_channels(channels: &ChannelSelectionView) -> String {
    if channels.loading {
        return "Loading channels...".to_string();
    }
    if channels.rows.is_empty() {
        return "No active channels.".to_string();
    }
    let mut out = String::new();
    for row in &channels.rows {
        let mark = if row.selected { "x" } else { " " };
        let _ = writeln!(out, "  [{mark}] {:>6}  {}", row.id, row.name);
    }
    let _ = write!(out, "  {} selected: {}", channels.selected_count, selection_hint(channels));
    out
}

fn selection_hint(channels: &ChannelSelectionView) -> String {
    if channels.all_active {
        "none, all active channels will be processed".to_string()
    } else {
        channels.summary()
    }
}

/// One status line for a job, e.g. `abc123 Running [#####     ] 50% Step 2`.
pub fn render_job(job: &JobView) -> String {
    let Some(status) = job.status else {
        return format!("{} submitted, waiting for first status", job.task_id);
    };
    let mut line = format!(
        "{} {} {} {:>3}%",
        job.task_id,
        status.label(),
        progress_bar(job.progress_percent),
        job.progress_percent
    );
    if let Some(step) = &job.current_step {
        let _ = write!(line, " {step}");
    }
    if let Some(processed) = &job.processed {
        let _ = write!(line, " ({processed})");
    }
    match status {
        JobStatus::Success => {
            if let Some(summary) = &job.result_summary {
                let _ = write!(line, " - {summary}");
            }
        }
        JobStatus::Failure | JobStatus::PollError => {
            if let Some(error) = &job.error_message {
                let _ = write!(line, " - {error}");
            }
        }
        JobStatus::Pending | JobStatus::Started => {}
    }
    line
}

/// Prefixes `line` with the local wall-clock time.
pub fn timestamped(line: &str) -> String {
    format!("[{}] {line}", Local::now().format("%H:%M:%S"))
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * PROGRESS_BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), " ".repeat(PROGRESS_BAR_WIDTH - filled))
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Configuring => "configuring",
        Phase::Submitting => "submitting",
        Phase::Polling => "job running",
        Phase::Terminal => "finished",
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use refresh_core::{update, AppState, ChannelSummary, Msg};

    use super::*;

    fn job(status: Option<JobStatus>, percent: u8) -> JobView {
        JobView {
            task_id: "abc123".to_string(),
            polling: true,
            status,
            progress_percent: percent,
            current_step: None,
            processed: None,
            result_summary: None,
            error_message: None,
            failure_detail: None,
            details: None,
        }
    }

    #[test]
    fn job_line_shows_bar_and_summary() {
        let mut view = job(Some(JobStatus::Success), 100);
        view.result_summary = Some("12 posts refreshed".to_string());
        assert_eq!(
            render_job(&view),
            "abc123 Success [####################] 100% - 12 posts refreshed"
        );
    }

    #[test]
    fn job_line_before_first_status() {
        assert_eq!(
            render_job(&job(None, 0)),
            "abc123 submitted, waiting for first status"
        );
    }

    #[test]
    fn running_job_shows_step_and_counts() {
        let mut view = job(Some(JobStatus::Started), 45);
        view.current_step = Some("Channel 3".to_string());
        view.processed = Some("3/7".to_string());
        assert_eq!(
            render_job(&view),
            "abc123 Running [#########           ]  45% Channel 3 (3/7)"
        );
    }

    #[test]
    fn form_hides_irrelevant_fields() {
        let text = render_form(&AppState::new().view());
        assert!(text.contains("Post refresh mode"));
        assert!(text.contains("Comment refresh mode"));
        assert!(text.contains("do_not_refresh (fixed)"));
        assert!(!text.contains("Days to look back"));
        assert!(text.contains("All active channels"));
    }

    #[test]
    fn channel_list_marks_selection() {
        let catalog = vec![ChannelSummary {
            id: 5,
            title: "News".to_string(),
            username: Some("news".to_string()),
            is_active: true,
        }];
        let (state, _) = update(AppState::new(), Msg::ChannelsLoaded(catalog));
        let (state, _) = update(state, Msg::ToggleChannels(vec![5]));
        assert_eq!(
            render_channels(&state.view().channels),
            "  [x]      5  News (@news)\n  1 selected: News"
        );
    }
}
