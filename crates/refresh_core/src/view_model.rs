use crate::state::{AppState, Phase};
use crate::{
    field_state, validate, ChannelId, CommentRefreshMode, FieldId, FieldState, JobConfiguration,
    JobKind, JobStatus, ModeOption, PostRefreshMode, ValidationError,
};

/// Number of selected channel names listed before summarising the rest.
pub const SELECTION_PREVIEW_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub phase: Phase,
    pub kind: JobKind,
    pub kind_label: String,
    pub fields: Vec<FieldRowView>,
    pub post_modes: Vec<ModeOption<PostRefreshMode>>,
    pub comment_modes: Vec<ModeOption<CommentRefreshMode>>,
    pub channels: ChannelSelectionView,
    pub validation: Option<ValidationError>,
    pub can_submit: bool,
    pub notice: Option<String>,
    pub notice_is_error: bool,
    pub job: Option<JobView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRowView {
    pub id: FieldId,
    pub label: &'static str,
    pub state: FieldState,
    /// Value that would be submitted; empty when unset.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRowView {
    pub id: ChannelId,
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelSelectionView {
    pub loading: bool,
    pub rows: Vec<ChannelRowView>,
    pub selected_count: usize,
    /// Up to [`SELECTION_PREVIEW_LIMIT`] selected titles.
    pub preview: Vec<String>,
    /// Selected channels beyond the preview.
    pub more_count: usize,
    pub all_active: bool,
}

impl ChannelSelectionView {
    pub fn summary(&self) -> String {
        if self.all_active {
            return "All active channels".to_string();
        }
        let mut text = self.preview.join(", ");
        if self.more_count > 0 {
            text.push_str(&format!(" ...and {} more", self.more_count));
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobView {
    pub task_id: String,
    pub polling: bool,
    /// `None` until the first snapshot arrives.
    pub status: Option<JobStatus>,
    pub progress_percent: u8,
    pub current_step: Option<String>,
    pub processed: Option<String>,
    pub result_summary: Option<String>,
    pub error_message: Option<String>,
    pub failure_detail: Option<String>,
    pub details: Option<String>,
}

pub(crate) fn build(state: &AppState, dirty: bool) -> AppViewModel {
    let config = state.config();
    let kind = config.kind;
    let profile = state.options().profile(kind);
    let validation = validate(config).err();
    let notice = state.notice();

    AppViewModel {
        phase: state.phase(),
        kind,
        kind_label: state.options().kind_label(kind),
        fields: FieldId::ALL
            .into_iter()
            .map(|id| FieldRowView {
                id,
                label: id.label(),
                state: field_state(config, id),
                value: field_value(config, id),
            })
            .collect(),
        post_modes: profile.map(|p| p.post_modes.clone()).unwrap_or_default(),
        comment_modes: profile.map(|p| p.comment_modes.clone()).unwrap_or_default(),
        channels: channel_view(state),
        can_submit: state.can_submit(),
        validation,
        notice: notice.map(|n| n.message()),
        notice_is_error: notice.is_some_and(|n| n.is_error()),
        job: state.job().map(|job| {
            let snapshot = job.snapshot.as_ref();
            JobView {
                task_id: job.handle.task_id().to_string(),
                polling: job.polling,
                status: snapshot.map(|s| s.status),
                progress_percent: snapshot.map_or(0, |s| s.progress_percent),
                current_step: snapshot.and_then(|s| s.current_step.clone()),
                processed: snapshot.and_then(|s| match (s.processed_count, s.total_to_process) {
                    (Some(done), Some(total)) => Some(format!("{done}/{total}")),
                    (Some(done), None) => Some(done.to_string()),
                    _ => None,
                }),
                result_summary: snapshot.and_then(|s| s.result_summary.clone()),
                error_message: snapshot.and_then(|s| s.error_message.clone()),
                failure_detail: snapshot
                    .and_then(|s| s.failure_detail.as_ref())
                    .map(pretty_json),
                details: job.details.as_ref().map(pretty_json),
            }
        }),
        dirty,
    }
}

fn channel_view(state: &AppState) -> ChannelSelectionView {
    let channels = state.channels();
    let selected: Vec<String> = channels.selected().map(|ch| ch.title.clone()).collect();
    let selected_count = selected.len();
    ChannelSelectionView {
        loading: state.is_catalog_loading(),
        rows: channels
            .available()
            .iter()
            .map(|ch| ChannelRowView {
                id: ch.id,
                name: ch.display_name(),
                selected: channels.is_selected(ch.id),
            })
            .collect(),
        selected_count,
        more_count: selected_count.saturating_sub(SELECTION_PREVIEW_LIMIT),
        preview: selected.into_iter().take(SELECTION_PREVIEW_LIMIT).collect(),
        all_active: channels.is_all_active(),
    }
}

fn field_value(config: &JobConfiguration, id: FieldId) -> String {
    let optional = |value: Option<String>| value.unwrap_or_default();
    match id {
        FieldId::ChannelIds => config
            .channel_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(","),
        FieldId::PostRefreshMode => config.effective_post_mode().to_string(),
        FieldId::PostRefreshDays => optional(config.post_refresh_days.map(|d| d.to_string())),
        FieldId::PostRefreshStartDate => optional(
            config
                .post_refresh_start_date
                .map(|date| date.format("%Y-%m-%d").to_string()),
        ),
        FieldId::PostLimitPerChannel => {
            optional(config.post_limit_per_channel.map(|l| l.to_string()))
        }
        FieldId::UpdateExistingPostsInfo => yes_no(config.update_existing_posts_info),
        FieldId::CommentRefreshMode => config.effective_comment_mode().to_string(),
        FieldId::CommentLimitPerPost => {
            optional(config.comment_limit_per_post.map(|l| l.to_string()))
        }
        FieldId::AnalyzeNewComments => yes_no(config.effective_analysis()),
    }
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

fn pretty_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
