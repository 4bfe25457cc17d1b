use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{ChannelId, FieldParseError, ValidationError};

pub(crate) const DEFAULT_POST_REFRESH_DAYS: i32 = 7;
pub(crate) const DEFAULT_POST_LIMIT: u32 = 100;
pub(crate) const DEFAULT_COMMENT_LIMIT: u32 = 200;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Selects defaults and which dimension of the job the user controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    #[default]
    CollectPosts,
    CollectComments,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::CollectPosts => "collect_posts",
            JobKind::CollectComments => "collect_comments",
        }
    }

    fn controls_posts(self) -> bool {
        matches!(self, JobKind::CollectPosts)
    }

    fn controls_comments(self) -> bool {
        matches!(self, JobKind::CollectComments)
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = FieldParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "collect_posts" | "posts" => Ok(JobKind::CollectPosts),
            "collect_comments" | "comments" => Ok(JobKind::CollectComments),
            other => Err(FieldParseError::UnknownOption {
                field: "job_kind",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostRefreshMode {
    NewOnly,
    LastNDays,
    SinceDate,
    UpdateStatsOnly,
}

impl PostRefreshMode {
    pub const ALL: [PostRefreshMode; 4] = [
        PostRefreshMode::NewOnly,
        PostRefreshMode::LastNDays,
        PostRefreshMode::SinceDate,
        PostRefreshMode::UpdateStatsOnly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PostRefreshMode::NewOnly => "new_only",
            PostRefreshMode::LastNDays => "last_n_days",
            PostRefreshMode::SinceDate => "since_date",
            PostRefreshMode::UpdateStatsOnly => "update_stats_only",
        }
    }

    /// The field this mode makes mandatory, if any.
    ///
    /// Shared by validation, payload normalization, and field relevance.
    pub fn required_field(self) -> Option<FieldId> {
        match self {
            PostRefreshMode::LastNDays => Some(FieldId::PostRefreshDays),
            PostRefreshMode::SinceDate => Some(FieldId::PostRefreshStartDate),
            PostRefreshMode::NewOnly | PostRefreshMode::UpdateStatsOnly => None,
        }
    }
}

impl fmt::Display for PostRefreshMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostRefreshMode {
    type Err = FieldParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim();
        PostRefreshMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| FieldParseError::UnknownOption {
                field: FieldId::PostRefreshMode.key(),
                value: needle.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentRefreshMode {
    NewPostsOnly,
    AddNewToExisting,
    DoNotRefresh,
}

impl CommentRefreshMode {
    pub const ALL: [CommentRefreshMode; 3] = [
        CommentRefreshMode::NewPostsOnly,
        CommentRefreshMode::AddNewToExisting,
        CommentRefreshMode::DoNotRefresh,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommentRefreshMode::NewPostsOnly => "new_posts_only",
            CommentRefreshMode::AddNewToExisting => "add_new_to_existing",
            CommentRefreshMode::DoNotRefresh => "do_not_refresh",
        }
    }
}

impl fmt::Display for CommentRefreshMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentRefreshMode {
    type Err = FieldParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim();
        CommentRefreshMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| FieldParseError::UnknownOption {
                field: FieldId::CommentRefreshMode.key(),
                value: needle.to_string(),
            })
    }
}

/// Identifies one editable field of the job configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldId {
    ChannelIds,
    PostRefreshMode,
    PostRefreshDays,
    PostRefreshStartDate,
    PostLimitPerChannel,
    UpdateExistingPostsInfo,
    CommentRefreshMode,
    CommentLimitPerPost,
    AnalyzeNewComments,
}

impl FieldId {
    pub const ALL: [FieldId; 9] = [
        FieldId::ChannelIds,
        FieldId::PostRefreshMode,
        FieldId::PostRefreshDays,
        FieldId::PostRefreshStartDate,
        FieldId::PostLimitPerChannel,
        FieldId::UpdateExistingPostsInfo,
        FieldId::CommentRefreshMode,
        FieldId::CommentLimitPerPost,
        FieldId::AnalyzeNewComments,
    ];

    /// Wire name of the field in the job specification.
    pub fn key(self) -> &'static str {
        match self {
            FieldId::ChannelIds => "channel_ids",
            FieldId::PostRefreshMode => "post_refresh_mode",
            FieldId::PostRefreshDays => "post_refresh_days",
            FieldId::PostRefreshStartDate => "post_refresh_start_date_str",
            FieldId::PostLimitPerChannel => "post_limit_per_channel",
            FieldId::UpdateExistingPostsInfo => "update_existing_posts_info",
            FieldId::CommentRefreshMode => "comment_refresh_mode",
            FieldId::CommentLimitPerPost => "comment_limit_per_post",
            FieldId::AnalyzeNewComments => "analyze_new_comments",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldId::ChannelIds => "Channels",
            FieldId::PostRefreshMode => "Post refresh mode",
            FieldId::PostRefreshDays => "Days to look back",
            FieldId::PostRefreshStartDate => "Start date (YYYY-MM-DD)",
            FieldId::PostLimitPerChannel => "Post limit per channel",
            FieldId::UpdateExistingPostsInfo => "Update existing posts info",
            FieldId::CommentRefreshMode => "Comment refresh mode",
            FieldId::CommentLimitPerPost => "Comment limit per post",
            FieldId::AnalyzeNewComments => "Analyze new comments",
        }
    }
}

impl FromStr for FieldId {
    type Err = FieldParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim().to_ascii_lowercase();
        let alias = match needle.as_str() {
            "post_mode" => Some(FieldId::PostRefreshMode),
            "days" => Some(FieldId::PostRefreshDays),
            "since" | "start_date" | "post_refresh_start_date" => {
                Some(FieldId::PostRefreshStartDate)
            }
            "post_limit" => Some(FieldId::PostLimitPerChannel),
            "update_existing" => Some(FieldId::UpdateExistingPostsInfo),
            "comment_mode" => Some(FieldId::CommentRefreshMode),
            "comment_limit" => Some(FieldId::CommentLimitPerPost),
            "analyze" => Some(FieldId::AnalyzeNewComments),
            _ => None,
        };
        alias
            .or_else(|| FieldId::ALL.into_iter().find(|id| id.key() == needle))
            .ok_or(FieldParseError::UnknownField(needle))
    }
}

/// How a field is presented for the current configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    /// Shown and under user control.
    Editable,
    /// Shown, but the job kind forces its submitted value.
    Fixed,
    /// Irrelevant to the current modes; cleared from the payload.
    Hidden,
}

/// A single typed edit to the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigField {
    PostRefreshMode(PostRefreshMode),
    PostRefreshDays(Option<i32>),
    PostRefreshStartDate(Option<NaiveDate>),
    PostLimitPerChannel(Option<u32>),
    UpdateExistingPostsInfo(bool),
    CommentRefreshMode(CommentRefreshMode),
    CommentLimitPerPost(Option<u32>),
    AnalyzeNewComments(bool),
}

impl ConfigField {
    pub fn id(&self) -> FieldId {
        match self {
            ConfigField::PostRefreshMode(_) => FieldId::PostRefreshMode,
            ConfigField::PostRefreshDays(_) => FieldId::PostRefreshDays,
            ConfigField::PostRefreshStartDate(_) => FieldId::PostRefreshStartDate,
            ConfigField::PostLimitPerChannel(_) => FieldId::PostLimitPerChannel,
            ConfigField::UpdateExistingPostsInfo(_) => FieldId::UpdateExistingPostsInfo,
            ConfigField::CommentRefreshMode(_) => FieldId::CommentRefreshMode,
            ConfigField::CommentLimitPerPost(_) => FieldId::CommentLimitPerPost,
            ConfigField::AnalyzeNewComments(_) => FieldId::AnalyzeNewComments,
        }
    }

    /// Parses raw user input for `field`.
    ///
    /// Empty numeric and date input yields "unset" (`None`), never zero.
    pub fn parse(field: FieldId, raw: &str) -> Result<Self, FieldParseError> {
        let key = field.key();
        match field {
            FieldId::ChannelIds => Err(FieldParseError::NotScalar(key)),
            FieldId::PostRefreshMode => raw.parse().map(ConfigField::PostRefreshMode),
            FieldId::PostRefreshDays => {
                parse_optional_number(key, raw).map(ConfigField::PostRefreshDays)
            }
            FieldId::PostRefreshStartDate => {
                parse_optional_date(key, raw).map(ConfigField::PostRefreshStartDate)
            }
            FieldId::PostLimitPerChannel => {
                parse_optional_number(key, raw).map(ConfigField::PostLimitPerChannel)
            }
            FieldId::UpdateExistingPostsInfo => {
                parse_flag(key, raw).map(ConfigField::UpdateExistingPostsInfo)
            }
            FieldId::CommentRefreshMode => raw.parse().map(ConfigField::CommentRefreshMode),
            FieldId::CommentLimitPerPost => {
                parse_optional_number(key, raw).map(ConfigField::CommentLimitPerPost)
            }
            FieldId::AnalyzeNewComments => {
                parse_flag(key, raw).map(ConfigField::AnalyzeNewComments)
            }
        }
    }
}

fn parse_optional_number<T: FromStr>(
    field: &'static str,
    raw: &str,
) -> Result<Option<T>, FieldParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|_| FieldParseError::InvalidNumber {
            field,
            value: trimmed.to_string(),
        })
}

fn parse_optional_date(
    field: &'static str,
    raw: &str,
) -> Result<Option<NaiveDate>, FieldParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map(Some)
        .map_err(|_| FieldParseError::InvalidDate {
            field,
            value: trimmed.to_string(),
        })
}

fn parse_flag(field: &'static str, raw: &str) -> Result<bool, FieldParseError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(FieldParseError::InvalidFlag {
            field,
            value: other.to_string(),
        }),
    }
}

/// The job specification under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfiguration {
    pub kind: JobKind,
    /// Empty means "all active channels".
    pub channel_ids: BTreeSet<ChannelId>,
    pub post_refresh_mode: PostRefreshMode,
    pub post_refresh_days: Option<i32>,
    pub post_refresh_start_date: Option<NaiveDate>,
    pub post_limit_per_channel: Option<u32>,
    pub update_existing_posts_info: bool,
    pub comment_refresh_mode: CommentRefreshMode,
    pub comment_limit_per_post: Option<u32>,
    pub analyze_new_comments: bool,
}

impl Default for JobConfiguration {
    fn default() -> Self {
        Self::with_defaults(JobKind::default())
    }
}

impl JobConfiguration {
    pub fn with_defaults(kind: JobKind) -> Self {
        let (post_refresh_mode, comment_refresh_mode, analyze_new_comments) = match kind {
            JobKind::CollectPosts => (
                PostRefreshMode::NewOnly,
                CommentRefreshMode::DoNotRefresh,
                false,
            ),
            JobKind::CollectComments => (
                PostRefreshMode::UpdateStatsOnly,
                CommentRefreshMode::AddNewToExisting,
                true,
            ),
        };
        Self {
            kind,
            channel_ids: BTreeSet::new(),
            post_refresh_mode,
            post_refresh_days: Some(DEFAULT_POST_REFRESH_DAYS),
            post_refresh_start_date: None,
            post_limit_per_channel: Some(DEFAULT_POST_LIMIT),
            update_existing_posts_info: false,
            comment_refresh_mode,
            comment_limit_per_post: Some(DEFAULT_COMMENT_LIMIT),
            analyze_new_comments,
        }
    }

    /// Post mode that will actually be submitted for this kind.
    pub fn effective_post_mode(&self) -> PostRefreshMode {
        if self.kind.controls_posts() {
            self.post_refresh_mode
        } else {
            PostRefreshMode::UpdateStatsOnly
        }
    }

    /// Comment mode that will actually be submitted for this kind.
    pub fn effective_comment_mode(&self) -> CommentRefreshMode {
        if self.kind.controls_comments() {
            self.comment_refresh_mode
        } else {
            CommentRefreshMode::DoNotRefresh
        }
    }

    pub fn effective_analysis(&self) -> bool {
        self.kind.controls_comments() && self.analyze_new_comments
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(self)
    }

    /// Copies the configuration into the wire form sent to the backend.
    pub fn to_submission_payload(&self) -> JobSpec {
        let post_mode = self.effective_post_mode();
        let required = post_mode.required_field();
        let channel_ids = if self.channel_ids.is_empty() {
            None
        } else {
            Some(self.channel_ids.iter().copied().collect())
        };

        JobSpec {
            channel_ids,
            post_refresh_mode: post_mode,
            post_refresh_days: self
                .post_refresh_days
                .filter(|_| required == Some(FieldId::PostRefreshDays)),
            post_refresh_start_date: self
                .post_refresh_start_date
                .filter(|_| required == Some(FieldId::PostRefreshStartDate)),
            post_limit_per_channel: self.post_limit_per_channel.unwrap_or(DEFAULT_POST_LIMIT),
            update_existing_posts_info: self.update_existing_posts_info,
            comment_refresh_mode: self.effective_comment_mode(),
            comment_limit_per_post: self.comment_limit_per_post.unwrap_or(DEFAULT_COMMENT_LIMIT),
            analyze_new_comments: self.effective_analysis(),
        }
    }
}

/// Pure field update.
pub fn apply_field(mut config: JobConfiguration, field: ConfigField) -> JobConfiguration {
    match field {
        ConfigField::PostRefreshMode(mode) => config.post_refresh_mode = mode,
        ConfigField::PostRefreshDays(days) => config.post_refresh_days = days,
        ConfigField::PostRefreshStartDate(date) => config.post_refresh_start_date = date,
        ConfigField::PostLimitPerChannel(limit) => config.post_limit_per_channel = limit,
        ConfigField::UpdateExistingPostsInfo(flag) => config.update_existing_posts_info = flag,
        ConfigField::CommentRefreshMode(mode) => config.comment_refresh_mode = mode,
        ConfigField::CommentLimitPerPost(limit) => config.comment_limit_per_post = limit,
        ConfigField::AnalyzeNewComments(flag) => config.analyze_new_comments = flag,
    }
    config
}

/// Returns the first violated rule, checked in a fixed order.
///
/// Post-mode rules only apply to fields [`field_state`] reports as editable,
/// so a kind that forces its post mode never fails on a hidden field.
pub fn validate(config: &JobConfiguration) -> Result<(), ValidationError> {
    let editable = |field| field_state(config, field) == FieldState::Editable;
    if editable(FieldId::PostRefreshDays)
        && !config.post_refresh_days.is_some_and(|days| days > 0)
    {
        return Err(ValidationError::DaysNotPositive);
    }
    if editable(FieldId::PostRefreshStartDate) && config.post_refresh_start_date.is_none() {
        return Err(ValidationError::StartDateMissing);
    }
    if config.kind == JobKind::CollectComments
        && config.comment_refresh_mode == CommentRefreshMode::DoNotRefresh
    {
        return Err(ValidationError::CommentRefreshDisabled);
    }
    Ok(())
}

pub fn field_state(config: &JobConfiguration, field: FieldId) -> FieldState {
    let posts = config.kind.controls_posts();
    let comments = config.kind.controls_comments();
    let required = config.effective_post_mode().required_field();
    let visible_when = |on: bool| {
        if on {
            FieldState::Editable
        } else {
            FieldState::Hidden
        }
    };
    let fixed_unless = |on: bool| {
        if on {
            FieldState::Editable
        } else {
            FieldState::Fixed
        }
    };

    match field {
        FieldId::ChannelIds | FieldId::UpdateExistingPostsInfo => FieldState::Editable,
        FieldId::PostRefreshMode => fixed_unless(posts),
        FieldId::PostRefreshDays | FieldId::PostRefreshStartDate => {
            visible_when(posts && required == Some(field))
        }
        FieldId::PostLimitPerChannel => visible_when(posts && required.is_some()),
        FieldId::CommentRefreshMode | FieldId::AnalyzeNewComments => fixed_unless(comments),
        FieldId::CommentLimitPerPost => visible_when(comments),
    }
}

/// Job specification as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// `None` is the "all active channels" sentinel.
    pub channel_ids: Option<Vec<ChannelId>>,
    pub post_refresh_mode: PostRefreshMode,
    pub post_refresh_days: Option<i32>,
    #[serde(rename = "post_refresh_start_date_str")]
    pub post_refresh_start_date: Option<NaiveDate>,
    pub post_limit_per_channel: u32,
    pub update_existing_posts_info: bool,
    pub comment_refresh_mode: CommentRefreshMode,
    pub comment_limit_per_post: u32,
    pub analyze_new_comments: bool,
}
