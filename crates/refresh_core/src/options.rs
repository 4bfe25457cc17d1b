//! Option tables for the refresh form.
//!
//! Each job kind carries its own profile: the modes offered to the user and
//! the configuration a fresh form starts from. Profiles are passed into
//! [`crate::AppState`] rather than read from globals.

use crate::config::{DEFAULT_COMMENT_LIMIT, DEFAULT_POST_LIMIT};
use crate::{CommentRefreshMode, JobConfiguration, JobKind, PostRefreshMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeOption<T> {
    pub value: T,
    pub label: String,
}

impl<T> ModeOption<T> {
    pub fn new(value: T, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindProfile {
    pub kind: JobKind,
    pub label: String,
    pub post_modes: Vec<ModeOption<PostRefreshMode>>,
    pub comment_modes: Vec<ModeOption<CommentRefreshMode>>,
    pub defaults: JobConfiguration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOptions {
    profiles: Vec<KindProfile>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self::standard()
    }
}

impl FormOptions {
    pub fn new(profiles: Vec<KindProfile>) -> Self {
        Self { profiles }
    }

    /// Built-in profiles for collecting posts and collecting comments.
    pub fn standard() -> Self {
        let posts = KindProfile {
            kind: JobKind::CollectPosts,
            label: "Collect posts".to_string(),
            post_modes: vec![
                ModeOption::new(PostRefreshMode::NewOnly, "Only new posts (since last seen id)"),
                ModeOption::new(PostRefreshMode::LastNDays, "Posts from the last N days"),
                ModeOption::new(PostRefreshMode::SinceDate, "Posts since a given date"),
            ],
            comment_modes: vec![ModeOption::new(
                CommentRefreshMode::DoNotRefresh,
                "Do not refresh comments",
            )],
            defaults: JobConfiguration::with_defaults(JobKind::CollectPosts),
        };
        let comments = KindProfile {
            kind: JobKind::CollectComments,
            label: "Collect comments".to_string(),
            post_modes: vec![ModeOption::new(
                PostRefreshMode::UpdateStatsOnly,
                "Update stats of existing posts only",
            )],
            comment_modes: vec![
                ModeOption::new(CommentRefreshMode::NewPostsOnly, "Only for brand new posts"),
                ModeOption::new(
                    CommentRefreshMode::AddNewToExisting,
                    "Add new comments to existing posts",
                ),
            ],
            defaults: JobConfiguration::with_defaults(JobKind::CollectComments),
        };
        Self::new(vec![posts, comments])
    }

    pub fn profile(&self, kind: JobKind) -> Option<&KindProfile> {
        self.profiles.iter().find(|profile| profile.kind == kind)
    }

    pub fn profiles(&self) -> &[KindProfile] {
        &self.profiles
    }

    /// Starting configuration for `kind`; falls back to the built-in defaults.
    pub fn defaults_for(&self, kind: JobKind) -> JobConfiguration {
        self.profile(kind)
            .map(|profile| JobConfiguration {
                kind,
                ..profile.defaults.clone()
            })
            .unwrap_or_else(|| JobConfiguration::with_defaults(kind))
    }

    pub fn kind_label(&self, kind: JobKind) -> String {
        self.profile(kind)
            .map(|profile| profile.label.clone())
            .unwrap_or_else(|| kind.as_str().to_string())
    }

    pub fn default_post_limit(&self, kind: JobKind) -> u32 {
        self.defaults_for(kind)
            .post_limit_per_channel
            .unwrap_or(DEFAULT_POST_LIMIT)
    }

    pub fn default_comment_limit(&self, kind: JobKind) -> u32 {
        self.defaults_for(kind)
            .comment_limit_per_post
            .unwrap_or(DEFAULT_COMMENT_LIMIT)
    }
}
