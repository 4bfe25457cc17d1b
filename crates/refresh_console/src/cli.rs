use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use refresh_core::{ChannelId, CommentRefreshMode, ConfigField, JobKind, PostRefreshMode};

#[derive(Debug, Parser)]
#[command(
    name = "refresh-console",
    version,
    about = "Configure, launch, and follow channel data refresh jobs"
)]
pub struct Cli {
    /// RON configuration file (defaults to ./refresh_console.ron if present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API root of the backend, e.g. http://localhost:8000/api/v1.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Seconds between status queries.
    #[arg(long, global = true)]
    pub poll_interval: Option<u64>,

    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive session (the default).
    Console,
    /// Launch a single job and follow it until it finishes.
    Refresh(RefreshArgs),
    /// List the active channels.
    Channels,
}

#[derive(Debug, Args, Default)]
pub struct RefreshArgs {
    /// collect_posts or collect_comments; defaults to the configured kind.
    #[arg(long)]
    pub kind: Option<JobKind>,

    /// Channel ids to refresh; all active channels when omitted.
    #[arg(long = "channel", value_delimiter = ',')]
    pub channels: Vec<ChannelId>,

    #[arg(long)]
    pub post_mode: Option<PostRefreshMode>,

    #[arg(long, allow_negative_numbers = true)]
    pub days: Option<i32>,

    /// Start date as YYYY-MM-DD.
    #[arg(long)]
    pub since: Option<NaiveDate>,

    #[arg(long)]
    pub post_limit: Option<u32>,

    #[arg(long)]
    pub update_existing: bool,

    #[arg(long)]
    pub comment_mode: Option<CommentRefreshMode>,

    #[arg(long)]
    pub comment_limit: Option<u32>,

    #[arg(long)]
    pub analyze: Option<bool>,
}

impl RefreshArgs {
    /// Field edits to apply on top of the kind's defaults, in form order.
    pub fn edits(&self) -> Vec<ConfigField> {
        let mut edits = Vec::new();
        if let Some(mode) = self.post_mode {
            edits.push(ConfigField::PostRefreshMode(mode));
        }
        if self.days.is_some() {
            edits.push(ConfigField::PostRefreshDays(self.days));
        }
        if self.since.is_some() {
            edits.push(ConfigField::PostRefreshStartDate(self.since));
        }
        if self.post_limit.is_some() {
            edits.push(ConfigField::PostLimitPerChannel(self.post_limit));
        }
        if self.update_existing {
            edits.push(ConfigField::UpdateExistingPostsInfo(true));
        }
        if let Some(mode) = self.comment_mode {
            edits.push(ConfigField::CommentRefreshMode(mode));
        }
        if self.comment_limit.is_some() {
            edits.push(ConfigField::CommentLimitPerPost(self.comment_limit));
        }
        if let Some(analyze) = self.analyze {
            edits.push(ConfigField::AnalyzeNewComments(analyze));
        }
        edits
    }
}
