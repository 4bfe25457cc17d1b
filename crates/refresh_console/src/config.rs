use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use refresh_core::JobKind;
use refresh_engine::{BackendSettings, PollSettings};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::logging::LogDestination;

const DEFAULT_CONFIG_FILENAME: &str = "refresh_console.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub destination: LogDestination,
    pub level: String,
    pub file: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            destination: LogDestination::File,
            level: "info".to_string(),
            file: PathBuf::from("./refresh_console.log"),
        }
    }
}

impl LogSettings {
    pub fn level_filter(&self) -> Result<LevelFilter> {
        refresh_logging::parse_level(&self.level)
            .ok_or_else(|| anyhow!("unknown log level '{}'", self.level))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub base_url: String,
    pub poll_interval_secs: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub catalog_page_size: u32,
    pub default_kind: JobKind,
    pub log: LogSettings,
    /// File the values were read from; `None` when running on defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let backend = BackendSettings::default();
        Self {
            base_url: backend.base_url,
            poll_interval_secs: PollSettings::default().interval.as_secs(),
            connect_timeout_secs: backend.connect_timeout.as_secs(),
            request_timeout_secs: backend.request_timeout.as_secs(),
            catalog_page_size: backend.catalog_page_size,
            default_kind: JobKind::default(),
            log: LogSettings::default(),
            source: None,
        }
    }
}

impl ConsoleConfig {
    /// Reads `explicit` if given, else `./refresh_console.ron` when it exists,
    /// else returns defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILENAME);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut config: Self = ron::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Command-line flags take precedence over the file.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(secs) = cli.poll_interval {
            self.poll_interval_secs = secs;
        }
        if let Some(level) = &cli.log_level {
            self.log.level = level.clone();
        }
    }

    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            catalog_page_size: self.catalog_page_size,
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(self.poll_interval_secs.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"(
                base_url: "http://backend:9000/api/v1",
                default_kind: collect_comments,
                log: (level: "debug"),
            )"#
        )
        .unwrap();

        let config = ConsoleConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.base_url, "http://backend:9000/api/v1");
        assert_eq!(config.default_kind, JobKind::CollectComments);
        assert_eq!(config.poll_interval_secs, 3);
        assert_eq!(config.log.level_filter().unwrap(), LevelFilter::Debug);
        assert_eq!(config.log.destination, LogDestination::File);
        assert_eq!(config.source.as_deref(), Some(file.path()));
    }

    #[test]
    fn defaults_have_no_source_file() {
        assert_eq!(ConsoleConfig::default().source, None);
    }

    #[test]
    fn unreadable_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.ron");
        let err = ConsoleConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("absent.ron"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "(poll_interval_secs: \"often\")").unwrap();
        assert!(ConsoleConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn cli_flags_override_file_values() {
        let cli = Cli::parse_from([
            "refresh-console",
            "--base-url",
            "http://other/api/v1",
            "--poll-interval",
            "5",
            "--log-level",
            "warn",
        ]);
        let mut config = ConsoleConfig::default();
        config.apply_overrides(&cli);

        assert_eq!(config.backend_settings().base_url, "http://other/api/v1");
        assert_eq!(config.poll_settings().interval, Duration::from_secs(5));
        assert_eq!(config.log.level_filter().unwrap(), LevelFilter::Warn);
    }

    #[test]
    fn zero_poll_interval_is_raised_to_one_second() {
        let config = ConsoleConfig {
            poll_interval_secs: 0,
            ..ConsoleConfig::default()
        };
        assert_eq!(config.poll_settings().interval, Duration::from_secs(1));
    }
}
