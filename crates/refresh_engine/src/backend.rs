use std::time::Duration;

use refresh_core::{
    ChannelSummary, JobHandle, JobSpec, StatusSnapshot, SubmissionError, SubmissionErrorKind,
};
use refresh_logging::{refresh_debug, refresh_info, refresh_warn};
use reqwest::StatusCode;
use url::Url;

use crate::wire::{self, ChannelPage, SubmitResponse, TaskStatusResponse};
use crate::{BackendError, BackendFailure, SubmissionAck};

const SUBMIT_PATH: &str = "run-advanced-data-refresh/";
const STATUS_PATH: &str = "task-status/";
const CHANNELS_PATH: &str = "channels/";

#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// API root, e.g. `http://localhost:8000/api/v1`.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub catalog_page_size: u32,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            catalog_page_size: 100,
        }
    }
}

/// The backend operations the job controller relies on.
#[async_trait::async_trait]
pub trait JobBackend: Send + Sync {
    /// Starts a job. Called once per submission, never retried.
    async fn submit_job(&self, spec: &JobSpec) -> Result<SubmissionAck, SubmissionError>;

    async fn query_job_status(&self, handle: &JobHandle) -> Result<StatusSnapshot, BackendError>;

    /// Full channel catalog, including inactive channels.
    async fn fetch_channels(&self) -> Result<Vec<ChannelSummary>, BackendError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: BackendSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let base = parse_base_url(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| BackendError::new(BackendFailure::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base
            .join(path)
            .map_err(|err| BackendError::new(BackendFailure::InvalidUrl, err.to_string()))
    }

    fn status_url(&self, handle: &JobHandle) -> Result<Url, BackendError> {
        let mut url = self.endpoint(STATUS_PATH)?;
        url.path_segments_mut()
            .map_err(|_| {
                BackendError::new(BackendFailure::InvalidUrl, "base url cannot have a path")
            })?
            .pop_if_empty()
            .push(handle.task_id());
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> Result<String, BackendError> {
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            let detail = wire::error_detail(status.as_u16(), &body);
            return Err(BackendError::new(
                BackendFailure::HttpStatus(status.as_u16()),
                detail.message,
            ));
        }
        Ok(body)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, BackendError> {
    // Url::join replaces the last segment unless the base ends with a slash.
    let mut normalized = raw.trim().trim_end_matches('/').to_string();
    normalized.push('/');
    Url::parse(&normalized)
        .map_err(|err| BackendError::new(BackendFailure::InvalidUrl, format!("{raw}: {err}")))
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body)
        .map_err(|err| BackendError::new(BackendFailure::Malformed, err.to_string()))
}

#[async_trait::async_trait]
impl JobBackend for ReqwestBackend {
    async fn submit_job(&self, spec: &JobSpec) -> Result<SubmissionAck, SubmissionError> {
        let url = self
            .endpoint(SUBMIT_PATH)
            .map_err(|err| SubmissionError::new(SubmissionErrorKind::Unknown, err.to_string()))?;
        refresh_info!("Submitting refresh job to {url}");

        let response = self
            .client
            .post(url)
            .json(spec)
            .send()
            .await
            .map_err(|err| {
                refresh_warn!("Submission request failed: {err}");
                network_failure(err)
            })?;
        let status = response.status();
        let body = response.text().await.map_err(network_failure)?;

        if !status.is_success() {
            let detail = wire::error_detail(status.as_u16(), &body);
            refresh_warn!("Submission rejected with {status}: {}", detail.message);
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    SubmissionError::validation(detail.message, detail.field_errors)
                }
                _ => SubmissionError::new(SubmissionErrorKind::Unknown, detail.message),
            });
        }

        let ack: SubmitResponse = parse_json(&body)
            .map_err(|err| SubmissionError::new(SubmissionErrorKind::Unknown, err.to_string()))?;
        if ack.task_id.trim().is_empty() {
            return Err(SubmissionError::new(
                SubmissionErrorKind::Unknown,
                "backend returned an empty task id",
            ));
        }
        refresh_info!("Refresh job accepted, task id {}", ack.task_id);
        Ok(SubmissionAck {
            handle: JobHandle::new(ack.task_id),
            message: ack.message,
            details: ack.details,
        })
    }

    async fn query_job_status(&self, handle: &JobHandle) -> Result<StatusSnapshot, BackendError> {
        let url = self.status_url(handle)?;
        let body = self.get_text(url).await?;
        let response: TaskStatusResponse = parse_json(&body)?;
        refresh_debug!("Task {handle} reported {}", response.status);
        Ok(response.into_snapshot())
    }

    async fn fetch_channels(&self) -> Result<Vec<ChannelSummary>, BackendError> {
        let page_size = self.settings.catalog_page_size.max(1);
        let mut channels = Vec::new();
        loop {
            let mut url = self.endpoint(CHANNELS_PATH)?;
            url.query_pairs_mut()
                .append_pair("skip", &channels.len().to_string())
                .append_pair("limit", &page_size.to_string());
            let page: ChannelPage = parse_json(&self.get_text(url).await?)?;
            let received = page.channels.len();
            channels.extend(page.channels);

            let total = page.total_channels.unwrap_or(channels.len() as u64);
            if received == 0 || received < page_size as usize || channels.len() as u64 >= total {
                break;
            }
        }
        refresh_debug!("Loaded {} channels", channels.len());
        Ok(channels)
    }
}

fn network_failure(err: reqwest::Error) -> SubmissionError {
    SubmissionError::new(SubmissionErrorKind::Network, map_reqwest_error(err).to_string())
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(BackendFailure::Timeout, err.to_string());
    }
    BackendError::new(BackendFailure::Network, err.to_string())
}
