//! Response bodies of the refresh API and their mapping onto core types.
//!
//! The status endpoint reports the raw task-queue state (`PENDING`,
//! `PROGRESS`, `SUCCESS`, ...) together with a free-form `meta` object that the
//! worker fills in as it runs. Everything here is lenient: unknown states and
//! odd `meta` shapes degrade to a running job rather than an error.

use refresh_core::{ChannelSummary, FieldError, JobStatus, StatusSnapshot};
use refresh_logging::{refresh_debug, refresh_warn};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    pub task_id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChannelPage {
    #[serde(default)]
    pub total_channels: Option<u64>,
    pub channels: Vec<ChannelSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskStatusResponse {
    pub status: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error_info: Option<Value>,
    #[serde(default)]
    pub meta: Option<Value>,
}

/// Worker-reported progress fields, each read on its own so one off-shape
/// value does not discard the rest.
#[derive(Debug)]
struct TaskMeta<'a> {
    fields: Option<&'a Map<String, Value>>,
}

impl<'a> TaskMeta<'a> {
    fn new(meta: Option<&'a Value>) -> Self {
        let fields = match meta {
            Some(Value::Object(fields)) => Some(fields),
            Some(Value::Null) | None => None,
            Some(other) => {
                refresh_debug!("Ignoring task meta that is not an object: {other}");
                None
            }
        };
        Self { fields }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields
            .and_then(|fields| fields.get(key))
            .filter(|value| !value.is_null())
    }

    fn text(&self, key: &str) -> Option<String> {
        self.get(key).map(value_text).filter(|text| !text.is_empty())
    }

    fn count(&self, key: &str) -> Option<u64> {
        let value = self.get(key)?;
        let count = value
            .as_u64()
            .or_else(|| whole_number(value.as_f64()?))
            .or_else(|| value.as_str()?.trim().parse().ok());
        if count.is_none() {
            refresh_debug!("Ignoring unreadable meta.{key}: {value}");
        }
        count
    }
}

fn whole_number(number: f64) -> Option<u64> {
    (number.is_finite() && number >= 0.0 && number.fract() == 0.0).then(|| number as u64)
}

pub(crate) fn job_status(raw: &str) -> JobStatus {
    match raw.trim().to_ascii_uppercase().as_str() {
        "PENDING" => JobStatus::Pending,
        "STARTED" | "PROGRESS" | "RETRY" => JobStatus::Started,
        "SUCCESS" => JobStatus::Success,
        "FAILURE" | "REVOKED" => JobStatus::Failure,
        other => {
            refresh_warn!("Unknown task state '{other}', treating it as running");
            JobStatus::Started
        }
    }
}

impl TaskStatusResponse {
    pub(crate) fn into_snapshot(self) -> StatusSnapshot {
        let status = job_status(&self.status);
        let meta = TaskMeta::new(self.meta.as_ref());

        let mut snapshot = StatusSnapshot::new(status);
        if let Some(percent) = meta.get("progress").and_then(progress_value) {
            snapshot = snapshot.with_progress(percent);
        }
        snapshot.current_step = meta.text("current_step");
        snapshot.processed_count = meta.count("processed_count");
        snapshot.total_to_process = meta.count("total_to_process");
        snapshot.result_summary = meta
            .text("result_summary")
            .or_else(|| self.result.as_ref().and_then(Value::as_str).map(str::to_string));
        snapshot.error_message = meta.text("error");
        if status == JobStatus::Failure && snapshot.error_message.is_none() {
            snapshot.error_message = Some(
                self.error_info
                    .as_ref()
                    .map(value_text)
                    .unwrap_or_else(|| "job failed without an error message".to_string()),
            );
        }
        snapshot.failure_detail = meta.get("raw_info_on_failure").cloned();
        snapshot
    }
}

fn progress_value(value: &Value) -> Option<i64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then(|| number.round() as i64)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Message and field errors extracted from a non-2xx response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ErrorDetail {
    pub message: String,
    pub field_errors: Vec<FieldError>,
}

pub(crate) fn error_detail(status: u16, body: &str) -> ErrorDetail {
    let fallback = format!("HTTP {status}");
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|mut value| value.get_mut("detail").map(Value::take));

    match detail {
        Some(Value::String(message)) => ErrorDetail {
            message,
            field_errors: Vec::new(),
        },
        Some(Value::Array(items)) => {
            let field_errors: Vec<FieldError> = items.iter().filter_map(field_error).collect();
            let message = if field_errors.is_empty() {
                fallback
            } else {
                field_errors
                    .iter()
                    .map(|err| format!("{}: {}", err.field, err.message))
                    .collect::<Vec<_>>()
                    .join("; ")
            };
            ErrorDetail {
                message,
                field_errors,
            }
        }
        Some(other) if !other.is_null() => ErrorDetail {
            message: value_text(&other),
            field_errors: Vec::new(),
        },
        _ => ErrorDetail {
            message: fallback,
            field_errors: Vec::new(),
        },
    }
}

/// One entry of a request-validation error list: `{loc: [...], msg}`.
fn field_error(item: &Value) -> Option<FieldError> {
    let message = item.get("msg")?.as_str()?.to_string();
    let field = item
        .get("loc")
        .and_then(Value::as_array)
        .map(|loc| {
            loc.iter()
                .filter(|part| part.as_str() != Some("body"))
                .map(value_text)
                .collect::<Vec<_>>()
                .join(".")
        })
        .filter(|field| !field.is_empty())
        .unwrap_or_else(|| "request".to_string());
    Some(FieldError { field, message })
}
