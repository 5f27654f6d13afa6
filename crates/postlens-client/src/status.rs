//! Backend endpoints and the analysis queue reply contract.
//!
//! Replies are decoded into explicit types here, once, so the polling code
//! never has to guess which fields a server chose to send.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

/// HTTP endpoint paths of the analysis backend.
pub mod endpoints {
    pub const HEALTH: &str = "/health";
    pub const ANALYZE: &str = "/analyze";
    pub const QUEUE_STATUS: &str = "/queue/status";
    pub const QUEUE_RESULT: &str = "/queue/result";
    pub const GLOBAL_STATS: &str = "/global-stats";
}

/// Top-level keys that mark a reply as a finished analysis.
const ANALYSIS_KEYS: [&str; 4] = ["comments", "posts", "about", "account_info"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Queued,
    Processing,
    #[serde(alias = "completed", alias = "ready")]
    Done,
    #[serde(alias = "error")]
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Processing => write!(f, "processing"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A queue ticket or status poll reply, as sent on the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReply {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub position: Option<u64>,
    #[serde(default)]
    pub eta_seconds: Option<f64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusReply {
    pub fn progress(&self) -> QueueProgress {
        QueueProgress {
            status: self.status,
            position: self.position,
            eta_seconds: self.eta_seconds,
        }
    }

    pub fn into_state(self) -> QueueState {
        match self.status {
            JobStatus::Queued => QueueState::Queued {
                position: self.position,
                eta_seconds: self.eta_seconds,
            },
            JobStatus::Processing => QueueState::Processing {
                position: self.position,
                eta_seconds: self.eta_seconds,
            },
            JobStatus::Done => QueueState::Done { result: self.result },
            JobStatus::Failed => QueueState::Failed { message: self.message },
        }
    }
}

/// Where an analysis job stands.
#[derive(Clone, Debug, PartialEq)]
pub enum QueueState {
    Queued { position: Option<u64>, eta_seconds: Option<f64> },
    Processing { position: Option<u64>, eta_seconds: Option<f64> },
    /// Finished. `result` is absent when the server wants it fetched separately.
    Done { result: Option<Value> },
    Failed { message: Option<String> },
}

/// Progress report handed to analysis callers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueueProgress {
    pub status: JobStatus,
    pub position: Option<u64>,
    pub eta_seconds: Option<f64>,
}

/// The reply to `POST /analyze`.
#[derive(Clone, Debug, PartialEq)]
pub enum AnalyzeReply {
    /// The job was queued; poll with the ticket's `request_id`.
    Queued(StatusReply),
    /// The server answered with the finished analysis directly.
    Complete(Value),
}

impl AnalyzeReply {
    /// A reply counts as a finished analysis when it carries analysis data
    /// and no usable `status`. A `null`, empty, `false` or zero status is
    /// treated as absent.
    pub fn classify(mut value: Value) -> ClientResult<Self> {
        let has_status = value.get("status").is_some_and(is_set);
        if !has_status {
            if let Value::Object(fields) = &mut value {
                fields.remove("status");
            }
        }
        let has_analysis = ANALYSIS_KEYS
            .iter()
            .any(|key| value.get(key).is_some_and(|v| !v.is_null()));

        if has_analysis && !has_status {
            return Ok(Self::Complete(value));
        }
        serde_json::from_value(value)
            .map(Self::Queued)
            .map_err(|e| ClientError::Protocol(format!("unrecognized analyze reply: {e}")))
    }
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The analysis request body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub username: String,
    pub top: u32,
    pub include_raw: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub force_refresh: bool,
}

impl AnalyzeRequest {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            top: 0,
            include_raw: true,
            force_refresh: false,
        }
    }
}
