use crate::constants::fields;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A request to create a new job on the remote task API.
///
/// Serializes to the `{ "type": ..., "params": ... }` shape the remote API expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRequest {
    /// The kind of job to run (e.g., "jpeg", "mt_stats").
    #[serde(rename = "type")]
    pub kind: String,
    /// Job parameters, passed through to the remote API untouched.
    pub params: Value,
}

impl JobRequest {
    pub fn new(kind: impl Into<String>, params: Value) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }
}

/// The identifier the remote API assigned to a created job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extracts the `task_id` of a creation response.
    ///
    /// Numeric ids are accepted and rendered as strings. Empty ids are rejected.
    pub fn from_creation_body(body: &Value) -> Option<Self> {
        match body.get(fields::TASK_ID)? {
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_string())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Finished,
    Done,
    Failed,
    Error,
    /// Anything the remote reported that we don't recognize, lowercased.
    /// Empty when the field was absent.
    Other(String),
}

impl JobStatus {
    /// Parses a remote status value, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "finished" => Self::Finished,
            "done" => Self::Done,
            "failed" => Self::Failed,
            "error" => Self::Error,
            _ => Self::Other(normalized),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Finished | Self::Done)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Error)
    }

    pub fn is_terminal(&self) -> bool {
        self.is_success() || self.is_failure()
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One HTTP exchange with the remote API: the status code and the decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

impl RawResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The decoded body of a single status poll.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub status: JobStatus,
    /// Out-of-band result artifact, if the remote already produced one.
    pub result_url: Option<String>,
    /// Inline result payload. `null` is treated as absent.
    pub result: Option<Value>,
    pub body: Value,
    pub received_at: DateTime<Utc>,
}

impl StatusSnapshot {
    pub fn from_body(body: Value) -> Self {
        let status = body
            .get(fields::STATUS)
            .and_then(Value::as_str)
            .map(JobStatus::parse)
            .unwrap_or_else(|| JobStatus::Other(String::new()));

        let result_url = body
            .get(fields::RESULT_URL)
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        let result = body
            .get(fields::RESULT)
            .filter(|r| !r.is_null())
            .cloned();

        Self {
            status,
            result_url,
            result,
            body,
            received_at: Utc::now(),
        }
    }

    /// A locator anywhere in the response ends polling, whatever the status says.
    pub fn is_success(&self) -> bool {
        self.status.is_success() || self.result_url.is_some()
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success() && self.status.is_failure()
    }

    /// Picks the result: locator, then inline result, then the raw body.
    pub fn into_output(self) -> TaskOutput {
        if let Some(url) = self.result_url {
            TaskOutput::Locator(url)
        } else if let Some(result) = self.result {
            TaskOutput::Inline(result)
        } else {
            TaskOutput::Raw(self.body)
        }
    }
}

/// The result of a finished job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TaskOutput {
    /// URL of an out-of-band artifact (e.g., a rendered image).
    Locator(String),
    /// The `result` field of the status response.
    Inline(Value),
    /// The whole status response, when it carried neither of the above.
    Raw(Value),
}

impl TaskOutput {
    pub fn locator(&self) -> Option<&str> {
        match self {
            Self::Locator(url) => Some(url),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Locator(url) => Value::String(url),
            Self::Inline(v) | Self::Raw(v) => v,
        }
    }
}
