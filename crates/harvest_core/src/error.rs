use serde_json::Value;
use thiserror::Error;

/// A wire-level failure, raised by a [`TaskTransport`](crate::traits::TaskTransport).
///
/// HTTP error statuses are not transport errors on their own; the client decides
/// which of them are retryable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// DNS, connect, TLS or timeout failure. The request never produced a response.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The remote answered with a success status but a body we couldn't decode.
    #[error("Malformed response: {0}")]
    Decode(String),

    /// An HTTP error status the retry policy treats as fatal.
    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: Value },
}

#[derive(Error, Debug)]
pub enum TaskError {
    /// The creation call didn't return 202 with a `task_id`.
    /// Never retried. `status` is [`None`] if the call didn't get a response.
    #[error("Job creation failed (upstream status {status:?}): {details}")]
    Creation { status: Option<u16>, details: Value },

    /// The remote job reached a terminal failure status.
    #[error("Task {task_id} failed with status '{status}'")]
    TaskFailed {
        task_id: String,
        status: String,
        details: Value,
    },

    /// A non-retryable transport fault while polling.
    #[error("Transport failure while polling task {task_id}: {source}")]
    Transport {
        task_id: String,
        #[source]
        source: TransportError,
    },

    /// All attempts were used up without a terminal status.
    #[error("Task {task_id} still not finished after {attempts} attempts")]
    PollTimeout {
        task_id: String,
        attempts: u32,
        last_status: Option<String>,
    },

    /// The caller cancelled the operation.
    #[error("Task operation cancelled (task {task_id:?})")]
    Cancelled { task_id: Option<String> },
}

impl TaskError {
    /// The HTTP status the upstream answered with, when one caused the failure.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Creation { status, .. } => *status,
            Self::Transport {
                source: TransportError::Status { status, .. },
                ..
            } => Some(*status),
            _ => None,
        }
    }

    /// Upstream details to hand back to the caller.
    pub fn details(&self) -> Value {
        match self {
            Self::Creation { details, .. } | Self::TaskFailed { details, .. } => details.clone(),
            Self::Transport { source, .. } => match source {
                TransportError::Status { body, .. } => body.clone(),
                other => Value::String(other.to_string()),
            },
            Self::PollTimeout {
                attempts,
                last_status,
                ..
            } => serde_json::json!({
                "attempts": attempts,
                "last_status": last_status,
            }),
            Self::Cancelled { .. } => Value::Null,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A value is present but unusable (e.g., zero attempts).
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A required value is absent.
    #[error("Missing configuration: {0}")]
    Missing(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upstream_status_only_when_known() {
        let creation = TaskError::Creation {
            status: Some(400),
            details: json!({ "error": "bad geometry" }),
        };
        assert_eq!(creation.upstream_status(), Some(400));

        let not_found = TaskError::Transport {
            task_id: "t".into(),
            source: TransportError::Status {
                status: 404,
                body: json!("gone"),
            },
        };
        assert_eq!(not_found.upstream_status(), Some(404));

        let timeout = TaskError::PollTimeout {
            task_id: "t".into(),
            attempts: 3,
            last_status: Some("pending".into()),
        };
        assert_eq!(timeout.upstream_status(), None);
        assert_eq!(timeout.details()["attempts"], 3);
    }

    #[test]
    fn display_messages() {
        let err = TaskError::Creation {
            status: None,
            details: json!("connection refused"),
        };
        assert_eq!(
            err.to_string(),
            "Job creation failed (upstream status None): \"connection refused\""
        );

        let err = TaskError::Cancelled {
            task_id: Some("t1".into()),
        };
        assert_eq!(
            err.to_string(),
            "Task operation cancelled (task Some(\"t1\"))"
        );
    }
}
