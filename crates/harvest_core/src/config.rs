use crate::constants::routes;
use crate::error::ConfigError;

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10_000);

/// Decides which HTTP error statuses seen while polling are worth another attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Every 4xx and 5xx consumes an attempt and is retried.
    #[default]
    Lenient,
    /// 401, 403 and 404 end polling immediately. Other 4xx and all 5xx are retried.
    FailFast,
}

impl RetryPolicy {
    pub fn is_retryable(&self, status: u16) -> bool {
        let retryable = (400..600).contains(&status);
        match self {
            Self::Lenient => retryable,
            Self::FailFast => retryable && !matches!(status, 401 | 403 | 404),
        }
    }
}

impl FromStr for RetryPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "lenient" => Ok(Self::Lenient),
            "fail_fast" => Ok(Self::FailFast),
            other => Err(ConfigError::Invalid(format!("unknown retry policy '{other}'"))),
        }
    }
}

/// How long and how often to poll a job.
///
/// The effective ceiling is `max_attempts * poll_interval`; there is no wall-clock deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Status calls to make before giving up. Must be positive.
    ///
    /// Defaults to `30`.
    pub max_attempts: u32,
    /// Delay after every non-terminal poll. Must be positive.
    ///
    /// Defaults to 10 seconds.
    pub poll_interval: Duration,
    pub retry_policy: RetryPolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl PollConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be positive".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid("poll_interval must be positive".into()));
        }
        Ok(())
    }
}

/// Where the remote task API lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskApiConfig {
    /// Base URL, e.g. `https://api-connect.eos.com`.
    pub base_url: String,
    /// Path of the job-creation endpoint, relative to `base_url`.
    pub creation_endpoint: String,
    /// Path of the status endpoint; `{task_id}` is replaced with the percent-encoded
    /// job handle.
    pub status_endpoint_template: String,
    /// Extra headers sent with every call (e.g. the API key header).
    pub headers: Vec<(String, String)>,
    /// Timeout of a single HTTP call.
    ///
    /// Defaults to 30 seconds.
    pub request_timeout: Duration,
}

impl TaskApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            creation_endpoint: routes::UPSTREAM_CREATE.to_string(),
            status_endpoint_template: routes::UPSTREAM_STATUS.to_string(),
            headers: Vec::new(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_endpoints(
        mut self,
        creation_endpoint: impl Into<String>,
        status_endpoint_template: impl Into<String>,
    ) -> Self {
        self.creation_endpoint = creation_endpoint.into();
        self.status_endpoint_template = status_endpoint_template.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("base_url".into()));
        }
        if !self
            .status_endpoint_template
            .contains(routes::TASK_ID_PLACEHOLDER)
        {
            return Err(ConfigError::Invalid(format!(
                "status endpoint template '{}' has no {} placeholder",
                self.status_endpoint_template,
                routes::TASK_ID_PLACEHOLDER
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid("request_timeout must be positive".into()));
        }
        for (i, (name, _)) in self.headers.iter().enumerate() {
            if self.headers[..i]
                .iter()
                .any(|(earlier, _)| earlier.eq_ignore_ascii_case(name))
            {
                return Err(ConfigError::Invalid(format!(
                    "header '{name}' is set more than once"
                )));
            }
        }
        Ok(())
    }
}
