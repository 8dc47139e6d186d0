//! # Harvest Client
//!
//! An async client that drives one remote asynchronous job from creation to a
//! terminal outcome.
//!
//! The remote API is eventually consistent: a job is created with one call and
//! then has to be polled until it reports a terminal status. [`AsyncTaskClient`]
//! hides that behind a single `await`, absorbing retryable upstream errors and
//! surfacing exactly one [`TaskOutput`] or [`TaskError`].
//!
//! ## Example
//!
//! ```no_run
//!  use harvest_client::{AsyncTaskClient, HttpTransport};
//!  use harvest_core::prelude::*;
//!  use serde_json::json;
//!
//!  async fn run() -> anyhow::Result<()> {
//!     let api = TaskApiConfig::new("https://api-connect.eos.com")
//!         .with_header("x-api-key", "my-key");
//!     let transport = HttpTransport::new(api)?;
//!     let client = AsyncTaskClient::new(transport, PollConfig::default())?;
//!
//!     let request = JobRequest::new("mt_stats", json!({ "bm_type": "NDVI" }));
//!     let output = client.submit_and_await(&request).await?;
//!     println!("{}", output.into_value());
//!     Ok(())
//! }
//! ```

mod transport;

pub use transport::HttpTransport;

use harvest_core::prelude::*;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub type PollOutcome = Result<TaskOutput, TaskError>;

/// The default [`Sleeper`], backed by the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Clone, Debug)]
pub struct AsyncTaskClient<T: TaskTransport, S: Sleeper = TokioSleeper> {
    transport: T,
    sleeper: S,
    config: PollConfig,
}

impl<T: TaskTransport> AsyncTaskClient<T> {
    pub fn new(transport: T, config: PollConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            transport,
            sleeper: TokioSleeper,
            config,
        })
    }
}

impl<T: TaskTransport, S: Sleeper> AsyncTaskClient<T, S> {
    /// Replaces the sleeper used between poll attempts.
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> AsyncTaskClient<T, S2> {
        AsyncTaskClient {
            transport: self.transport,
            sleeper,
            config: self.config,
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Creates a job and polls it until it reaches a terminal state.
    pub async fn submit_and_await(&self, request: &JobRequest) -> PollOutcome {
        self.submit_and_await_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Like [`submit_and_await`](Self::submit_and_await), but gives up with
    /// [`TaskError::Cancelled`] as soon as `cancel` fires.
    pub async fn submit_and_await_with_cancel(
        &self,
        request: &JobRequest,
        cancel: &CancellationToken,
    ) -> PollOutcome {
        let handle = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TaskError::Cancelled { task_id: None }),
            handle = self.create(request) => handle?,
        };

        self.poll(&handle, cancel).await
    }

    async fn create(&self, request: &JobRequest) -> Result<JobHandle, TaskError> {
        debug!(job_type = %request.kind, params = %request.params, "Creating task");

        let response = self.transport.create(request).await.map_err(|e| {
            warn!(error = %e, "Task creation call failed");
            TaskError::Creation {
                status: None,
                details: Value::String(e.to_string()),
            }
        })?;

        debug!(status = response.status, body = %response.body, "Task creation response");

        if response.status != 202 {
            return Err(TaskError::Creation {
                status: Some(response.status),
                details: response.body,
            });
        }

        // An accepted response without an id is still a failed creation.
        let handle = JobHandle::from_creation_body(&response.body).ok_or_else(|| {
            TaskError::Creation {
                status: None,
                details: response.body.clone(),
            }
        })?;

        info!(task_id = %handle, job_type = %request.kind, "Task created");
        Ok(handle)
    }

    async fn poll(&self, handle: &JobHandle, cancel: &CancellationToken) -> PollOutcome {
        let PollConfig {
            max_attempts,
            poll_interval,
            retry_policy,
        } = self.config;

        let cancelled = || TaskError::Cancelled {
            task_id: Some(handle.to_string()),
        };

        let mut attempts = 0;
        let mut last_status = None;

        while attempts < max_attempts {
            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                response = self.transport.status(handle) => response,
            };
            attempts += 1;

            let response = response.map_err(|source| {
                warn!(task_id = %handle, attempt = attempts, error = %source, "Status call failed");
                TaskError::Transport {
                    task_id: handle.to_string(),
                    source,
                }
            })?;

            debug!(
                task_id = %handle,
                attempt = attempts,
                status = response.status,
                body = %response.body,
                "Status response"
            );

            if response.is_success() {
                let snapshot = StatusSnapshot::from_body(response.body);

                if snapshot.is_success() {
                    info!(task_id = %handle, attempts, status = %snapshot.status, "Task finished");
                    return Ok(snapshot.into_output());
                }

                if snapshot.is_failure() {
                    warn!(task_id = %handle, attempts, status = %snapshot.status, "Task failed");
                    return Err(TaskError::TaskFailed {
                        task_id: handle.to_string(),
                        status: snapshot.status.to_string(),
                        details: snapshot.body,
                    });
                }

                last_status = Some(snapshot.status.to_string());
            } else if retry_policy.is_retryable(response.status) {
                warn!(
                    task_id = %handle,
                    attempt = attempts,
                    status = response.status,
                    "Retryable upstream error while polling"
                );
            } else {
                return Err(TaskError::Transport {
                    task_id: handle.to_string(),
                    source: TransportError::Status {
                        status: response.status,
                        body: response.body,
                    },
                });
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                _ = self.sleeper.sleep(poll_interval) => {}
            }
        }

        warn!(task_id = %handle, attempts, ?last_status, "Gave up waiting for task");
        Err(TaskError::PollTimeout {
            task_id: handle.to_string(),
            attempts,
            last_status,
        })
    }
}
