use crate::error::*;
use crate::job::*;

use std::time::Duration;

/// A trait for injecting the wire layer into the task client.
///
/// Implementations return `Ok` for every response that arrived, whatever its
/// HTTP status, and `Err` only when no usable response was received.
pub trait TaskTransport: Send + Sync + 'static + Clone {
    /// Submits a job-creation request.
    fn create(
        &self,
        request: &JobRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;

    /// Fetches the current status of a job.
    fn status(
        &self,
        handle: &JobHandle,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// Suspends the poll loop between attempts.
pub trait Sleeper: Send + Sync + 'static + Clone {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}
