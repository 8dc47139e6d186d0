use harvest_client::AsyncTaskClient;
use harvest_core::prelude::*;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState<T: TaskTransport, S: Sleeper> {
    pub client: AsyncTaskClient<T, S>,
    pub shutdown: CancellationToken,
}

impl<T: TaskTransport, S: Sleeper> AppState<T, S> {
    /// Runs one job to completion, giving up when the server shuts down.
    pub async fn run(&self, request: JobRequest) -> Result<TaskOutput, TaskError> {
        self.client
            .submit_and_await_with_cancel(&request, &self.shutdown)
            .await
    }
}
