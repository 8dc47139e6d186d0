//! # Harvest Server
//!
//! A thin, Axum-based proxy in front of the remote task API.
//!
//! Every route takes a domain payload from the dashboard, wraps it into a
//! [`JobRequest`](harvest_core::job::JobRequest), drives it to completion with an
//! [`AsyncTaskClient`] and hands the outcome back unchanged:
//!
//! * success: `{ "success": true, "data": ... }` (or `imageUrl` for rendered images)
//! * failure: `{ "success": false, "error": ..., "details": ... }`, with the
//!   upstream HTTP status when there is one, 500 otherwise.
//!
//! ## Example
//!
//! ```no_run
//! use harvest_client::{AsyncTaskClient, HttpTransport};
//! use harvest_core::prelude::*;
//! use harvest_server::prelude::*;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let transport = HttpTransport::new(TaskApiConfig::new("https://api-connect.eos.com"))?;
//! let client = AsyncTaskClient::new(transport, PollConfig::default())?;
//!
//! let app = HarvestServer::default().build(client);
//! # Ok(())
//! # }
//! ```

mod api;

pub mod payload;
pub mod state;

use harvest_client::AsyncTaskClient;
use harvest_core::prelude::{routes::*, *};

use axum::{
    Router,
    routing::{get, post},
};
use state::AppState;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// The builder for the Harvest proxy.
#[derive(Clone, Debug, Default)]
pub struct HarvestServer {
    config: HarvestServerConfig,
}

impl HarvestServer {
    pub fn new(config: HarvestServerConfig) -> Self {
        Self { config }
    }
}

#[derive(Clone, Debug, Default)]
pub struct HarvestServerConfig {
    /// Cancelled on shutdown; in-flight polls end with
    /// [`TaskError::Cancelled`](harvest_core::error::TaskError::Cancelled).
    pub shutdown: CancellationToken,
}

impl HarvestServer {
    pub fn build<T: TaskTransport, S: Sleeper>(self, client: AsyncTaskClient<T, S>) -> Router {
        let HarvestServerConfig { shutdown } = self.config;
        Router::new()
            .route(HEALTH, get(|| async { "OK" }))
            .route(NDVI_IMAGE, post(api::ndvi_image::<T, S>))
            .route(VEGETATION_STATS, post(api::vegetation_stats::<T, S>))
            .route(SOIL_MOISTURE, post(api::soil_moisture::<T, S>))
            .layer(TraceLayer::new_for_http())
            .with_state(AppState { client, shutdown })
    }
}

pub mod prelude {
    pub use crate::payload::*;
    pub use crate::state::*;
    pub use crate::{HarvestServer, HarvestServerConfig};
}
