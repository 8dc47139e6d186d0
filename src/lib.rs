//! # Harvest
//!
//! Drives asynchronous satellite-imagery jobs (NDVI renders, vegetation-index and
//! soil-moisture statistics) to completion and serves them to an agronomy dashboard.
//!
//! This crate serves as an entry point, re-exporting the core types and
//! optionally including the client, proxy server and mock API via feature flags.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | **`client`** | The polling task client and HTTP transport (`harvest_client`). Default. |
//! | **`server`** | The Axum-based dashboard proxy (`harvest_server`). |
//! | **`mock`** | A scripted fake of the remote task API (`harvest_mock`). |
//!
//! ## Example: Polling a Job
//!
//! ```toml
//! [dependencies]
//! harvest = "0.3"
//! ```
//!
//! ```rust,no_run
//! use harvest::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let api = TaskApiConfig::new("https://api-connect.eos.com")
//!         .with_header("x-api-key", std::env::var("HARVEST_API_KEY")?);
//!     let client = AsyncTaskClient::new(HttpTransport::new(api)?, PollConfig::default())?;
//!
//!     // Submit
//!     let request = JobRequest::new(job_types::MT_STATS, json!({ "bm_type": "NDVI" }));
//!
//!     // Wait
//!     let output = client.submit_and_await(&request).await?;
//!     println!("{}", output.into_value());
//!     Ok(())
//! }
//! ```
//!
//! With the **`server`** feature, `HarvestServer::default().build(client)` turns the
//! same client into an Axum router for the dashboard.

pub use harvest_core::*;

#[cfg(feature = "client")]
pub mod client {
    pub use harvest_client::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use harvest_server::*;
}

#[cfg(feature = "mock")]
pub mod mock {
    pub use harvest_mock::*;
}

pub mod prelude {
    pub use harvest_core::prelude::*;

    #[cfg(feature = "client")]
    pub use harvest_client::{AsyncTaskClient, HttpTransport, PollOutcome, TokioSleeper};

    #[cfg(feature = "server")]
    pub use harvest_server::prelude::*;

    #[cfg(feature = "mock")]
    pub use harvest_mock::{MockReply, MockScript, MockTaskApi};
}
