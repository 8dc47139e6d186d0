//! # Harvest Core
//!
//! Types and traits for the ecosystem.
//!
//! Defines the protocol spoken between the task client and a remote
//! asynchronous job API.
//!
//! - **[`JobRequest`](job::JobRequest)**: The `{ type, params }` payload that creates a job.
//! - **[`StatusSnapshot`](job::StatusSnapshot)**: One decoded status poll.
//! - **[`TaskOutput`](job::TaskOutput)**: The result of a finished job.
//! - **[`TaskTransport`](traits::TaskTransport)**: Trait for the wire layer (e.g., HTTP).

pub mod config;
pub mod constants;
pub mod error;
pub mod job;
pub mod traits;

pub mod prelude {
    pub use super::config::*;
    pub use super::constants::*;
    pub use super::error::*;
    pub use super::job::*;
    pub use super::traits::*;
}
