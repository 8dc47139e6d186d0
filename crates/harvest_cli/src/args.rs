use clap::{Args, Parser, Subcommand};
use harvest_core::prelude::*;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "harvest", version, about = "Drive remote imagery tasks to completion")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP proxy for the dashboard.
    Serve {
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,

        /// Serve against an in-process fake task API instead of the real one.
        #[arg(long)]
        mock: bool,

        #[command(flatten)]
        api: ApiArgs,

        #[command(flatten)]
        poll: PollArgs,
    },
    /// Submit one job and print its result.
    Run {
        /// Job type, e.g. `mt_stats`.
        #[arg(long = "type")]
        kind: String,

        /// Job params as JSON, or `@path` to read them from a file.
        #[arg(long)]
        params: String,

        #[command(flatten)]
        api: ApiArgs,

        #[command(flatten)]
        poll: PollArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    #[arg(long, env = "HARVEST_API_URL", default_value = "https://api-connect.eos.com")]
    pub api_url: String,

    #[arg(long, env = "HARVEST_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "HARVEST_API_KEY_HEADER", default_value = "x-api-key")]
    pub api_key_header: String,

    #[arg(long, default_value = routes::UPSTREAM_CREATE)]
    pub create_endpoint: String,

    #[arg(long, default_value = routes::UPSTREAM_STATUS)]
    pub status_endpoint: String,

    /// Timeout of a single upstream call, in seconds.
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl ApiArgs {
    pub fn to_config(&self, base_url: &str) -> TaskApiConfig {
        let mut config = TaskApiConfig::new(base_url)
            .with_endpoints(&self.create_endpoint, &self.status_endpoint);
        config.request_timeout = Duration::from_secs(self.request_timeout_secs);

        match &self.api_key {
            Some(key) => config.with_header(&self.api_key_header, key),
            None => config,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PollArgs {
    #[arg(long, env = "HARVEST_POLL_INTERVAL_MS", default_value_t = 10_000)]
    pub poll_interval_ms: u64,

    #[arg(long, env = "HARVEST_MAX_ATTEMPTS", default_value_t = 30)]
    pub max_attempts: u32,

    /// `lenient` retries every 4xx/5xx, `fail-fast` stops on 401/403/404.
    #[arg(long, env = "HARVEST_RETRY_POLICY", default_value = "lenient")]
    pub retry_policy: RetryPolicy,
}

impl PollArgs {
    pub fn to_config(&self) -> PollConfig {
        PollConfig::default()
            .with_max_attempts(self.max_attempts)
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_retry_policy(self.retry_policy)
    }
}
