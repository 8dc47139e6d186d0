mod args;

use anyhow::{Context, bail};
use args::{ApiArgs, Cli, Command, PollArgs};
use clap::Parser;
use harvest_client::{AsyncTaskClient, HttpTransport};
use harvest_core::prelude::*;
use harvest_mock::{MockScript, MockTaskApi};
use harvest_server::prelude::*;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match Cli::parse().command {
        Command::Serve {
            port,
            mock,
            api,
            poll,
        } => serve(port, mock, api, poll).await,
        Command::Run {
            kind,
            params,
            api,
            poll,
        } => run(kind, params, api, poll).await,
    }
}

fn build_client(
    api: &ApiArgs,
    base_url: &str,
    poll: &PollArgs,
) -> anyhow::Result<AsyncTaskClient<HttpTransport>> {
    let transport = HttpTransport::new(api.to_config(base_url))?;
    let client = AsyncTaskClient::new(transport, poll.to_config())?;
    Ok(client)
}

/// Cancels `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
            token.cancel();
        }
    });
}

async fn serve(port: u16, mock: bool, api: ApiArgs, poll: PollArgs) -> anyhow::Result<()> {
    // Kept alive for as long as the server runs.
    let fake = if mock {
        Some(MockTaskApi::spawn(MockScript::demo()).await?)
    } else {
        None
    };

    let base_url = match &fake {
        Some(fake) => {
            warn!(url = fake.base_url(), "Serving against the mock task API");
            fake.base_url().to_string()
        }
        None => {
            if api.api_key.is_none() {
                warn!("No API key configured, upstream calls will likely be rejected");
            }
            api.api_url.clone()
        }
    };

    let client = build_client(&api, &base_url, &poll)?;
    let shutdown = CancellationToken::new();
    let app = HarvestServer::new(HarvestServerConfig {
        shutdown: shutdown.clone(),
    })
    .build(client);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server listening on http://{addr}");

    cancel_on_ctrl_c(shutdown.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}

async fn run(kind: String, params: String, api: ApiArgs, poll: PollArgs) -> anyhow::Result<()> {
    let raw = match params.strip_prefix('@') {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading params from {path}"))?,
        None => params,
    };
    let params: Value = serde_json::from_str(&raw).context("params must be valid JSON")?;
    if !params.is_object() {
        bail!("params must be a JSON object");
    }

    let client = build_client(&api, &api.api_url, &poll)?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let output = client
        .submit_and_await_with_cancel(&JobRequest::new(kind, params), &cancel)
        .await?;

    match output.locator() {
        Some(url) => println!("{url}"),
        None => println!("{}", serde_json::to_string_pretty(&output.into_value())?),
    }

    Ok(())
}
