use harvest_client::{AsyncTaskClient, HttpTransport};
use harvest_core::prelude::*;
use harvest_mock::{MockReply, MockScript, MockTaskApi};
use harvest_server::prelude::*;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct TestServer {
    base_url: String,
    upstream: MockTaskApi,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(script: MockScript) -> Self {
        Self::spawn_with(script, HarvestServerConfig::default()).await
    }

    async fn spawn_with(script: MockScript, config: HarvestServerConfig) -> Self {
        let upstream = MockTaskApi::spawn(script).await.unwrap();
        let transport = HttpTransport::new(TaskApiConfig::new(upstream.base_url())).unwrap();
        let poll = PollConfig::default()
            .with_max_attempts(3)
            .with_poll_interval(Duration::from_millis(10));
        let client = AsyncTaskClient::new(transport, poll).unwrap();

        let app = HarvestServer::new(config).build(client);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            upstream,
            handle,
        }
    }

    async fn post(&self, route: &str, body: Value) -> (StatusCode, Value) {
        let res = reqwest::Client::new()
            .post(format!("{}{}", self.base_url, route))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn polygon() -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[[30.1, 50.2], [30.2, 50.2], [30.2, 50.3], [30.1, 50.2]]]
    })
}

fn stats_body() -> Value {
    json!({ "dateStart": "2024-05-01", "dateEnd": "2024-06-01", "geometry": polygon() })
}

#[tokio::test]
async fn health() {
    let server = TestServer::spawn(MockScript::demo()).await;
    let res = reqwest::get(format!("{}/health", server.base_url))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn vegetation_stats_passes_result_through() {
    let server = TestServer::spawn(MockScript::demo()).await;

    let (status, body) = server.post(routes::VEGETATION_STATS, stats_body()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "data": { "ndvi": 0.42 } }));

    let created = server.upstream.created_jobs();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["type"], "mt_stats");
    assert_eq!(created[0]["params"]["bm_type"], "NDVI");
    assert_eq!(created[0]["params"]["date_start"], "2024-05-01");
}

#[tokio::test]
async fn soil_moisture_uses_moisture_index() {
    let server = TestServer::spawn(MockScript::demo()).await;

    let (status, body) = server.post(routes::SOIL_MOISTURE, stats_body()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        server.upstream.created_jobs()[0]["params"]["bm_type"],
        "SOIL_MOISTURE"
    );
}

#[tokio::test]
async fn ndvi_image_returns_image_url() {
    let script = MockScript::default().then(MockReply::ok(json!({
        "status": "pending",
        "result_url": "https://cdn.example/ndvi/field-7.png"
    })));
    let server = TestServer::spawn(script).await;

    let (status, body) = server
        .post(routes::NDVI_IMAGE, json!({ "viewId": "S2/36/U/UA/2024/5/1/0" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "success": true, "imageUrl": "https://cdn.example/ndvi/field-7.png" })
    );
    assert_eq!(server.upstream.created_jobs()[0]["type"], "jpeg");
}

#[tokio::test]
async fn upstream_creation_status_is_propagated() {
    let script = MockScript::default().with_creation(MockReply::new(
        422,
        json!({ "error": "geometry too large" }),
    ));
    let server = TestServer::spawn(script).await;

    let (status, body) = server.post(routes::VEGETATION_STATS, stats_body()).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["details"], json!({ "error": "geometry too large" }));
    assert!(body["error"].as_str().unwrap().contains("creation failed"));
    assert_eq!(server.upstream.status_calls(), 0);
}

#[tokio::test]
async fn task_failure_is_500_with_details() {
    let script = MockScript::default().then(MockReply::ok(json!({
        "status": "failed",
        "message": "no scenes for date range"
    })));
    let server = TestServer::spawn(script).await;

    let (status, body) = server.post(routes::VEGETATION_STATS, stats_body()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["details"]["message"], "no scenes for date range");
}

#[tokio::test]
async fn poll_timeout_is_500() {
    let server = TestServer::spawn(MockScript::default()).await;

    let (status, body) = server.post(routes::SOIL_MOISTURE, stats_body()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["details"]["attempts"], 3);
    assert_eq!(server.upstream.status_calls(), 3);
}

#[tokio::test]
async fn invalid_payloads_are_400() {
    let server = TestServer::spawn(MockScript::demo()).await;

    let (status, body) = server
        .post(
            routes::VEGETATION_STATS,
            json!({ "dateStart": "2024-06-01", "dateEnd": "2024-05-01", "geometry": polygon() }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = server
        .post(routes::NDVI_IMAGE, json!({ "geometry": polygon() }))
        .await;
    assert!(status.is_client_error());
    assert_eq!(body["success"], false);

    assert_eq!(server.upstream.create_calls(), 0);
}

#[tokio::test]
async fn shutdown_cancels_in_flight_polls() {
    let shutdown = CancellationToken::new();
    shutdown.cancel();
    let server = TestServer::spawn_with(
        MockScript::demo(),
        HarvestServerConfig {
            shutdown: shutdown.clone(),
        },
    )
    .await;

    let (status, body) = server.post(routes::VEGETATION_STATS, stats_body()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("cancelled"));
    assert_eq!(server.upstream.create_calls(), 0);
}
