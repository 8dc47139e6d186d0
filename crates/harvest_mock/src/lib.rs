//! # Harvest Mock
//!
//! A scripted fake of the remote task API, for development and testing.
//!
//! Serves the creation and status endpoints on an ephemeral local port and
//! answers from a [`MockScript`]. Every call is counted so tests can assert how
//! many polls the client made.
//!
//! **DO NOT point production traffic at this!!!**
//!
//! ## Usage
//!
//! ```no_run
//! # use harvest_mock::{MockReply, MockScript, MockTaskApi};
//! # use serde_json::json;
//! # async fn run() {
//! let script = MockScript::default()
//!     .then(MockReply::ok(json!({ "status": "running" })))
//!     .then(MockReply::ok(json!({ "status": "finished", "result": { "ndvi": 0.42 } })));
//!
//! let api = MockTaskApi::spawn(script).await.unwrap();
//! println!("fake task API at {}", api.base_url());
//! # }
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use harvest_core::prelude::{fields, routes};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::debug;

/// A canned HTTP answer.
#[derive(Debug, Clone, PartialEq)]
pub struct MockReply {
    pub status: u16,
    pub body: Value,
}

impl MockReply {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    /// A 202 carrying a freshly generated `task_id`.
    pub fn accepted() -> Self {
        Self::new(202, json!({ (fields::TASK_ID): uuid::Uuid::new_v4().to_string() }))
    }
}

/// What the fake API answers, in order.
#[derive(Debug, Clone)]
pub struct MockScript {
    creation: MockReply,
    statuses: VecDeque<MockReply>,
    required_header: Option<(String, String)>,
}

impl Default for MockScript {
    fn default() -> Self {
        Self {
            creation: MockReply::accepted(),
            statuses: VecDeque::new(),
            required_header: None,
        }
    }
}

impl MockScript {
    /// A job that runs for one poll, then finishes with an inline result.
    pub fn demo() -> Self {
        Self::default()
            .then(MockReply::ok(json!({ "status": "running" })))
            .then(MockReply::ok(json!({
                "status": "finished",
                "result": { "ndvi": 0.42 }
            })))
    }

    pub fn with_creation(mut self, reply: MockReply) -> Self {
        self.creation = reply;
        self
    }

    /// Queues a status reply. The last queued reply is repeated forever.
    pub fn then(mut self, reply: MockReply) -> Self {
        self.statuses.push_back(reply);
        self
    }

    /// Answers 401 to every call that lacks this header.
    pub fn require_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.required_header = Some((name.into(), value.into()));
        self
    }

    fn next_status(&mut self) -> MockReply {
        match self.statuses.len() {
            0 => MockReply::ok(json!({ "status": "pending" })),
            1 => self.statuses[0].clone(),
            _ => self.statuses.pop_front().unwrap_or_else(|| MockReply::ok(Value::Null)),
        }
    }
}

#[derive(Default)]
struct MockState {
    script: Mutex<MockScript>,
    create_calls: AtomicUsize,
    status_calls: AtomicUsize,
    created: Mutex<Vec<Value>>,
    polled: Mutex<Vec<String>>,
}

pub struct MockTaskApi {
    base_url: String,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockTaskApi {
    /// Binds `127.0.0.1:0` and serves `script` until dropped.
    pub async fn spawn(script: MockScript) -> std::io::Result<Self> {
        let state = Arc::new(MockState {
            script: Mutex::new(script),
            ..Default::default()
        });

        let app = Router::new()
            .route(routes::UPSTREAM_CREATE, post(create_task))
            .route(routes::UPSTREAM_STATUS, get(task_status))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);
        debug!(%base_url, "Mock task API listening");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Mock task API stopped: {e}");
            }
        });

        Ok(Self {
            base_url,
            state,
            handle,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn create_calls(&self) -> usize {
        self.state.create_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.state.status_calls.load(Ordering::SeqCst)
    }

    /// Bodies of every creation request received so far.
    pub fn created_jobs(&self) -> Vec<Value> {
        self.state
            .created
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Task ids of every status request received so far.
    pub fn polled_ids(&self) -> Vec<String> {
        self.state
            .polled
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl Drop for MockTaskApi {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn reply(r: MockReply) -> Response {
    let status = StatusCode::from_u16(r.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(r.body)).into_response()
}

fn unauthorized(state: &MockState, headers: &HeaderMap) -> Option<Response> {
    let script = state.script.lock().ok()?;
    let (name, value) = script.required_header.as_ref()?;
    let present = headers
        .get(name.as_str())
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == value);

    (!present).then(|| reply(MockReply::new(401, json!({ "error": "invalid api key" }))))
}

async fn create_task(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.create_calls.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut created) = state.created.lock() {
        created.push(body);
    }

    if let Some(res) = unauthorized(&state, &headers) {
        return res;
    }

    let creation = match state.script.lock() {
        Ok(script) => script.creation.clone(),
        Err(_) => MockReply::new(500, json!({ "error": "mock state poisoned" })),
    };
    reply(creation)
}

async fn task_status(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> Response {
    state.status_calls.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut polled) = state.polled.lock() {
        polled.push(task_id);
    }

    if let Some(res) = unauthorized(&state, &headers) {
        return res;
    }

    let next = match state.script.lock() {
        Ok(mut script) => script.next_status(),
        Err(_) => MockReply::new(500, json!({ "error": "mock state poisoned" })),
    };
    reply(next)
}
