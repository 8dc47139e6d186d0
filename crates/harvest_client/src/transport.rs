use harvest_core::prelude::*;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::trace;
use url::Url;

/// [`TaskTransport`] over HTTP, talking JSON to the remote task API.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    base: Url,
    config: TaskApiConfig,
}

impl HttpTransport {
    pub fn new(config: TaskApiConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let base = Url::parse(&config.base_url)
            .map_err(|e| ConfigError::Invalid(format!("base_url '{}': {e}", config.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::Invalid(format!(
                "base_url '{}' cannot carry a path",
                config.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ConfigError::Invalid(format!("header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ConfigError::Invalid(format!("header '{name}' value: {e}")))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::Invalid(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base,
            config,
        })
    }

    pub fn config(&self) -> &TaskApiConfig {
        &self.config
    }

    /// Appends `template` to the base URL segment by segment. The task id fills the
    /// `{task_id}` placeholder as a single percent-encoded segment.
    fn endpoint(&self, template: &str, task_id: Option<&str>) -> Result<Url, TransportError> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                TransportError::Connection(format!("base URL '{}' cannot carry a path", self.base))
            })?;
            segments.pop_if_empty();

            for segment in template.split('/').filter(|s| !s.is_empty()) {
                match task_id {
                    Some(id) if segment.contains(routes::TASK_ID_PLACEHOLDER) => {
                        segments.push(&segment.replace(routes::TASK_ID_PLACEHOLDER, id));
                    }
                    _ => {
                        segments.push(segment);
                    }
                }
            }
        }
        Ok(url)
    }

    async fn exchange(&self, builder: RequestBuilder) -> Result<RawResponse, TransportError> {
        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let body = decode_body(status, &text)?;
        Ok(RawResponse::new(status.as_u16(), body))
    }
}

impl TaskTransport for HttpTransport {
    async fn create(&self, request: &JobRequest) -> Result<RawResponse, TransportError> {
        let url = self.endpoint(&self.config.creation_endpoint, None)?;
        trace!(%url, "POST");
        self.exchange(self.client.post(url).json(request)).await
    }

    async fn status(&self, handle: &JobHandle) -> Result<RawResponse, TransportError> {
        let url = self.endpoint(&self.config.status_endpoint_template, Some(handle.as_str()))?;
        trace!(%url, "GET");
        self.exchange(self.client.get(url)).await
    }
}

/// Error pages are often HTML, so non-JSON bodies are kept as strings unless the
/// status claims success.
fn decode_body(status: StatusCode, text: &str) -> Result<Value, TransportError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    match serde_json::from_str(text) {
        Ok(body) => Ok(body),
        Err(e) if status.is_success() => Err(TransportError::Decode(format!(
            "{status}: {e}"
        ))),
        Err(_) => Ok(Value::String(text.to_string())),
    }
}
