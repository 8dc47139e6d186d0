use crate::prelude::*;

use harvest_core::prelude::*;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::error;

pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

fn failure(status: StatusCode, error: String, details: Value) -> Response {
    let body = Json(json!({
        "success": false,
        "error": error,
        "details": details,
    }));
    (status, body).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Some(err) = self.0.downcast_ref::<TaskError>() {
            let status = err
                .upstream_status()
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

            if status.is_server_error() {
                error!("Task error: {err}");
            }
            return failure(status, err.to_string(), err.details());
        }

        if let Some(err) = self.0.downcast_ref::<PayloadError>() {
            return failure(StatusCode::BAD_REQUEST, err.to_string(), Value::Null);
        }

        if let Some(err) = self.0.downcast_ref::<JsonRejection>() {
            return failure(err.status(), err.body_text(), Value::Null);
        }

        error!("Internal Server Error: {:?}", self.0);
        failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error".to_string(),
            Value::Null,
        )
    }
}

fn data(output: TaskOutput) -> Json<Value> {
    Json(json!({ "success": true, "data": output.into_value() }))
}

/// POST /api/ndvi-image
pub async fn ndvi_image<T: TaskTransport, S: Sleeper>(
    State(state): State<AppState<T, S>>,
    payload: Result<Json<NdviImageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let output = state.run(payload.into_job()?).await?;

    let res = match output.locator() {
        Some(url) => Json(json!({ "success": true, "imageUrl": url })),
        None => data(output),
    };

    Ok(res)
}

/// POST /api/vegetation-stats
pub async fn vegetation_stats<T: TaskTransport, S: Sleeper>(
    State(state): State<AppState<T, S>>,
    payload: Result<Json<VegetationStatsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let output = state.run(payload.into_job()?).await?;
    Ok(data(output))
}

/// POST /api/soil-moisture
pub async fn soil_moisture<T: TaskTransport, S: Sleeper>(
    State(state): State<AppState<T, S>>,
    payload: Result<Json<SoilMoistureRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let output = state.run(payload.into_job()?).await?;
    Ok(data(output))
}
