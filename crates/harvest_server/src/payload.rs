//! Dashboard payloads and how they map onto remote job requests.

use harvest_core::prelude::*;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    /// The payload is well-formed JSON but can't be turned into a job.
    /// Maps to **HTTP 400 Bad Request**.
    #[error("Invalid payload: {0}")]
    Invalid(String),
}

/// Body of `POST /api/ndvi-image`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NdviImageRequest {
    /// Scene identifier of the satellite view to render.
    pub view_id: String,
    pub geometry: Option<Value>,
    /// Index to render. Defaults to `NDVI`.
    pub bm_type: Option<String>,
    /// Image format. Defaults to `png`.
    pub format: Option<String>,
}

impl NdviImageRequest {
    pub fn into_job(self) -> Result<JobRequest, PayloadError> {
        if self.view_id.trim().is_empty() {
            return Err(PayloadError::Invalid("viewId must not be empty".into()));
        }

        let mut params = Map::new();
        params.insert("view_id".into(), Value::String(self.view_id));
        params.insert(
            "bm_type".into(),
            Value::String(self.bm_type.unwrap_or_else(|| indices::NDVI.to_string())),
        );
        params.insert(
            "format".into(),
            Value::String(self.format.unwrap_or_else(|| "png".to_string())),
        );
        if let Some(geometry) = self.geometry {
            params.insert("geometry".into(), check_geometry(geometry)?);
        }

        Ok(JobRequest::new(job_types::RENDER, Value::Object(params)))
    }
}

/// Body of `POST /api/vegetation-stats`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VegetationStatsRequest {
    pub date_start: String,
    pub date_end: String,
    pub geometry: Value,
    /// Vegetation index. Defaults to `NDVI`.
    pub index: Option<String>,
    /// Defaults to `["sentinel2"]`.
    pub sensors: Option<Vec<String>>,
    pub reference: Option<String>,
}

impl VegetationStatsRequest {
    pub fn into_job(self) -> Result<JobRequest, PayloadError> {
        let index = self.index.unwrap_or_else(|| indices::NDVI.to_string());
        let sensors = self
            .sensors
            .unwrap_or_else(|| vec!["sentinel2".to_string()]);

        stats_job(
            &index,
            &self.date_start,
            &self.date_end,
            self.geometry,
            Some(sensors),
            self.reference,
        )
    }
}

/// Body of `POST /api/soil-moisture`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilMoistureRequest {
    pub date_start: String,
    pub date_end: String,
    pub geometry: Value,
    pub reference: Option<String>,
}

impl SoilMoistureRequest {
    pub fn into_job(self) -> Result<JobRequest, PayloadError> {
        stats_job(
            indices::SOIL_MOISTURE,
            &self.date_start,
            &self.date_end,
            self.geometry,
            None,
            self.reference,
        )
    }
}

fn stats_job(
    index: &str,
    date_start: &str,
    date_end: &str,
    geometry: Value,
    sensors: Option<Vec<String>>,
    reference: Option<String>,
) -> Result<JobRequest, PayloadError> {
    let start = parse_date("dateStart", date_start)?;
    let end = parse_date("dateEnd", date_end)?;
    if start > end {
        return Err(PayloadError::Invalid(format!(
            "dateStart {start} is after dateEnd {end}"
        )));
    }

    let mut params = json!({
        "bm_type": index,
        "date_start": start.to_string(),
        "date_end": end.to_string(),
        "geometry": check_geometry(geometry)?,
    });
    if let Some(sensors) = sensors {
        params["sensors"] = json!(sensors);
    }
    if let Some(reference) = reference {
        params["reference"] = Value::String(reference);
    }

    Ok(JobRequest::new(job_types::MT_STATS, params))
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, PayloadError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        PayloadError::Invalid(format!("{field} '{value}' is not a YYYY-MM-DD date: {e}"))
    })
}

/// Only checks the shape GeoJSON needs to be routable; the remote validates the rest.
fn check_geometry(geometry: Value) -> Result<Value, PayloadError> {
    match geometry.get("type").and_then(Value::as_str) {
        Some(_) if geometry.get("coordinates").is_some() => Ok(geometry),
        _ => Err(PayloadError::Invalid(
            "geometry must be a GeoJSON object with 'type' and 'coordinates'".into(),
        )),
    }
}
