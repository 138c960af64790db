use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection},
        Query,
    },
    response::Response,
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::export;
use crate::handlers::csv_attachment;
use crate::ingest;
use crate::ml::clean;
use crate::ml::forecast::{generate_forecast, ForecastError, ForecastPoint, MIN_ROWS};
use crate::models::{ForecastRequest, ForecastResponse, ForecastUploadParams};

pub async fn forecast(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ForecastResponse>, AppError> {
    let request = forecast_request(payload)?;
    let points = run_forecast(request.rows, request.horizon.as_ref())?;
    Ok(Json(points.into()))
}

/// Forecast straight from a `date,sales` CSV upload.
pub async fn upload(
    Query(params): Query<ForecastUploadParams>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ForecastResponse>, AppError> {
    let records = ingest::parse_records(&body?)?;
    let horizon = params.horizon.map(Value::String);
    let points = run_forecast(Some(Value::Array(records)), horizon.as_ref())?;
    Ok(Json(points.into()))
}

pub async fn export_csv(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = forecast_request(payload)?;
    let points = run_forecast(request.rows, request.horizon.as_ref())?;
    let csv = export::forecast_csv(&points)?;
    Ok(csv_attachment(csv, export::FORECAST_FILENAME))
}

fn forecast_request(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<ForecastRequest, AppError> {
    let Json(body) = payload
        .map_err(|r| AppError::rejected_json(r, ForecastError::MalformedInput.to_string()))?;
    Ok(ForecastRequest::from_body(body)?)
}

/// The minimum row count applies to the raw rows, before any are cleaned away.
fn run_forecast(
    rows: Option<Value>,
    horizon: Option<&Value>,
) -> Result<Vec<ForecastPoint>, ForecastError> {
    let rows = match rows {
        Some(Value::Array(rows)) if rows.len() >= MIN_ROWS => rows,
        _ => return Err(ForecastError::InsufficientRows),
    };

    let horizon = clean::horizon(horizon);
    let observations = clean::observations(&rows);
    let dropped = rows.len() - observations.len();

    let points = generate_forecast(observations, horizon)?;
    info!(rows = rows.len(), dropped, horizon = points.len(), "Generated forecast");
    Ok(points)
}
