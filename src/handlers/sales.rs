use axum::{
    body::Bytes,
    extract::rejection::{BytesRejection, JsonRejection},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::ingest;
use crate::ml::clean;
use crate::ml::forecast::History;
use crate::ml::summary::{self, SummaryError};
use crate::models::{SalesRow, SalesSummaryRequest, SalesSummaryResponse};

pub async fn summary(
    payload: Result<Json<SalesSummaryRequest>, JsonRejection>,
) -> Result<Json<SalesSummaryResponse>, AppError> {
    let Json(request) = payload?;
    let rows = match request.rows {
        Some(Value::Array(rows)) => rows,
        _ => Vec::new(),
    };
    Ok(Json(summarize_rows(&rows)?))
}

/// Parse a `date,sales` CSV upload and summarise it.
pub async fn upload(
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SalesSummaryResponse>, AppError> {
    let records = ingest::parse_records(&body?)?;
    Ok(Json(summarize_rows(&records)?))
}

fn summarize_rows(rows: &[Value]) -> Result<SalesSummaryResponse, SummaryError> {
    let history =
        History::new(clean::observations(rows)).map_err(|_| SummaryError::NoValidRows)?;
    let summary = summary::summarize(&history);
    info!(rows = rows.len(), days = summary.days, "Summarised sales history");

    Ok(SalesSummaryResponse {
        rows: history.observations().iter().map(SalesRow::from).collect(),
        summary,
    })
}
