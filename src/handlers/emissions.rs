use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection},
        State,
    },
    response::Response,
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::export;
use crate::handlers::{csv_attachment, AppState};
use crate::ingest;
use crate::ml::emissions::{self, EmissionFactors, EmissionsError, EmissionsSummary};
use crate::models::{EmissionsRequest, FactorsResponse};

pub async fn get_factors(State(state): State<AppState>) -> Json<FactorsResponse> {
    Json(FactorsResponse {
        factors: state.emission_factors.factors().clone(),
        fallback_factor: state.emission_factors.fallback(),
    })
}

pub async fn template() -> Response {
    csv_attachment(
        export::EXPENSES_TEMPLATE.to_string(),
        export::EXPENSES_TEMPLATE_FILENAME,
    )
}

pub async fn estimate(
    State(state): State<AppState>,
    payload: Result<Json<EmissionsRequest>, JsonRejection>,
) -> Result<Json<EmissionsSummary>, AppError> {
    let Json(request) = payload?;
    let rows = match request.rows {
        Some(Value::Array(rows)) => rows,
        _ => Vec::new(),
    };
    let factors = state.emission_factors.with_overrides(&request.factors);
    Ok(Json(estimate_rows(&rows, &factors)?))
}

/// Estimate from a `category,spend` CSV upload using the configured factors.
pub async fn upload(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<EmissionsSummary>, AppError> {
    let records = ingest::parse_records(&body?)?;
    Ok(Json(estimate_rows(&records, &state.emission_factors)?))
}

fn estimate_rows(
    rows: &[Value],
    factors: &EmissionFactors,
) -> Result<EmissionsSummary, EmissionsError> {
    let expenses = emissions::expenses(rows);
    let summary = emissions::estimate(&expenses, factors)?;
    info!(
        rows = rows.len(),
        categories = summary.lines.len(),
        total_emission = summary.totals.emission,
        "Estimated emissions"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::config::AppConfig;
    use axum::http::{header, StatusCode};
    use serde_json::json;

    fn state() -> AppState {
        AppState::new(&AppConfig::default())
    }

    #[tokio::test]
    async fn test_factors() {
        let Json(response) = get_factors(State(state())).await;
        assert_eq!(response.factors.len(), 6);
        assert_eq!(response.factors["Materials"], 0.30);
        assert_eq!(response.fallback_factor, 0.15);
    }

    #[tokio::test]
    async fn test_estimate_with_override() {
        let mut factors = BTreeMap::new();
        factors.insert("Travel".to_string(), 1.0);
        let request = EmissionsRequest {
            rows: Some(json!([
                {"category": "Travel", "spend": 180},
                {"category": "Electricity", "spend": "320"},
            ])),
            factors,
        };

        let Json(summary) = estimate(State(state()), Ok(Json(request))).await.unwrap();
        assert_eq!(summary.lines[0].emission, 180.0);
        assert_eq!(summary.lines[1].emission, 80.0);
        assert_eq!(summary.totals.emission, 260.0);
    }

    #[tokio::test]
    async fn test_estimate_without_valid_rows() {
        let request = EmissionsRequest {
            rows: Some(json!([{"category": "Travel", "spend": -5}])),
            factors: BTreeMap::new(),
        };

        let err = estimate(State(state()), Ok(Json(request))).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.error, "No valid rows (need columns: category,spend).");
    }

    #[tokio::test]
    async fn test_template_round_trips_through_upload() {
        let response = template().await;
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=expenses_template.csv"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let Json(summary) = upload(State(state()), Ok(bytes)).await.unwrap();
        assert_eq!(summary.lines.len(), 3);
        assert_eq!(summary.totals.spend, 1040.0);
        // 320 * 0.25 + 180 * 0.18 + 540 * 0.30
        assert_eq!(summary.totals.emission, 274.4);
    }
}
