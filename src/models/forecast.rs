use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ml::forecast::{ForecastError, ForecastPoint};

/// Body of a forecast request. Both fields stay loosely typed so the
/// boundary can apply its own coercion and error messages.
#[derive(Debug, Default)]
pub struct ForecastRequest {
    pub rows: Option<Value>,
    pub horizon: Option<Value>,
}

impl ForecastRequest {
    /// Anything other than a JSON object is malformed. `null` fields count as absent.
    pub fn from_body(body: Value) -> Result<Self, ForecastError> {
        match body {
            Value::Object(mut map) => Ok(Self {
                rows: map.remove("rows").filter(|v| !v.is_null()),
                horizon: map.remove("horizon").filter(|v| !v.is_null()),
            }),
            _ => Err(ForecastError::MalformedInput),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ForecastUploadParams {
    pub horizon: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ForecastRow {
    /// ISO-8601 date-time at UTC midnight.
    pub date: String,
    pub forecast: f64,
}

impl From<ForecastPoint> for ForecastRow {
    fn from(point: ForecastPoint) -> Self {
        Self {
            date: iso_midnight(point.date),
            forecast: point.value,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub forecast: Vec<ForecastRow>,
}

impl From<Vec<ForecastPoint>> for ForecastResponse {
    fn from(points: Vec<ForecastPoint>) -> Self {
        Self {
            forecast: points.into_iter().map(ForecastRow::from).collect(),
        }
    }
}

fn iso_midnight(date: NaiveDate) -> String {
    date.format("%Y-%m-%dT00:00:00.000Z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_from_object() {
        let request =
            ForecastRequest::from_body(json!({"rows": [1, 2], "horizon": null})).unwrap();
        assert_eq!(request.rows, Some(json!([1, 2])));
        assert_eq!(request.horizon, None);
    }

    #[test]
    fn test_request_must_be_object() {
        for body in [json!([1, 2]), json!("rows"), json!(null)] {
            assert_eq!(
                ForecastRequest::from_body(body).unwrap_err(),
                ForecastError::MalformedInput
            );
        }
    }

    #[test]
    fn test_row_serializes_as_iso_datetime() {
        let row = ForecastRow::from(ForecastPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            value: 99.5,
        });

        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            serde_json::json!({"date": "2024-01-15T00:00:00.000Z", "forecast": 99.5})
        );
    }
}
