use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ml::forecast::Observation;
use crate::ml::summary::HistorySummary;

#[derive(Debug, Deserialize)]
pub struct SalesSummaryRequest {
    pub rows: Option<Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SalesRow {
    pub date: NaiveDate,
    pub sales: f64,
}

impl From<&Observation> for SalesRow {
    fn from(obs: &Observation) -> Self {
        Self {
            date: obs.date,
            sales: obs.value,
        }
    }
}

/// Cleaned, date-sorted history plus its headline metrics.
#[derive(Debug, Serialize)]
pub struct SalesSummaryResponse {
    pub rows: Vec<SalesRow>,
    pub summary: HistorySummary,
}
