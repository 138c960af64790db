use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct EmissionsRequest {
    pub rows: Option<Value>,
    /// Per-request factor overrides, kg CO2e per pound.
    #[serde(default)]
    pub factors: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize)]
pub struct FactorsResponse {
    pub factors: BTreeMap<String, f64>,
    pub fallback_factor: f64,
}
