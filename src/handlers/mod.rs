pub mod emissions;
pub mod forecasts;
pub mod health;
pub mod sales;

use std::sync::Arc;

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::config::AppConfig;
use crate::ml::emissions::EmissionFactors;

/// Shared application state available to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub emission_factors: Arc<EmissionFactors>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            emission_factors: Arc::new(EmissionFactors::new(
                config.emissions.factors.clone(),
                config.emissions.fallback_factor,
            )),
        }
    }
}

/// `text/csv` download with an attachment file name.
pub(crate) fn csv_attachment(body: String, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        body,
    )
        .into_response()
}
