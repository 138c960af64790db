pub mod emissions;
pub mod forecast;
pub mod sales;

pub use emissions::{EmissionsRequest, FactorsResponse};
pub use forecast::{ForecastRequest, ForecastResponse, ForecastUploadParams};
pub use sales::{SalesRow, SalesSummaryRequest, SalesSummaryResponse};
