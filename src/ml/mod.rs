pub mod clean;
pub mod emissions;
pub mod forecast;
pub mod summary;

/// Round to two decimal places (cents).
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
