use anyhow::Context;

use crate::ml::forecast::ForecastPoint;

pub const FORECAST_FILENAME: &str = "retailiq_forecast.csv";
pub const EXPENSES_TEMPLATE_FILENAME: &str = "expenses_template.csv";

/// Sample upload for the emissions estimate.
pub const EXPENSES_TEMPLATE: &str = "category,spend\nElectricity,320\nTravel,180\nMaterials,540\n";

/// Two-column `date,forecast` download of a projection.
pub fn forecast_csv(points: &[ForecastPoint]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["date", "forecast"])?;
    for p in points {
        writer.write_record([p.date.format("%Y-%m-%d").to_string(), p.value.to_string()])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing forecast CSV: {}", e.error()))?;
    String::from_utf8(bytes).context("forecast CSV is not UTF-8")
}
