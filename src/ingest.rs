//! CSV uploads into loose JSON row records.
//!
//! The first line is the header. Blank lines are skipped, fields are trimmed
//! and numeric-looking fields become JSON numbers, so the result goes through
//! the same cleaning as rows posted as JSON.

use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV upload has no header row.")]
    MissingHeader,
}

pub fn parse_records(body: &[u8]) -> Result<Vec<Value>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(IngestError::MissingHeader);
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, field)| (name.clone(), coerce_field(field)))
            .collect();
        records.push(Value::Object(row));
    }

    Ok(records)
}

fn coerce_field(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    field
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(field.to_string()))
}
