//! Spend-based carbon estimate: per-category spend multiplied by an
//! emission factor in kg CO2e per pound spent.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::clean::coerce_number;
use super::round2;

pub const OTHER_CATEGORY: &str = "Other";
pub const DEFAULT_FALLBACK_FACTOR: f64 = 0.15;

pub fn default_factors() -> BTreeMap<String, f64> {
    [
        ("Electricity", 0.25),
        ("Travel", 0.18),
        ("Logistics", 0.22),
        ("Materials", 0.30),
        ("Services", 0.12),
        (OTHER_CATEGORY, 0.15),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

#[derive(Debug, Error, PartialEq)]
pub enum EmissionsError {
    #[error("No valid rows (need columns: category,spend).")]
    NoValidRows,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub category: String,
    pub spend: f64,
}

/// Clean `{category, spend}` rows. Blank categories become `Other`; spend
/// must be a finite, non-negative number.
pub fn expenses(rows: &[Value]) -> Vec<Expense> {
    rows.iter()
        .filter_map(|row| {
            let record = row.as_object()?;
            let spend = record.get("spend").and_then(coerce_number)?;
            if spend < 0.0 {
                return None;
            }

            let category = match record.get("category") {
                Some(Value::String(s)) => s.trim().to_string(),
                Some(Value::Number(n)) => n.to_string(),
                _ => String::new(),
            };
            let category = if category.is_empty() {
                OTHER_CATEGORY.to_string()
            } else {
                category
            };

            Some(Expense { category, spend })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct EmissionFactors {
    factors: BTreeMap<String, f64>,
    fallback: f64,
}

impl EmissionFactors {
    /// Category keys are stored as `Capitalized` names, since file and env
    /// sources hand them over lowercased.
    pub fn new(factors: BTreeMap<String, f64>, fallback: f64) -> Self {
        let factors = factors
            .into_iter()
            .map(|(k, v)| (canonical_category(&k), v))
            .collect();
        Self { factors, fallback }
    }

    /// Copy with caller-supplied factors layered over these ones.
    pub fn with_overrides(&self, overrides: &BTreeMap<String, f64>) -> Self {
        let mut factors = self.factors.clone();
        factors.extend(
            overrides
                .iter()
                .filter(|(_, v)| v.is_finite())
                .map(|(k, v)| (canonical_category(k), *v)),
        );
        Self {
            factors,
            fallback: self.fallback,
        }
    }

    /// Exact category match first, then case-insensitive, then `Other`,
    /// then the fallback factor.
    pub fn factor_for(&self, category: &str) -> f64 {
        self.lookup(category)
            .or_else(|| self.lookup(OTHER_CATEGORY))
            .unwrap_or(self.fallback)
    }

    fn lookup(&self, category: &str) -> Option<f64> {
        self.factors.get(category).copied().or_else(|| {
            self.factors
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(category))
                .map(|(_, v)| *v)
        })
    }

    pub fn factors(&self) -> &BTreeMap<String, f64> {
        &self.factors
    }

    pub fn fallback(&self) -> f64 {
        self.fallback
    }
}

fn canonical_category(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmissionLine {
    pub category: String,
    pub spend: f64,
    pub factor: f64,
    pub emission: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmissionTotals {
    pub spend: f64,
    pub emission: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmissionsSummary {
    pub lines: Vec<EmissionLine>,
    pub totals: EmissionTotals,
}

/// Aggregate spend per category (first-seen order) and apply factors.
pub fn estimate(
    expenses: &[Expense],
    factors: &EmissionFactors,
) -> Result<EmissionsSummary, EmissionsError> {
    if expenses.is_empty() {
        return Err(EmissionsError::NoValidRows);
    }

    let mut order: Vec<&str> = Vec::new();
    let mut by_category: HashMap<&str, f64> = HashMap::new();
    for e in expenses {
        let entry = by_category.entry(e.category.as_str()).or_insert_with(|| {
            order.push(e.category.as_str());
            0.0
        });
        *entry += e.spend;
    }

    let lines: Vec<EmissionLine> = order
        .into_iter()
        .map(|category| {
            let spend = by_category[category];
            let factor = factors.factor_for(category);
            EmissionLine {
                category: category.to_string(),
                spend: round2(spend),
                factor,
                emission: round2(spend * factor),
            }
        })
        .collect();

    let totals = EmissionTotals {
        spend: round2(lines.iter().map(|l| l.spend).sum()),
        emission: round2(lines.iter().map(|l| l.emission).sum()),
    };

    Ok(EmissionsSummary { lines, totals })
}
