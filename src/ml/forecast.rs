//! Linear trend + weekday seasonality forecasting.
//!
//! Fits an ordinary-least-squares trend over the day index, measures how far
//! each weekday sits from that trend on average, then projects both forward
//! one calendar day at a time.

use chrono::{Datelike, Days, NaiveDate};
use thiserror::Error;

use super::round2;

/// Fewest raw rows a forecast request may carry.
pub const MIN_ROWS: usize = 7;
pub const DEFAULT_HORIZON: usize = 30;
pub const MAX_HORIZON: usize = 365;

/// Substituted for a zero regression denominator (a single point).
/// Keeps degenerate histories forecastable instead of dividing by zero.
const DEGENERATE_DENOMINATOR: f64 = 1e-9;

#[derive(Debug, Error, PartialEq)]
pub enum ForecastError {
    #[error("Need at least 7 days of data (date,sales).")]
    InsufficientRows,
    #[error("No valid rows.")]
    NoValidRows,
    #[error("Request body must be a JSON object with a rows array.")]
    MalformedInput,
    #[error("Forecast date overflows the calendar after {0}")]
    DateOutOfRange(NaiveDate),
}

/// A single cleaned daily data point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

/// Observations sorted by date; position in the sequence is the time index `t`.
#[derive(Debug, Clone)]
pub struct History {
    observations: Vec<Observation>,
    last_date: NaiveDate,
}

impl History {
    /// Sorts the observations ascending by date. The sort is stable, so rows
    /// sharing a date keep their incoming order and each gets its own index.
    pub fn new(mut observations: Vec<Observation>) -> Result<Self, ForecastError> {
        observations.sort_by_key(|o| o.date);
        let last_date = observations
            .last()
            .map(|o| o.date)
            .ok_or(ForecastError::NoValidRows)?;

        Ok(Self {
            observations,
            last_date,
        })
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    fn indexed(&self) -> impl Iterator<Item = (f64, &Observation)> {
        self.observations
            .iter()
            .enumerate()
            .map(|(t, obs)| (t as f64, obs))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendModel {
    pub intercept: f64,
    pub slope: f64,
}

impl TrendModel {
    /// Ordinary least squares over `(t, value)` pairs.
    pub fn fit(history: &History) -> Self {
        let n = history.len() as f64;
        let (mut sum_t, mut sum_y, mut sum_tt, mut sum_ty) = (0.0, 0.0, 0.0, 0.0);

        for (t, obs) in history.indexed() {
            sum_t += t;
            sum_y += obs.value;
            sum_tt += t * t;
            sum_ty += t * obs.value;
        }

        let mut denominator = n * sum_tt - sum_t * sum_t;
        if denominator == 0.0 {
            denominator = DEGENERATE_DENOMINATOR;
        }

        let slope = (n * sum_ty - sum_t * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_t) / n;

        Self { intercept, slope }
    }

    pub fn predict(&self, t: f64) -> f64 {
        self.intercept + self.slope * t
    }
}

/// Additive per-weekday correction, indexed Sunday = 0 .. Saturday = 6.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekdayAdjustment([f64; 7]);

impl WeekdayAdjustment {
    /// Mean trend residual per weekday, re-centered so the seven buckets sum
    /// to zero. Weekdays absent from the history start at zero.
    pub fn fit(history: &History, trend: &TrendModel) -> Self {
        let mut sums = [0.0_f64; 7];
        let mut counts = [0_usize; 7];

        for (t, obs) in history.indexed() {
            let bucket = weekday_bucket(obs.date);
            sums[bucket] += obs.value - trend.predict(t);
            counts[bucket] += 1;
        }

        let mut adjustments = [0.0_f64; 7];
        for ((adj, sum), count) in adjustments.iter_mut().zip(sums).zip(counts) {
            if count > 0 {
                *adj = sum / count as f64;
            }
        }

        let mean = adjustments.iter().sum::<f64>() / 7.0;
        for adj in &mut adjustments {
            *adj -= mean;
        }

        Self(adjustments)
    }

    pub fn for_date(&self, date: NaiveDate) -> f64 {
        self.0[weekday_bucket(date)]
    }
}

fn weekday_bucket(date: NaiveDate) -> usize {
    date.weekday().num_days_from_sunday() as usize
}

/// One projected day. `value` is rounded to cents and never negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Project `horizon` days past the end of the history. The horizon is
/// clamped into `1..=MAX_HORIZON`.
pub fn project(
    history: &History,
    trend: &TrendModel,
    seasonal: &WeekdayAdjustment,
    horizon: usize,
) -> Result<Vec<ForecastPoint>, ForecastError> {
    let horizon = horizon.clamp(1, MAX_HORIZON);
    let last_date = history.last_date();
    let last_t = (history.len() - 1) as f64;

    (1..=horizon)
        .map(|i| {
            let date = last_date
                .checked_add_days(Days::new(i as u64))
                .ok_or(ForecastError::DateOutOfRange(last_date))?;
            let t = last_t + i as f64;
            let projected = round2(trend.predict(t) + seasonal.for_date(date));

            // Sales and spend cannot go below zero.
            let value = if projected > 0.0 { projected } else { 0.0 };
            Ok(ForecastPoint { date, value })
        })
        .collect()
}

/// Fit trend and weekday seasonality to `observations` and project `horizon` days.
pub fn generate_forecast(
    observations: Vec<Observation>,
    horizon: usize,
) -> Result<Vec<ForecastPoint>, ForecastError> {
    let history = History::new(observations)?;
    let trend = TrendModel::fit(&history);
    let seasonal = WeekdayAdjustment::fit(&history, &trend);

    project(&history, &trend, &seasonal, horizon)
}
