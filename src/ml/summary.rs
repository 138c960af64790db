//! Headline metrics and trailing moving averages for an uploaded sales history.

use serde::Serialize;
use thiserror::Error;

use super::forecast::History;
use super::round2;

pub const SHORT_WINDOW: usize = 7;
pub const LONG_WINDOW: usize = 30;
const RECENT_DAYS: usize = 30;

#[derive(Debug, Error, PartialEq)]
pub enum SummaryError {
    #[error("No valid rows found (need columns: date,sales).")]
    NoValidRows,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistorySummary {
    pub days: usize,
    pub total: f64,
    pub last_30_days: f64,
    pub average_per_day: f64,
    pub moving_average_7: Vec<Option<f64>>,
    pub moving_average_30: Vec<Option<f64>>,
}

pub fn summarize(history: &History) -> HistorySummary {
    let values = history.values();
    let days = values.len();
    let total: f64 = values.iter().sum();
    let last_30_days: f64 = values[days.saturating_sub(RECENT_DAYS)..].iter().sum();

    HistorySummary {
        days,
        total,
        last_30_days,
        average_per_day: round2(total / days as f64),
        moving_average_7: moving_average(&values, SHORT_WINDOW),
        moving_average_30: moving_average(&values, LONG_WINDOW),
    }
}

/// Trailing mean over `window` values, `None` until the window is full.
pub fn moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut sum = 0.0;
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            sum += v;
            if i >= window {
                sum -= values[i - window];
            }
            (i + 1 >= window).then(|| round2(sum / window as f64))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::forecast::Observation;
    use chrono::NaiveDate;

    fn history(values: &[f64]) -> History {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let obs = values
            .iter()
            .enumerate()
            .map(|(i, v)| Observation {
                date: start + chrono::Duration::days(i as i64),
                value: *v,
            })
            .collect();
        History::new(obs).unwrap()
    }

    #[test]
    fn test_moving_average_window() {
        let ma = moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(ma, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_moving_average_rounds_to_cents() {
        let ma = moving_average(&[1.0, 1.0, 2.0], 3);
        assert_eq!(ma[2], Some(1.33));
    }

    #[test]
    fn test_moving_average_short_series() {
        assert!(moving_average(&[1.0, 2.0], 7).iter().all(Option::is_none));
        assert!(moving_average(&[], 7).is_empty());
    }

    #[test]
    fn test_summary_metrics() {
        let values: Vec<f64> = (1..=40).map(f64::from).collect();
        let summary = summarize(&history(&values));

        assert_eq!(summary.days, 40);
        assert_eq!(summary.total, 820.0);
        // 11 + 12 + ... + 40
        assert_eq!(summary.last_30_days, 765.0);
        assert_eq!(summary.average_per_day, 20.5);
        assert_eq!(summary.moving_average_7.len(), 40);
        assert_eq!(summary.moving_average_7[6], Some(4.0));
        assert_eq!(summary.moving_average_30[28], None);
        assert_eq!(summary.moving_average_30[29], Some(15.5));
    }

    #[test]
    fn test_summary_of_short_history() {
        let summary = summarize(&history(&[10.0, 20.0, 30.5]));
        assert_eq!(summary.last_30_days, 60.5);
        assert_eq!(summary.average_per_day, 20.17);
    }
}
