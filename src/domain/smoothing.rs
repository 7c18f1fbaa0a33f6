//! Trailing rolling means.
//!
//! `rolling_mean(x, w)[i]` averages the last `min(w, i + 1)` values ending at
//! `i`, so the head of the series uses a shrinking window instead of being
//! undefined. The sparse variant skips missing values and reports a missing
//! output when fewer than `min_periods` values are present in the window.

use serde::Serialize;

use super::error::DashboardError;

pub const MIN_WINDOW: usize = 1;
pub const MAX_WINDOW: usize = 30;
pub const DEFAULT_WINDOW: usize = 7;

/// Trend-line window used on indicator charts.
pub const TREND_WINDOW: usize = 5;

/// Smoothing window bounded to `[MIN_WINDOW, MAX_WINDOW]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SmoothingWindow(usize);

impl SmoothingWindow {
    pub fn new(days: usize) -> Result<Self, DashboardError> {
        if (MIN_WINDOW..=MAX_WINDOW).contains(&days) {
            Ok(Self(days))
        } else {
            Err(DashboardError::invalid_selection(
                "window",
                format!("{days} is outside {MIN_WINDOW}..={MAX_WINDOW}"),
            ))
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for SmoothingWindow {
    fn default() -> Self {
        Self(DEFAULT_WINDOW)
    }
}

pub fn rolling_mean(series: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);

    (0..series.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &series[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

pub fn rolling_mean_sparse(
    series: &[Option<f64>],
    window: usize,
    min_periods: usize,
) -> Vec<Option<f64>> {
    let window = window.max(1);
    let min_periods = min_periods.clamp(1, window);

    (0..series.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let present: Vec<f64> = series[start..=i].iter().flatten().copied().collect();
            if present.len() < min_periods {
                None
            } else {
                Some(present.iter().sum::<f64>() / present.len() as f64)
            }
        })
        .collect()
}

/// Strict trailing mean: the full window must be present.
pub fn trend_line(series: &[Option<f64>]) -> Vec<Option<f64>> {
    rolling_mean_sparse(series, TREND_WINDOW, TREND_WINDOW)
}
