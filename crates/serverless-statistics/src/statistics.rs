// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Descriptive statistics over per-invocation samples.
//!
//! Tail percentiles and the confidence interval are only reported once the
//! sample is large enough for them to mean something:
//!
//! | Statistic | Minimum sample size |
//! |---|---|
//! | p95 | 20 |
//! | p99 | 100 |
//! | 95% confidence interval half-width | 30 |
//!
//! The standard deviation is the population one (divides by `n`): the sample
//! is every invocation of the window, not an estimate of a larger set.

use crate::error::StatsError;

pub const P95_MIN_SAMPLES: usize = 20;
pub const P99_MIN_SAMPLES: usize = 100;
pub const CONFIDENCE_MIN_SAMPLES: usize = 30;

const Z_95: f64 = 1.96;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub p95: Option<f64>,
    pub p99: Option<f64>,
    /// Half-width of the 95% confidence interval of the mean.
    pub confidence95: Option<f64>,
}

pub fn summarize(values: &[f64]) -> Result<SummaryStatistics, StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptySample);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = values.len();
    let mean = mean(values);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let p95 = (n >= P95_MIN_SAMPLES).then(|| quantile(0.95, &sorted));
    let p99 = (n >= P99_MIN_SAMPLES).then(|| quantile(0.99, &sorted));
    let confidence95 = (n >= CONFIDENCE_MIN_SAMPLES)
        .then(|| Z_95 * population_std_dev(values, mean) / (n as f64).sqrt());

    Ok(SummaryStatistics {
        min,
        max,
        mean,
        median: quantile(0.5, &sorted),
        p95,
        p99,
        confidence95,
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let sum_squares: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (sum_squares / values.len() as f64).sqrt()
}

/// Nearest-rank quantile: the smallest element with at least `p` of the
/// sample at or below it. `sorted` must be non-empty and ascending.
fn quantile(p: f64, sorted: &[f64]) -> f64 {
    let rank = (p * sorted.len() as f64).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[index]
}
