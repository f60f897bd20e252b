//! Error metrics over a batch of predictions.
//!
//! The coin count target always uses every record. The monetary value target
//! skips records whose value truth is unknown, so both targets can have a
//! different number of samples. Any metric computed over zero records fails
//! with [`CoinError::DivideByZero`].

pub mod metrics;

use std::fmt;

use clap::ValueEnum;

use crate::error::{CoinError, Result};
use crate::models::PredictionResult;
use metrics::{absolute_error, mean_error, percentage, squared_error};

/// Largest count difference still considered a near-perfect prediction
pub const NEAR_PERFECT_MAX_DIFF: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Metric {
    /// Mean Absolute Error
    Mae,
    /// Mean Squared Error
    Mse,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Mae => "MAE",
            Metric::Mse => "MSE",
        }
    }

    fn error_fn(&self) -> fn(f64, f64) -> f64 {
        match self {
            Metric::Mae => absolute_error,
            Metric::Mse => squared_error,
        }
    }

    fn count_label(&self) -> &'static str {
        match self {
            Metric::Mae => "MAE number of coins",
            Metric::Mse => "MSE number of coins",
        }
    }

    fn value_label(&self) -> &'static str {
        match self {
            Metric::Mae => "MAE monetary value",
            Metric::Mse => "MSE monetary value",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One metric evaluated on both targets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricReport {
    pub metric: Metric,
    pub count_error: f64,
    pub value_error: f64,
}

impl fmt::Display for MetricReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} = {:.3}", self.metric.count_label(), self.count_error)?;
        write!(f, "{} = {:.3}", self.metric.value_label(), self.value_error)
    }
}

/// Metric on the coin count, over every record
pub fn count_error(results: &[PredictionResult], metric: Metric) -> Result<f64> {
    mean_error(
        results.iter().map(PredictionResult::count_pair),
        metric.error_fn(),
        metric.count_label(),
    )
}

/// Metric on the monetary value, over records with a known value truth
pub fn value_error(results: &[PredictionResult], metric: Metric) -> Result<f64> {
    mean_error(
        results.iter().filter_map(PredictionResult::value_pair),
        metric.error_fn(),
        metric.value_label(),
    )
}

pub fn evaluate(results: &[PredictionResult], metric: Metric) -> Result<MetricReport> {
    if results.is_empty() {
        return Err(CoinError::DivideByZero(metric.label()));
    }
    Ok(MetricReport {
        metric,
        count_error: count_error(results, metric)?,
        value_error: value_error(results, metric)?,
    })
}

pub fn mae(results: &[PredictionResult]) -> Result<MetricReport> {
    evaluate(results, Metric::Mae)
}

pub fn mse(results: &[PredictionResult]) -> Result<MetricReport> {
    evaluate(results, Metric::Mse)
}

/// Number of value samples: records whose monetary value truth is known
pub fn value_sample_size(results: &[PredictionResult]) -> usize {
    results.iter().filter(|r| r.total_value_truth.is_some()).count()
}

/// Coin count accuracy buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountAccuracy {
    /// Exact count
    pub perfect: usize,
    /// Off by at most [`NEAR_PERFECT_MAX_DIFF`]
    pub near_perfect: usize,
    pub poor: usize,
}

impl CountAccuracy {
    pub fn classify(results: &[PredictionResult]) -> Self {
        results
            .iter()
            .fold(Self::default(), |mut acc, result| {
                match result.count_diff() {
                    0 => acc.perfect += 1,
                    d if d <= NEAR_PERFECT_MAX_DIFF => acc.near_perfect += 1,
                    _ => acc.poor += 1,
                }
                acc
            })
    }

    pub fn total(&self) -> usize {
        self.perfect + self.near_perfect + self.poor
    }

    /// Percentage of the batch in each bucket, formatted one per line
    pub fn proportions_report(&self) -> Result<String> {
        let total = self.total();
        Ok(format!(
            "Perfect predictions (difference = 0) : {:.2} %\n\
             Near-perfect predictions (difference <= {}) : {:.2} %\n\
             Poor predictions (difference > {}) : {:.2} %",
            percentage(self.perfect, total)?,
            NEAR_PERFECT_MAX_DIFF,
            percentage(self.near_perfect, total)?,
            NEAR_PERFECT_MAX_DIFF,
            percentage(self.poor, total)?,
        ))
    }
}

/// Count metric restricted to records whose count prediction is wrong
pub fn imperfect_count_error(results: &[PredictionResult], metric: Metric) -> Result<f64> {
    let imperfect: Vec<PredictionResult> = results
        .iter()
        .filter(|r| !r.is_perfect_count())
        .cloned()
        .collect();
    count_error(&imperfect, metric)
}

/// Value metric restricted to records whose count prediction is exact
pub fn perfect_count_value_error(results: &[PredictionResult], metric: Metric) -> Result<f64> {
    let perfect: Vec<PredictionResult> = results
        .iter()
        .filter(|r| r.is_perfect_count())
        .cloned()
        .collect();
    value_error(&perfect, metric)
}
