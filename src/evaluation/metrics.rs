//! Numeric aggregation over (predicted, truth) pairs.

use crate::error::{CoinError, Result};

pub fn absolute_error(predicted: f64, truth: f64) -> f64 {
    (predicted - truth).abs()
}

pub fn squared_error(predicted: f64, truth: f64) -> f64 {
    (predicted - truth).powi(2)
}

/// Mean of `error(predicted, truth)` over all pairs.
///
/// `what` names the quantity in the error raised for an empty input.
pub fn mean_error<I>(pairs: I, error: fn(f64, f64) -> f64, what: &'static str) -> Result<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (sum, n) = pairs
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), (predicted, truth)| {
            (sum + error(predicted, truth), n + 1)
        });

    if n == 0 {
        return Err(CoinError::DivideByZero(what));
    }
    Ok(sum / n as f64)
}

/// `part` as a percentage of `total`
pub fn percentage(part: usize, total: usize) -> Result<f64> {
    if total == 0 {
        return Err(CoinError::DivideByZero("a proportion"));
    }
    Ok(100.0 * part as f64 / total as f64)
}
