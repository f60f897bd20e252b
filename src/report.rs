//! Text reports printed after a run.

use std::fmt::Write;

use crate::error::Result;
use crate::evaluation::{self, CountAccuracy, Metric};
use crate::models::PredictionResult;

const PREDICTION_HEADER: &str = "Prediction";
const TRUTH_HEADER: &str = "Ground Truth";
const COLUMN_GAP: usize = 7;

fn value_text(value: f64) -> String {
    value.to_string()
}

fn truth_text(truth: Option<f64>) -> String {
    truth.map_or_else(|| "unknown".to_string(), value_text)
}

fn widest<F>(results: &[PredictionResult], len: F) -> usize
where
    F: Fn(&PredictionResult) -> usize,
{
    results.iter().map(len).max().unwrap_or(0)
}

/// Per-image table of predictions next to ground truths, one row per image,
/// every column padded to its widest entry
pub fn details_table(results: &[PredictionResult]) -> String {
    let name_width = widest(results, |r| r.name.len()) + 3;
    let count_pred_width = widest(results, |r| r.coin_count_predicted.to_string().len())
        .max(PREDICTION_HEADER.len());
    let count_truth_width =
        widest(results, |r| r.coin_count_truth.to_string().len()).max(TRUTH_HEADER.len());
    let value_pred_width = widest(results, |r| value_text(r.total_value_predicted).len())
        .max(PREDICTION_HEADER.len());
    let value_truth_width =
        widest(results, |r| truth_text(r.total_value_truth).len()).max(TRUTH_HEADER.len());

    let count_block = count_pred_width + count_truth_width + 3;
    let value_block = value_pred_width + value_truth_width + 3;
    let sub_header = format!("{} / {}", PREDICTION_HEADER, TRUTH_HEADER);
    let gap = COLUMN_GAP;

    let mut out = String::new();
    // Infallible: writing to a String
    let _ = writeln!(
        out,
        "{:name_width$}{:^count_block$}{:gap$}{:^value_block$}",
        "", "Number of coins", "", "Monetary value"
    );
    let _ = writeln!(
        out,
        "{:name_width$}{:^count_block$}{:gap$}{:^value_block$}",
        "", sub_header, "", sub_header
    );

    for r in results {
        let _ = writeln!(
            out,
            "{:<name_width$}{:>count_pred_width$} / {:<count_truth_width$}{:^gap$}{:>value_pred_width$} / {}",
            format!("{} :", r.name),
            r.coin_count_predicted,
            r.coin_count_truth,
            "|",
            value_text(r.total_value_predicted),
            truth_text(r.total_value_truth),
        );
    }
    out
}

/// Count accuracy buckets, their proportions and the conditional metrics
/// for every requested metric
pub fn breakdown_report(results: &[PredictionResult], metrics: &[Metric]) -> Result<String> {
    let accuracy = CountAccuracy::classify(results);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Perfect / near-perfect / poor predictions = {} / {} / {}",
        accuracy.perfect, accuracy.near_perfect, accuracy.poor
    );
    let _ = writeln!(out, "{}", accuracy.proportions_report()?);

    for metric in metrics {
        let _ = writeln!(out);
        let count = evaluation::imperfect_count_error(results, *metric)?;
        let _ = writeln!(
            out,
            "{} number of coins (imperfect count predictions only) = {:.3}",
            metric, count
        );
        let value = evaluation::perfect_count_value_error(results, *metric)?;
        let _ = writeln!(
            out,
            "{} monetary value (perfect count predictions only) = {:.3}",
            metric, value
        );
    }
    Ok(out)
}
