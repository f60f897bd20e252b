use std::path::PathBuf;

/// One image to evaluate, with its ground truth.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    /// Identifier from the image list (relative path, unique in a batch)
    pub name: String,
    pub path: PathBuf,
    pub coin_count_truth: u32,
    /// `None` when the ground truth has no usable monetary value
    pub total_value_truth: Option<f64>,
}

/// Prediction for one image next to its ground truth.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub name: String,
    pub coin_count_predicted: u32,
    pub coin_count_truth: u32,
    pub total_value_predicted: f64,
    pub total_value_truth: Option<f64>,
}

impl PredictionResult {
    pub fn new(record: &ImageRecord, coin_count_predicted: u32, total_value_predicted: f64) -> Self {
        Self {
            name: record.name.clone(),
            coin_count_predicted,
            coin_count_truth: record.coin_count_truth,
            total_value_predicted,
            total_value_truth: record.total_value_truth,
        }
    }

    /// Absolute difference between predicted and true coin count
    pub fn count_diff(&self) -> u32 {
        self.coin_count_predicted.abs_diff(self.coin_count_truth)
    }

    pub fn is_perfect_count(&self) -> bool {
        self.count_diff() == 0
    }

    /// (predicted, truth) pair for the coin count target
    pub fn count_pair(&self) -> (f64, f64) {
        (self.coin_count_predicted as f64, self.coin_count_truth as f64)
    }

    /// (predicted, truth) pair for the monetary value target, if the truth is known
    pub fn value_pair(&self) -> Option<(f64, f64)> {
        self.total_value_truth
            .map(|truth| (self.total_value_predicted, truth))
    }
}
