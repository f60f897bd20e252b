#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from coincount for tests
pub use coincount::{
    CircleDetector, CoinError, DetectedCircle, ImageRecord, Metric, MetricReport, Pipeline,
    PredictionResult, RegressionAlgorithm,
};
