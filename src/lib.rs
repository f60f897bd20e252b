pub mod config;
pub mod dataset;
pub mod detection;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod pipeline;
pub mod regression;
pub mod report;
pub mod valuation;

pub use detection::circles::{CircleSet, DetectedCircle};
pub use detection::{CircleDetector, DetectorConfig};
pub use error::{CoinError, Result};
pub use evaluation::{CountAccuracy, Metric, MetricReport};
pub use models::{ImageRecord, PredictionResult};
pub use pipeline::{DebugConfig, Pipeline, PipelineOutput};
pub use regression::RegressionAlgorithm;
pub use valuation::{CoinValuer, PlaceholderValuer};
