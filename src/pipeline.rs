use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use image::{DynamicImage, Rgb};
use imageproc::drawing::draw_hollow_circle_mut;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::detection::circles::CircleSet;
use crate::detection::{CircleDetector, DetectorConfig};
use crate::error::{CoinError, Result};
use crate::evaluation::{self, Metric, MetricReport};
use crate::models::{ImageRecord, PredictionResult};
use crate::regression::{self, RegressionAlgorithm};
use crate::valuation::{self, CoinValuer, PlaceholderValuer};

const CIRCLE_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
const CIRCLE_THICKNESS: i32 = 3;

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

impl DebugConfig {
    /// Save the image with its circles drawn, and one zoomed crop per coin
    fn save(&self, name: &str, img: &DynamicImage, circles: &CircleSet) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let save_err = |path: &Path, e: image::ImageError| {
            CoinError::Debug(format!("Failed to save image {}: {}", path.display(), e))
        };

        let mut annotated = img.to_rgb8();
        for circle in circles {
            let center = (circle.center_x as i32, circle.center_y as i32);
            let radius = circle.radius as i32;
            for offset in 0..CIRCLE_THICKNESS {
                draw_hollow_circle_mut(&mut annotated, center, radius + offset - 1, CIRCLE_COLOR);
            }
        }
        let path = debug_path(&self.output_dir, name, "circles");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        annotated.save(&path).map_err(|e| save_err(&path, e))?;

        let annotated = DynamicImage::ImageRgb8(annotated);
        for (idx, circle) in circles.iter().enumerate() {
            let crop = valuation::zoomed_coin(&annotated, circle, valuation::DEFAULT_ZOOM);
            if valuation::is_empty_crop(&crop) {
                continue;
            }
            let path = debug_path(&self.output_dir, name, &format!("coin_{:02}", idx + 1));
            crop.save(&path).map_err(|e| save_err(&path, e))?;
        }

        tracing::debug!(image = name, dir = %self.output_dir.display(), "debug images saved");
        Ok(())
    }
}

/// Output path of one debug image, mirroring the folders of the image name
/// under `output_dir`. Only plain folder names are kept, so outputs never
/// leave `output_dir`.
fn debug_path(output_dir: &Path, name: &str, suffix: &str) -> PathBuf {
    let relative = Path::new(name);
    let mut path = output_dir.to_path_buf();
    if let Some(parent) = relative.parent() {
        path.extend(parent.components().filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        }));
    }
    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.join(format!("{}_{}.png", stem, suffix))
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub results: Vec<PredictionResult>,
    /// One report per requested metric, in the requested order
    pub reports: Vec<MetricReport>,
}

/// Runs a regression algorithm over a batch of images, then evaluates it
pub struct Pipeline {
    algorithm: RegressionAlgorithm,
    metrics: Vec<Metric>,
    detector: CircleDetector,
    valuer: Arc<dyn CoinValuer>,
    debug: Option<DebugConfig>,
}

impl Pipeline {
    /// Algorithm 1, MSE only, placeholder valuation
    pub fn new() -> Self {
        Self {
            algorithm: RegressionAlgorithm::default(),
            metrics: vec![Metric::Mse],
            detector: CircleDetector::default(),
            valuer: Arc::new(PlaceholderValuer),
            debug: None,
        }
    }

    pub fn with_algorithm(mut self, algorithm: RegressionAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Metrics to compute, in order
    pub fn with_metrics(mut self, metrics: Vec<Metric>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_detector_config(mut self, config: DetectorConfig) -> Self {
        self.detector = CircleDetector::new(config);
        self
    }

    pub fn with_valuer(mut self, valuer: Arc<dyn CoinValuer>) -> Self {
        self.valuer = valuer;
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(CoinError::Debug(format!(
                    "Directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug = Some(DebugConfig {
            output_dir,
            enabled: true,
        });
        Ok(self)
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Decode one image and predict its coin count and value
    pub fn predict_one(&self, record: &ImageRecord) -> Result<PredictionResult> {
        let started = Instant::now();
        let img = regression::load_image(&record.path, &record.name)?;
        let prediction = self.algorithm.predict(&img, &self.detector, self.valuer.as_ref())?;

        if let Some(debug) = &self.debug {
            debug.save(&record.name, &img, &prediction.circles)?;
        }

        tracing::debug!(
            image = %record.name,
            coins = prediction.coin_count,
            value = prediction.total_value,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "image processed"
        );
        Ok(PredictionResult::new(
            record,
            prediction.coin_count,
            prediction.total_value,
        ))
    }

    /// Predict every image. The first failure aborts the whole batch.
    pub fn predict_all(&self, records: &[ImageRecord]) -> Result<Vec<PredictionResult>> {
        tracing::info!(
            images = records.len(),
            algorithm = %self.algorithm,
            valuer = self.valuer.name(),
            "running regression"
        );

        #[cfg(feature = "parallel")]
        let results = records
            .par_iter()
            .map(|record| self.predict_one(record))
            .collect::<Result<Vec<_>>>()?;

        #[cfg(not(feature = "parallel"))]
        let results = records
            .iter()
            .map(|record| self.predict_one(record))
            .collect::<Result<Vec<_>>>()?;

        Ok(results)
    }

    /// Compute the configured metrics over a complete batch of predictions
    pub fn evaluate(&self, results: &[PredictionResult]) -> Result<Vec<MetricReport>> {
        self.metrics
            .iter()
            .map(|metric| evaluation::evaluate(results, *metric))
            .collect()
    }

    /// Predict every image, then evaluate once all predictions are in
    pub fn run(&self, records: &[ImageRecord]) -> Result<PipelineOutput> {
        let started = Instant::now();
        let results = self.predict_all(records)?;
        let reports = self.evaluate(&results)?;
        tracing::info!(
            images = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run complete"
        );
        Ok(PipelineOutput { results, reports })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_path_keeps_folders() {
        let root = Path::new("out");
        assert_eq!(
            debug_path(root, "group1/IMG_01.jpg", "circles"),
            Path::new("out/group1/IMG_01_circles.png")
        );
        assert_eq!(
            debug_path(root, "coins.png", "coin_02"),
            Path::new("out/coins_coin_02.png")
        );
        assert_ne!(
            debug_path(root, "a/b.png", "circles"),
            debug_path(root, "a_b.png", "circles")
        );
    }

    #[test]
    fn test_debug_path_stays_under_output_dir() {
        assert_eq!(
            debug_path(Path::new("out"), "../../etc/x.png", "circles"),
            Path::new("out/etc/x_circles.png")
        );
    }
}
