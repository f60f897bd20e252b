use std::path::Path;

use clap::ValueEnum;
use image::{DynamicImage, ImageReader};

use crate::detection::CircleDetector;
use crate::detection::circles::CircleSet;
use crate::error::{CoinError, Result};
use crate::valuation::{self, CoinValuer, PlaceholderValuer};

/// Regression algorithm variants selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RegressionAlgorithm {
    /// Hough circle detection + placeholder valuation
    #[default]
    #[value(name = "1")]
    One,
    /// Declared, not implemented
    #[value(name = "2")]
    Two,
}

/// Coin count and total value predicted for one image
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub circles: CircleSet,
    pub coin_count: u32,
    pub total_value: f64,
}

/// Decode an image file, distinguishing a missing file from an unreadable one
pub fn load_image(path: &Path, name: &str) -> Result<DynamicImage> {
    if !path.is_file() {
        return Err(CoinError::NotFound(format!(
            "The image '{}' couldn't be found at '{}'.",
            name,
            path.display()
        )));
    }

    let decode_err = |reason: String| CoinError::Decode {
        name: name.to_string(),
        reason,
    };
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| decode_err(e.to_string()))
}

impl RegressionAlgorithm {
    pub fn label(&self) -> &'static str {
        match self {
            RegressionAlgorithm::One => "1",
            RegressionAlgorithm::Two => "2",
        }
    }

    /// Predict the coin count and total monetary value of one decoded image
    pub fn predict(
        &self,
        img: &DynamicImage,
        detector: &CircleDetector,
        valuer: &dyn CoinValuer,
    ) -> Result<Prediction> {
        match self {
            RegressionAlgorithm::One => {
                let circles = detector.detect(img);
                let total_value =
                    valuation::estimate_total_value(img, &circles, valuer, valuation::DEFAULT_ZOOM);
                Ok(Prediction {
                    coin_count: circles.count(),
                    circles,
                    total_value,
                })
            }
            RegressionAlgorithm::Two => Err(CoinError::NotImplemented(self.label())),
        }
    }

    /// Predict with the default detector and the placeholder valuer
    pub fn predict_default(&self, img: &DynamicImage) -> Result<Prediction> {
        self.predict(img, &CircleDetector::default(), &PlaceholderValuer)
    }
}

impl std::fmt::Display for RegressionAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "regression algorithm {}", self.label())
    }
}
