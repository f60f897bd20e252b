pub mod circles;
pub mod hough;
pub mod preprocessing;

use std::path::Path;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{CoinError, Result};
use circles::CircleSet;
use hough::{HoughParams, MIN_DP, hough_circles};
use preprocessing::ThresholdMethod;

/// Tuning of the circle detector.
///
/// Radii and distances are expressed in pixels of the reference-scaled
/// image, which keeps them meaningful whatever the input resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Shorter side length every image is resized to before detection
    pub reference_side: u32,
    /// Median blur aperture (odd)
    pub median_aperture: u32,
    pub threshold_method: ThresholdMethod,
    /// Added to the derived high threshold before running Canny
    pub threshold_offset: f32,
    pub dp: f32,
    pub accumulator_threshold: u32,
    /// Smallest expected coin radius; also sets the minimum center distance
    pub fixed_min_radius: u32,
    /// Subtracted from `fixed_min_radius` to get the transform's minimum radius
    pub min_radius_margin: u32,
    /// Largest expected coin radius, before the 1.33 widening
    pub fixed_max_radius: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            reference_side: 500,
            median_aperture: 7,
            threshold_method: ThresholdMethod::Otsu,
            threshold_offset: 20.0,
            dp: 1.2,
            accumulator_threshold: 50,
            fixed_min_radius: (50.0 * 0.66) as u32,
            min_radius_margin: 30,
            fixed_max_radius: 177,
        }
    }
}

impl DetectorConfig {
    /// Load a (possibly partial) configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|_| {
            CoinError::NotFound(format!("The file {} doesn't exist.", path.display()))
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            CoinError::Parse(format!(
                "The detector configuration '{}' couldn't be parsed: {}",
                path.display(),
                e
            ))
        })?;
        config.validate().map_err(|reason| {
            CoinError::Parse(format!(
                "The detector configuration '{}' is invalid: {}",
                path.display(),
                reason
            ))
        })?;
        Ok(config)
    }

    /// Check the values a configuration file may get wrong
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.reference_side == 0 {
            return Err("reference_side must be positive".to_string());
        }
        if self.median_aperture % 2 == 0 {
            return Err(format!(
                "median_aperture must be odd, got {}",
                self.median_aperture
            ));
        }
        if !self.dp.is_finite() || self.dp < MIN_DP {
            return Err(format!("dp must be at least {}, got {}", MIN_DP, self.dp));
        }
        if !self.threshold_offset.is_finite() {
            return Err("threshold_offset must be finite".to_string());
        }
        if self.min_radius() > self.max_radius() {
            return Err(format!(
                "fixed_min_radius - min_radius_margin ({}) exceeds the maximum radius ({})",
                self.min_radius(),
                self.max_radius()
            ));
        }
        Ok(())
    }

    pub fn min_radius(&self) -> u32 {
        self.fixed_min_radius.saturating_sub(self.min_radius_margin)
    }

    pub fn max_radius(&self) -> u32 {
        (self.fixed_max_radius as f32 * 1.33) as u32
    }

    pub fn min_center_distance(&self) -> f32 {
        2.0 * self.fixed_min_radius as f32
    }

    fn hough_params(&self, high_threshold: u8) -> HoughParams {
        HoughParams {
            dp: self.dp,
            min_dist: self.min_center_distance(),
            canny_high: high_threshold as f32 + self.threshold_offset,
            accumulator_threshold: self.accumulator_threshold,
            min_radius: self.min_radius(),
            max_radius: self.max_radius(),
        }
    }
}

/// Locates coin-like circles in a decoded image
#[derive(Debug, Clone, Default)]
pub struct CircleDetector {
    pub config: DetectorConfig,
}

impl CircleDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Detect circles; the returned circles are in original-image pixels.
    ///
    /// Finding no circle is a valid outcome and yields an empty set.
    pub fn detect(&self, img: &DynamicImage) -> CircleSet {
        if img.width() == 0 || img.height() == 0 {
            return CircleSet::default();
        }

        let (resized, back_factor) =
            preprocessing::resize_shortest_side(img, self.config.reference_side);
        let gray = preprocessing::to_grayscale(&resized);
        let blurred = preprocessing::median_blur(&gray, self.config.median_aperture);

        let high_threshold =
            preprocessing::canny_high_threshold(&blurred, self.config.threshold_method);
        let params = self.config.hough_params(high_threshold);
        tracing::debug!(
            width = resized.width(),
            height = resized.height(),
            high_threshold,
            ?params,
            "running circle transform"
        );

        let circles = CircleSet::new(hough_circles(&blurred, &params)).scaled(back_factor);
        tracing::debug!(count = circles.count(), back_factor, "circles detected");
        circles
    }
}
