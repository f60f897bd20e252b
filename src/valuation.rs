//! Monetary value estimation from detected coins.
//!
//! Each detected circle is cut out of the original image and handed to a
//! [`CoinValuer`]. No denomination classifier exists yet: the only valuer
//! shipped is [`PlaceholderValuer`], which values every coin at zero.

use image::{DynamicImage, GenericImageView, Rgba};

use crate::detection::circles::{CircleSet, DetectedCircle};

/// Default crop size around a coin, as a multiple of its radius
pub const DEFAULT_ZOOM: f32 = 1.5;

/// Maps one extracted coin to a monetary value
pub trait CoinValuer: Send + Sync {
    /// `zoomed` is the square crop around the coin, `interior` holds only
    /// the pixels inside the circle (everything else is zeroed)
    fn value(&self, zoomed: &DynamicImage, interior: &DynamicImage) -> f64;

    fn name(&self) -> &str;
}

/// Stand-in for a denomination classifier: every coin is worth 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderValuer;

impl CoinValuer for PlaceholderValuer {
    fn value(&self, _zoomed: &DynamicImage, _interior: &DynamicImage) -> f64 {
        0.0
    }

    fn name(&self) -> &str {
        "Placeholder (always 0)"
    }
}

/// Pixel bounds `(x_min, y_min, x_max, y_max)` of the square of half side
/// `zoom * radius` around the circle center, clipped to the image
fn zoom_bounds(
    width: u32,
    height: u32,
    circle: &DetectedCircle,
    zoom: f32,
) -> (u32, u32, u32, u32) {
    let half = (zoom * circle.radius) as i64;
    let cx = circle.center_x as i64;
    let cy = circle.center_y as i64;

    let x_min = (cx - half).clamp(0, width as i64) as u32;
    let x_max = (cx + half).clamp(0, width.saturating_sub(1) as i64) as u32;
    let y_min = (cy - half).clamp(0, height as i64) as u32;
    let y_max = (cy + half).clamp(0, height.saturating_sub(1) as i64) as u32;
    (x_min, y_min, x_max, y_max)
}

/// Square crop centered on the coin, side `2 * zoom * radius`, clipped to
/// the image. May be empty when the circle lies outside the image.
pub fn zoomed_coin(img: &DynamicImage, circle: &DetectedCircle, zoom: f32) -> DynamicImage {
    let (x_min, y_min, x_max, y_max) = zoom_bounds(img.width(), img.height(), circle, zoom);
    img.crop_imm(
        x_min,
        y_min,
        x_max.saturating_sub(x_min),
        y_max.saturating_sub(y_min),
    )
}

/// Crop of the coin interior only: pixels outside the circle are zeroed
pub fn coin_interior(img: &DynamicImage, circle: &DetectedCircle) -> DynamicImage {
    let zoomed = zoomed_coin(img, circle, 1.0);
    let (x_min, y_min, _, _) = zoom_bounds(img.width(), img.height(), circle, 1.0);

    let mut masked = zoomed.to_rgba8();
    for (x, y, pixel) in masked.enumerate_pixels_mut() {
        let ox = (x + x_min) as f32;
        let oy = (y + y_min) as f32;
        if !circle.contains(ox, oy) {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    DynamicImage::ImageRgba8(masked)
}

/// Value of every coin found in `img`, in detection order
pub fn coin_values(
    img: &DynamicImage,
    circles: &CircleSet,
    valuer: &dyn CoinValuer,
    zoom: f32,
) -> Vec<f64> {
    circles
        .iter()
        .map(|circle| {
            let zoomed = zoomed_coin(img, circle, zoom);
            let interior = coin_interior(img, circle);
            valuer.value(&zoomed, &interior)
        })
        .collect()
}

/// Total monetary value of the coins found in `img`
pub fn estimate_total_value(
    img: &DynamicImage,
    circles: &CircleSet,
    valuer: &dyn CoinValuer,
    zoom: f32,
) -> f64 {
    let values = coin_values(img, circles, valuer, zoom);
    let total: f64 = values.iter().sum();
    tracing::debug!(coins = values.len(), total, valuer = valuer.name(), "estimated monetary value");
    total.max(0.0)
}

/// Checks whether a crop produced by [`zoomed_coin`] has any pixel
pub fn is_empty_crop(img: &DynamicImage) -> bool {
    let (w, h) = img.dimensions();
    w == 0 || h == 0
}
