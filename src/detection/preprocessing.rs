use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use imageproc::contrast::otsu_level;
use imageproc::filter::median_filter;
use serde::{Deserialize, Serialize};

/// How the Canny high threshold of the circle transform is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMethod {
    /// Otsu's bimodal histogram threshold
    #[default]
    Otsu,
    /// 1.33 × median intensity, capped at 255
    Median,
}

/// Resize so the shorter side equals `target`, keeping the aspect ratio.
///
/// Returns the resized image and the factor that maps coordinates in the
/// resized image back to the original one.
pub fn resize_shortest_side(img: &DynamicImage, target: u32) -> (DynamicImage, f32) {
    let (width, height) = (img.width(), img.height());
    let shortest = width.min(height);
    if shortest == target {
        return (img.clone(), 1.0);
    }
    let factor = target as f32 / shortest as f32;

    let new_width = ((width as f32 * factor).round() as u32).max(1);
    let new_height = ((height as f32 * factor).round() as u32).max(1);
    let resized = img.resize_exact(new_width, new_height, FilterType::Triangle);

    let back_factor = shortest as f32 / new_width.min(new_height) as f32;
    (resized, back_factor)
}

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Median blur with a square aperture of `aperture` pixels (odd)
pub fn median_blur(img: &GrayImage, aperture: u32) -> GrayImage {
    let radius = aperture / 2;
    median_filter(img, radius, radius)
}

/// Candidate Canny high threshold for the blurred intensity image
pub fn canny_high_threshold(img: &GrayImage, method: ThresholdMethod) -> u8 {
    match method {
        ThresholdMethod::Otsu => otsu_level(img),
        ThresholdMethod::Median => {
            let scaled = 1.33 * median_intensity(img);
            scaled.min(255.0) as u8
        }
    }
}

/// Median pixel intensity, via the 256-bin histogram.
/// For an even pixel count this is the mean of the two middle levels.
pub fn median_intensity(img: &GrayImage) -> f32 {
    let mut histogram = [0u64; 256];
    for pixel in img.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0.0;
    }

    // 1-based ranks of the middle pixels; equal for odd counts
    let (lower_rank, upper_rank) = (total.div_ceil(2), total / 2 + 1);
    let level_at = |rank: u64| {
        let mut seen = 0u64;
        for (level, count) in histogram.iter().enumerate() {
            seen += count;
            if seen >= rank {
                return level as f32;
            }
        }
        255.0
    };
    (level_at(lower_rank) + level_at(upper_rank)) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, RgbImage};

    #[test]
    fn test_resize_shortest_side_landscape() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(1000, 800));
        let (resized, back) = resize_shortest_side(&img, 500);

        assert_eq!(resized.height(), 500);
        assert_eq!(resized.width(), 625);
        assert!((back - 1.6).abs() < 1e-6);
    }

    #[test]
    fn test_resize_shortest_side_upscales_small_images() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(250, 400));
        let (resized, back) = resize_shortest_side(&img, 500);

        assert_eq!(resized.width(), 500);
        assert_eq!(resized.height(), 800);
        assert!((back - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_median_threshold_is_capped() {
        let bright = GrayImage::from_pixel(10, 10, Luma([240u8]));
        assert_eq!(canny_high_threshold(&bright, ThresholdMethod::Median), 255);

        let mid = GrayImage::from_pixel(10, 10, Luma([90u8]));
        assert_eq!(canny_high_threshold(&mid, ThresholdMethod::Median), 119);
    }

    #[test]
    fn test_median_intensity() {
        let mut img = GrayImage::from_pixel(3, 1, Luma([10u8]));
        img.put_pixel(1, 0, Luma([50u8]));
        img.put_pixel(2, 0, Luma([200u8]));
        assert_eq!(median_intensity(&img), 50.0);
    }

    #[test]
    fn test_median_intensity_averages_middle_levels() {
        let mut img = GrayImage::from_pixel(4, 1, Luma([10u8]));
        img.put_pixel(2, 0, Luma([51u8]));
        img.put_pixel(3, 0, Luma([200u8]));
        assert_eq!(median_intensity(&img), 30.5);

        // 1.33 × 30.5 = 40.565
        assert_eq!(canny_high_threshold(&img, ThresholdMethod::Median), 40);
    }
}
