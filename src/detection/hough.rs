use image::GrayImage;
use imageproc::edges::canny;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

use crate::detection::circles::DetectedCircle;

/// Smallest accepted accumulator resolution ratio; below it the accumulator
/// grows past any useful size
pub const MIN_DP: f32 = 0.5;

/// Parameters of the gradient Hough circle transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughParams {
    /// Ratio of image resolution to accumulator resolution
    pub dp: f32,
    /// Minimum distance between two detected centers
    pub min_dist: f32,
    /// Canny high threshold (the low threshold is half of it)
    pub canny_high: f32,
    /// Minimum votes for a center and minimum edge support for a radius
    pub accumulator_threshold: u32,
    pub min_radius: u32,
    pub max_radius: u32,
}

struct Accumulator {
    width: usize,
    height: usize,
    votes: Vec<u32>,
}

impl Accumulator {
    /// One cell of padding on every side so local maxima never touch the border
    fn new(inner_width: usize, inner_height: usize) -> Self {
        let width = inner_width + 2;
        let height = inner_height + 2;
        Self {
            width,
            height,
            votes: vec![0; width * height],
        }
    }

    fn vote(&mut self, x: usize, y: usize) {
        self.votes[(y + 1) * self.width + x + 1] += 1;
    }

    /// Local maxima above the threshold, strongest first, in inner coordinates
    fn peaks(&self, threshold: u32) -> Vec<(u32, usize, usize)> {
        let mut peaks = Vec::new();
        for y in 1..self.height - 1 {
            for x in 1..self.width - 1 {
                let base = y * self.width + x;
                let v = self.votes[base];
                if v > threshold
                    && v > self.votes[base - 1]
                    && v >= self.votes[base + 1]
                    && v > self.votes[base - self.width]
                    && v >= self.votes[base + self.width]
                {
                    peaks.push((v, x - 1, y - 1));
                }
            }
        }
        peaks.sort_by(|a, b| b.0.cmp(&a.0).then(a.2.cmp(&b.2)).then(a.1.cmp(&b.1)));
        peaks
    }
}

/// Find circles with the Hough gradient method.
///
/// Every edge pixel votes along its gradient line, in both directions, for
/// centers at distances between the minimum and maximum radius. Accumulator
/// peaks become center candidates; each candidate keeps the radius with the
/// densest edge support, and is dropped if it lies closer than `min_dist`
/// to an already accepted circle.
pub fn hough_circles(img: &GrayImage, params: &HoughParams) -> Vec<DetectedCircle> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 || params.min_radius > params.max_radius {
        return Vec::new();
    }
    if !params.dp.is_finite() || params.dp < MIN_DP {
        tracing::warn!(dp = params.dp, "accumulator resolution out of range, skipping transform");
        return Vec::new();
    }

    let edges = canny(img, (params.canny_high / 2.0).max(1.0), params.canny_high);
    let gx = horizontal_sobel(img);
    let gy = vertical_sobel(img);

    let idp = 1.0 / params.dp;
    let acc_width = (width as f32 * idp).ceil() as usize;
    let acc_height = (height as f32 * idp).ceil() as usize;
    let mut acc = Accumulator::new(acc_width, acc_height);
    let mut edge_points = Vec::new();

    for (x, y, pixel) in edges.enumerate_pixels() {
        if pixel[0] == 0 {
            continue;
        }
        let vx = gx.get_pixel(x, y)[0] as f32;
        let vy = gy.get_pixel(x, y)[0] as f32;
        let magnitude = (vx * vx + vy * vy).sqrt();
        if magnitude < f32::EPSILON {
            continue;
        }
        edge_points.push((x as f32, y as f32));

        let (ux, uy) = (vx / magnitude * idp, vy / magnitude * idp);
        let (x0, y0) = ((x as f32 + 0.5) * idp, (y as f32 + 0.5) * idp);

        for sign in [1.0f32, -1.0] {
            for r in params.min_radius..=params.max_radius {
                let ax = x0 + sign * r as f32 * ux;
                let ay = y0 + sign * r as f32 * uy;
                if ax < 0.0 || ay < 0.0 {
                    break;
                }
                let (ix, iy) = (ax as usize, ay as usize);
                if ix >= acc_width || iy >= acc_height {
                    break;
                }
                acc.vote(ix, iy);
            }
        }
    }

    let min_r2 = (params.min_radius as f32).powi(2);
    let max_r2 = (params.max_radius as f32).powi(2);
    let min_dist2 = params.min_dist * params.min_dist;
    let mut circles: Vec<DetectedCircle> = Vec::new();
    let mut distances = Vec::with_capacity(edge_points.len());

    for (_, ax, ay) in acc.peaks(params.accumulator_threshold) {
        let cx = (ax as f32 + 0.5) * params.dp;
        let cy = (ay as f32 + 0.5) * params.dp;

        let too_close = circles.iter().any(|c| {
            let dx = c.center_x - cx;
            let dy = c.center_y - cy;
            dx * dx + dy * dy < min_dist2
        });
        if too_close {
            continue;
        }

        distances.clear();
        distances.extend(edge_points.iter().filter_map(|&(px, py)| {
            let d2 = (px - cx).powi(2) + (py - cy).powi(2);
            (min_r2..=max_r2).contains(&d2).then(|| d2.sqrt())
        }));

        if let Some(radius) = best_radius(&mut distances, params.dp, params.accumulator_threshold) {
            circles.push(DetectedCircle::new(cx, cy, radius));
        }
    }

    circles
}

/// Group sorted center distances into shells no wider than `shell_width` and
/// return the median radius of the densest shell (support per unit radius)
/// among shells with more than `min_support` edge points.
fn best_radius(distances: &mut [f32], shell_width: f32, min_support: u32) -> Option<f32> {
    if distances.is_empty() {
        return None;
    }
    distances.sort_by(f32::total_cmp);

    let mut best: Option<(usize, f32)> = None;
    let mut start = 0;
    for end in 1..=distances.len() {
        if end < distances.len() && distances[end] - distances[start] <= shell_width {
            continue;
        }
        let support = end - start;
        let radius = distances[(start + end - 1) / 2];
        if support as u32 > min_support {
            let denser = match best {
                None => true,
                Some((best_support, best_r)) => support as f32 * best_r > best_support as f32 * radius,
            };
            if denser {
                best = Some((support, radius));
            }
        }
        start = end;
    }

    best.map(|(_, radius)| radius)
}
