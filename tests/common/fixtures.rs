use std::path::{Path, PathBuf};

use coincount::PredictionResult;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use imageproc::filter::gaussian_blur_f32;

pub const BACKGROUND: Rgb<u8> = Rgb([215, 210, 200]);
pub const COIN: Rgb<u8> = Rgb([70, 55, 40]);

/// Three well separated coins of radius 160 in a 1000x1000 image
pub const THREE_COINS: [(i32, i32, i32); 3] = [(220, 220, 160), (700, 260, 160), (460, 740, 160)];

/// Dark filled discs `(x, y, radius)` on a light background, softened like a photo
pub fn coin_image(width: u32, height: u32, coins: &[(i32, i32, i32)]) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);
    for &(x, y, r) in coins {
        draw_filled_circle_mut(&mut img, (x, y), r, COIN);
    }
    gaussian_blur_f32(&img, 2.0)
}

pub fn blank_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, BACKGROUND)
}

/// One image of a test dataset
pub struct Entry {
    pub name: &'static str,
    pub image: Option<RgbImage>,
    pub coins: u32,
    /// `None` is written as `NaN`
    pub value: Option<f64>,
}

/// Paths of a dataset written to a temporary directory
pub struct DatasetFiles {
    pub dir: tempfile::TempDir,
    pub image_list: PathBuf,
    pub image_dir: PathBuf,
    pub ground_truth: PathBuf,
}

/// Write images, image list and JSON ground truth for `entries`.
/// Entries without an image are listed and labelled, but no file is written.
pub fn write_dataset(entries: &[Entry]) -> DatasetFiles {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let image_dir = dir.path().join("img_database");
    std::fs::create_dir_all(&image_dir).expect("Failed to create image directory");

    for entry in entries {
        if let Some(img) = &entry.image {
            let path = image_dir.join(entry.name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("Failed to create image subfolder");
            }
            img.save(&path).expect("Failed to save test image");
        }
    }

    let names: Vec<&str> = entries.iter().map(|e| e.name).collect();
    let image_list = write_file(dir.path(), "imgs_to_evaluate.txt", &names.join("\n"));

    let truths: Vec<String> = entries
        .iter()
        .map(|e| {
            let value = e.value.map_or_else(|| "NaN".to_string(), |v| v.to_string());
            format!(r#""{}": {{"nbCoins": {}, "totalValue": {}}}"#, e.name, e.coins, value)
        })
        .collect();
    let ground_truth = write_file(
        dir.path(),
        "ground_truth.txt",
        &format!("{{{}}}", truths.join(",\n")),
    );

    DatasetFiles {
        dir,
        image_list,
        image_dir,
        ground_truth,
    }
}

/// Write a ground truth workbook: a header row, then
/// `(name, coin count, value, group)` rows. A `None` value leaves the cell empty.
pub fn write_spreadsheet(
    dir: &Path,
    name: &str,
    rows: &[(&str, f64, Option<f64>, &str)],
) -> PathBuf {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, title) in ["Image", "Coins", "Value", "Group"].into_iter().enumerate() {
        sheet
            .write_string(0, col as u16, title)
            .expect("Failed to write header cell");
    }
    for (idx, &(image, coins, value, group)) in rows.iter().enumerate() {
        let row = idx as u32 + 1;
        sheet.write_string(row, 0, image).expect("Failed to write name cell");
        sheet.write_number(row, 1, coins).expect("Failed to write count cell");
        if let Some(value) = value {
            sheet.write_number(row, 2, value).expect("Failed to write value cell");
        }
        if !group.is_empty() {
            sheet.write_string(row, 3, group).expect("Failed to write group cell");
        }
    }

    let path = dir.join(name);
    workbook.save(&path).expect("Failed to save test workbook");
    path
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

pub fn result(count: (u32, u32), value: (f64, Option<f64>)) -> PredictionResult {
    PredictionResult {
        name: "img.jpg".to_string(),
        coin_count_predicted: count.0,
        coin_count_truth: count.1,
        total_value_predicted: value.0,
        total_value_truth: value.1,
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
