//! Loading of the evaluation batch: image list, ground truth and image paths.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{CoinError, Result};
use crate::models::ImageRecord;

/// Header rows skipped at the top of a ground truth spreadsheet
pub const SPREADSHEET_HEADER_ROWS: usize = 1;

const SPREADSHEET_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

/// Ground truth of one image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundTruth {
    pub coin_count: u32,
    /// `None` when the monetary value is unknown
    pub total_value: Option<f64>,
}

pub type GroundTruthMap = HashMap<String, GroundTruth>;

/// Read a whole text file, which must exist and not be blank
pub fn read_text_file(path: &Path, purpose: &str) -> Result<String> {
    let text = std::fs::read_to_string(path).map_err(|_| {
        CoinError::NotFound(format!(
            "The file {} doesn't exist.\n(this file is supposed to contain {})",
            path.display(),
            purpose
        ))
    })?;

    if text.trim().is_empty() {
        return Err(CoinError::EmptyInput(path.to_path_buf()));
    }
    Ok(text)
}

/// Image names listed in a whitespace separated file, duplicates removed.
/// The order of first appearance is kept.
pub fn read_image_list(path: &Path) -> Result<Vec<String>> {
    let text = read_text_file(path, "the list of images for regression and evaluation")?;
    let mut seen = HashSet::new();
    Ok(text
        .split_whitespace()
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect())
}

#[derive(Deserialize)]
struct RawGroundTruth {
    #[serde(rename = "nbCoins")]
    nb_coins: u32,
    #[serde(rename = "totalValue")]
    total_value: Value,
}

fn parse_total_value(value: &Value) -> std::result::Result<Option<f64>, String> {
    let parsed = match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("nan") || s.is_empty() {
                None
            } else {
                Some(s.parse::<f64>().map_err(|_| format!("invalid totalValue '{}'", s))?)
            }
        }
        other => return Err(format!("invalid totalValue '{}'", other)),
    };
    Ok(parsed.filter(|v| v.is_finite()))
}

/// Replace the non-standard `NaN` / `Infinity` literals emitted by some JSON
/// writers with `null`, leaving string contents untouched
fn replace_non_finite_literals(text: &str) -> String {
    const LITERALS: [&str; 4] = ["-Infinity", "Infinity", "-NaN", "NaN"];

    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(literal) = LITERALS.iter().find(|l| rest.starts_with(**l)) {
            out.push_str("null");
            rest = &rest[literal.len()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Parse a JSON ground truth: `{"<image>": {"nbCoins": 3, "totalValue": 1.5}, ...}`.
///
/// A `totalValue` of `null`, `NaN` or `"NaN"` means the value is unknown.
pub fn parse_ground_truth_json(text: &str) -> Result<GroundTruthMap> {
    let parse_err = |detail: String| {
        CoinError::Parse(format!(
            "The content of the ground truth file couldn't be parsed in a ground truth object: {}",
            detail
        ))
    };

    let raw: HashMap<String, RawGroundTruth> =
        serde_json::from_str(&replace_non_finite_literals(text))
            .map_err(|e| parse_err(e.to_string()))?;

    raw.into_iter()
        .map(|(name, entry)| {
            let total_value = parse_total_value(&entry.total_value)
                .map_err(|e| parse_err(format!("{} (image '{}')", e, name)))?;
            Ok((
                name,
                GroundTruth {
                    coin_count: entry.nb_coins,
                    total_value,
                },
            ))
        })
        .collect()
}

fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::Float(f)) => f.to_string(),
        _ => String::new(),
    }
}

fn cell_number(cell: Option<&Data>) -> Option<f64> {
    let number = match cell {
        Some(Data::Int(i)) => Some(*i as f64),
        Some(Data::Float(f)) => Some(*f),
        Some(Data::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

/// Read ground truth from the first sheet of a spreadsheet.
///
/// Columns: image name, coin count, monetary value, group folder. The key of
/// each row is `<group>/<name>`, or just the name when the group is empty.
pub fn load_ground_truth_spreadsheet(path: &Path) -> Result<GroundTruthMap> {
    if !path.is_file() {
        return Err(CoinError::NotFound(format!(
            "The file {} doesn't exist.",
            path.display()
        )));
    }
    let parse_err = |detail: String| {
        CoinError::Parse(format!(
            "The spreadsheet '{}' couldn't be read as ground truth: {}",
            path.display(),
            detail
        ))
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| parse_err(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| parse_err("no worksheet".to_string()))?
        .map_err(|e| parse_err(e.to_string()))?;

    let mut ground_truth = GroundTruthMap::new();
    for (idx, row) in range.rows().enumerate().skip(SPREADSHEET_HEADER_ROWS) {
        let name = cell_text(row.first());
        if name.is_empty() {
            continue;
        }

        let coin_count = cell_number(row.get(1))
            .filter(|c| *c >= 0.0 && c.fract() == 0.0)
            .ok_or_else(|| parse_err(format!("row {}: invalid coin count", idx + 1)))?
            as u32;
        let total_value = cell_number(row.get(2));

        let group = cell_text(row.get(3));
        let key = if group.is_empty() {
            name
        } else {
            format!("{}/{}", group.trim_end_matches('/'), name)
        };

        ground_truth.insert(
            key,
            GroundTruth {
                coin_count,
                total_value,
            },
        );
    }

    if ground_truth.is_empty() {
        return Err(CoinError::EmptyInput(path.to_path_buf()));
    }
    Ok(ground_truth)
}

pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SPREADSHEET_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Load ground truth, choosing the format from the file extension
pub fn load_ground_truth(path: &Path) -> Result<GroundTruthMap> {
    if is_spreadsheet(path) {
        load_ground_truth_spreadsheet(path)
    } else {
        let text = read_text_file(path, "the ground truth for the images")?;
        parse_ground_truth_json(&text)
    }
}

/// Keep only the ground truth of the listed images; every listed image must have one
pub fn select_ground_truth(
    mut ground_truth: GroundTruthMap,
    names: &[String],
) -> Result<Vec<GroundTruth>> {
    if let Some(missing) = names.iter().find(|name| !ground_truth.contains_key(*name)) {
        return Err(CoinError::MissingGroundTruth(missing.clone()));
    }
    Ok(names
        .iter()
        .filter_map(|name| ground_truth.remove(name))
        .collect())
}

/// Resolve every image name to an existing file inside `dir`
pub fn resolve_image_paths(dir: &Path, names: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CoinError::NotFound(format!(
            "The directory '{}' doesn't exist.",
            dir.display()
        )));
    }

    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            if path.is_file() {
                Ok(path)
            } else {
                Err(CoinError::NotFound(format!(
                    "The image '{}' couldn't be found at '{}'.",
                    name,
                    path.display()
                )))
            }
        })
        .collect()
}

/// Build the evaluation batch. Fails before any image is decoded when an
/// input is missing or an image has no ground truth.
pub fn load_dataset(
    image_list: &Path,
    image_dir: &Path,
    ground_truth: &Path,
) -> Result<Vec<ImageRecord>> {
    let names = read_image_list(image_list)?;
    let truths = select_ground_truth(load_ground_truth(ground_truth)?, &names)?;
    let paths = resolve_image_paths(image_dir, &names)?;
    tracing::info!(images = names.len(), dir = %image_dir.display(), "dataset loaded");

    Ok(names
        .into_iter()
        .zip(paths)
        .zip(truths)
        .map(|((name, path), truth)| ImageRecord {
            name,
            path,
            coin_count_truth: truth.coin_count,
            total_value_truth: truth.total_value,
        })
        .collect())
}
