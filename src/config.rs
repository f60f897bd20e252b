use std::path::{Path, PathBuf};

use crate::detection::DetectorConfig;
use crate::error::{CoinError, Result};
use crate::evaluation::Metric;
use crate::regression::RegressionAlgorithm;

/// Default list of image names to evaluate, relative to the data root
pub const DEFAULT_IMAGE_LIST: &str = "data/default_imgs_to_evaluate.txt";
/// Default directory holding the images
pub const DEFAULT_IMAGE_DIR: &str = "data/img_database";
/// Default ground truth file
pub const DEFAULT_GROUND_TRUTH: &str = "data/default_ground_truth.txt";

/// Fully resolved settings of one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub image_list: PathBuf,
    pub image_dir: PathBuf,
    pub ground_truth: PathBuf,
    pub metrics: Vec<Metric>,
    pub algorithm: RegressionAlgorithm,
    pub detector: DetectorConfig,
    pub print_details: bool,
    pub print_breakdown: bool,
    pub debug_out: Option<PathBuf>,
}

/// Inputs as given on the command line, before defaults are applied
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub image_list: Option<PathBuf>,
    pub image_dir: Option<PathBuf>,
    pub ground_truth: Option<PathBuf>,
    pub metrics: Vec<Metric>,
    pub algorithm: RegressionAlgorithm,
    pub detector_config: Option<PathBuf>,
    pub print_details: bool,
    pub print_breakdown: bool,
    pub debug_out: Option<PathBuf>,
}

fn default_file(
    root: &Path,
    given: Option<PathBuf>,
    default: &str,
    what: &'static str,
    flag: &'static str,
) -> Result<PathBuf> {
    if let Some(path) = given {
        return Ok(path);
    }
    let path = root.join(default);
    if path.is_file() {
        Ok(path)
    } else {
        Err(CoinError::Config { what, path, flag })
    }
}

fn default_dir(
    root: &Path,
    given: Option<PathBuf>,
    default: &str,
    what: &'static str,
    flag: &'static str,
) -> Result<PathBuf> {
    if let Some(path) = given {
        return Ok(path);
    }
    let path = root.join(default);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(CoinError::Config { what, path, flag })
    }
}

impl RunConfig {
    /// Apply defaults relative to `data_root`. A missing default with no
    /// override is a [`CoinError::Config`]. Overrides are used as given and
    /// checked later, when loaded.
    pub fn resolve(options: RunOptions, data_root: &Path) -> Result<Self> {
        let image_list = default_file(
            data_root,
            options.image_list,
            DEFAULT_IMAGE_LIST,
            "file containing a list of images' names to evaluate",
            "-f",
        )?;
        let image_dir = default_dir(
            data_root,
            options.image_dir,
            DEFAULT_IMAGE_DIR,
            "directory containing all the images to evaluate",
            "-d",
        )?;
        let ground_truth = default_file(
            data_root,
            options.ground_truth,
            DEFAULT_GROUND_TRUTH,
            "file containing the ground truth",
            "-g",
        )?;

        let detector = match &options.detector_config {
            Some(path) => DetectorConfig::from_json_file(path)?,
            None => DetectorConfig::default(),
        };

        let metrics = if options.metrics.is_empty() {
            vec![Metric::Mse]
        } else {
            options.metrics
        };

        Ok(Self {
            image_list,
            image_dir,
            ground_truth,
            metrics,
            algorithm: options.algorithm,
            detector,
            print_details: options.print_details,
            print_breakdown: options.print_breakdown,
            debug_out: options.debug_out,
        })
    }
}
