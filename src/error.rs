use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading data, running a regression algorithm or
/// evaluating its predictions.
#[derive(Debug, Error)]
pub enum CoinError {
    /// A default input is missing and no override was supplied.
    #[error(
        "The default {what} doesn't exist\n\t({})\nPlease give a substitute with the option '{flag}'",
        .path.display()
    )]
    Config {
        what: &'static str,
        path: PathBuf,
        flag: &'static str,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("The file '{}' is empty.", .0.display())]
    EmptyInput(PathBuf),

    #[error("{0}")]
    Parse(String),

    #[error("The ground truth file doesn't have data for the '{0}' file.")]
    MissingGroundTruth(String),

    #[error("The file '{name}' couldn't be read as an image: {reason}")]
    Decode { name: String, reason: String },

    #[error("Regression algorithm n°{0} not implemented")]
    NotImplemented(&'static str),

    #[error("cannot compute {0} over zero records")]
    DivideByZero(&'static str),

    #[error("Debug output: {0}")]
    Debug(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoinError>;
