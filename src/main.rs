use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use coincount::config::{RunConfig, RunOptions};
use coincount::{Metric, Pipeline, RegressionAlgorithm, dataset, report};

#[derive(Parser)]
#[command(name = "coincount")]
#[command(about = "Count coins and estimate their value in images, then evaluate the predictions")]
struct Cli {
    /// File listing the names of the images to evaluate
    #[arg(short = 'f', long, value_name = "FILE")]
    file_to_evaluate: Option<PathBuf>,

    /// Directory containing the images to evaluate
    #[arg(short = 'd', long, value_name = "DIR")]
    dir_images: Option<PathBuf>,

    /// Ground truth file (JSON, or a spreadsheet: xlsx/xls/xlsm/ods)
    #[arg(short = 'g', long, value_name = "FILE")]
    file_ground_truth: Option<PathBuf>,

    /// Evaluations to apply, in order (default: mse)
    #[arg(short = 'e', long = "evaluation", value_enum, ignore_case = true, num_args = 1..)]
    evaluations: Vec<Metric>,

    /// Regression algorithm
    #[arg(short = 'r', long, value_enum, default_value = "1")]
    regression_algorithm: RegressionAlgorithm,

    /// Print the prediction and ground truth of every image
    #[arg(short = 'p', long)]
    print_details: bool,

    /// Print count accuracy buckets and conditional metrics
    #[arg(short = 'b', long)]
    breakdown: bool,

    /// JSON file overriding circle detector settings
    #[arg(long, value_name = "FILE")]
    detector_config: Option<PathBuf>,

    /// Save annotated images and coin crops to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Root the default data paths are resolved from
    #[arg(long, value_name = "DIR", default_value = ".")]
    data_root: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Enable verbose output (debug logs)
    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let options = RunOptions {
        image_list: cli.file_to_evaluate,
        image_dir: cli.dir_images,
        ground_truth: cli.file_ground_truth,
        metrics: cli.evaluations,
        algorithm: cli.regression_algorithm,
        detector_config: cli.detector_config,
        print_details: cli.print_details,
        print_breakdown: cli.breakdown,
        debug_out: cli.debug_out,
    };
    let config = RunConfig::resolve(options, &cli.data_root)?;

    let records = dataset::load_dataset(&config.image_list, &config.image_dir, &config.ground_truth)?;

    let mut pipeline = Pipeline::new()
        .with_algorithm(config.algorithm)
        .with_metrics(config.metrics.clone())
        .with_detector_config(config.detector.clone());
    if let Some(debug_dir) = config.debug_out.clone() {
        pipeline = pipeline.with_debug(debug_dir)?;
    }

    let results = pipeline.predict_all(&records)?;

    if config.print_details {
        println!("{}", report::details_table(&results));
    }

    for metric_report in pipeline.evaluate(&results)? {
        println!("{}", metric_report);
        println!();
    }

    if config.print_breakdown {
        println!("{}", report::breakdown_report(&results, pipeline.metrics())?);
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { cli.log_level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Error : {}", e);
            ExitCode::FAILURE
        }
    }
}
