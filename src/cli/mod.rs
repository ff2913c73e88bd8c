//! etalon CLI - Ground-Truth Dataset Validation and Metrics
//!
//! Command-line interface for etalon operations.

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod basic;
mod metrics;
mod validate;

pub use basic::{MetricsArgs, RoleArgs};

/// etalon - Ground-Truth Dataset Validation and Metrics in Pure Rust
#[derive(Parser)]
#[command(name = "etalon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flag rows unfit for use as ground truth
    Validate {
        /// Path to dataset file (Parquet/CSV/JSON)
        path: PathBuf,
        #[command(flatten)]
        roles: RoleArgs,
        /// Accept only phone-style identifiers (optional '+', digits only)
        #[arg(long)]
        digits: bool,
        /// Shortest accepted identifier with --digits
        #[arg(long, default_value = "10")]
        min_digits: usize,
        /// Longest accepted identifier with --digits
        #[arg(long, default_value = "15")]
        max_digits: usize,
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
        /// Write the dataset with an is_valid column (format by extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compute the time-binned metrics report
    Metrics {
        /// Path to dataset file (Parquet/CSV/JSON)
        path: PathBuf,
        #[command(flatten)]
        roles: RoleArgs,
        #[command(flatten)]
        metrics: MetricsArgs,
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
        /// Write the report as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare the metrics report against a stored baseline
    Compare {
        /// Path to dataset file (Parquet/CSV/JSON)
        path: PathBuf,
        #[command(flatten)]
        roles: RoleArgs,
        #[command(flatten)]
        metrics: MetricsArgs,
        /// Baseline report (JSON)
        #[arg(short, long)]
        baseline: PathBuf,
        /// Relative tolerance for floating-point fields
        #[arg(short, long, default_value = "0.0")]
        tolerance: f64,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("etalon=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the etalon CLI.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Validate {
            path,
            roles,
            digits,
            min_digits,
            max_digits,
            format,
            output,
        } => {
            let identifier_format =
                digits.then(|| crate::IdentifierFormat::digits(min_digits, max_digits));
            validate::cmd_validate(
                &path,
                &roles,
                identifier_format,
                &format,
                output.as_ref(),
            )
            .map(|()| true)
        }
        Commands::Metrics {
            path,
            roles,
            metrics,
            format,
            output,
        } => metrics::cmd_metrics(&path, &roles, &metrics, &format, output.as_ref()).map(|()| true),
        Commands::Compare {
            path,
            roles,
            metrics,
            baseline,
            tolerance,
        } => metrics::cmd_compare(&path, &roles, &metrics, &baseline, tolerance),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}
