//! Metrics CLI commands.

use std::path::{Path, PathBuf};

use crate::{MetricsReport, RowValidator};

use super::basic::{load_dataset, write_text, MetricsArgs, RoleArgs};

fn compute_report(
    path: &Path,
    roles: &RoleArgs,
    metrics: &MetricsArgs,
) -> crate::Result<MetricsReport> {
    let dataset = load_dataset(path)?;
    let roles = roles.roles()?;
    let aggregator = metrics.aggregator()?;

    let validity = RowValidator::new().validate(&dataset, &roles)?;
    aggregator.compute(&dataset, &validity, &roles)
}

/// Compute and print the metrics report.
pub(crate) fn cmd_metrics(
    path: &Path,
    roles: &RoleArgs,
    metrics: &MetricsArgs,
    format: &str,
    output: Option<&PathBuf>,
) -> crate::Result<()> {
    let report = compute_report(path, roles, metrics)?;

    if let Some(output_path) = output {
        write_text(output_path, &report.to_json_pretty()?)?;
        println!("Metrics report written to: {}", output_path.display());
    } else if format == "json" {
        println!("{}", report.to_json_pretty()?);
    } else {
        println!("File: {}", path.display());
        print!("{}", report);
    }

    Ok(())
}

/// Compare the metrics report against a baseline.
///
/// Returns `Ok(false)` when the reports differ.
pub(crate) fn cmd_compare(
    path: &Path,
    roles: &RoleArgs,
    metrics: &MetricsArgs,
    baseline: &Path,
    tolerance: f64,
) -> crate::Result<bool> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(crate::Error::configuration(format!(
            "tolerance must be a finite non-negative number, got {}",
            tolerance
        )));
    }

    let expected = MetricsReport::from_json_file(baseline)?;
    let report = compute_report(path, roles, metrics)?;
    let mismatches = report.compare(&expected, tolerance);

    if mismatches.is_empty() {
        println!("\u{2713} Report matches baseline {}", baseline.display());
        return Ok(true);
    }

    println!(
        "\u{2717} {} field(s) differ from baseline {}:",
        mismatches.len(),
        baseline.display()
    );
    for mismatch in &mismatches {
        println!("  - {}", mismatch);
    }
    Ok(false)
}
