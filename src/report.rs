//! Metrics report value object.
//!
//! A [`MetricsReport`] is produced once per dataset and never changed
//! afterwards. It serializes to the JSON layout used for baseline files and
//! can be compared against a stored baseline to catch data-quality drift.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    task::TaskType,
};

/// Statistics of one temporal bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalMetrics {
    /// Representative timestamp of the bin (epoch milliseconds).
    pub date_cut: f64,
    /// Rows whose date falls in the bin.
    pub count: usize,
    /// Valid rows whose date falls in the bin.
    pub valid_count: usize,
    /// Mean label over valid labeled rows in the bin.
    pub avg_target: Option<f64>,
}

/// Dataset-level metrics report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Kind of supervised task the label describes.
    pub task_type: TaskType,
    /// Scoring function for the task (`"auc"` for binary).
    pub label: Option<String>,
    /// Total row count.
    pub count: usize,
    /// Rows marked valid.
    pub valid_count: usize,
    /// `valid_count / count` as a percentage.
    pub valid_rate: f64,
    /// Mean label over valid rows with a finite label.
    pub avg_target: Option<f64>,
    /// Bin boundaries (epoch milliseconds).
    pub cuts: Vec<f64>,
    /// Per-bin statistics.
    pub interval: Vec<IntervalMetrics>,
}

/// A field that differs between a report and its baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMismatch {
    /// Dotted field path, e.g. `interval[2].avg_target`.
    pub field: String,
    /// Baseline value.
    pub expected: String,
    /// Computed value.
    pub actual: String,
}

impl fmt::Display for ReportMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.field, self.expected, self.actual
        )
    }
}

fn close(a: f64, b: f64, tolerance: f64) -> bool {
    a == b || (a - b).abs() <= tolerance * a.abs().max(b.abs()).max(1.0)
}

fn close_opt(a: Option<f64>, b: Option<f64>, tolerance: f64) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => close(a, b, tolerance),
        (None, None) => true,
        _ => false,
    }
}

fn show_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "null".to_string(), |v| v.to_string())
}

struct Mismatches(Vec<ReportMismatch>);

impl Mismatches {
    fn push(&mut self, field: impl Into<String>, expected: impl ToString, actual: impl ToString) {
        self.0.push(ReportMismatch {
            field: field.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
}

impl MetricsReport {
    /// Rows marked invalid.
    pub fn invalid_count(&self) -> usize {
        self.count.saturating_sub(self.valid_count)
    }

    /// Sum of the per-bin row counts.
    pub fn binned_count(&self) -> usize {
        self.interval.iter().map(|i| i.count).sum()
    }

    /// Sum of the per-bin valid row counts.
    pub fn binned_valid_count(&self) -> usize {
        self.interval.iter().map(|i| i.valid_count).sum()
    }

    /// Whether the cut boundaries strictly increase.
    pub fn cuts_strictly_increasing(&self) -> bool {
        self.cuts.windows(2).all(|w| w[0] < w[1])
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Format(e.to_string()))
    }

    /// Parse a report from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if the JSON does not describe a report.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Format(e.to_string()))
    }

    /// Load a baseline report from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(e, path))?;
        Self::from_json(&json)
    }

    /// List fields that differ from `baseline`.
    ///
    /// Floats are compared with a relative `tolerance` (0.0 means exact);
    /// counts, task type and label must match exactly.
    pub fn compare(&self, baseline: &Self, tolerance: f64) -> Vec<ReportMismatch> {
        let mut out = Mismatches(Vec::new());

        if self.task_type != baseline.task_type {
            out.push("task_type", baseline.task_type, self.task_type);
        }
        if self.label != baseline.label {
            out.push(
                "label",
                baseline.label.as_deref().unwrap_or("null"),
                self.label.as_deref().unwrap_or("null"),
            );
        }
        if self.count != baseline.count {
            out.push("count", baseline.count, self.count);
        }
        if self.valid_count != baseline.valid_count {
            out.push("valid_count", baseline.valid_count, self.valid_count);
        }
        if !close(self.valid_rate, baseline.valid_rate, tolerance) {
            out.push("valid_rate", baseline.valid_rate, self.valid_rate);
        }
        if !close_opt(self.avg_target, baseline.avg_target, tolerance) {
            out.push(
                "avg_target",
                show_opt(baseline.avg_target),
                show_opt(self.avg_target),
            );
        }

        if self.cuts.len() == baseline.cuts.len() {
            for (i, (a, b)) in self.cuts.iter().zip(&baseline.cuts).enumerate() {
                if !close(*a, *b, tolerance) {
                    out.push(format!("cuts[{}]", i), b, a);
                }
            }
        } else {
            out.push("cuts.len", baseline.cuts.len(), self.cuts.len());
        }

        if self.interval.len() == baseline.interval.len() {
            for (i, (a, b)) in self.interval.iter().zip(&baseline.interval).enumerate() {
                if !close(a.date_cut, b.date_cut, tolerance) {
                    out.push(format!("interval[{}].date_cut", i), b.date_cut, a.date_cut);
                }
                if a.count != b.count {
                    out.push(format!("interval[{}].count", i), b.count, a.count);
                }
                if a.valid_count != b.valid_count {
                    out.push(
                        format!("interval[{}].valid_count", i),
                        b.valid_count,
                        a.valid_count,
                    );
                }
                if !close_opt(a.avg_target, b.avg_target, tolerance) {
                    out.push(
                        format!("interval[{}].avg_target", i),
                        show_opt(b.avg_target),
                        show_opt(a.avg_target),
                    );
                }
            }
        } else {
            out.push(
                "interval.len",
                baseline.interval.len(),
                self.interval.len(),
            );
        }

        out.0
    }
}

#[allow(clippy::cast_possible_truncation)]
fn format_epoch(ms: f64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(ms.round() as i64)
        .map_or_else(|| format!("{}", ms), |dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

impl fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Etalon Metrics Report")?;
        writeln!(f, "=====================")?;
        writeln!(
            f,
            "Task type:   {} ({})",
            self.task_type,
            self.label.as_deref().unwrap_or("no scoring")
        )?;
        writeln!(f, "Rows:        {}", self.count)?;
        writeln!(
            f,
            "Valid rows:  {} ({:.2}%)",
            self.valid_count, self.valid_rate
        )?;
        writeln!(f, "Avg target:  {}", show_opt(self.avg_target))?;
        writeln!(f)?;

        if self.interval.is_empty() {
            return writeln!(f, "No dated valid rows; no intervals.");
        }

        writeln!(
            f,
            "{:<18} {:<18} {:>10} {:>10} {:>12}",
            "FROM", "TO", "COUNT", "VALID", "AVG TARGET"
        )?;
        writeln!(f, "{}", "-".repeat(72))?;
        for (i, interval) in self.interval.iter().enumerate() {
            let from = self.cuts.get(i).copied().map(format_epoch).unwrap_or_default();
            let to = self
                .cuts
                .get(i + 1)
                .copied()
                .map(format_epoch)
                .unwrap_or_default();
            let avg = interval
                .avg_target
                .map_or_else(|| "-".to_string(), |v| format!("{:.4}", v));
            writeln!(
                f,
                "{:<18} {:<18} {:>10} {:>10} {:>12}",
                from, to, interval.count, interval.valid_count, avg
            )?;
        }
        Ok(())
    }
}
