//! Time-binned metrics for validated datasets.
//!
//! Consumes a dataset together with its [`Validity`] flags and produces a
//! [`MetricsReport`]: global counts, the mean target, and a histogram of
//! date bins with quantile (or equal-width) boundaries.
//!
//! Statistical dead ends never fail the computation. An empty table reports
//! a zero valid rate, a bin without labeled valid rows reports a `None`
//! average, and rows without a usable date are simply left out of the bins.
//!
//! # Example
//!
//! ```ignore
//! use etalon::metrics::{DateCut, MetricsAggregator};
//!
//! let report = MetricsAggregator::new()
//!     .bins(6)
//!     .date_cut(DateCut::Midpoint)
//!     .compute(&dataset, &validity, &roles)?;
//!
//! println!("{}", report);
//! ```

// Statistical computation requires usize->f64 casts
#![allow(clippy::cast_precision_loss)]

mod cuts;
mod dates;


use std::{fmt, str::FromStr, sync::Arc};

use tracing::{debug, warn};

pub use cuts::{
    derive_cuts, interval_index, quantile, CutSpec, CutStrategy, DegenerateBins, MAX_BINS,
};
pub use dates::{parse_date_str, read_dates, EpochUnit};

use crate::{
    cells::read_labels,
    dataset::{ArrowDataset, Dataset},
    error::{Error, Result},
    report::{IntervalMetrics, MetricsReport},
    roles::{ColumnRole, ColumnRoles},
    task::{distinct_values, DistinctValueClassifier, TaskClassifier},
    validate::Validity,
};

/// How the representative timestamp of a bin is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateCut {
    /// Midpoint of the bin boundaries.
    #[default]
    Midpoint,
    /// Mean date of the rows in the bin; the midpoint for empty bins.
    MeanDate,
}

impl fmt::Display for DateCut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Midpoint => "midpoint",
            Self::MeanDate => "mean",
        })
    }
}

impl FromStr for DateCut {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "midpoint" | "mid" => Ok(Self::Midpoint),
            "mean" | "mean-date" => Ok(Self::MeanDate),
            other => Err(Error::parse(format!("unknown date-cut strategy '{}'", other))),
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsConfig {
    /// Number of date bins (default: 6, at most [`MAX_BINS`]).
    pub bins: usize,
    /// Boundary placement (default: quantile).
    pub strategy: CutStrategy,
    /// Repeated-boundary policy (default: collapse).
    pub degenerate: DegenerateBins,
    /// Bin representative timestamp (default: midpoint).
    pub date_cut: DateCut,
    /// Fraction of the date range subtracted from the first cut (default:
    /// 0.0).
    pub lower_edge_widening: f64,
    /// Unit of bare numeric dates (default: milliseconds).
    pub epoch_unit: EpochUnit,
    /// Largest distinct-label count treated as multiclass (default: 50).
    pub max_classes: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            bins: 6,
            strategy: CutStrategy::Quantile,
            degenerate: DegenerateBins::Collapse,
            date_cut: DateCut::Midpoint,
            lower_edge_widening: 0.0,
            epoch_unit: EpochUnit::Milliseconds,
            max_classes: DistinctValueClassifier::default().max_classes,
        }
    }
}

impl MetricsConfig {
    /// Check the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for zero bins, more than
    /// [`MAX_BINS`] bins, or a negative or non-finite widening.
    pub fn check(&self) -> Result<()> {
        if self.bins == 0 {
            return Err(Error::configuration("bins must be at least 1"));
        }
        if self.bins > MAX_BINS {
            return Err(Error::configuration(format!(
                "bins must be at most {}, got {}",
                MAX_BINS, self.bins
            )));
        }
        if !self.lower_edge_widening.is_finite() || self.lower_edge_widening < 0.0 {
            return Err(Error::configuration(format!(
                "lower edge widening must be a finite non-negative fraction, got {}",
                self.lower_edge_widening
            )));
        }
        Ok(())
    }

    fn cut_spec(&self) -> CutSpec {
        CutSpec {
            bins: self.bins,
            strategy: self.strategy,
            degenerate: self.degenerate,
            lower_edge_widening: self.lower_edge_widening,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    count: usize,
    valid_count: usize,
    label_sum: f64,
    label_n: usize,
    date_sum: f64,
}

impl Accumulator {
    fn avg_target(&self) -> Option<f64> {
        (self.label_n > 0).then(|| self.label_sum / self.label_n as f64)
    }
}

/// Metrics aggregator.
#[derive(Clone)]
pub struct MetricsAggregator {
    config: MetricsConfig,
    classifier: Option<Arc<dyn TaskClassifier>>,
}

impl fmt::Debug for MetricsAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsAggregator")
            .field("config", &self.config)
            .field("custom_classifier", &self.classifier.is_some())
            .finish()
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAggregator {
    /// Create an aggregator with default configuration.
    pub fn new() -> Self {
        Self::with_config(MetricsConfig::default())
    }

    /// Create an aggregator from a full configuration.
    pub fn with_config(config: MetricsConfig) -> Self {
        Self {
            config,
            classifier: None,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Set the number of date bins
    #[must_use]
    pub fn bins(mut self, bins: usize) -> Self {
        self.config.bins = bins;
        self
    }

    /// Set how the bin boundaries are placed
    #[must_use]
    pub fn cut_strategy(mut self, strategy: CutStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Set the repeated-boundary policy
    #[must_use]
    pub fn degenerate_bins(mut self, policy: DegenerateBins) -> Self {
        self.config.degenerate = policy;
        self
    }

    /// Set how the bin timestamp is chosen
    #[must_use]
    pub fn date_cut(mut self, date_cut: DateCut) -> Self {
        self.config.date_cut = date_cut;
        self
    }

    /// Widen the first cut downwards by a fraction of the date range.
    ///
    /// Applied after repeated boundaries are handled. Together with
    /// [`CutStrategy::EqualWidth`], `0.001` reproduces the cuts of legacy
    /// equal-width reports; with quantile cuts it only moves the first one.
    #[must_use]
    pub fn lower_edge_widening(mut self, fraction: f64) -> Self {
        self.config.lower_edge_widening = fraction;
        self
    }

    /// Set the unit of bare numeric dates
    #[must_use]
    pub fn epoch_unit(mut self, unit: EpochUnit) -> Self {
        self.config.epoch_unit = unit;
        self
    }

    /// Set the multiclass cardinality limit of the default classifier
    #[must_use]
    pub fn max_classes(mut self, max_classes: usize) -> Self {
        self.config.max_classes = max_classes;
        self
    }

    /// Replace the task-type classifier.
    #[must_use]
    pub fn classifier(mut self, classifier: impl TaskClassifier + 'static) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    /// Compute the metrics report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the date or label role is not
    /// declared or its column is missing, or if the configuration is
    /// unusable. Returns [`Error::SchemaMismatch`] if `validity` does not
    /// cover every row or a column type is unsupported.
    pub fn compute(
        &self,
        dataset: &ArrowDataset,
        validity: &Validity,
        roles: &ColumnRoles,
    ) -> Result<MetricsReport> {
        self.config.check()?;

        let schema = dataset.schema();
        let date_column = roles.resolve(ColumnRole::Date, &schema)?;
        let label_column = roles.resolve(ColumnRole::Label, &schema)?;

        if validity.len() != dataset.len() {
            return Err(Error::schema_mismatch(format!(
                "validity covers {} rows but dataset has {}",
                validity.len(),
                dataset.len()
            )));
        }

        let labels = read_labels(dataset.column(label_column)?.as_ref())?;
        let dates = read_dates(dataset.column(date_column)?.as_ref(), self.config.epoch_unit)?;
        let targets: Vec<Option<f64>> = labels
            .iter()
            .zip(validity.iter())
            .map(|(label, valid)| if valid { label.finite() } else { None })
            .collect();

        let report = self.aggregate(&dates, validity, &targets);
        debug!(
            date = date_column,
            label = label_column,
            rows = report.count,
            valid = report.valid_count,
            bins = report.interval.len(),
            "computed metrics"
        );
        Ok(report)
    }

    /// Aggregate already-extracted columns.
    ///
    /// `targets[i]` is the label of row `i` when the row is valid and the
    /// label finite, `None` otherwise.
    pub(crate) fn aggregate(
        &self,
        dates: &[Option<f64>],
        validity: &Validity,
        targets: &[Option<f64>],
    ) -> MetricsReport {
        let count = validity.len();
        let valid_count = validity.valid_count();

        let observed: Vec<f64> = targets.iter().flatten().copied().collect();
        let distinct = distinct_values(observed.iter().copied());
        let task_type = match &self.classifier {
            Some(classifier) => classifier.classify(&distinct),
            None => DistinctValueClassifier {
                max_classes: self.config.max_classes,
            }
            .classify(&distinct),
        };
        let avg_target =
            (!observed.is_empty()).then(|| observed.iter().sum::<f64>() / observed.len() as f64);

        let valid_rate = if count == 0 {
            warn!("metrics requested for an empty dataset");
            0.0
        } else {
            100.0 * valid_count as f64 / count as f64
        };

        let valid_dates: Vec<f64> = dates
            .iter()
            .zip(validity.iter())
            .filter_map(|(date, valid)| if valid { *date } else { None })
            .collect();
        let cuts = derive_cuts(&valid_dates, &self.config.cut_spec());
        if cuts.is_empty() && count > 0 {
            warn!(rows = count, "no valid rows with a usable date; no intervals");
        } else if self
            .config
            .bins
            .checked_add(1)
            .is_some_and(|expected| cuts.len() < expected)
        {
            debug!(
                requested = self.config.bins,
                produced = cuts.len().saturating_sub(1),
                "date bins collapsed"
            );
        }

        let mut bins = vec![Accumulator::default(); cuts.len().saturating_sub(1)];
        let mut undated = 0usize;
        let mut outside = 0usize;
        for (row, date) in dates.iter().enumerate() {
            let Some(date) = *date else {
                undated += 1;
                continue;
            };
            let Some(idx) = interval_index(&cuts, date) else {
                outside += 1;
                continue;
            };
            let bin = &mut bins[idx];
            bin.count += 1;
            bin.date_sum += date;
            if validity.is_valid(row) {
                bin.valid_count += 1;
                if let Some(target) = targets.get(row).copied().flatten() {
                    bin.label_sum += target;
                    bin.label_n += 1;
                }
            }
        }
        if undated > 0 || outside > 0 {
            debug!(undated, outside, "rows left out of date bins");
        }

        let interval = bins
            .iter()
            .enumerate()
            .map(|(i, bin)| {
                let midpoint = (cuts[i] + cuts[i + 1]) / 2.0;
                let date_cut = match self.config.date_cut {
                    DateCut::MeanDate if bin.count > 0 => bin.date_sum / bin.count as f64,
                    DateCut::Midpoint | DateCut::MeanDate => midpoint,
                };
                IntervalMetrics {
                    date_cut,
                    count: bin.count,
                    valid_count: bin.valid_count,
                    avg_target: bin.avg_target(),
                }
            })
            .collect();

        MetricsReport {
            task_type,
            label: task_type.scoring().map(str::to_string),
            count,
            valid_count,
            valid_rate,
            avg_target,
            cuts,
            interval,
        }
    }
}
