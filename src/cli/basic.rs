//! Shared CLI plumbing: dataset I/O and common flags.

use std::path::Path;

use clap::Args;

use crate::{
    ArrowDataset, ColumnRole, ColumnRoles, MetricsAggregator, MetricsConfig,
};

/// Column role declarations.
#[derive(Args, Debug, Clone, Default)]
pub struct RoleArgs {
    /// Identifier column (e.g. phone number)
    #[arg(long)]
    pub identifier: Option<String>,
    /// Date column
    #[arg(long)]
    pub date: Option<String>,
    /// Label (target) column
    #[arg(long)]
    pub label: Option<String>,
    /// Score column
    #[arg(long)]
    pub score: Option<String>,
    /// Feature columns
    #[arg(long = "feature")]
    pub features: Vec<String>,
}

impl RoleArgs {
    /// Build the role mapping.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Configuration`] if a column is declared twice.
    pub fn roles(&self) -> crate::Result<ColumnRoles> {
        let singles = [
            (&self.identifier, ColumnRole::Identifier),
            (&self.date, ColumnRole::Date),
            (&self.label, ColumnRole::Label),
            (&self.score, ColumnRole::Score),
        ];
        let pairs = singles
            .into_iter()
            .filter_map(|(column, role)| column.clone().map(|c| (c, role)))
            .chain(
                self.features
                    .iter()
                    .map(|c| (c.clone(), ColumnRole::Feature)),
            );
        ColumnRoles::try_from_pairs(pairs)
    }
}

/// Metrics configuration flags.
#[derive(Args, Debug, Clone)]
pub struct MetricsArgs {
    /// Number of date bins
    #[arg(long, default_value = "6")]
    pub bins: usize,
    /// Boundary placement (quantile, equal-width)
    #[arg(long, default_value = "quantile")]
    pub cut_strategy: String,
    /// Repeated boundaries (collapse, pad)
    #[arg(long, default_value = "collapse")]
    pub degenerate: String,
    /// Bin timestamp (midpoint, mean)
    #[arg(long, default_value = "midpoint")]
    pub date_cut: String,
    /// Widen the first cut by this fraction of the date range
    #[arg(long, default_value = "0.0")]
    pub lower_edge: f64,
    /// Unit of numeric dates (s, ms, us, ns)
    #[arg(long, default_value = "ms")]
    pub epoch_unit: String,
    /// Largest distinct-label count treated as multiclass
    #[arg(long, default_value = "50")]
    pub max_classes: usize,
}

impl Default for MetricsArgs {
    fn default() -> Self {
        let config = MetricsConfig::default();
        Self {
            bins: config.bins,
            cut_strategy: config.strategy.to_string(),
            degenerate: config.degenerate.to_string(),
            date_cut: config.date_cut.to_string(),
            lower_edge: config.lower_edge_widening,
            epoch_unit: config.epoch_unit.to_string(),
            max_classes: config.max_classes,
        }
    }
}

impl MetricsArgs {
    /// Build the aggregator.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Parse`] for an unknown policy, strategy or
    /// unit name.
    pub fn aggregator(&self) -> crate::Result<MetricsAggregator> {
        Ok(MetricsAggregator::with_config(MetricsConfig {
            bins: self.bins,
            strategy: self.cut_strategy.parse()?,
            degenerate: self.degenerate.parse()?,
            date_cut: self.date_cut.parse()?,
            lower_edge_widening: self.lower_edge,
            epoch_unit: self.epoch_unit.parse()?,
            max_classes: self.max_classes,
        }))
    }
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}

/// Load a dataset from a file path based on extension.
pub(crate) fn load_dataset(path: &Path) -> crate::Result<ArrowDataset> {
    match extension(path) {
        "parquet" => ArrowDataset::from_parquet(path),
        "csv" => ArrowDataset::from_csv(path),
        "json" | "jsonl" => ArrowDataset::from_json(path),
        "gz" => match path.file_stem().map(Path::new).map(extension) {
            Some("csv") => ArrowDataset::from_csv_gz(path),
            _ => Err(crate::Error::unsupported_format("gz (only .csv.gz)")),
        },
        ext => Err(crate::Error::unsupported_format(ext)),
    }
}

/// Save a dataset to a file path based on extension.
pub(crate) fn save_dataset(dataset: &ArrowDataset, path: &Path) -> crate::Result<()> {
    match extension(path) {
        "parquet" => dataset.to_parquet(path),
        "csv" => dataset.to_csv(path),
        "json" | "jsonl" => dataset.to_json(path),
        ext => Err(crate::Error::unsupported_format(ext)),
    }
}

/// Write text to a file.
pub(crate) fn write_text(path: &Path, text: &str) -> crate::Result<()> {
    std::fs::write(path, text).map_err(|e| crate::Error::io(e, path))
}
