//! etalon - Ground-Truth Dataset Validation and Metrics in Pure Rust
//!
//! Prepares labeled ground-truth datasets ("etalons") for a downstream
//! matching pipeline: flags rows unfit for use as ground truth and
//! summarizes the temporal and label distribution into a compact metrics
//! report.
//!
//! # Design Principles
//!
//! 1. **Flags, not failures** - Bad rows are `false` flags, never errors
//! 2. **Immutable inputs** - Validation and metrics never mutate the table
//! 3. **Reproducible** - Same table and configuration, same report
//! 4. **Ecosystem aligned** - Arrow 53, Parquet 53
//!
//! # Quick Start
//!
//! ```no_run
//! use etalon::{ArrowDataset, ColumnRole, ColumnRoles, MetricsAggregator, RowValidator};
//!
//! let dataset = ArrowDataset::from_csv("etalon.csv").unwrap();
//! let roles = ColumnRoles::try_from_pairs([
//!     ("phone_num", ColumnRole::Identifier),
//!     ("rep_date", ColumnRole::Date),
//!     ("target", ColumnRole::Label),
//! ])
//! .unwrap();
//!
//! let validity = RowValidator::new().validate(&dataset, &roles).unwrap();
//! let report = MetricsAggregator::new()
//!     .compute(&dataset, &validity, &roles)
//!     .unwrap();
//! println!("{}", report);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
// Allow common test patterns
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::cast_lossless,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss,
        clippy::float_cmp,
        clippy::unreadable_literal
    )
)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod cells;
/// CLI module for command-line interface
#[cfg(feature = "cli")]
pub mod cli;
pub mod dataset;
pub mod error;
pub mod etalon;
pub mod metrics;
pub mod report;
pub mod roles;
pub mod task;
pub mod validate;

// Re-export arrow types commonly needed
pub use arrow::{
    array::RecordBatch,
    datatypes::{Schema, SchemaRef},
};
pub use dataset::{ArrowDataset, CsvOptions, Dataset};
pub use error::{Error, Result};
pub use etalon::{Etalon, ValidatedEtalon};
pub use metrics::{
    CutStrategy, DateCut, DegenerateBins, EpochUnit, MetricsAggregator, MetricsConfig,
};
pub use report::{IntervalMetrics, MetricsReport, ReportMismatch};
pub use roles::{ColumnRole, ColumnRoles};
pub use task::{DistinctValueClassifier, TaskClassifier, TaskType};
pub use validate::{IdentifierFormat, InvalidReason, RowValidator, Validity, VALIDITY_COLUMN};
