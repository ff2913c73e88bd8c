//! Row validation for ground-truth datasets.
//!
//! Classifies every row as valid or invalid from its identifier and label
//! values only. Dates and scores never influence validity. A bad row is
//! never an error: it is a `false` flag, so one broken record cannot abort
//! the rest of the table.
//!
//! # Example
//!
//! ```ignore
//! use etalon::validate::{IdentifierFormat, RowValidator};
//!
//! let validity = RowValidator::new()
//!     .identifier_format(IdentifierFormat::digits(10, 15))
//!     .validate(&dataset, &roles)?;
//!
//! println!("{} of {} rows are valid", validity.valid_count(), validity.len());
//! let with_flags = validity.attach(&dataset)?;
//! ```

use std::sync::Arc;

use arrow::array::BooleanArray;
use tracing::{debug, warn};

use crate::{
    cells::{read_identifiers, read_labels, IdentifierCell, LabelCell},
    dataset::{ArrowDataset, Dataset},
    error::{Error, Result},
    roles::{ColumnRole, ColumnRoles},
};

/// Default name of the derived validity column.
pub const VALIDITY_COLUMN: &str = "is_valid";

/// Accepted shape of identifier keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierFormat {
    /// Any non-empty key without control characters.
    #[default]
    Any,
    /// Phone-style key: optional leading `+`, then only ASCII digits.
    Digits {
        /// Minimum number of digits.
        min_len: usize,
        /// Maximum number of digits.
        max_len: usize,
    },
}

impl IdentifierFormat {
    /// Phone-style keys with `min_len..=max_len` digits.
    pub fn digits(min_len: usize, max_len: usize) -> Self {
        Self::Digits { min_len, max_len }
    }

    /// Check a normalized key.
    pub fn accepts(&self, key: &str) -> bool {
        match self {
            Self::Any => !key.is_empty() && !key.chars().any(char::is_control),
            Self::Digits { min_len, max_len } => {
                let digits = key.strip_prefix('+').unwrap_or(key);
                !digits.is_empty()
                    && digits.bytes().all(|b| b.is_ascii_digit())
                    && (*min_len..=*max_len).contains(&digits.len())
            }
        }
    }
}

/// Why a row was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidReason {
    /// Identifier is null or empty.
    MissingIdentifier,
    /// Identifier does not match the configured format.
    MalformedIdentifier,
    /// Label is present but not a finite number.
    NonFiniteLabel,
}

impl InvalidReason {
    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::MissingIdentifier => "missing identifier",
            Self::MalformedIdentifier => "malformed identifier",
            Self::NonFiniteLabel => "non-finite label",
        }
    }
}

/// Per-row validity flags, aligned with the input row order.
#[derive(Debug, Clone, PartialEq)]
pub struct Validity {
    flags: BooleanArray,
    reasons: Vec<Option<InvalidReason>>,
}

impl Validity {
    /// Build from plain flags (no rejection reasons recorded).
    pub fn from_flags(flags: Vec<bool>) -> Self {
        let reasons = vec![None; flags.len()];
        Self {
            flags: BooleanArray::from(flags),
            reasons,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Whether row `index` is valid. Out-of-range rows are invalid.
    pub fn is_valid(&self, index: usize) -> bool {
        index < self.flags.len() && self.flags.value(index)
    }

    /// Number of valid rows.
    pub fn valid_count(&self) -> usize {
        self.flags.true_count()
    }

    /// Number of invalid rows.
    pub fn invalid_count(&self) -> usize {
        self.len() - self.valid_count()
    }

    /// Rejection reason for row `index`, if it was rejected by a validator.
    pub fn reason(&self, index: usize) -> Option<InvalidReason> {
        self.reasons.get(index).copied().flatten()
    }

    /// Count of rejected rows per reason.
    pub fn reason_counts(&self) -> Vec<(InvalidReason, usize)> {
        [
            InvalidReason::MissingIdentifier,
            InvalidReason::MalformedIdentifier,
            InvalidReason::NonFiniteLabel,
        ]
        .into_iter()
        .map(|r| (r, self.reasons.iter().filter(|x| **x == Some(r)).count()))
        .filter(|(_, n)| *n > 0)
        .collect()
    }

    /// The flags as an Arrow array.
    pub fn as_array(&self) -> &BooleanArray {
        &self.flags
    }

    /// Iterate over the flags in row order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.flags.len()).map(|i| self.flags.value(i))
    }

    /// New dataset with the flags appended as [`VALIDITY_COLUMN`].
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset length differs or the column exists.
    pub fn attach(&self, dataset: &ArrowDataset) -> Result<ArrowDataset> {
        self.attach_as(dataset, VALIDITY_COLUMN)
    }

    /// New dataset with the flags appended under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset length differs or the column exists.
    pub fn attach_as(&self, dataset: &ArrowDataset, name: &str) -> Result<ArrowDataset> {
        dataset.with_column(name, Arc::new(self.flags.clone()))
    }
}

/// Row validator.
#[derive(Debug, Clone, Default)]
pub struct RowValidator {
    identifier_format: IdentifierFormat,
}

impl RowValidator {
    /// Create a validator accepting any non-empty identifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the accepted identifier format
    #[must_use]
    pub fn identifier_format(mut self, format: IdentifierFormat) -> Self {
        self.identifier_format = format;
        self
    }

    /// Classify every row of `dataset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the identifier or label role is
    /// not declared, or names a column absent from the table. Returns
    /// [`Error::SchemaMismatch`] if a column type cannot hold keys or
    /// numbers.
    pub fn validate(&self, dataset: &ArrowDataset, roles: &ColumnRoles) -> Result<Validity> {
        let schema = dataset.schema();
        let identifier_column = roles.resolve(ColumnRole::Identifier, &schema)?;
        let label_column = roles.resolve(ColumnRole::Label, &schema)?;

        let identifiers = read_identifiers(dataset.column(identifier_column)?.as_ref())?;
        let labels = read_labels(dataset.column(label_column)?.as_ref())?;
        if identifiers.len() != labels.len() {
            return Err(Error::schema_mismatch(format!(
                "identifier column has {} rows but label column has {}",
                identifiers.len(),
                labels.len()
            )));
        }

        let reasons: Vec<Option<InvalidReason>> = identifiers
            .iter()
            .zip(&labels)
            .map(|(id, label)| self.check_row(id, *label))
            .collect();
        let flags = BooleanArray::from(reasons.iter().map(Option::is_none).collect::<Vec<_>>());

        let validity = Validity { flags, reasons };
        debug!(
            identifier = identifier_column,
            label = label_column,
            rows = validity.len(),
            valid = validity.valid_count(),
            "validated rows"
        );
        if !validity.is_empty() && validity.valid_count() == 0 {
            warn!(rows = validity.len(), "no valid rows in dataset");
        }

        Ok(validity)
    }

    /// Classify a single row.
    pub fn check_row(&self, identifier: &IdentifierCell, label: LabelCell) -> Option<InvalidReason> {
        match identifier {
            IdentifierCell::Missing => return Some(InvalidReason::MissingIdentifier),
            IdentifierCell::Malformed => return Some(InvalidReason::MalformedIdentifier),
            IdentifierCell::Key(key) if !self.identifier_format.accepts(key) => {
                return Some(InvalidReason::MalformedIdentifier)
            }
            IdentifierCell::Key(_) => {}
        }
        match label {
            LabelCell::Invalid => Some(InvalidReason::NonFiniteLabel),
            LabelCell::Missing | LabelCell::Value(_) => None,
        }
    }
}
