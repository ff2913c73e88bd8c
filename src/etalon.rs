//! Named ground-truth datasets.
//!
//! An [`Etalon`] bundles a table with its column roles and the search keys
//! the downstream matcher joins on. Validation consumes it and yields a
//! [`ValidatedEtalon`], the only state metrics can be computed from.
//!
//! # Example
//!
//! ```ignore
//! use etalon::{ArrowDataset, ColumnRole, ColumnRoles, Etalon, MetricsAggregator, RowValidator};
//!
//! let roles = ColumnRoles::try_from_pairs([
//!     ("phone_num", ColumnRole::Identifier),
//!     ("rep_date", ColumnRole::Date),
//!     ("target", ColumnRole::Label),
//! ])?;
//! let etalon = Etalon::new("churn", ArrowDataset::from_csv("data.csv")?, roles)?
//!     .search_keys([["phone_num", "rep_date"]])?;
//!
//! let validated = etalon.validate(&RowValidator::new())?;
//! let report = validated.calculate_metrics(&MetricsAggregator::new())?;
//! ```

use tracing::debug;

use crate::{
    dataset::{ArrowDataset, Dataset},
    error::{Error, Result},
    metrics::MetricsAggregator,
    report::MetricsReport,
    roles::{ColumnRole, ColumnRoles},
    validate::{RowValidator, Validity},
};

/// A labeled dataset with declared column meanings.
#[derive(Debug, Clone)]
pub struct Etalon {
    name: String,
    description: Option<String>,
    dataset: ArrowDataset,
    roles: ColumnRoles,
    search_keys: Vec<Vec<String>>,
}

impl Etalon {
    /// Create an etalon.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a declared column is missing from
    /// the table.
    pub fn new(name: impl Into<String>, dataset: ArrowDataset, roles: ColumnRoles) -> Result<Self> {
        roles.check_schema(&dataset.schema())?;
        Ok(Self {
            name: name.into(),
            description: None,
            dataset,
            roles,
            search_keys: Vec::new(),
        })
    }

    /// Set a free-text description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare the search keys: groups of columns the matcher joins on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a group is empty or names a
    /// column without an identifier or date role.
    pub fn search_keys<K, C>(mut self, keys: K) -> Result<Self>
    where
        K: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let mut groups = Vec::new();
        for group in keys {
            let group: Vec<String> = group.into_iter().map(Into::into).collect();
            if group.is_empty() {
                return Err(Error::configuration("search key group is empty"));
            }
            for column in &group {
                match self.roles.role_of(column) {
                    Some(ColumnRole::Identifier | ColumnRole::Date) => {}
                    Some(role) => {
                        return Err(Error::configuration(format!(
                            "search key column '{}' has role {}",
                            column, role
                        )))
                    }
                    None => {
                        return Err(Error::configuration(format!(
                            "search key column '{}' has no declared role",
                            column
                        )))
                    }
                }
            }
            groups.push(group);
        }
        self.search_keys = groups;
        Ok(self)
    }

    /// Etalon name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-text description, if any.
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Underlying table.
    pub fn dataset(&self) -> &ArrowDataset {
        &self.dataset
    }

    /// Declared column roles.
    pub fn roles(&self) -> &ColumnRoles {
        &self.roles
    }

    /// Declared search key groups.
    pub fn search_key_groups(&self) -> &[Vec<String>] {
        &self.search_keys
    }

    /// Validate every row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the identifier or label role is
    /// not declared.
    pub fn validate(self, validator: &RowValidator) -> Result<ValidatedEtalon> {
        let validity = validator.validate(&self.dataset, &self.roles)?;
        debug!(
            etalon = %self.name,
            valid = validity.valid_count(),
            invalid = validity.invalid_count(),
            "etalon validated"
        );
        Ok(ValidatedEtalon {
            etalon: self,
            validity,
        })
    }
}

/// An etalon together with its row validity flags.
#[derive(Debug, Clone)]
pub struct ValidatedEtalon {
    etalon: Etalon,
    validity: Validity,
}

impl ValidatedEtalon {
    /// The validated etalon.
    pub fn etalon(&self) -> &Etalon {
        &self.etalon
    }

    /// Row validity flags.
    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    /// New table with the flags appended as `is_valid`.
    ///
    /// # Errors
    ///
    /// Returns an error if the table already has an `is_valid` column.
    pub fn flagged_dataset(&self) -> Result<ArrowDataset> {
        self.validity.attach(&self.etalon.dataset)
    }

    /// Compute the metrics report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the date role is not declared or
    /// the aggregator configuration is unusable.
    pub fn calculate_metrics(&self, aggregator: &MetricsAggregator) -> Result<MetricsReport> {
        aggregator.compute(&self.etalon.dataset, &self.validity, &self.etalon.roles)
    }

    /// Split back into the etalon and its flags.
    pub fn into_parts(self) -> (Etalon, Validity) {
        (self.etalon, self.validity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskType;

    const CSV: &str = "timestamp,msisdn,target,score
2000000,3,0,0.5
2000000,3,0,0.5
2000000,4,1,
2000000,5,,0.5
2000000,6,,0.5
2000000,,1,0.5
2000000,8,1,0.5
2000000,9,inf,0.5
2000000,10,NaN,0.5
";

    fn roles() -> ColumnRoles {
        ColumnRoles::try_from_pairs([
            ("msisdn", ColumnRole::Identifier),
            ("timestamp", ColumnRole::Date),
            ("target", ColumnRole::Label),
            ("score", ColumnRole::Score),
        ])
        .unwrap()
    }

    fn etalon() -> Etalon {
        let dataset = ArrowDataset::from_csv_str(CSV).unwrap();
        Etalon::new("test_etalon", dataset, roles())
            .unwrap()
            .description("test etalon")
            .search_keys([["msisdn", "timestamp"]])
            .unwrap()
    }

    #[test]
    fn test_accessors() {
        let etalon = etalon();
        assert_eq!(etalon.name(), "test_etalon");
        assert_eq!(etalon.description_text(), Some("test etalon"));
        assert_eq!(etalon.search_key_groups()[0], vec!["msisdn", "timestamp"]);
        assert_eq!(etalon.dataset().len(), 9);
    }

    #[test]
    fn test_validate_and_metrics() {
        let validated = etalon().validate(&RowValidator::new()).unwrap();
        // missing msisdn plus the inf and NaN labels
        assert_eq!(validated.validity().invalid_count(), 3);

        let flagged = validated.flagged_dataset().unwrap();
        assert!(flagged.schema().index_of("is_valid").is_ok());
        assert!(validated.etalon().dataset().schema().index_of("is_valid").is_err());

        let report = validated
            .calculate_metrics(&MetricsAggregator::new())
            .unwrap();
        assert_eq!(report.count, 9);
        assert_eq!(report.valid_count, 6);
        assert_eq!(report.task_type, TaskType::Binary);
        // all rows share one timestamp
        assert_eq!(report.cuts, vec![2_000_000.0, 2_000_000.0]);
        assert_eq!(report.interval[0].count, 9);
    }

    #[test]
    fn test_unknown_column_rejected() {
        let dataset = ArrowDataset::from_csv_str(CSV).unwrap();
        let roles = roles().with("rep_date", ColumnRole::Feature).unwrap();
        assert!(Etalon::new("x", dataset, roles).unwrap_err().is_configuration());
    }

    #[test]
    fn test_search_keys_checked() {
        assert!(etalon().search_keys([["target"]]).is_err());
        assert!(etalon().search_keys([["nope"]]).is_err());
        assert!(etalon().search_keys([Vec::<String>::new()]).is_err());
    }
}
