//! Column meanings.
//!
//! Every column that matters to validation or metrics carries exactly one
//! [`ColumnRole`]. The mapping is checked once, when [`ColumnRoles`] is
//! built, and never again per row.
//!
//! # Example
//!
//! ```
//! use etalon::roles::{ColumnRole, ColumnRoles};
//!
//! let roles = ColumnRoles::try_from_pairs([
//!     ("phone_num", ColumnRole::Identifier),
//!     ("rep_date", ColumnRole::Date),
//!     ("target", ColumnRole::Label),
//! ])
//! .unwrap();
//!
//! assert_eq!(roles.column_for(ColumnRole::Label), Some("target"));
//! ```

use std::{collections::BTreeMap, fmt, str::FromStr};

use arrow::datatypes::Schema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Semantic meaning of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnRole {
    /// Key identifying the subject of a row (phone-number-like).
    Identifier,
    /// Timestamp convertible to epoch milliseconds.
    Date,
    /// Target value; 0/1 for binary tasks, null for unlabeled rows.
    Label,
    /// Pre-existing model score. Never affects validity.
    Score,
    /// Any other column carried along untouched.
    Feature,
}

impl ColumnRole {
    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::Date => "date",
            Self::Label => "label",
            Self::Score => "score",
            Self::Feature => "feature",
        }
    }

    /// Whether at most one column may carry this role.
    pub fn is_unique(&self) -> bool {
        !matches!(self, Self::Feature)
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identifier" | "id" | "msisdn" => Ok(Self::Identifier),
            "date" | "timestamp" => Ok(Self::Date),
            "label" | "target" => Ok(Self::Label),
            "score" => Ok(Self::Score),
            "feature" => Ok(Self::Feature),
            other => Err(Error::parse(format!("unknown column role '{}'", other))),
        }
    }
}

/// Declared mapping from column name to role.
///
/// Invariant: no two columns share the Identifier, Date, Label or Score
/// role, and a column carries a single role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRoles {
    by_column: BTreeMap<String, ColumnRole>,
}

impl ColumnRoles {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping from `(column, role)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a column is declared twice or a
    /// unique role is assigned to more than one column.
    pub fn try_from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ColumnRole)>,
        S: Into<String>,
    {
        pairs
            .into_iter()
            .try_fold(Self::new(), |roles, (column, role)| roles.with(column, role))
    }

    /// Add one declaration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the column already has a role or
    /// the role is unique and already taken.
    pub fn with(mut self, column: impl Into<String>, role: ColumnRole) -> Result<Self> {
        let column = column.into();
        if let Some(existing) = self.by_column.get(&column) {
            return Err(Error::configuration(format!(
                "column '{}' declared twice (as {} and {})",
                column, existing, role
            )));
        }
        if role.is_unique() {
            if let Some(taken) = self.column_for(role) {
                return Err(Error::configuration(format!(
                    "role '{}' declared for both '{}' and '{}'",
                    role, taken, column
                )));
            }
        }
        self.by_column.insert(column, role);
        Ok(self)
    }

    /// Column carrying `role`, if declared. For [`ColumnRole::Feature`] the
    /// first feature column in name order is returned.
    pub fn column_for(&self, role: ColumnRole) -> Option<&str> {
        self.by_column
            .iter()
            .find(|(_, r)| **r == role)
            .map(|(c, _)| c.as_str())
    }

    /// Column carrying `role`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if no column is declared with it.
    pub fn require(&self, role: ColumnRole) -> Result<&str> {
        self.column_for(role).ok_or_else(|| {
            Error::configuration(format!("no column declared with role '{}'", role))
        })
    }

    /// Role declared for `column`.
    pub fn role_of(&self, column: &str) -> Option<ColumnRole> {
        self.by_column.get(column).copied()
    }

    /// Iterate over `(column, role)` pairs in column-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnRole)> {
        self.by_column.iter().map(|(c, r)| (c.as_str(), *r))
    }

    /// Number of declared columns.
    pub fn len(&self) -> usize {
        self.by_column.len()
    }

    /// Whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.by_column.is_empty()
    }

    /// Check that every declared column exists in `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] naming the first missing column.
    pub fn check_schema(&self, schema: &Schema) -> Result<()> {
        for (column, role) in self.iter() {
            if schema.index_of(column).is_err() {
                return Err(Error::configuration(format!(
                    "column '{}' declared as {} is not present in the table",
                    column, role
                )));
            }
        }
        Ok(())
    }

    /// Resolve `role` to a column that exists in `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the role is not declared or its
    /// column is missing from the table.
    pub fn resolve(&self, role: ColumnRole, schema: &Schema) -> Result<&str> {
        let column = self.require(role)?;
        if schema.index_of(column).is_err() {
            return Err(Error::configuration(format!(
                "column '{}' declared as {} is not present in the table",
                column, role
            )));
        }
        Ok(column)
    }
}

#[cfg(test)]
mod tests {
    use arrow::datatypes::{DataType, Field};

    use super::*;

    fn roles() -> ColumnRoles {
        ColumnRoles::try_from_pairs([
            ("phone_num", ColumnRole::Identifier),
            ("rep_date", ColumnRole::Date),
            ("target", ColumnRole::Label),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup_both_directions() {
        let roles = roles();
        assert_eq!(roles.column_for(ColumnRole::Identifier), Some("phone_num"));
        assert_eq!(roles.column_for(ColumnRole::Score), None);
        assert_eq!(roles.role_of("rep_date"), Some(ColumnRole::Date));
        assert_eq!(roles.role_of("unknown"), None);
        assert_eq!(roles.len(), 3);
    }

    #[test]
    fn test_duplicate_unique_role_rejected() {
        let err = roles().with("other_target", ColumnRole::Label).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("target"));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let err = roles().with("target", ColumnRole::Score).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_many_features_allowed() {
        let roles = roles()
            .with("age", ColumnRole::Feature)
            .and_then(|r| r.with("region", ColumnRole::Feature))
            .unwrap();
        assert_eq!(roles.len(), 5);
        assert_eq!(roles.column_for(ColumnRole::Feature), Some("age"));
    }

    #[test]
    fn test_require_missing_role() {
        let err = roles().require(ColumnRole::Score).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("score"));
    }

    #[test]
    fn test_check_schema() {
        let schema = Schema::new(vec![
            Field::new("phone_num", DataType::Int64, true),
            Field::new("rep_date", DataType::Date32, true),
        ]);
        let err = roles().check_schema(&schema).unwrap_err();
        assert!(err.to_string().contains("target"));

        let err = roles().resolve(ColumnRole::Label, &schema).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            roles().resolve(ColumnRole::Date, &schema).unwrap(),
            "rep_date"
        );
    }

    #[test]
    fn test_parse_role_aliases() {
        assert_eq!(
            "MSISDN".parse::<ColumnRole>().unwrap(),
            ColumnRole::Identifier
        );
        assert_eq!("target".parse::<ColumnRole>().unwrap(), ColumnRole::Label);
        assert_eq!(" Date ".parse::<ColumnRole>().unwrap(), ColumnRole::Date);
        assert!("phone".parse::<ColumnRole>().is_err());
    }

    #[test]
    fn test_role_serde_names() {
        let json = serde_json::to_string(&ColumnRole::Identifier).unwrap();
        assert_eq!(json, "\"IDENTIFIER\"");
    }
}
