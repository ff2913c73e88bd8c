//! Task type inference from observed label values.
//!
//! The kind of supervised task is derived from the distinct label values of
//! valid rows. New task types plug in through [`TaskClassifier`]; the
//! cut/interval computation never looks at the task type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic kind of the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    /// Labels are exactly {0, 1}.
    Binary,
    /// A small set of integral class labels.
    Multiclass,
    /// Continuous labels.
    Regression,
    /// Nothing to classify: no labels, or a single constant value.
    Unknown,
}

impl TaskType {
    /// Scoring function used to evaluate predictions for this task.
    pub fn scoring(&self) -> Option<&'static str> {
        match self {
            Self::Binary => Some("auc"),
            Self::Multiclass => Some("accuracy"),
            Self::Regression => Some("rmse"),
            Self::Unknown => None,
        }
    }

    /// Upper-case name, as serialized.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Binary => "BINARY",
            Self::Multiclass => "MULTICLASS",
            Self::Regression => "REGRESSION",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decides the task type from the distinct label values.
pub trait TaskClassifier: Send + Sync {
    /// `distinct` is sorted ascending, deduplicated and finite.
    fn classify(&self, distinct: &[f64]) -> TaskType;
}

/// Default classifier based on the distinct-value set.
///
/// - no values or a single value: [`TaskType::Unknown`]
/// - exactly {0, 1}: [`TaskType::Binary`]
/// - integral values, at most `max_classes` of them: [`TaskType::Multiclass`]
/// - anything else: [`TaskType::Regression`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistinctValueClassifier {
    /// Largest class count still treated as multiclass.
    pub max_classes: usize,
}

impl Default for DistinctValueClassifier {
    fn default() -> Self {
        Self { max_classes: 50 }
    }
}

impl TaskClassifier for DistinctValueClassifier {
    fn classify(&self, distinct: &[f64]) -> TaskType {
        match distinct {
            [] | [_] => TaskType::Unknown,
            [a, b] if *a == 0.0 && *b == 1.0 => TaskType::Binary,
            values
                if values.len() <= self.max_classes && values.iter().all(|v| v.fract() == 0.0) =>
            {
                TaskType::Multiclass
            }
            _ => TaskType::Regression,
        }
    }
}

/// Sorted, deduplicated copy of the finite values.
pub fn distinct_values(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut out: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    out.sort_by(f64::total_cmp);
    // -0.0 and 0.0 are the same class
    out.dedup_by(|a, b| a == b);
    out
}
