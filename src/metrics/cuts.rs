//! Quantile cut points and interval assignment.
//!
//! Cut points are computed with an explicit sort-and-interpolate routine so
//! the boundaries are reproducible bit for bit: linear interpolation between
//! order statistics at position `h = (n - 1) * q`. Equal-width cuts split
//! the observed date range into `bins` steps of the same length instead.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What to do with repeated boundaries when many rows share a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegenerateBins {
    /// Drop repeated boundaries; cuts stay strictly increasing and fewer
    /// intervals are reported.
    #[default]
    Collapse,
    /// Keep every boundary; zero-width intervals are reported with zero
    /// counts.
    Pad,
}

impl fmt::Display for DegenerateBins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Collapse => "collapse",
            Self::Pad => "pad",
        })
    }
}

impl FromStr for DegenerateBins {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collapse" | "drop" => Ok(Self::Collapse),
            "pad" | "keep" => Ok(Self::Pad),
            other => Err(Error::parse(format!(
                "unknown degenerate-bin policy '{}'",
                other
            ))),
        }
    }
}

/// Largest accepted bin count.
pub const MAX_BINS: usize = 10_000;

/// How the raw boundaries are placed over the observed dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CutStrategy {
    /// Boundaries at the quantiles `0, 1/bins, ..., 1` of the dates.
    #[default]
    Quantile,
    /// Boundaries at `min + k * (max - min) / bins`.
    EqualWidth,
}

impl fmt::Display for CutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Quantile => "quantile",
            Self::EqualWidth => "equal-width",
        })
    }
}

impl FromStr for CutStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quantile" | "qcut" => Ok(Self::Quantile),
            "equal-width" | "equal_width" | "width" | "cut" => Ok(Self::EqualWidth),
            other => Err(Error::parse(format!("unknown cut strategy '{}'", other))),
        }
    }
}

/// Linear-interpolated quantile of an ascending slice.
///
/// Returns `None` for an empty slice. `q` is clamped to `[0, 1]`.
#[allow(clippy::cast_precision_loss)]
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    Some(interpolate(sorted, last as f64 * q.clamp(0.0, 1.0)))
}

/// Value at fractional order-statistic position `h` of a non-empty slice.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn interpolate(sorted: &[f64], h: f64) -> f64 {
    let last = sorted.len() - 1;
    let lo = (h.floor() as usize).min(last);
    let hi = (lo + 1).min(last);
    let frac = h - lo as f64;
    let (a, b) = (sorted[lo], sorted[hi]);
    if frac <= 0.0 || a == b {
        a
    } else {
        a + (b - a) * frac
    }
}

/// Cut-point configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutSpec {
    /// Number of bins; `bins + 1` raw boundaries are computed.
    pub bins: usize,
    /// Boundary placement.
    pub strategy: CutStrategy,
    /// Repeated-boundary policy.
    pub degenerate: DegenerateBins,
    /// Fraction of the date range subtracted from the first boundary.
    pub lower_edge_widening: f64,
}

/// Derive cut boundaries from (unsorted) epoch-millisecond dates.
///
/// Returns an empty vector when there are no dates or `bins` is zero or
/// above [`MAX_BINS`]. The lower-edge widening is applied after repeated
/// boundaries are handled; under [`DegenerateBins::Collapse`] it never adds
/// an interval below the earliest date.
#[allow(clippy::cast_precision_loss)]
pub fn derive_cuts(dates: &[f64], spec: &CutSpec) -> Vec<f64> {
    let mut sorted: Vec<f64> = dates.iter().copied().filter(|d| d.is_finite()).collect();
    if sorted.is_empty() || spec.bins == 0 || spec.bins > MAX_BINS {
        return Vec::new();
    }
    sorted.sort_by(f64::total_cmp);

    let (min, max) = (sorted[0], sorted[sorted.len() - 1]);
    let range = max - min;
    let bins = spec.bins as f64;
    let mut cuts: Vec<f64> = match spec.strategy {
        CutStrategy::Quantile => {
            // position (n - 1) * k / bins, multiplied first so exact splits stay exact
            let last = sorted.len() - 1;
            (0..=spec.bins)
                .map(|k| interpolate(&sorted, (last * k) as f64 / bins))
                .collect()
        }
        CutStrategy::EqualWidth => (0..=spec.bins)
            .map(|k| match k {
                0 => min,
                k if k == spec.bins => max,
                k => min + range * k as f64 / bins,
            })
            .collect(),
    };
    // rounding must not reorder boundaries
    for i in 1..cuts.len() {
        if cuts[i] < cuts[i - 1] {
            cuts[i] = cuts[i - 1];
        }
    }

    if spec.degenerate == DegenerateBins::Collapse {
        cuts.dedup_by(|a, b| a == b);
        if cuts.len() == 1 {
            cuts.push(cuts[0]);
        }
    }

    if spec.lower_edge_widening > 0.0 && range > 0.0 {
        cuts[0] -= range * spec.lower_edge_widening;
    }
    cuts
}

/// Index of the interval containing `date`.
///
/// Intervals are `[cuts[i], cuts[i + 1])`, the last one closed on both ends.
/// Dates outside `[cuts[0], cuts[n - 1]]` belong to no interval. A
/// zero-width interval receives no date unless it is the final, closed one.
pub fn interval_index(cuts: &[f64], date: f64) -> Option<usize> {
    let (&first, &last) = (cuts.first()?, cuts.last()?);
    if cuts.len() < 2 || !date.is_finite() || date < first || date > last {
        return None;
    }
    let below_or_equal = cuts.partition_point(|c| *c <= date);
    Some(below_or_equal.min(cuts.len() - 1) - 1)
}
