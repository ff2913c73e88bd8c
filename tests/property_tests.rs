#![allow(clippy::unwrap_used)]
//! Property-based tests for validation and metrics.
//!
//! Uses proptest to verify the report invariants hold across random tables.

use std::sync::Arc;

use arrow::{
    array::{Float64Array, Int64Array, RecordBatch, StringArray},
    datatypes::{DataType, Field, Schema},
};
use etalon::{
    ArrowDataset, ColumnRole, ColumnRoles, DegenerateBins, MetricsAggregator, RowValidator,
};
use proptest::prelude::*;

type Row = (Option<String>, Option<i64>, Option<f64>, f64);

fn roles() -> ColumnRoles {
    ColumnRoles::try_from_pairs([
        ("msisdn", ColumnRole::Identifier),
        ("rep_date", ColumnRole::Date),
        ("target", ColumnRole::Label),
        ("score", ColumnRole::Score),
    ])
    .unwrap()
}

fn build(rows: &[Row]) -> ArrowDataset {
    let schema = Arc::new(Schema::new(vec![
        Field::new("msisdn", DataType::Utf8, true),
        Field::new("rep_date", DataType::Int64, true),
        Field::new("target", DataType::Float64, true),
        Field::new("score", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.0.clone()).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(rows.iter().map(|r| r.1).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.2).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.3).collect::<Vec<_>>())),
        ],
    )
    .unwrap();
    ArrowDataset::from_batch(batch).unwrap()
}

fn identifier_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        "[0-9]{5,11}".prop_map(Some),
    ]
}

fn label_strategy() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        Just(None),
        Just(Some(f64::NAN)),
        Just(Some(f64::INFINITY)),
        (0u8..2).prop_map(|v| Some(f64::from(v))),
        (-100.0f64..100.0).prop_map(Some),
    ]
}

fn row_strategy() -> impl Strategy<Value = Row> {
    (
        identifier_strategy(),
        proptest::option::of(0i64..1_000_000),
        label_strategy(),
        -1.0f64..1.0,
    )
}

fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    proptest::collection::vec(row_strategy(), 1..200)
}

proptest! {
    /// Property: validity depends only on identifier and label
    #[test]
    fn prop_validity_ignores_date_and_score(
        rows in rows_strategy(),
        shift in 1i64..1_000,
        score in -5.0f64..5.0,
    ) {
        let altered: Vec<Row> = rows
            .iter()
            .map(|(id, date, label, _)| (id.clone(), date.map(|d| d + shift), *label, score))
            .collect();

        let validator = RowValidator::new();
        let a = validator.validate(&build(&rows), &roles()).unwrap();
        let b = validator.validate(&build(&altered), &roles()).unwrap();
        prop_assert_eq!(a.iter().collect::<Vec<_>>(), b.iter().collect::<Vec<_>>());
    }

    /// Property: counts add up and every valid dated row is binned
    #[test]
    fn prop_count_invariants(rows in rows_strategy(), bins in 1usize..10) {
        let dataset = build(&rows);
        let validity = RowValidator::new().validate(&dataset, &roles()).unwrap();
        let report = MetricsAggregator::new()
            .bins(bins)
            .compute(&dataset, &validity, &roles())
            .unwrap();

        prop_assert_eq!(report.count, rows.len());
        prop_assert_eq!(report.valid_count + report.invalid_count(), report.count);

        let dated = rows.iter().filter(|r| r.1.is_some()).count();
        let valid_dated = rows
            .iter()
            .zip(validity.iter())
            .filter(|(r, valid)| *valid && r.1.is_some())
            .count();
        prop_assert!(report.binned_count() <= dated);
        prop_assert_eq!(report.binned_valid_count(), valid_dated);
    }

    /// Property: collapsed cuts strictly increase and frame the intervals
    #[test]
    fn prop_cuts_shape(rows in rows_strategy(), bins in 1usize..10) {
        let dataset = build(&rows);
        let validity = RowValidator::new().validate(&dataset, &roles()).unwrap();
        let report = MetricsAggregator::new()
            .bins(bins)
            .compute(&dataset, &validity, &roles())
            .unwrap();

        if report.interval.is_empty() {
            prop_assert!(report.cuts.is_empty());
        } else {
            prop_assert_eq!(report.cuts.len(), report.interval.len() + 1);
            prop_assert!(report.interval.len() <= bins);
            let single = report.cuts.len() == 2 && report.cuts[0] == report.cuts[1];
            prop_assert!(single || report.cuts_strictly_increasing());
        }
    }

    /// Property: padding keeps exactly the requested number of intervals
    #[test]
    fn prop_pad_keeps_bins(rows in rows_strategy(), bins in 1usize..10) {
        let dataset = build(&rows);
        let validity = RowValidator::new().validate(&dataset, &roles()).unwrap();
        let report = MetricsAggregator::new()
            .bins(bins)
            .degenerate_bins(DegenerateBins::Pad)
            .compute(&dataset, &validity, &roles())
            .unwrap();

        if !report.interval.is_empty() {
            prop_assert_eq!(report.interval.len(), bins);
            prop_assert!(report.cuts.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    /// Property: the mean target lies within the observed label range
    #[test]
    fn prop_avg_target_bounds(rows in rows_strategy()) {
        let dataset = build(&rows);
        let validity = RowValidator::new().validate(&dataset, &roles()).unwrap();
        let report = MetricsAggregator::new()
            .compute(&dataset, &validity, &roles())
            .unwrap();

        let labels: Vec<f64> = rows
            .iter()
            .zip(validity.iter())
            .filter_map(|(r, valid)| if valid { r.2 } else { None })
            .collect();
        match report.avg_target {
            None => prop_assert!(labels.is_empty()),
            Some(avg) => {
                let min = labels.iter().copied().fold(f64::INFINITY, f64::min);
                let max = labels.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                prop_assert!(avg >= min - 1e-9 && avg <= max + 1e-9);
            }
        }
    }

    /// Property: computing twice yields the same report
    #[test]
    fn prop_compute_is_deterministic(rows in rows_strategy(), bins in 1usize..10) {
        let dataset = build(&rows);
        let validity = RowValidator::new().validate(&dataset, &roles()).unwrap();
        let aggregator = MetricsAggregator::new().bins(bins).lower_edge_widening(0.001);
        let first = aggregator.compute(&dataset, &validity, &roles()).unwrap();
        let second = aggregator.compute(&dataset, &validity, &roles()).unwrap();
        prop_assert_eq!(first, second);
    }
}
