//! Cell readers for identifier and label columns.
//!
//! Arrow columns arrive with whatever type the loader inferred. These helpers
//! turn them into per-row values that keep "absent" apart from "present but
//! unusable", which is the distinction validation is built on.

use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    Int8Array, LargeStringArray, NullArray, StringArray, UInt16Array, UInt32Array, UInt64Array,
    UInt8Array,
};

use crate::error::{Error, Result};

/// An identifier cell after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierCell {
    /// Null, or an empty string after trimming.
    Missing,
    /// Normalized key text.
    Key(String),
    /// Present but cannot be turned into a key (e.g. `1.5` or `NaN`).
    Malformed,
}

/// A label cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LabelCell {
    /// Null, or an empty string.
    Missing,
    /// A finite number.
    Value(f64),
    /// Present but infinite, NaN or not numeric.
    Invalid,
}

impl LabelCell {
    /// The finite value, if any.
    pub fn finite(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Missing | Self::Invalid => None,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn float_key(v: f64) -> IdentifierCell {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15 {
        IdentifierCell::Key(format!("{}", v as i64))
    } else {
        IdentifierCell::Malformed
    }
}

fn text_key(s: &str) -> IdentifierCell {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        IdentifierCell::Missing
    } else {
        IdentifierCell::Key(trimmed.to_string())
    }
}

fn number_label(v: f64) -> LabelCell {
    if v.is_finite() {
        LabelCell::Value(v)
    } else {
        LabelCell::Invalid
    }
}

fn text_label(s: &str) -> LabelCell {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return LabelCell::Missing;
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => LabelCell::Value(1.0),
        "false" => LabelCell::Value(0.0),
        other => other
            .parse::<f64>()
            .map(number_label)
            .unwrap_or(LabelCell::Invalid),
    }
}

macro_rules! read_cells {
    ($array:expr, $missing:expr, $( $ty:ty => $map:expr ),+ $(,)?) => {{
        let array: &dyn Array = $array;
        let len = array.len();
        $(
            if let Some(arr) = array.as_any().downcast_ref::<$ty>() {
                let map = $map;
                return Ok((0..len)
                    .map(|i| if arr.is_null(i) { $missing } else { map(arr, i) })
                    .collect());
            }
        )+
        if array.as_any().downcast_ref::<NullArray>().is_some() {
            return Ok(vec![$missing; len]);
        }
    }};
}

/// Read an identifier column.
///
/// # Errors
///
/// Returns [`Error::SchemaMismatch`] for column types that cannot hold keys
/// (lists, structs, binary, ...).
#[allow(clippy::cast_precision_loss)]
pub fn read_identifiers(array: &dyn Array) -> Result<Vec<IdentifierCell>> {
    read_cells!(
        array,
        IdentifierCell::Missing,
        StringArray => |a: &StringArray, i| text_key(a.value(i)),
        LargeStringArray => |a: &LargeStringArray, i| text_key(a.value(i)),
        Int64Array => |a: &Int64Array, i| IdentifierCell::Key(a.value(i).to_string()),
        Int32Array => |a: &Int32Array, i| IdentifierCell::Key(a.value(i).to_string()),
        Int16Array => |a: &Int16Array, i| IdentifierCell::Key(a.value(i).to_string()),
        Int8Array => |a: &Int8Array, i| IdentifierCell::Key(a.value(i).to_string()),
        UInt64Array => |a: &UInt64Array, i| IdentifierCell::Key(a.value(i).to_string()),
        UInt32Array => |a: &UInt32Array, i| IdentifierCell::Key(a.value(i).to_string()),
        UInt16Array => |a: &UInt16Array, i| IdentifierCell::Key(a.value(i).to_string()),
        UInt8Array => |a: &UInt8Array, i| IdentifierCell::Key(a.value(i).to_string()),
        Float64Array => |a: &Float64Array, i| float_key(a.value(i)),
        Float32Array => |a: &Float32Array, i| float_key(f64::from(a.value(i))),
    );
    Err(Error::schema_mismatch(format!(
        "identifier column has unsupported type {}",
        array.data_type()
    )))
}

/// Read a label column.
///
/// # Errors
///
/// Returns [`Error::SchemaMismatch`] for column types that cannot hold
/// numbers.
#[allow(clippy::cast_precision_loss)]
pub fn read_labels(array: &dyn Array) -> Result<Vec<LabelCell>> {
    read_cells!(
        array,
        LabelCell::Missing,
        Float64Array => |a: &Float64Array, i| number_label(a.value(i)),
        Float32Array => |a: &Float32Array, i| number_label(f64::from(a.value(i))),
        Int64Array => |a: &Int64Array, i| LabelCell::Value(a.value(i) as f64),
        Int32Array => |a: &Int32Array, i| LabelCell::Value(f64::from(a.value(i))),
        Int16Array => |a: &Int16Array, i| LabelCell::Value(f64::from(a.value(i))),
        Int8Array => |a: &Int8Array, i| LabelCell::Value(f64::from(a.value(i))),
        UInt64Array => |a: &UInt64Array, i| LabelCell::Value(a.value(i) as f64),
        UInt32Array => |a: &UInt32Array, i| LabelCell::Value(f64::from(a.value(i))),
        UInt16Array => |a: &UInt16Array, i| LabelCell::Value(f64::from(a.value(i))),
        UInt8Array => |a: &UInt8Array, i| LabelCell::Value(f64::from(a.value(i))),
        BooleanArray => |a: &BooleanArray, i| LabelCell::Value(if a.value(i) { 1.0 } else { 0.0 }),
        StringArray => |a: &StringArray, i| text_label(a.value(i)),
        LargeStringArray => |a: &LargeStringArray, i| text_label(a.value(i)),
    );
    Err(Error::schema_mismatch(format!(
        "label column has unsupported type {}",
        array.data_type()
    )))
}
