//! Date column conversion to epoch milliseconds.
//!
//! Temporal binning works on plain `f64` epoch milliseconds. Arrow temporal
//! types convert exactly; bare numbers are read in the configured
//! [`EpochUnit`]; strings are parsed with chrono as UTC. A cell that cannot be
//! converted is `None` and drops out of binning only.

use std::{fmt, str::FromStr};

use arrow::array::{
    Array, Date32Array, Date64Array, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeStringArray, NullArray, StringArray, TimestampMicrosecondArray,
    TimestampMillisecondArray, TimestampNanosecondArray, TimestampSecondArray, UInt32Array,
    UInt64Array,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

/// Unit of bare numeric timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpochUnit {
    /// Seconds since the Unix epoch.
    Seconds,
    /// Milliseconds since the Unix epoch.
    #[default]
    Milliseconds,
    /// Microseconds since the Unix epoch.
    Microseconds,
    /// Nanoseconds since the Unix epoch.
    Nanoseconds,
}

impl EpochUnit {
    /// Convert a value in this unit to milliseconds.
    pub fn to_millis(self, value: f64) -> f64 {
        match self {
            Self::Seconds => value * 1_000.0,
            Self::Milliseconds => value,
            Self::Microseconds => value / 1_000.0,
            Self::Nanoseconds => value / 1_000_000.0,
        }
    }

    /// Short name (`s`, `ms`, `us`, `ns`).
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Seconds => "s",
            Self::Milliseconds => "ms",
            Self::Microseconds => "us",
            Self::Nanoseconds => "ns",
        }
    }
}

impl fmt::Display for EpochUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for EpochUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "seconds" => Ok(Self::Seconds),
            "ms" | "millis" | "milliseconds" => Ok(Self::Milliseconds),
            "us" | "micros" | "microseconds" => Ok(Self::Microseconds),
            "ns" | "nanos" | "nanoseconds" => Ok(Self::Nanoseconds),
            other => Err(Error::parse(format!("unknown epoch unit '{}'", other))),
        }
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Parse a textual date as UTC epoch milliseconds.
///
/// Accepts RFC 3339, common `Y-m-d H:M:S` layouts, plain dates (midnight
/// UTC) and bare numbers in `unit`.
#[allow(clippy::cast_precision_loss)]
pub fn parse_date_str(s: &str, unit: EpochUnit) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis() as f64);
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive).timestamp_millis() as f64);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            let midnight = date.and_hms_opt(0, 0, 0)?;
            return Some(Utc.from_utc_datetime(&midnight).timestamp_millis() as f64);
        }
    }

    s.parse::<f64>().ok().and_then(finite).map(|v| unit.to_millis(v))
}

macro_rules! convert_dates {
    ($array:expr, $( $ty:ty => $map:expr ),+ $(,)?) => {{
        let array: &dyn Array = $array;
        $(
            if let Some(arr) = array.as_any().downcast_ref::<$ty>() {
                let map = $map;
                return Ok((0..arr.len())
                    .map(|i| if arr.is_null(i) { None } else { map(arr, i) })
                    .collect());
            }
        )+
        if array.as_any().downcast_ref::<NullArray>().is_some() {
            return Ok(vec![None; array.len()]);
        }
    }};
}

/// Convert a date column to epoch milliseconds.
///
/// # Errors
///
/// Returns [`Error::SchemaMismatch`] for column types that cannot hold a
/// timestamp.
#[allow(clippy::cast_precision_loss)]
pub fn read_dates(array: &dyn Array, unit: EpochUnit) -> Result<Vec<Option<f64>>> {
    convert_dates!(
        array,
        TimestampMillisecondArray => |a: &TimestampMillisecondArray, i| Some(a.value(i) as f64),
        TimestampSecondArray => |a: &TimestampSecondArray, i| Some(a.value(i) as f64 * 1_000.0),
        TimestampMicrosecondArray => |a: &TimestampMicrosecondArray, i| Some(a.value(i) as f64 / 1_000.0),
        TimestampNanosecondArray => |a: &TimestampNanosecondArray, i| Some(a.value(i) as f64 / 1_000_000.0),
        Date32Array => |a: &Date32Array, i| Some(f64::from(a.value(i)) * MILLIS_PER_DAY),
        Date64Array => |a: &Date64Array, i| Some(a.value(i) as f64),
        Int64Array => |a: &Int64Array, i| Some(unit.to_millis(a.value(i) as f64)),
        Int32Array => |a: &Int32Array, i| Some(unit.to_millis(f64::from(a.value(i)))),
        UInt64Array => |a: &UInt64Array, i| Some(unit.to_millis(a.value(i) as f64)),
        UInt32Array => |a: &UInt32Array, i| Some(unit.to_millis(f64::from(a.value(i)))),
        Float64Array => |a: &Float64Array, i| finite(a.value(i)).map(|v| unit.to_millis(v)),
        Float32Array => |a: &Float32Array, i| finite(f64::from(a.value(i))).map(|v| unit.to_millis(v)),
        StringArray => |a: &StringArray, i| parse_date_str(a.value(i), unit),
        LargeStringArray => |a: &LargeStringArray, i| parse_date_str(a.value(i), unit),
    );
    Err(Error::schema_mismatch(format!(
        "date column has unsupported type {}",
        array.data_type()
    )))
}
