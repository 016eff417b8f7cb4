//! Type registry: type tag to conversion function.
//!
//! The registry is an immutable table built once and handed to the schema binder.
//! Conversion functions are pure; none of them touch shared state.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error_handling::{ConversionError, SchemaError};

use super::types::{FieldValue, TypeTag};

/// Converts one raw text value into a typed value.
pub type Converter = fn(&str) -> Result<FieldValue, ConversionError>;

/// Date layouts tried in order. Month-first wins for ambiguous slash dates;
/// day-first is tried only when month-first fails.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d-%B-%Y",
    "%d %B %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%Y%m%d",
];

/// Time-of-day layouts that may follow any date layout.
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

/// Zone-qualified layouts; the result is normalized to UTC. `%z` takes
/// `+0200` and `+02:00` alike.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

/// Every date layout followed by every time layout, in date order.
/// ISO dates also accept a `T` separator.
static DATETIME_FORMATS: LazyLock<Vec<String>> = LazyLock::new(|| {
    let mut formats = Vec::with_capacity((DATE_FORMATS.len() + 1) * TIME_FORMATS.len());
    for date in DATE_FORMATS {
        for time in TIME_FORMATS {
            formats.push(format!("{date} {time}"));
        }
        if *date == "%Y-%m-%d" {
            for time in TIME_FORMATS {
                formats.push(format!("{date}T{time}"));
            }
        }
    }
    formats
});

fn convert_string(raw: &str) -> Result<FieldValue, ConversionError> {
    Ok(FieldValue::String(raw.to_string()))
}

fn convert_integer(raw: &str) -> Result<FieldValue, ConversionError> {
    raw.trim()
        .parse::<i64>()
        .map(FieldValue::Integer)
        .map_err(|e| ConversionError {
            tag: TypeTag::Integer,
            raw: raw.to_string(),
            reason: e.to_string(),
        })
}

fn convert_float(raw: &str) -> Result<FieldValue, ConversionError> {
    raw.trim()
        .parse::<f64>()
        .map(FieldValue::Float)
        .map_err(|e| ConversionError {
            tag: TypeTag::Float,
            raw: raw.to_string(),
            reason: e.to_string(),
        })
}

fn convert_timestamp(raw: &str) -> Result<FieldValue, ConversionError> {
    parse_timestamp(raw.trim())
        .map(FieldValue::Timestamp)
        .ok_or_else(|| ConversionError {
            tag: TypeTag::Timestamp,
            raw: raw.to_string(),
            reason: "no known date/time format matches".to_string(),
        })
}

/// Parses free-form date/time text.
///
/// Accepts RFC 3339, RFC 2822, zone-qualified ISO dates, and any date layout
/// (ISO, slash, dotted, month-name, compact `YYYYMMDD`) optionally followed
/// by a 24-hour or AM/PM time of day. Missing time of day means midnight.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.naive_utc());
    }

    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.naive_utc());
        }
    }

    for format in DATETIME_FORMATS.iter() {
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive_dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(naive_date) = NaiveDate::parse_from_str(text, format) {
            return naive_date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Immutable lookup table from type tag to conversion function.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    entries: Vec<(TypeTag, Converter)>,
}

impl TypeRegistry {
    /// Registry with the four standard tags: `s`, `i`, `f`, `d`.
    pub fn standard() -> Self {
        TypeRegistry {
            entries: vec![
                (TypeTag::String, convert_string as Converter),
                (TypeTag::Integer, convert_integer as Converter),
                (TypeTag::Float, convert_float as Converter),
                (TypeTag::Timestamp, convert_timestamp as Converter),
            ],
        }
    }

    /// Resolves a single-letter tag to its type and converter.
    pub fn lookup(&self, code: &str) -> Result<(TypeTag, Converter), SchemaError> {
        self.entries
            .iter()
            .find(|(tag, _)| tag.code() == code)
            .copied()
            .ok_or_else(|| SchemaError::UnknownTypeTag {
                tag: code.to_string(),
            })
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
