//! Type tags and typed field values.

use chrono::NaiveDateTime;
use serde_json::{json, Value};

/// Semantic type declared for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    String,
    Integer,
    Float,
    Timestamp,
}

impl TypeTag {
    /// All tags, in code order `s`, `i`, `f`, `d`.
    pub const ALL: [TypeTag; 4] = [
        TypeTag::String,
        TypeTag::Integer,
        TypeTag::Float,
        TypeTag::Timestamp,
    ];

    /// Single-letter code used on the command line.
    pub fn code(&self) -> &'static str {
        match self {
            TypeTag::String => "s",
            TypeTag::Integer => "i",
            TypeTag::Float => "f",
            TypeTag::Timestamp => "d",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Integer => "integer",
            TypeTag::Float => "float",
            TypeTag::Timestamp => "timestamp",
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A converted column value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    /// Calendar date and time of day, no zone attached.
    Timestamp(NaiveDateTime),
}

impl FieldValue {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            FieldValue::String(_) => TypeTag::String,
            FieldValue::Integer(_) => TypeTag::Integer,
            FieldValue::Float(_) => TypeTag::Float,
            FieldValue::Timestamp(_) => TypeTag::Timestamp,
        }
    }

    /// Renders the value as Extended JSON so the declared type survives storage.
    ///
    /// Timestamps become `{"$date": "..."}` and non-finite floats become
    /// `{"$numberDouble": "..."}`, since plain JSON has no way to express either.
    /// `$date` carries millisecond precision; sub-millisecond digits are dropped.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Float(f) => match serde_json::Number::from_f64(*f) {
                Some(n) => Value::Number(n),
                None => {
                    let repr = if f.is_nan() {
                        "NaN"
                    } else if f.is_sign_positive() {
                        "Infinity"
                    } else {
                        "-Infinity"
                    };
                    json!({ "$numberDouble": repr })
                }
            },
            FieldValue::Timestamp(ts) => {
                json!({ "$date": ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_codes_and_names() {
        let codes: Vec<&str> = TypeTag::ALL.iter().map(|t| t.code()).collect();
        assert_eq!(codes, vec!["s", "i", "f", "d"]);
        assert_eq!(TypeTag::Timestamp.to_string(), "timestamp");
    }

    #[test]
    fn test_to_json_keeps_types() {
        assert_eq!(FieldValue::String("007".into()).to_json(), json!("007"));
        assert_eq!(FieldValue::Integer(7).to_json(), json!(7));
        assert_eq!(FieldValue::Float(-99.3).to_json(), json!(-99.3));

        let ts = NaiveDate::from_ymd_opt(2014, 4, 17)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date");
        assert_eq!(
            FieldValue::Timestamp(ts).to_json(),
            json!({ "$date": "2014-04-17T00:00:00.000Z" })
        );
    }

    #[test]
    fn test_to_json_timestamp_truncates_to_milliseconds() {
        let ts = NaiveDate::from_ymd_opt(2014, 4, 17)
            .and_then(|d| d.and_hms_micro_opt(13, 45, 30, 250_123))
            .expect("valid date");
        assert_eq!(
            FieldValue::Timestamp(ts).to_json(),
            json!({ "$date": "2014-04-17T13:45:30.250Z" })
        );
    }

    #[test]
    fn test_to_json_non_finite_floats() {
        assert_eq!(
            FieldValue::Float(f64::NAN).to_json(),
            json!({ "$numberDouble": "NaN" })
        );
        assert_eq!(
            FieldValue::Float(f64::NEG_INFINITY).to_json(),
            json!({ "$numberDouble": "-Infinity" })
        );
    }
}
