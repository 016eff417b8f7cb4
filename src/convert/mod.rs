//! Record conversion: one raw record + schema -> one typed document.
//!
//! Conversion is pure. A failure on one record leaves nothing behind, so the
//! caller is free to skip the record and carry on with the next one.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error_handling::RecordError;
use crate::schema::{FieldSchema, FieldValue};

/// Raw text values of one source row, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    line: u64,
    values: HashMap<String, String>,
}

impl RawRecord {
    /// Creates an empty record for the given 1-based source line.
    pub fn new(line: u64) -> Self {
        RawRecord {
            line,
            values: HashMap::new(),
        }
    }

    pub fn with_values<I, K, V>(line: u64, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        RawRecord {
            line,
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Converted fields, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedDocument {
    fields: Vec<(String, FieldValue)>,
}

impl TypedDocument {
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON object body, keys in schema order.
    pub fn to_json(&self) -> Value {
        let mut map = Map::with_capacity(self.fields.len());
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.to_json());
        }
        Value::Object(map)
    }
}

impl From<Vec<(String, FieldValue)>> for TypedDocument {
    fn from(fields: Vec<(String, FieldValue)>) -> Self {
        TypedDocument { fields }
    }
}

/// Applies `schema` to `record`.
///
/// Fields are looked up and converted in schema order; extra record fields
/// are ignored. The first missing or unconvertible field fails the whole
/// record. No default or null is ever substituted.
pub fn convert_record(
    record: &RawRecord,
    schema: &FieldSchema,
) -> Result<TypedDocument, RecordError> {
    let mut fields = Vec::with_capacity(schema.len());
    for spec in schema.fields() {
        let raw = record
            .get(&spec.name)
            .ok_or_else(|| RecordError::MissingField {
                field: spec.name.clone(),
            })?;
        let value = (spec.convert)(raw).map_err(|source| RecordError::FieldConversionError {
            field: spec.name.clone(),
            raw: raw.to_string(),
            tag: spec.tag,
            source,
        })?;
        fields.push((spec.name.clone(), value));
    }
    Ok(TypedDocument { fields })
}
