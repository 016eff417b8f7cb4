//! Column typing: the type registry and the schema binder.
//!
//! A schema is bound once, before the pipeline starts, from two parallel lists:
//! field names and single-letter type tags (`s`, `i`, `f`, `d`).

mod binder;
mod registry;
mod types;

pub use binder::{bind_schema, FieldSchema, FieldSpec};
pub use registry::{parse_timestamp, Converter, TypeRegistry};
pub use types::{FieldValue, TypeTag};
