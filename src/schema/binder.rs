//! Schema binder: field names + type tags -> ordered `FieldSchema`.

use std::collections::HashSet;

use crate::error_handling::SchemaError;

use super::registry::{Converter, TypeRegistry};
use super::types::TypeTag;

/// One column of the schema.
#[derive(Clone)]
pub struct FieldSpec {
    pub name: String,
    pub tag: TypeTag,
    pub(crate) convert: Converter,
}

impl std::fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .finish()
    }
}

/// Ordered binding of field names to types.
///
/// Order is both the column read order and the output field order. Names are
/// unique. Converters are resolved at bind time, so conversion never looks a
/// tag up again.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
}

impl FieldSchema {
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// `name:code` pairs, e.g. `name:s age:i`. Stored with each run.
    pub fn describe(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{}:{}", f.name, f.tag.code()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TypeRegistry {
    /// Binds field names to type tags using this registry.
    ///
    /// Every tag is resolved eagerly so configuration mistakes surface before
    /// any record is read.
    pub fn bind<N, T>(&self, field_names: &[N], type_tags: &[T]) -> Result<FieldSchema, SchemaError>
    where
        N: AsRef<str>,
        T: AsRef<str>,
    {
        if field_names.len() != type_tags.len() {
            return Err(SchemaError::SchemaArityMismatch {
                fields: field_names.len(),
                types: type_tags.len(),
            });
        }
        if field_names.is_empty() {
            return Err(SchemaError::EmptySchema);
        }

        let mut seen = HashSet::with_capacity(field_names.len());
        let mut fields = Vec::with_capacity(field_names.len());
        for (name, code) in field_names.iter().zip(type_tags) {
            let name = name.as_ref();
            if !seen.insert(name) {
                return Err(SchemaError::DuplicateField(name.to_string()));
            }
            let (tag, convert) = self.lookup(code.as_ref())?;
            fields.push(FieldSpec {
                name: name.to_string(),
                tag,
                convert,
            });
        }

        Ok(FieldSchema { fields })
    }
}

/// Binds field names to type tags with the standard registry.
///
/// # Errors
///
/// - `SchemaArityMismatch` when the two lists differ in length
/// - `UnknownTypeTag` for any tag outside `s`, `i`, `f`, `d`
/// - `DuplicateField` when a name repeats
/// - `EmptySchema` when both lists are empty
///
/// # Example
///
/// ```
/// use typed_import::bind_schema;
///
/// let schema = bind_schema(&["name", "age"], &["s", "i"]).unwrap();
/// assert_eq!(schema.describe(), "name:s age:i");
/// ```
pub fn bind_schema<N, T>(field_names: &[N], type_tags: &[T]) -> Result<FieldSchema, SchemaError>
where
    N: AsRef<str>,
    T: AsRef<str>,
{
    TypeRegistry::standard().bind(field_names, type_tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_preserves_order() {
        let schema = bind_schema(&["name", "age", "price", "dt"], &["s", "i", "f", "d"])
            .expect("valid schema");
        let names: Vec<&str> = schema.names().collect();
        assert_eq!(names, vec!["name", "age", "price", "dt"]);
        let tags: Vec<TypeTag> = schema.fields().iter().map(|f| f.tag).collect();
        assert_eq!(
            tags,
            vec![
                TypeTag::String,
                TypeTag::Integer,
                TypeTag::Float,
                TypeTag::Timestamp
            ]
        );
        assert_eq!(schema.len(), 4);
    }

    #[test]
    fn test_bind_arity_mismatch_for_all_lengths() {
        let names = ["a", "b", "c", "d"];
        let tags = ["s", "s", "s", "s"];
        for n in 0..=names.len() {
            for t in 0..=tags.len() {
                if n == t {
                    continue;
                }
                assert_eq!(
                    bind_schema(&names[..n], &tags[..t]).unwrap_err(),
                    SchemaError::SchemaArityMismatch {
                        fields: n,
                        types: t
                    }
                );
            }
        }
    }

    #[test]
    fn test_bind_unknown_tag() {
        let err = bind_schema(&["name", "flag"], &["s", "b"]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownTypeTag {
                tag: "b".to_string()
            }
        );
    }

    #[test]
    fn test_bind_arity_checked_before_tags() {
        let err = bind_schema(&["a"], &["x", "y"]).unwrap_err();
        assert!(matches!(err, SchemaError::SchemaArityMismatch { .. }));
    }

    #[test]
    fn test_bind_duplicate_field() {
        let err = bind_schema(&["id", "id"], &["i", "s"]).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateField("id".to_string()));
    }

    #[test]
    fn test_bind_empty() {
        let empty: [&str; 0] = [];
        assert_eq!(
            bind_schema(&empty, &empty).unwrap_err(),
            SchemaError::EmptySchema
        );
    }

    #[test]
    fn test_bind_accepts_owned_strings() {
        let names = vec!["name".to_string()];
        let tags = vec!["s".to_string()];
        let schema = bind_schema(&names, &tags).expect("valid schema");
        assert_eq!(schema.describe(), "name:s");
    }
}
