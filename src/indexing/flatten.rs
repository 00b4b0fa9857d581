//! Extraction of a policy field's values from a document.

use crate::document::{Document, Value};
use crate::error::{FathomError, Result};
use crate::policy::{Field, FieldPath};

/// Scalar values `field` selects from `document`, in document order.
///
/// A missing attribute (or a missing key inside a list element or map)
/// yields no values. A structure that contradicts the field path, such as a
/// scalar where `tags[name]` expects a list of maps, is a transform error.
pub fn field_values(document: &Document, field: &Field) -> Result<Vec<Value>> {
    let path = field.path()?;
    let Some(value) = document.get(path.attribute()) else {
        return Ok(Vec::new());
    };

    let values = match &path {
        FieldPath::Attribute(_) => match value {
            Value::List(items) if field.tokenize => scalars(&field.name, items)?,
            Value::List(items) => {
                let joined = scalars(&field.name, items)?
                    .iter()
                    .filter_map(Value::to_text)
                    .collect::<Vec<_>>()
                    .join(" ");
                if joined.is_empty() {
                    Vec::new()
                } else {
                    vec![Value::String(joined)]
                }
            }
            Value::Map(_) => {
                return Err(FathomError::transform(format!(
                    "field `{}` holds a map; select a key with `{}{{key}}`",
                    field.name, field.name
                )));
            }
            scalar => vec![scalar.clone()],
        },
        FieldPath::ListElements { key, .. } => {
            let elements = match value {
                Value::List(items) => items.as_slice(),
                Value::Map(_) => std::slice::from_ref(value),
                other => return Err(shape_error(&field.name, "a list of maps", other)),
            };
            let mut values = Vec::new();
            for element in elements {
                let map = element
                    .as_map()
                    .ok_or_else(|| shape_error(&field.name, "a list of maps", element))?;
                if let Some(inner) = map.get(key) {
                    values.extend(scalars(&field.name, std::slice::from_ref(inner))?);
                }
            }
            values
        }
        FieldPath::MapEntry { key, .. } => {
            let map = value
                .as_map()
                .ok_or_else(|| shape_error(&field.name, "a map", value))?;
            match map.get(key) {
                Some(inner) => scalars(&field.name, std::slice::from_ref(inner))?,
                None => Vec::new(),
            }
        }
    };
    Ok(values)
}

/// Flatten one level of lists; nested maps are rejected.
fn scalars(field: &str, values: &[Value]) -> Result<Vec<Value>> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::Map(_) => return Err(shape_error(field, "scalar values", value)),
            Value::List(items) => {
                for item in items {
                    if matches!(item, Value::List(_) | Value::Map(_)) {
                        return Err(shape_error(field, "scalar values", item));
                    }
                    out.push(item.clone());
                }
            }
            scalar => out.push(scalar.clone()),
        }
    }
    Ok(out)
}

fn shape_error(field: &str, expected: &str, found: &Value) -> FathomError {
    FathomError::transform(format!(
        "field `{field}` expects {expected}, found {}",
        found.kind()
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc() -> Document {
        Document::from_json(
            Some("books"),
            json!({
                "_id": "b1",
                "title": "Dune",
                "keywords": ["desert", "spice"],
                "tags": [{"name": "scifi"}, {"name": "classic"}, {"other": 1}],
                "published": {"year": 1965, "month": 8},
                "author": {"name": "Herbert"}
            }),
        )
        .unwrap()
    }

    fn texts(values: Vec<Value>) -> Vec<String> {
        values.iter().filter_map(Value::to_text).collect()
    }

    #[test]
    fn test_plain_attribute() {
        let values = field_values(&doc(), &Field::new("title")).unwrap();
        assert_eq!(texts(values), vec!["Dune"]);
        assert!(field_values(&doc(), &Field::new("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_list_joined_or_expanded() {
        let joined = field_values(&doc(), &Field::new("keywords")).unwrap();
        assert_eq!(texts(joined), vec!["desert spice"]);

        let expanded = field_values(&doc(), &Field::new("keywords").tokenized(true)).unwrap();
        assert_eq!(texts(expanded), vec!["desert", "spice"]);
    }

    #[test]
    fn test_list_elements_and_map_entry() {
        let tags = field_values(&doc(), &Field::keyword("tags[name]")).unwrap();
        assert_eq!(texts(tags), vec!["scifi", "classic"]);

        let year = field_values(&doc(), &Field::keyword("published{year}")).unwrap();
        assert_eq!(year, vec![Value::Integer(1965)]);

        let none = field_values(&doc(), &Field::keyword("published{day}")).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_shape_mismatch_is_transform_error() {
        let err = field_values(&doc(), &Field::new("title[name]")).unwrap_err();
        assert!(matches!(err, FathomError::Transform(_)));
        assert!(field_values(&doc(), &Field::new("author")).is_err());
        assert!(field_values(&doc(), &Field::new("keywords{x}")).is_err());
    }
}
