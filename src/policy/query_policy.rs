//! Query policies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::Value;
use crate::error::{FathomError, Result};
use crate::policy::{Policy, read_bool, read_f32, read_i64, read_map};

/// A field that keyword queries search and results may be sorted by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryField {
    pub name: String,
    /// Rank among sort keys; lower sorts first. Zero means "not a sort key".
    pub sort_order: u32,
    pub ascending: bool,
    pub boost: f32,
}

impl QueryField {
    pub fn new<S: Into<String>>(name: S) -> Self {
        QueryField {
            name: name.into(),
            sort_order: 0,
            ascending: true,
            boost: 1.0,
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn sorted(mut self, sort_order: u32, ascending: bool) -> Self {
        self.sort_order = sort_order;
        self.ascending = ascending;
        self
    }

    pub(crate) fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert("sort_order".to_string(), Value::Integer(self.sort_order as i64));
        map.insert("ascending".to_string(), Value::Boolean(self.ascending));
        map.insert("boost".to_string(), Value::from(self.boost));
        Value::Map(map)
    }

    pub(crate) fn from_value(name: &str, value: &Value) -> Result<Self> {
        let map = value.as_map().ok_or_else(|| {
            FathomError::validation(format!("query field `{name}` must be described by a map"))
        })?;
        let sort_order = read_i64(map, "sort_order", 0)?;
        Ok(QueryField {
            name: name.to_string(),
            sort_order: u32::try_from(sort_order).map_err(|_| {
                FathomError::validation(format!(
                    "query field `{name}` has invalid sort order {sort_order}"
                ))
            })?,
            ascending: read_bool(map, "ascending", true)?,
            boost: read_f32(map, "boost", 1.0)?,
        })
    }
}

/// Which indexed fields keyword queries search, how they are weighted, and how
/// tied results are ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryPolicy {
    pub id: String,
    pub fields: BTreeMap<String, QueryField>,
}

impl QueryPolicy {
    pub fn new<S: Into<String>>(id: S) -> Self {
        QueryPolicy {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add or replace a field by name.
    pub fn add_field(&mut self, field: QueryField) {
        self.fields.insert(field.name.clone(), field);
    }

    pub fn with_field(mut self, field: QueryField) -> Self {
        self.add_field(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&QueryField> {
        self.fields.get(name)
    }

    /// Fields with a non-zero sort order, ranked by it.
    pub fn sort_fields(&self) -> Vec<&QueryField> {
        let mut fields: Vec<&QueryField> =
            self.fields.values().filter(|f| f.sort_order > 0).collect();
        fields.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.name.cmp(&b.name)));
        fields
    }
}

impl Policy for QueryPolicy {
    const DATABASE: &'static str = "query_policies";
    const ID_PREFIX: &'static str = "query_policy_for_";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(FathomError::validation("query policy id must not be empty"));
        }
        for field in self.fields.values() {
            if field.name.is_empty() {
                return Err(FathomError::validation(format!(
                    "query policy `{}` has a field without a name",
                    self.id
                )));
            }
            if !field.boost.is_finite() || field.boost < 0.0 {
                return Err(FathomError::validation(format!(
                    "query field `{}` has invalid boost {}",
                    field.name, field.boost
                )));
            }
        }
        Ok(())
    }

    fn to_attributes(&self) -> BTreeMap<String, Value> {
        let fields = self
            .fields
            .iter()
            .map(|(name, field)| (name.clone(), field.to_value()))
            .collect();
        BTreeMap::from([("fields".to_string(), Value::Map(fields))])
    }

    fn from_attributes(id: &str, attributes: &BTreeMap<String, Value>) -> Result<Self> {
        let mut policy = QueryPolicy::new(id);
        if let Some(fields) = read_map(attributes, "fields")? {
            for (name, value) in fields {
                policy.add_field(QueryField::from_value(name, value)?);
            }
        }
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_fields_ranked() {
        let policy = QueryPolicy::new("books")
            .with_field(QueryField::new("title").with_boost(2.0))
            .with_field(QueryField::new("year").sorted(2, false))
            .with_field(QueryField::new("author").sorted(1, true));

        let names: Vec<_> = policy.sort_fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["author", "year"]);
    }

    #[test]
    fn test_document_round_trip() {
        let policy = QueryPolicy::new("books")
            .with_field(QueryField::new("title").with_boost(1.1))
            .with_field(QueryField::new("year").sorted(1, false));

        let doc = policy.to_document(None).unwrap();
        assert_eq!(doc.id(), Some("query_policy_for_books"));

        let back = QueryPolicy::from_document(&doc).unwrap();
        assert_eq!(back, policy);
    }

    #[test]
    fn test_negative_sort_order_rejected() {
        let value = Value::Map(BTreeMap::from([(
            "sort_order".to_string(),
            Value::Integer(-1),
        )]));
        assert!(QueryField::from_value("year", &value).is_err());
    }
}
