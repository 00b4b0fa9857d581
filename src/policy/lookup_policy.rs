//! Lookup (autocomplete) policies.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::Value;
use crate::error::{FathomError, Result};
use crate::policy::{Policy, read_bool, read_f32, read_i64, read_map, read_string};

/// Declared kind of a lookup field's values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Number,
    Date,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Date => "date",
        };
        f.write_str(name)
    }
}

impl FromStr for ValueType {
    type Err = FathomError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "string" => Ok(ValueType::String),
            "number" => Ok(ValueType::Number),
            "date" => Ok(ValueType::Date),
            other => Err(FathomError::validation(format!("unknown value type `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupField {
    pub name: String,
    pub sort_order: u32,
    pub ascending: bool,
    pub boost: f32,
    pub value_type: ValueType,
}

impl LookupField {
    pub fn new<S: Into<String>>(name: S) -> Self {
        LookupField {
            name: name.into(),
            sort_order: 0,
            ascending: true,
            boost: 1.0,
            value_type: ValueType::String,
        }
    }

    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
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

    fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert("sort_order".to_string(), Value::Integer(self.sort_order as i64));
        map.insert("ascending".to_string(), Value::Boolean(self.ascending));
        map.insert("boost".to_string(), Value::from(self.boost));
        map.insert("value_type".to_string(), Value::from(self.value_type.to_string()));
        Value::Map(map)
    }

    fn from_value(name: &str, value: &Value) -> Result<Self> {
        let map = value.as_map().ok_or_else(|| {
            FathomError::validation(format!("lookup field `{name}` must be described by a map"))
        })?;
        let sort_order = read_i64(map, "sort_order", 0)?;
        let value_type = match read_string(map, "value_type")? {
            Some(kind) => kind.parse()?,
            None => ValueType::default(),
        };
        Ok(LookupField {
            name: name.to_string(),
            sort_order: u32::try_from(sort_order).map_err(|_| {
                FathomError::validation(format!(
                    "lookup field `{name}` has invalid sort order {sort_order}"
                ))
            })?,
            ascending: read_bool(map, "ascending", true)?,
            boost: read_f32(map, "boost", 1.0)?,
            value_type,
        })
    }
}

/// Fields an autocomplete lookup matches against, and the single field whose
/// values it returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupPolicy {
    pub id: String,
    pub fields: BTreeMap<String, LookupField>,
    pub field_to_return: Option<String>,
}

impl LookupPolicy {
    pub fn new<S: Into<String>>(id: S) -> Self {
        LookupPolicy {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn add_field(&mut self, field: LookupField) {
        self.fields.insert(field.name.clone(), field);
    }

    pub fn with_field(mut self, field: LookupField) -> Self {
        self.add_field(field);
        self
    }

    pub fn returning<S: Into<String>>(mut self, field: S) -> Self {
        self.field_to_return = Some(field.into());
        self
    }

    /// Field whose values a lookup returns; the first field by name when unset.
    pub fn return_field(&self) -> Option<&str> {
        self.field_to_return
            .as_deref()
            .or_else(|| self.fields.keys().next().map(String::as_str))
    }

    /// Fields with a non-zero sort order, ranked by it.
    pub fn sort_fields(&self) -> Vec<&LookupField> {
        let mut fields: Vec<&LookupField> =
            self.fields.values().filter(|f| f.sort_order > 0).collect();
        fields.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.name.cmp(&b.name)));
        fields
    }
}

impl Policy for LookupPolicy {
    const DATABASE: &'static str = "lookup_policies";
    const ID_PREFIX: &'static str = "lookup_policy_for_";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(FathomError::validation("lookup policy id must not be empty"));
        }
        if let Some(field) = &self.field_to_return {
            if field.is_empty() {
                return Err(FathomError::validation(format!(
                    "lookup policy `{}` has an empty return field",
                    self.id
                )));
            }
        }
        for field in self.fields.values() {
            if !field.boost.is_finite() || field.boost < 0.0 {
                return Err(FathomError::validation(format!(
                    "lookup field `{}` has invalid boost {}",
                    field.name, field.boost
                )));
            }
        }
        Ok(())
    }

    fn to_attributes(&self) -> BTreeMap<String, Value> {
        let mut map = BTreeMap::new();
        let fields = self
            .fields
            .iter()
            .map(|(name, field)| (name.clone(), field.to_value()))
            .collect();
        map.insert("fields".to_string(), Value::Map(fields));
        if let Some(field) = &self.field_to_return {
            map.insert("field_to_return".to_string(), Value::from(field.as_str()));
        }
        map
    }

    fn from_attributes(id: &str, attributes: &BTreeMap<String, Value>) -> Result<Self> {
        let mut policy = LookupPolicy::new(id);
        policy.field_to_return = read_string(attributes, "field_to_return")?;
        if let Some(fields) = read_map(attributes, "fields")? {
            for (name, value) in fields {
                policy.add_field(LookupField::from_value(name, value)?);
            }
        }
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_parsing() {
        assert_eq!("Number".parse::<ValueType>().unwrap(), ValueType::Number);
        assert_eq!("date".parse::<ValueType>().unwrap(), ValueType::Date);
        assert!("blob".parse::<ValueType>().is_err());
    }

    #[test]
    fn test_return_field_defaults_to_first() {
        let policy = LookupPolicy::new("cities")
            .with_field(LookupField::new("name"))
            .with_field(LookupField::new("country"));
        assert_eq!(policy.return_field(), Some("country"));
        assert_eq!(policy.returning("name").return_field(), Some("name"));
    }

    #[test]
    fn test_document_round_trip() {
        let policy = LookupPolicy::new("cities")
            .with_field(LookupField::new("name").sorted(1, true))
            .with_field(LookupField::new("population").with_value_type(ValueType::Number))
            .with_field(LookupField::new("founded").with_value_type(ValueType::Date))
            .returning("name");

        let doc = policy.to_document(None).unwrap();
        assert_eq!(doc.database(), "lookup_policies");
        assert_eq!(LookupPolicy::from_document(&doc).unwrap(), policy);
    }
}
