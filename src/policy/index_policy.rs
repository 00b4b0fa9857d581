//! Index policies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::Value;
use crate::error::{FathomError, Result};
use crate::policy::field::Field;
use crate::policy::{Policy, read_bool, read_f32, read_i64, read_map, read_string};

/// Owner tag matching every partition.
pub const DEFAULT_OWNER: &str = "all";

/// Name of the analyzer used when a policy does not pick one.
pub const DEFAULT_ANALYZER: &str = "standard";

/// Rules for projecting one database's documents into an index.
///
/// The policy id doubles as the index name and as the name of the primary
/// database the documents come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexPolicy {
    pub id: String,
    fields: BTreeMap<String, Field>,
    /// Document-level relevance seed, independent of term frequency.
    pub score: i64,
    /// Multiplier applied to every field boost.
    pub boost: f32,
    /// Analyzer selector resolved through the analyzer registry.
    pub analyzer: String,
    /// Partition tag stamped on every indexed document.
    pub owner: String,
    /// Attribute providing the index id instead of the document id.
    pub custom_id_field: Option<String>,
    /// Attribute ordering "always match" results, newest first when unset.
    pub custom_sort_field: Option<String>,
    /// Attribute holding the document timestamp used by recency decay.
    pub timestamp_field: Option<String>,
    /// Feed analyzed tokens into the index's term dictionary.
    pub add_to_dictionary: bool,
}

impl IndexPolicy {
    pub fn new<S: Into<String>>(id: S) -> Self {
        IndexPolicy {
            id: id.into(),
            fields: BTreeMap::new(),
            score: 0,
            boost: 1.0,
            analyzer: DEFAULT_ANALYZER.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            custom_id_field: None,
            custom_sort_field: None,
            timestamp_field: None,
            add_to_dictionary: false,
        }
    }

    /// Add or replace a field. Last write wins for a repeated name.
    ///
    /// Fails if the field would become a second latitude or longitude source.
    pub fn add_field(&mut self, field: Field) -> Result<()> {
        field.validate()?;
        if let Some(existing) = self.latitude_field() {
            if field.spatial_latitude && existing.name != field.name {
                return Err(FathomError::validation(format!(
                    "policy `{}` already has latitude field `{}`",
                    self.id, existing.name
                )));
            }
        }
        if let Some(existing) = self.longitude_field() {
            if field.spatial_longitude && existing.name != field.name {
                return Err(FathomError::validation(format!(
                    "policy `{}` already has longitude field `{}`",
                    self.id, existing.name
                )));
            }
        }
        self.fields.insert(field.name.clone(), field);
        Ok(())
    }

    /// Builder-style [`add_field`](Self::add_field).
    pub fn with_field(mut self, field: Field) -> Result<Self> {
        self.add_field(field)?;
        Ok(self)
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Field> {
        self.fields.remove(name)
    }

    /// Fields ordered by name.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn latitude_field(&self) -> Option<&Field> {
        self.fields.values().find(|f| f.spatial_latitude)
    }

    pub fn longitude_field(&self) -> Option<&Field> {
        self.fields.values().find(|f| f.spatial_longitude)
    }

    /// Whether both coordinates are declared.
    pub fn is_spatial(&self) -> bool {
        self.latitude_field().is_some() && self.longitude_field().is_some()
    }

    /// Index name; identical to the policy id.
    pub fn index_name(&self) -> &str {
        &self.id
    }
}

impl Policy for IndexPolicy {
    const DATABASE: &'static str = "index_policies";
    const ID_PREFIX: &'static str = "index_policy_for_";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(FathomError::validation("index policy id must not be empty"));
        }
        if !self.boost.is_finite() || self.boost < 0.0 {
            return Err(FathomError::validation(format!(
                "index policy `{}` has invalid boost {}",
                self.id, self.boost
            )));
        }
        for field in self.fields.values() {
            field.validate()?;
        }
        let latitudes = self.fields.values().filter(|f| f.spatial_latitude).count();
        let longitudes = self.fields.values().filter(|f| f.spatial_longitude).count();
        if latitudes > 1 || longitudes > 1 {
            return Err(FathomError::validation(format!(
                "index policy `{}` declares more than one latitude or longitude field",
                self.id
            )));
        }
        Ok(())
    }

    fn to_attributes(&self) -> BTreeMap<String, Value> {
        let mut map = BTreeMap::new();
        map.insert("score".to_string(), Value::Integer(self.score));
        map.insert("boost".to_string(), Value::from(self.boost));
        map.insert("analyzer".to_string(), Value::from(self.analyzer.as_str()));
        map.insert("owner".to_string(), Value::from(self.owner.as_str()));
        map.insert(
            "add_to_dictionary".to_string(),
            Value::Boolean(self.add_to_dictionary),
        );
        let optional = [
            ("custom_id_field", &self.custom_id_field),
            ("custom_sort_field", &self.custom_sort_field),
            ("timestamp_field", &self.timestamp_field),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                map.insert(key.to_string(), Value::from(value.as_str()));
            }
        }
        let fields = self
            .fields
            .iter()
            .map(|(name, field)| (name.clone(), field.to_value()))
            .collect();
        map.insert("fields".to_string(), Value::Map(fields));
        map
    }

    fn from_attributes(id: &str, attributes: &BTreeMap<String, Value>) -> Result<Self> {
        let mut policy = IndexPolicy::new(id);
        policy.score = read_i64(attributes, "score", 0)?;
        policy.boost = read_f32(attributes, "boost", 1.0)?;
        policy.analyzer =
            read_string(attributes, "analyzer")?.unwrap_or_else(|| DEFAULT_ANALYZER.to_string());
        policy.owner =
            read_string(attributes, "owner")?.unwrap_or_else(|| DEFAULT_OWNER.to_string());
        policy.add_to_dictionary = read_bool(attributes, "add_to_dictionary", false)?;
        policy.custom_id_field = read_string(attributes, "custom_id_field")?;
        policy.custom_sort_field = read_string(attributes, "custom_sort_field")?;
        policy.timestamp_field = read_string(attributes, "timestamp_field")?;
        if let Some(fields) = read_map(attributes, "fields")? {
            for (name, value) in fields {
                policy.add_field(Field::from_value(name, value)?)?;
            }
        }
        Ok(policy)
    }
}
