//! Per-field indexing descriptors.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::document::Value;
use crate::error::{FathomError, Result};
use crate::policy::{read_bool, read_f32, read_string};

/// Where a policy field takes its values from inside a document.
///
/// - `title` reads the attribute directly.
/// - `tags[name]` reads the `name` key of every element of the `tags` list.
/// - `date{year}` reads the `year` key of the `date` map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    Attribute(String),
    ListElements { attribute: String, key: String },
    MapEntry { attribute: String, key: String },
}

impl FieldPath {
    /// Parse a field name. Malformed bracket syntax is a validation error.
    pub fn parse(name: &str) -> Result<Self> {
        let split = |open: char, close: char| -> Result<Option<(String, String)>> {
            let Some(start) = name.find(open) else {
                return Ok(None);
            };
            let attribute = &name[..start];
            let rest = &name[start + open.len_utf8()..];
            let key = rest.strip_suffix(close).ok_or_else(|| {
                FathomError::validation(format!("field `{name}` is missing a closing `{close}`"))
            })?;
            if attribute.is_empty() || key.is_empty() {
                return Err(FathomError::validation(format!(
                    "field `{name}` must name both an attribute and a key"
                )));
            }
            Ok(Some((attribute.to_string(), key.to_string())))
        };

        if let Some((attribute, key)) = split('[', ']')? {
            return Ok(FieldPath::ListElements { attribute, key });
        }
        if let Some((attribute, key)) = split('{', '}')? {
            return Ok(FieldPath::MapEntry { attribute, key });
        }
        if name.is_empty() {
            return Err(FathomError::validation("field name must not be empty"));
        }
        Ok(FieldPath::Attribute(name.to_string()))
    }

    /// Top-level document attribute the path reads from.
    pub fn attribute(&self) -> &str {
        match self {
            FieldPath::Attribute(attribute)
            | FieldPath::ListElements { attribute, .. }
            | FieldPath::MapEntry { attribute, .. } => attribute,
        }
    }
}

/// How one document attribute is indexed.
///
/// Two fields are equal when their names are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    /// Attribute name, possibly using `list[key]` or `map{key}` syntax.
    pub name: String,
    /// Keep the raw value in the index so it can be returned with hits.
    pub store_in_index: bool,
    /// Name the stored value is returned under, when different from `name`.
    pub store_as: Option<String>,
    /// Run values through the analyzer instead of indexing one exact term.
    pub analyze: bool,
    /// Expand list values into separate values instead of joining them.
    pub tokenize: bool,
    pub boost: f32,
    /// Strip HTML markup before analysis.
    pub html_strip: bool,
    /// Values of this field are the document latitude.
    pub spatial_latitude: bool,
    /// Values of this field are the document longitude.
    pub spatial_longitude: bool,
}

impl Field {
    /// A stored, analyzed field with boost 1.0.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Field {
            name: name.into(),
            store_in_index: true,
            store_as: None,
            analyze: true,
            tokenize: false,
            boost: 1.0,
            html_strip: false,
            spatial_latitude: false,
            spatial_longitude: false,
        }
    }

    /// A stored, non-analyzed field holding one exact term per value.
    pub fn keyword<S: Into<String>>(name: S) -> Self {
        Field {
            analyze: false,
            ..Field::new(name)
        }
    }

    /// The latitude source of a spatial policy.
    pub fn latitude<S: Into<String>>(name: S) -> Self {
        Field {
            analyze: false,
            spatial_latitude: true,
            ..Field::new(name)
        }
    }

    /// The longitude source of a spatial policy.
    pub fn longitude<S: Into<String>>(name: S) -> Self {
        Field {
            analyze: false,
            spatial_longitude: true,
            ..Field::new(name)
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn with_store_as<S: Into<String>>(mut self, name: S) -> Self {
        self.store_as = Some(name.into());
        self
    }

    pub fn stored(mut self, stored: bool) -> Self {
        self.store_in_index = stored;
        self
    }

    pub fn analyzed(mut self, analyze: bool) -> Self {
        self.analyze = analyze;
        self
    }

    pub fn tokenized(mut self, tokenize: bool) -> Self {
        self.tokenize = tokenize;
        self
    }

    pub fn strip_html(mut self, strip: bool) -> Self {
        self.html_strip = strip;
        self
    }

    /// Name the stored value is returned under.
    pub fn stored_name(&self) -> &str {
        self.store_as.as_deref().unwrap_or(&self.name)
    }

    /// Parsed form of [`name`](Self::name).
    pub fn path(&self) -> Result<FieldPath> {
        FieldPath::parse(&self.name)
    }

    pub fn is_spatial(&self) -> bool {
        self.spatial_latitude || self.spatial_longitude
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.path()?;
        if self.spatial_latitude && self.spatial_longitude {
            return Err(FathomError::validation(format!(
                "field `{}` cannot be both latitude and longitude",
                self.name
            )));
        }
        if !self.boost.is_finite() || self.boost < 0.0 {
            return Err(FathomError::validation(format!(
                "field `{}` has invalid boost {}",
                self.name, self.boost
            )));
        }
        Ok(())
    }

    pub(crate) fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert("store_in_index".to_string(), Value::Boolean(self.store_in_index));
        if let Some(store_as) = &self.store_as {
            map.insert("store_as".to_string(), Value::String(store_as.clone()));
        }
        map.insert("analyze".to_string(), Value::Boolean(self.analyze));
        map.insert("tokenize".to_string(), Value::Boolean(self.tokenize));
        map.insert("boost".to_string(), Value::from(self.boost));
        map.insert("html_strip".to_string(), Value::Boolean(self.html_strip));
        map.insert(
            "spatial_latitude".to_string(),
            Value::Boolean(self.spatial_latitude),
        );
        map.insert(
            "spatial_longitude".to_string(),
            Value::Boolean(self.spatial_longitude),
        );
        Value::Map(map)
    }

    pub(crate) fn from_value(name: &str, value: &Value) -> Result<Self> {
        let map = value.as_map().ok_or_else(|| {
            FathomError::validation(format!("field `{name}` must be described by a map"))
        })?;
        Ok(Field {
            name: name.to_string(),
            store_in_index: read_bool(map, "store_in_index", true)?,
            store_as: read_string(map, "store_as")?,
            analyze: read_bool(map, "analyze", true)?,
            tokenize: read_bool(map, "tokenize", false)?,
            boost: read_f32(map, "boost", 1.0)?,
            html_strip: read_bool(map, "html_strip", false)?,
            spatial_latitude: read_bool(map, "spatial_latitude", false)?,
            spatial_longitude: read_bool(map, "spatial_longitude", false)?,
        })
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Field {}

impl Hash for Field {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
