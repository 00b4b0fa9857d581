//! Immutable stored documents and their builder.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::document::value::Value;
use crate::error::{FathomError, Result};

/// Reserved key carrying the document id in map form.
pub const ID_KEY: &str = "_id";
/// Reserved key carrying the revision token in map form.
pub const REVISION_KEY: &str = "_rev";
/// Reserved key carrying the owning database in map form.
pub const DATABASE_KEY: &str = "database";

/// Whether `key` names a reserved (non-user) attribute.
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with('_') || key == DATABASE_KEY
}

/// A single stored document.
///
/// Documents are never mutated after [`DocumentBuilder::build`]; saving a
/// document produces a new one carrying the updated revision. Equality and
/// hashing consider the id only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    database: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    revision: Option<String>,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

impl Document {
    /// Create a builder for constructing documents.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }

    /// Build a document from a flat JSON object. Reserved keys `_id`, `_rev`
    /// and `database` populate the document header; `database` may be given
    /// explicitly instead.
    pub fn from_json(database: Option<&str>, json: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(map) = json else {
            return Err(FathomError::validation("document JSON must be an object"));
        };
        let mut builder = DocumentBuilder::new();
        if let Some(database) = database {
            builder = builder.database(database);
        }
        for (key, value) in map {
            builder = builder.put(key, Value::from_json(value)?)?;
        }
        builder.build()
    }

    /// Flat JSON form including the reserved header keys.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert(
            DATABASE_KEY.to_string(),
            serde_json::Value::String(self.database.clone()),
        );
        if let Some(id) = &self.id {
            map.insert(ID_KEY.to_string(), serde_json::Value::String(id.clone()));
        }
        if let Some(revision) = &self.revision {
            map.insert(
                REVISION_KEY.to_string(),
                serde_json::Value::String(revision.clone()),
            );
        }
        for (key, value) in &self.attributes {
            map.insert(key.clone(), value.to_json());
        }
        serde_json::Value::Object(map)
    }

    /// Name of the owning database.
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Opaque revision token used for optimistic concurrency.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// User attributes, reserved keys excluded.
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Get a user attribute.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Get a user attribute as a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Number of user attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Start a builder pre-filled with this document's content.
    pub fn to_builder(&self) -> DocumentBuilder {
        DocumentBuilder {
            database: Some(self.database.clone()),
            id: self.id.clone(),
            revision: self.revision.clone(),
            attributes: self.attributes.clone(),
        }
    }

    /// Copy of this document with a new id and revision.
    pub(crate) fn with_header(&self, id: String, revision: String) -> Document {
        Document {
            database: self.database.clone(),
            id: Some(id),
            revision: Some(revision),
            attributes: self.attributes.clone(),
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Document {}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn header_string(name: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(FathomError::validation(format!(
            "reserved attribute `{name}` must be a string, got {}",
            other.kind()
        ))),
    }
}

/// A validating builder for [`Document`]s.
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    database: Option<String>,
    id: Option<String>,
    revision: Option<String>,
    attributes: BTreeMap<String, Value>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn database<S: Into<String>>(mut self, database: S) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn revision<S: Into<String>>(mut self, revision: S) -> Self {
        self.revision = Some(revision.into());
        self
    }

    /// Add an attribute.
    ///
    /// `_id`, `_rev` and `database` set the document header and must be strings.
    /// Any other `_`-prefixed name, or an empty name, is rejected.
    pub fn put<S: Into<String>, V: Into<Value>>(mut self, name: S, value: V) -> Result<Self> {
        let name = name.into();
        let value = value.into();
        if name.is_empty() {
            return Err(FathomError::validation("attribute name must not be empty"));
        }

        if name == ID_KEY {
            self.id = Some(header_string(&name, value)?);
        } else if name == REVISION_KEY {
            self.revision = Some(header_string(&name, value)?);
        } else if name == DATABASE_KEY {
            self.database = Some(header_string(&name, value)?);
        } else if is_reserved_key(&name) {
            return Err(FathomError::validation(format!(
                "attribute `{name}` uses a reserved prefix"
            )));
        } else {
            self.attributes.insert(name, value);
        }
        Ok(self)
    }

    /// Add an attribute from JSON.
    pub fn put_json<S: Into<String>>(self, name: S, value: serde_json::Value) -> Result<Self> {
        self.put(name, Value::from_json(value)?)
    }

    /// Remove an attribute if present.
    pub fn remove(mut self, name: &str) -> Self {
        self.attributes.remove(name);
        self
    }

    /// Build the document. A non-empty database is required.
    pub fn build(self) -> Result<Document> {
        let database = self
            .database
            .filter(|db| !db.is_empty())
            .ok_or_else(|| FathomError::validation("document database is required"))?;
        Ok(Document {
            database,
            id: self.id,
            revision: self.revision,
            attributes: self.attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_build_round_trips_attributes() {
        let attrs: Vec<(&str, Value)> = vec![
            ("title", Value::from("Hitchhiker")),
            ("pages", Value::from(224)),
            ("price", Value::from(9.99)),
            ("available", Value::from(true)),
            ("tags", Value::from(vec!["scifi", "comedy"])),
        ];

        let mut builder = Document::builder().database("books").id("b1");
        for (k, v) in &attrs {
            builder = builder.put(*k, v.clone()).unwrap();
        }
        let doc = builder.build().unwrap();

        assert_eq!(doc.database(), "books");
        assert_eq!(doc.id(), Some("b1"));
        assert_eq!(doc.len(), attrs.len());
        for (k, v) in &attrs {
            assert_eq!(doc.get(k), Some(v));
        }
    }

    #[test]
    fn test_database_is_required() {
        let err = Document::builder().put("a", 1).unwrap().build().unwrap_err();
        assert!(matches!(err, FathomError::Validation(_)));

        let err = Document::builder().database("").build().unwrap_err();
        assert!(matches!(err, FathomError::Validation(_)));
    }

    #[test]
    fn test_reserved_keys() {
        let doc = Document::builder()
            .put("database", "books")
            .unwrap()
            .put("_id", "b2")
            .unwrap()
            .put("_rev", "1-abc")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(doc.database(), "books");
        assert_eq!(doc.id(), Some("b2"));
        assert_eq!(doc.revision(), Some("1-abc"));
        assert!(doc.is_empty());

        assert!(Document::builder().put("_secret", 1).is_err());
        assert!(Document::builder().put("", 1).is_err());
        assert!(Document::builder().put("_id", 3).is_err());
    }

    #[test]
    fn test_equality_is_by_id() {
        let a = Document::builder()
            .database("books")
            .id("same")
            .put("title", "A")
            .unwrap()
            .build()
            .unwrap();
        let b = Document::builder()
            .database("other")
            .id("same")
            .put("title", "B")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(a, b);

        let set: HashSet<Document> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_json_round_trip() {
        let source = json!({"_id": "b3", "database": "books", "title": "Emma", "year": 1815});
        let doc = Document::from_json(None, source.clone()).unwrap();
        assert_eq!(doc.get_str("title"), Some("Emma"));
        assert_eq!(doc.to_json(), source);

        assert!(Document::from_json(Some("books"), json!({"bad": null})).is_err());
    }
}
