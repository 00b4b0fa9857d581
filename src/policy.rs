//! Declarative index, query and lookup policies.
//!
//! Policies describe *how* documents become index entries ([`IndexPolicy`]) and
//! how indexed fields are queried, sorted and returned ([`QueryPolicy`],
//! [`LookupPolicy`]). They are stored as ordinary documents; the [`Policy`]
//! trait is the two-way mapping between a policy and a document's attribute
//! map, and converting in one direction and back reproduces the original.

use std::collections::BTreeMap;

use crate::document::{Document, Value};
use crate::error::{FathomError, Result};

pub mod field;
pub mod index_policy;
pub mod lookup_policy;
pub mod query_policy;

pub use field::{Field, FieldPath};
pub use index_policy::IndexPolicy;
pub use lookup_policy::{LookupField, LookupPolicy, ValueType};
pub use query_policy::{QueryField, QueryPolicy};

/// Common behavior of storable policies.
pub trait Policy: Clone + Send + Sync + 'static {
    /// Database holding policies of this kind.
    const DATABASE: &'static str;

    /// Prefix of the synthetic document id, e.g. `index_policy_for_`.
    const ID_PREFIX: &'static str;

    /// Id of the index or lookup this policy belongs to.
    fn id(&self) -> &str;

    /// Check invariants that cannot be expressed in the type.
    fn validate(&self) -> Result<()>;

    /// Attribute-map form.
    fn to_attributes(&self) -> BTreeMap<String, Value>;

    /// Rebuild from the attribute map written by [`to_attributes`](Self::to_attributes).
    fn from_attributes(id: &str, attributes: &BTreeMap<String, Value>) -> Result<Self>;

    /// Deterministic id of the document storing the policy for `id`.
    fn document_id(id: &str) -> String {
        format!("{}{}", Self::ID_PREFIX, id)
    }

    /// Document form, carrying `revision` when one is known.
    fn to_document(&self, revision: Option<&str>) -> Result<Document> {
        self.validate()?;
        let mut builder = Document::builder()
            .database(Self::DATABASE)
            .id(Self::document_id(self.id()));
        if let Some(revision) = revision {
            builder = builder.revision(revision);
        }
        for (key, value) in self.to_attributes() {
            builder = builder.put(key, value)?;
        }
        builder.build()
    }

    /// Convert a stored policy document.
    fn from_document(document: &Document) -> Result<Self> {
        let doc_id = document
            .id()
            .ok_or_else(|| FathomError::validation("policy document has no id"))?;
        let id = doc_id.strip_prefix(Self::ID_PREFIX).unwrap_or(doc_id);
        let policy = Self::from_attributes(id, document.attributes())?;
        policy.validate()?;
        Ok(policy)
    }
}

// Attribute readers shared by the policy conversions.

pub(crate) fn read_bool(map: &BTreeMap<String, Value>, key: &str, default: bool) -> Result<bool> {
    match map.get(key) {
        None => Ok(default),
        Some(value) => value
            .as_bool()
            .ok_or_else(|| invalid_kind(key, "boolean", value)),
    }
}

pub(crate) fn read_f32(map: &BTreeMap<String, Value>, key: &str, default: f32) -> Result<f32> {
    match map.get(key) {
        None => Ok(default),
        Some(value) => value
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| invalid_kind(key, "number", value)),
    }
}

pub(crate) fn read_i64(map: &BTreeMap<String, Value>, key: &str, default: i64) -> Result<i64> {
    match map.get(key) {
        None => Ok(default),
        Some(value) => value
            .as_i64()
            .ok_or_else(|| invalid_kind(key, "integer", value)),
    }
}

pub(crate) fn read_string(map: &BTreeMap<String, Value>, key: &str) -> Result<Option<String>> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(value) => Err(invalid_kind(key, "string", value)),
    }
}

pub(crate) fn read_map<'a>(
    map: &'a BTreeMap<String, Value>,
    key: &str,
) -> Result<Option<&'a BTreeMap<String, Value>>> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Map(inner)) => Ok(Some(inner)),
        Some(value) => Err(invalid_kind(key, "map", value)),
    }
}

fn invalid_kind(key: &str, expected: &str, value: &Value) -> FathomError {
    FathomError::validation(format!(
        "policy attribute `{key}` must be a {expected}, got {}",
        value.kind()
    ))
}
