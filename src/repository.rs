//! Document repository contract.
//!
//! The indexing and query core never talks to a storage backend directly; it
//! goes through the [`DocumentRepository`] trait. Backends are chosen once at
//! startup through [`RepositoryFactory`], which resolves a
//! [`RepositoryConfig`] variant into a shared trait object.
//!
//! Writes are optimistic: a document saved with a revision must carry the
//! store's current revision, otherwise the save fails with
//! [`FathomError::Conflict`](crate::error::FathomError::Conflict).

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::document::{Document, Value};
use crate::error::Result;

pub mod batches;
pub mod memory;

pub use batches::DocumentBatches;
pub use memory::{MemoryRepository, MemoryRepositoryConfig};

/// Summary information about a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub name: String,
    pub document_count: usize,
    /// Monotonic counter bumped on every write to the database.
    pub update_sequence: u64,
}

/// Storage contract consumed by the indexing, query and configuration layers.
pub trait DocumentRepository: Send + Sync + std::fmt::Debug {
    /// Create a database. Fails if it already exists.
    fn create_database(&self, database: &str) -> Result<()>;

    /// Delete a database and all its documents.
    fn delete_database(&self, database: &str) -> Result<()>;

    /// Names of all databases, sorted.
    fn get_all_databases(&self) -> Result<Vec<String>>;

    /// Save a document and return it with its new id and revision.
    ///
    /// With `upsert` set, a document without a revision replaces whatever is
    /// stored under its id. Otherwise writing over an existing document requires
    /// the current revision.
    fn save_document(&self, document: &Document, upsert: bool) -> Result<Document>;

    /// Fetch one document; fails with `NotFound` if absent.
    fn get_document(&self, database: &str, id: &str) -> Result<Document>;

    /// Fetch several documents, silently skipping missing ids.
    fn get_documents(&self, database: &str, ids: &[String]) -> Result<Vec<Document>>;

    /// Up to `limit` documents ordered by id, starting at `start_key` inclusive.
    fn get_all_documents(
        &self,
        database: &str,
        start_key: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Document>>;

    /// Documents whose ids fall in `[start_key, end_key]`, ordered by id.
    fn get_documents_in_range(
        &self,
        database: &str,
        start_key: &str,
        end_key: &str,
    ) -> Result<Vec<Document>>;

    /// Documents whose attributes equal every given criterion.
    fn query(&self, database: &str, criteria: &BTreeMap<String, Value>) -> Result<Vec<Document>>;

    /// Delete a document, checking the revision when one is given.
    fn delete_document(&self, database: &str, id: &str, revision: Option<&str>) -> Result<()>;

    fn get_info(&self, database: &str) -> Result<DatabaseInfo>;
}

/// Backend selection, resolved once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RepositoryConfig {
    /// In-process repository.
    Memory(MemoryRepositoryConfig),
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig::Memory(MemoryRepositoryConfig::default())
    }
}

/// Factory turning a [`RepositoryConfig`] into a repository.
pub struct RepositoryFactory;

impl RepositoryFactory {
    pub fn create(config: &RepositoryConfig) -> Result<Arc<dyn DocumentRepository>> {
        match config {
            RepositoryConfig::Memory(memory) => {
                Ok(Arc::new(MemoryRepository::with_config(memory.clone())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_creates_memory_repository() {
        let repo = RepositoryFactory::create(&RepositoryConfig::default()).unwrap();
        repo.create_database("books").unwrap();
        assert_eq!(repo.get_all_databases().unwrap(), vec!["books".to_string()]);
    }

    #[test]
    fn test_config_is_tagged() {
        let json = serde_json::to_value(RepositoryConfig::default()).unwrap();
        assert_eq!(json["type"], "memory");
        let parsed: RepositoryConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, RepositoryConfig::default());
    }
}
