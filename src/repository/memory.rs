//! In-memory document repository.
//!
//! Keeps every database as an id-ordered map behind one `RwLock`. Revision
//! tokens have the form `"<generation>-<uuid>"`. Useful for tests, the CLI, and
//! as a reference for the optimistic-concurrency contract other backends follow.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::{Document, Value};
use crate::error::{FathomError, Result};
use crate::repository::{DatabaseInfo, DocumentRepository};

/// Settings for [`MemoryRepository`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct MemoryRepositoryConfig {
    /// Create databases implicitly on first write instead of failing.
    pub auto_create_databases: bool,
}

#[derive(Debug, Default)]
struct Database {
    documents: BTreeMap<String, Document>,
    update_sequence: u64,
}

/// An in-process [`DocumentRepository`].
#[derive(Debug, Default)]
pub struct MemoryRepository {
    databases: RwLock<HashMap<String, Database>>,
    config: MemoryRepositoryConfig,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MemoryRepositoryConfig) -> Self {
        MemoryRepository {
            databases: RwLock::new(HashMap::new()),
            config,
        }
    }

    fn next_revision(current: Option<&str>) -> String {
        let generation = current
            .and_then(|rev| rev.split('-').next())
            .and_then(|g| g.parse::<u64>().ok())
            .unwrap_or(0);
        format!("{}-{}", generation + 1, Uuid::new_v4().simple())
    }

    fn missing_database(database: &str) -> FathomError {
        FathomError::not_found(format!("database `{database}`"))
    }
}

impl DocumentRepository for MemoryRepository {
    fn create_database(&self, database: &str) -> Result<()> {
        if database.is_empty() {
            return Err(FathomError::validation("database name must not be empty"));
        }
        let mut databases = self.databases.write();
        if databases.contains_key(database) {
            return Err(FathomError::persistence(format!(
                "database `{database}` already exists"
            )));
        }
        databases.insert(database.to_string(), Database::default());
        Ok(())
    }

    fn delete_database(&self, database: &str) -> Result<()> {
        self.databases
            .write()
            .remove(database)
            .map(|_| ())
            .ok_or_else(|| Self::missing_database(database))
    }

    fn get_all_databases(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.databases.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn save_document(&self, document: &Document, upsert: bool) -> Result<Document> {
        let mut databases = self.databases.write();
        if !databases.contains_key(document.database()) {
            if !self.config.auto_create_databases {
                return Err(Self::missing_database(document.database()));
            }
            databases.insert(document.database().to_string(), Database::default());
        }
        let db = databases
            .get_mut(document.database())
            .ok_or_else(|| Self::missing_database(document.database()))?;

        let id = document
            .id()
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let current = db.documents.get(&id).and_then(|d| d.revision().map(str::to_string));

        match (current.as_deref(), document.revision()) {
            (Some(stored), Some(given)) if stored != given => {
                return Err(FathomError::conflict(document.database(), &id));
            }
            (Some(_), None) if !upsert => {
                return Err(FathomError::conflict(document.database(), &id));
            }
            (None, Some(_)) if !upsert => {
                // a revision for a document that does not exist
                return Err(FathomError::conflict(document.database(), &id));
            }
            _ => {}
        }

        let saved = document.with_header(id.clone(), Self::next_revision(current.as_deref()));
        db.documents.insert(id, saved.clone());
        db.update_sequence += 1;
        Ok(saved)
    }

    fn get_document(&self, database: &str, id: &str) -> Result<Document> {
        let databases = self.databases.read();
        let db = databases
            .get(database)
            .ok_or_else(|| Self::missing_database(database))?;
        db.documents
            .get(id)
            .cloned()
            .ok_or_else(|| FathomError::not_found(format!("document `{database}/{id}`")))
    }

    fn get_documents(&self, database: &str, ids: &[String]) -> Result<Vec<Document>> {
        let databases = self.databases.read();
        let db = databases
            .get(database)
            .ok_or_else(|| Self::missing_database(database))?;
        Ok(ids
            .iter()
            .filter_map(|id| db.documents.get(id).cloned())
            .collect())
    }

    fn get_all_documents(
        &self,
        database: &str,
        start_key: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Document>> {
        let databases = self.databases.read();
        let db = databases
            .get(database)
            .ok_or_else(|| Self::missing_database(database))?;
        let lower = match start_key {
            Some(key) => Bound::Included(key.to_string()),
            None => Bound::Unbounded,
        };
        Ok(db
            .documents
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    fn get_documents_in_range(
        &self,
        database: &str,
        start_key: &str,
        end_key: &str,
    ) -> Result<Vec<Document>> {
        if start_key > end_key {
            return Ok(Vec::new());
        }
        let databases = self.databases.read();
        let db = databases
            .get(database)
            .ok_or_else(|| Self::missing_database(database))?;
        Ok(db
            .documents
            .range(start_key.to_string()..=end_key.to_string())
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    fn query(&self, database: &str, criteria: &BTreeMap<String, Value>) -> Result<Vec<Document>> {
        let databases = self.databases.read();
        let db = databases
            .get(database)
            .ok_or_else(|| Self::missing_database(database))?;
        Ok(db
            .documents
            .values()
            .filter(|doc| {
                criteria
                    .iter()
                    .all(|(key, expected)| doc.get(key) == Some(expected))
            })
            .cloned()
            .collect())
    }

    fn delete_document(&self, database: &str, id: &str, revision: Option<&str>) -> Result<()> {
        let mut databases = self.databases.write();
        let db = databases
            .get_mut(database)
            .ok_or_else(|| Self::missing_database(database))?;
        let stored = db
            .documents
            .get(id)
            .ok_or_else(|| FathomError::not_found(format!("document `{database}/{id}`")))?;
        if let Some(revision) = revision {
            if stored.revision() != Some(revision) {
                return Err(FathomError::conflict(database, id));
            }
        }
        db.documents.remove(id);
        db.update_sequence += 1;
        Ok(())
    }

    fn get_info(&self, database: &str) -> Result<DatabaseInfo> {
        let databases = self.databases.read();
        let db = databases
            .get(database)
            .ok_or_else(|| Self::missing_database(database))?;
        Ok(DatabaseInfo {
            name: database.to_string(),
            document_count: db.documents.len(),
            update_sequence: db.update_sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: &str, title: &str) -> Document {
        Document::builder()
            .database("books")
            .id(id)
            .put("title", title)
            .unwrap()
            .build()
            .unwrap()
    }

    fn repo() -> MemoryRepository {
        let repo = MemoryRepository::new();
        repo.create_database("books").unwrap();
        repo
    }

    #[test]
    fn test_save_assigns_revisions() {
        let repo = repo();
        let saved = repo.save_document(&book("b1", "Emma"), false).unwrap();
        assert!(saved.revision().unwrap().starts_with("1-"));

        let updated = saved.to_builder().put("title", "Emma II").unwrap().build().unwrap();
        let saved_again = repo.save_document(&updated, false).unwrap();
        assert!(saved_again.revision().unwrap().starts_with("2-"));
        assert_eq!(
            repo.get_document("books", "b1").unwrap().get_str("title"),
            Some("Emma II")
        );
    }

    #[test]
    fn test_stale_revision_conflicts() {
        let repo = repo();
        let first = repo.save_document(&book("b1", "Emma"), false).unwrap();
        repo.save_document(&first, false).unwrap();

        // `first` now carries an outdated revision
        let err = repo.save_document(&first, false).unwrap_err();
        assert!(matches!(err, FathomError::Conflict { .. }));

        // overwriting without a revision needs upsert
        let err = repo.save_document(&book("b1", "Other"), false).unwrap_err();
        assert!(err.is_persistence());
        repo.save_document(&book("b1", "Other"), true).unwrap();
    }

    #[test]
    fn test_missing_document_is_not_found() {
        let repo = repo();
        assert!(repo.get_document("books", "nope").unwrap_err().is_not_found());
        assert!(repo.get_document("films", "nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_generated_ids_and_paging() {
        let repo = repo();
        for id in ["a", "b", "c", "d"] {
            repo.save_document(&book(id, id), false).unwrap();
        }
        let anonymous = Document::builder().database("books").build().unwrap();
        let saved = repo.save_document(&anonymous, false).unwrap();
        assert!(saved.id().is_some());

        let page = repo.get_all_documents("books", Some("b"), 2).unwrap();
        let ids: Vec<_> = page.iter().map(|d| d.id().unwrap()).collect();
        assert_eq!(ids, vec!["b", "c"]);

        let range = repo.get_documents_in_range("books", "a", "c").unwrap();
        assert_eq!(range.len(), 3);
        assert_eq!(repo.get_info("books").unwrap().document_count, 5);
    }

    #[test]
    fn test_query_and_delete() {
        let repo = repo();
        let saved = repo.save_document(&book("b1", "Emma"), false).unwrap();
        repo.save_document(&book("b2", "Dune"), false).unwrap();

        let criteria = BTreeMap::from([("title".to_string(), Value::from("Dune"))]);
        let hits = repo.query("books", &criteria).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), Some("b2"));

        assert!(repo.delete_document("books", "b1", Some("0-x")).is_err());
        repo.delete_document("books", "b1", saved.revision()).unwrap();
        assert_eq!(repo.get_info("books").unwrap().document_count, 1);
    }

    #[test]
    fn test_create_database_twice_fails() {
        let repo = repo();
        assert!(repo.create_database("books").unwrap_err().is_persistence());
    }
}
