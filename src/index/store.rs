//! Registry of named indexes with an open/closed lifecycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ahash::AHashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{FathomError, Result};
use crate::index::inverted::{IndexStats, InvertedIndex};

/// One named index. Readers share the lock; a writer holds it exclusively, so
/// concurrent writers to the same index are serialized.
#[derive(Debug)]
pub struct IndexHandle {
    name: String,
    index: RwLock<InvertedIndex>,
    open: AtomicBool,
}

impl IndexHandle {
    fn new(name: &str) -> Self {
        IndexHandle {
            name: name.to_string(),
            index: RwLock::new(InvertedIndex::new()),
            open: AtomicBool::new(true),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(FathomError::index_closed(&self.name))
        }
    }

    /// Shared snapshot access. Fails fast once the index is closed.
    pub fn read(&self) -> Result<RwLockReadGuard<'_, InvertedIndex>> {
        self.ensure_open()?;
        let guard = self.index.read();
        // closed while we were waiting for the lock
        self.ensure_open()?;
        Ok(guard)
    }

    /// Exclusive access. Fails fast once the index is closed.
    pub fn write(&self) -> Result<RwLockWriteGuard<'_, InvertedIndex>> {
        self.ensure_open()?;
        let guard = self.index.write();
        self.ensure_open()?;
        Ok(guard)
    }

    pub fn stats(&self) -> IndexStats {
        self.index.read().stats(&self.name, self.is_open())
    }
}

/// All indexes of a platform, by name.
#[derive(Debug, Default)]
pub struct IndexStore {
    indexes: RwLock<AHashMap<String, Arc<IndexHandle>>>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `name`, creating an empty index on first use and reopening a
    /// closed one with its contents intact.
    pub fn open(&self, name: &str) -> Result<Arc<IndexHandle>> {
        if name.is_empty() {
            return Err(FathomError::validation("index name must not be empty"));
        }
        if let Some(handle) = self.indexes.read().get(name) {
            if !handle.is_open() {
                log::info!("reopening index `{name}`");
                handle.open.store(true, Ordering::Release);
            }
            return Ok(handle.clone());
        }
        let mut indexes = self.indexes.write();
        let handle = indexes
            .entry(name.to_string())
            .or_insert_with(|| {
                log::info!("creating index `{name}`");
                Arc::new(IndexHandle::new(name))
            })
            .clone();
        handle.open.store(true, Ordering::Release);
        Ok(handle)
    }

    /// Handle of an open index.
    pub fn get(&self, name: &str) -> Result<Arc<IndexHandle>> {
        let handle = self
            .indexes
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| FathomError::not_found(format!("index `{name}`")))?;
        handle.ensure_open()?;
        Ok(handle)
    }

    /// Close an index; reads and writes fail with `IndexClosed` until reopened.
    pub fn close(&self, name: &str) -> Result<()> {
        let indexes = self.indexes.read();
        let handle = indexes
            .get(name)
            .ok_or_else(|| FathomError::not_found(format!("index `{name}`")))?;
        handle.open.store(false, Ordering::Release);
        log::info!("closed index `{name}`");
        Ok(())
    }

    /// Close and forget an index and its contents.
    pub fn drop_index(&self, name: &str) -> Result<()> {
        let handle = self
            .indexes
            .write()
            .remove(name)
            .ok_or_else(|| FathomError::not_found(format!("index `{name}`")))?;
        handle.open.store(false, Ordering::Release);
        log::info!("dropped index `{name}`");
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indexes.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn stats(&self, name: &str) -> Result<IndexStats> {
        let indexes = self.indexes.read();
        let handle = indexes
            .get(name)
            .ok_or_else(|| FathomError::not_found(format!("index `{name}`")))?;
        Ok(handle.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::inverted::IndexEntry;

    #[test]
    fn test_open_get_close() {
        let store = IndexStore::new();
        assert!(store.get("books").unwrap_err().is_not_found());

        let handle = store.open("books").unwrap();
        handle.write().unwrap().add(IndexEntry {
            id: "b1".to_string(),
            ..Default::default()
        });
        assert_eq!(store.get("books").unwrap().read().unwrap().num_docs(), 1);

        store.close("books").unwrap();
        assert!(matches!(
            store.get("books").unwrap_err(),
            FathomError::IndexClosed(_)
        ));
        assert!(handle.read().is_err());
        assert!(!store.stats("books").unwrap().open);

        // reopening keeps the contents
        store.open("books").unwrap();
        assert_eq!(store.stats("books").unwrap().doc_count, 1);
    }

    #[test]
    fn test_drop_index() {
        let store = IndexStore::new();
        let handle = store.open("books").unwrap();
        store.open("films").unwrap();
        assert_eq!(store.names(), vec!["books", "films"]);

        store.drop_index("books").unwrap();
        assert!(!store.contains("books"));
        assert!(handle.write().is_err());
        assert!(store.drop_index("books").is_err());
    }
}
