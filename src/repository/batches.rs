//! Lazy, forward-only paging over a repository database.

use std::sync::Arc;

use crate::document::Document;
use crate::error::Result;
use crate::repository::DocumentRepository;

/// Iterator yielding a database's documents in id order, one page at a time.
///
/// Each call to `next` fetches the following page from the repository. The
/// sequence ends after the first short page or after a fetch error. It cannot
/// be rewound; build a new one to scan again.
pub struct DocumentBatches {
    repository: Arc<dyn DocumentRepository>,
    database: String,
    page_size: usize,
    next_key: Option<String>,
    exhausted: bool,
}

impl DocumentBatches {
    /// Page through `database` with `page_size` documents per batch.
    pub fn new<S: Into<String>>(
        repository: Arc<dyn DocumentRepository>,
        database: S,
        page_size: usize,
    ) -> Self {
        DocumentBatches {
            repository,
            database: database.into(),
            page_size: page_size.max(1),
            next_key: None,
            exhausted: false,
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    fn fetch(&mut self) -> Result<Vec<Document>> {
        // Ask for one extra document to learn the next page's start key.
        let mut page = self.repository.get_all_documents(
            &self.database,
            self.next_key.as_deref(),
            self.page_size + 1,
        )?;
        if page.len() > self.page_size {
            let lookahead = page.pop();
            self.next_key = lookahead.and_then(|doc| doc.id().map(str::to_string));
            if self.next_key.is_none() {
                self.exhausted = true;
            }
        } else {
            self.exhausted = true;
        }
        Ok(page)
    }
}

impl Iterator for DocumentBatches {
    type Item = Result<Vec<Document>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.fetch() {
            Ok(page) if page.is_empty() => None,
            Ok(page) => Some(Ok(page)),
            Err(err) => {
                self.exhausted = true;
                Some(Err(err))
            }
        }
    }
}

impl std::fmt::Debug for DocumentBatches {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentBatches")
            .field("database", &self.database)
            .field("page_size", &self.page_size)
            .field("next_key", &self.next_key)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
