//! Loading configuration documents with a file fallback.

use std::fs;
use std::path::Path;

use crate::document::Document;
use crate::error::{FathomError, Result};
use crate::repository::DocumentRepository;

/// Fetch `database/id` from the repository, falling back to a JSON file.
///
/// When the repository has no such document and `fallback` is given, the file
/// is read as a document with the requested id. With `persist` set the
/// fallback document is written to the repository (creating the database if
/// needed) and the stored copy is returned.
pub fn load_or_bootstrap(
    repository: &dyn DocumentRepository,
    database: &str,
    id: &str,
    fallback: Option<&Path>,
    persist: bool,
) -> Result<Document> {
    match repository.get_document(database, id) {
        Ok(document) => return Ok(document),
        Err(err) if err.is_not_found() => {}
        Err(err) => return Err(err),
    }

    let path = fallback.ok_or_else(|| FathomError::not_found(format!("document `{database}/{id}`")))?;
    log::info!("bootstrapping `{database}/{id}` from {}", path.display());

    let content = fs::read_to_string(path)?;
    let json: serde_json::Value = serde_json::from_str(&content)?;
    let document = Document::from_json(Some(database), json)?
        .to_builder()
        .id(id)
        .build()?;

    if !persist {
        return Ok(document);
    }
    if let Err(err) = repository.create_database(database) {
        log::debug!("create_database `{database}` failed, continuing: {err}");
    }
    repository.save_document(&document, true)
}
