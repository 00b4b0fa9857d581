//! Policy-driven indexing engine.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::registry::AnalyzerRegistry;
use crate::analysis::char_filter::CharFilter;
use crate::analysis::char_filter::html_strip::HtmlStripCharFilter;
use crate::document::{Document, Value};
use crate::error::{FathomError, Result};
use crate::index::{FieldTerms, GeoPoint, IndexEntry, IndexHandle, IndexStore};
use crate::indexing::flatten::field_values;
use crate::policy::{Field, IndexPolicy, Policy};
use crate::repository::{DocumentBatches, DocumentRepository};
use crate::spelling::surface_words;

/// Tuning knobs of the indexing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Documents fetched from the repository per batch.
    pub batch_size: usize,
    /// Transform the documents of a batch on the rayon pool.
    pub parallel: bool,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        IndexingConfig {
            batch_size: 500,
            parallel: true,
        }
    }
}

/// Outcome of one indexing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexReport {
    /// Index the documents were written to.
    pub index: String,

    /// Documents read from the batches.
    pub total_documents: usize,

    /// Documents added to the index.
    pub documents_indexed: usize,

    /// Documents skipped because they could not be transformed.
    pub documents_failed: usize,

    /// Entries removed, by `delete_existing` or an explicit update.
    pub documents_deleted: usize,

    pub execution_time: Duration,
}

impl IndexReport {
    fn new(index: &str) -> Self {
        IndexReport {
            index: index.to_string(),
            ..Default::default()
        }
    }

    fn absorb(&mut self, other: IndexReport) {
        self.total_documents += other.total_documents;
        self.documents_indexed += other.documents_indexed;
        self.documents_failed += other.documents_failed;
        self.documents_deleted += other.documents_deleted;
    }
}

/// How a secondary (join) database composes documents for an index.
///
/// Every document of `join_database` links one `source_database` document,
/// named by its `source_id_field` attribute, to the id it is indexed under,
/// taken from its `index_id_field` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSpec {
    pub join_database: String,
    pub source_database: String,
    pub source_id_field: String,
    pub index_id_field: String,
}

/// Turns documents into index entries under an [`IndexPolicy`] and writes
/// them into the [`IndexStore`].
///
/// Writers to one index are serialized by that index's lock; runs against
/// different indexes proceed concurrently.
#[derive(Debug, Clone)]
pub struct IndexingEngine {
    store: Arc<IndexStore>,
    analyzers: Arc<AnalyzerRegistry>,
    config: IndexingConfig,
}

impl IndexingEngine {
    pub fn new(store: Arc<IndexStore>, analyzers: Arc<AnalyzerRegistry>) -> Self {
        Self::with_config(store, analyzers, IndexingConfig::default())
    }

    pub fn with_config(
        store: Arc<IndexStore>,
        analyzers: Arc<AnalyzerRegistry>,
        config: IndexingConfig,
    ) -> Self {
        IndexingEngine {
            store,
            analyzers,
            config,
        }
    }

    pub fn config(&self) -> &IndexingConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Index every document of `batches` under `policy`.
    ///
    /// With `delete_existing`, a document replaces whatever the index holds
    /// under the same id; otherwise it is appended. Documents that cannot be
    /// transformed are logged and counted as failures. A batch that cannot be
    /// fetched ends the run with its error.
    pub fn index<I>(
        &self,
        policy: &IndexPolicy,
        batches: I,
        delete_existing: bool,
    ) -> Result<IndexReport>
    where
        I: IntoIterator<Item = Result<Vec<Document>>>,
    {
        let start = Instant::now();
        policy.validate()?;
        let analyzer = self.analyzers.resolve(&policy.analyzer)?;
        let handle = self.store.open(policy.index_name())?;

        let mut report = IndexReport::new(policy.index_name());
        for batch in batches {
            let batch = batch?;
            report.absorb(self.write_batch(&handle, policy, &analyzer, &batch, delete_existing)?);
        }
        report.execution_time = start.elapsed();

        log::info!(
            "indexed {}/{} documents into `{}` ({} failed) in {:?}",
            report.documents_indexed,
            report.total_documents,
            report.index,
            report.documents_failed,
            report.execution_time
        );
        Ok(report)
    }

    /// Index all documents of the database named like the policy.
    pub fn index_using_primary_database(
        &self,
        repository: Arc<dyn DocumentRepository>,
        policy: &IndexPolicy,
        delete_existing: bool,
    ) -> Result<IndexReport> {
        let batches = DocumentBatches::new(repository, policy.id.clone(), self.config.batch_size);
        self.index(policy, batches, delete_existing)
    }

    /// Index documents composed through a join database.
    ///
    /// Each join document yields one entry: the source document's attributes,
    /// completed by the join document's own attributes, indexed under the id
    /// held in [`JoinSpec::index_id_field`]. Join documents lacking either key,
    /// or pointing at a missing source document, count as failures.
    pub fn index_using_secondary_database(
        &self,
        repository: Arc<dyn DocumentRepository>,
        policy: &IndexPolicy,
        join: &JoinSpec,
        delete_existing: bool,
    ) -> Result<IndexReport> {
        let start = Instant::now();
        policy.validate()?;
        let analyzer = self.analyzers.resolve(&policy.analyzer)?;
        let handle = self.store.open(policy.index_name())?;

        let mut report = IndexReport::new(policy.index_name());
        let batches = DocumentBatches::new(
            repository.clone(),
            join.join_database.clone(),
            self.config.batch_size,
        );
        for batch in batches {
            let batch = batch?;
            let mut composed = Vec::with_capacity(batch.len());
            for link in &batch {
                match compose_joined(repository.as_ref(), policy, join, link) {
                    Ok(document) => composed.push(document),
                    Err(err) if err.is_persistence() => return Err(err),
                    Err(err) => {
                        log::warn!(
                            "skipping join document {:?} of `{}`: {err}",
                            link.id(),
                            join.join_database
                        );
                        report.total_documents += 1;
                        report.documents_failed += 1;
                    }
                }
            }
            report.absorb(self.write_batch(
                &handle,
                policy,
                &analyzer,
                &composed,
                delete_existing,
            )?);
        }
        report.execution_time = start.elapsed();
        log::info!(
            "indexed {}/{} joined documents from `{}` into `{}`",
            report.documents_indexed,
            report.total_documents,
            join.join_database,
            report.index
        );
        Ok(report)
    }

    /// Re-index the given ids from the policy's database.
    ///
    /// Ids that no longer exist in the repository are removed from the index,
    /// including entries indexed under a custom id field.
    pub fn update_using_primary_database(
        &self,
        repository: Arc<dyn DocumentRepository>,
        policy: &IndexPolicy,
        ids: &[String],
    ) -> Result<IndexReport> {
        let start = Instant::now();
        let documents = repository.get_documents(&policy.id, ids)?;
        let mut report = self.update_documents(policy, &documents)?;

        let found: Vec<&str> = documents.iter().filter_map(Document::id).collect();
        let vanished: Vec<String> = ids
            .iter()
            .filter(|id| !found.contains(&id.as_str()))
            .cloned()
            .collect();
        if !vanished.is_empty() {
            report.documents_deleted += self.delete_sources(policy.index_name(), &vanished)?;
        }
        report.execution_time = start.elapsed();
        Ok(report)
    }

    /// Replace the entries of the given documents.
    pub fn update_documents(&self, policy: &IndexPolicy, documents: &[Document]) -> Result<IndexReport> {
        self.index(policy, std::iter::once(Ok(documents.to_vec())), true)
    }

    /// Remove the entries indexed under `ids`; returns how many were removed.
    pub fn delete_documents(&self, index: &str, ids: &[String]) -> Result<usize> {
        let handle = self.store.get(index)?;
        let mut index = handle.write()?;
        let removed = ids.iter().map(|id| index.delete(id)).sum();
        log::debug!("deleted {removed} entries from `{}`", handle.name());
        Ok(removed)
    }

    /// Remove the entries built from the repository documents `ids`, whatever
    /// ids they were indexed under; returns how many were removed.
    pub fn delete_sources(&self, index: &str, ids: &[String]) -> Result<usize> {
        let handle = self.store.get(index)?;
        let mut index = handle.write()?;
        let removed = ids.iter().map(|id| index.delete_source(id)).sum();
        log::debug!("deleted {removed} entries of vanished documents from `{}`", handle.name());
        Ok(removed)
    }

    /// Map one document to an index entry under `policy`.
    pub fn transform(&self, policy: &IndexPolicy, document: &Document) -> Result<IndexEntry> {
        let analyzer = self.analyzers.resolve(&policy.analyzer)?;
        transform_document(policy, analyzer.as_ref(), document)
    }

    fn write_batch(
        &self,
        handle: &IndexHandle,
        policy: &IndexPolicy,
        analyzer: &Arc<dyn Analyzer>,
        documents: &[Document],
        delete_existing: bool,
    ) -> Result<IndexReport> {
        let entries: Vec<Result<IndexEntry>> = if self.config.parallel {
            documents
                .par_iter()
                .map(|document| transform_document(policy, analyzer.as_ref(), document))
                .collect()
        } else {
            documents
                .iter()
                .map(|document| transform_document(policy, analyzer.as_ref(), document))
                .collect()
        };

        let mut report = IndexReport::new(handle.name());
        report.total_documents = documents.len();

        // held for one batch at a time so readers interleave between batches
        let mut index = handle.write()?;
        for (document, entry) in documents.iter().zip(entries) {
            match entry {
                Ok(entry) => {
                    if delete_existing {
                        report.documents_deleted += index.delete(&entry.id);
                        // a changed custom id leaves the old entry under another id
                        if let Some(source) = &entry.source_id {
                            report.documents_deleted += index.delete_source(source);
                        }
                    }
                    index.add(entry);
                    report.documents_indexed += 1;
                }
                Err(err) => {
                    log::warn!(
                        "skipping document {:?} of `{}`: {err}",
                        document.id(),
                        document.database()
                    );
                    report.documents_failed += 1;
                }
            }
        }
        Ok(report)
    }
}

fn compose_joined(
    repository: &dyn DocumentRepository,
    policy: &IndexPolicy,
    join: &JoinSpec,
    link: &Document,
) -> Result<Document> {
    let key = |field: &str| {
        link.get(field).and_then(Value::to_text).ok_or_else(|| {
            FathomError::transform(format!("join document has no `{field}` key"))
        })
    };
    let source_id = key(&join.source_id_field)?;
    let index_id = key(&join.index_id_field)?;

    let source = match repository.get_document(&join.source_database, &source_id) {
        Ok(source) => source,
        Err(err) if err.is_not_found() => {
            return Err(FathomError::transform(format!(
                "source document `{}/{source_id}` is missing",
                join.source_database
            )));
        }
        Err(err) => return Err(err),
    };

    let mut builder = Document::builder().database(policy.id.clone()).id(index_id);
    for (name, value) in source.attributes() {
        builder = builder.put(name.clone(), value.clone())?;
    }
    for (name, value) in link.attributes() {
        if !source.contains(name) {
            builder = builder.put(name.clone(), value.clone())?;
        }
    }
    builder.build()
}

pub(crate) fn transform_document(
    policy: &IndexPolicy,
    analyzer: &dyn Analyzer,
    document: &Document,
) -> Result<IndexEntry> {
    let id = match &policy.custom_id_field {
        Some(field) => document.get(field).and_then(Value::to_text).ok_or_else(|| {
            FathomError::transform(format!("document has no id field `{field}`"))
        })?,
        None => document
            .id()
            .map(str::to_string)
            .ok_or_else(|| FathomError::transform("document has no id"))?,
    };

    let mut entry = IndexEntry {
        id,
        source_id: document.id().map(str::to_string),
        score: policy.score,
        owner: policy.owner.clone(),
        ..Default::default()
    };
    let mut latitude = None;
    let mut longitude = None;

    for field in policy.fields() {
        let mut values = field_values(document, field)?;
        if values.is_empty() {
            continue;
        }

        if field.is_spatial() {
            let coordinate = coordinate(field, &values[0])?;
            if field.spatial_latitude {
                latitude = Some(coordinate);
            } else {
                longitude = Some(coordinate);
            }
        } else {
            let texts = field_texts(field, &values);
            let terms = field_terms(field, analyzer, &texts)?;
            if policy.add_to_dictionary && field.analyze {
                entry
                    .dictionary_terms
                    .extend(texts.iter().flat_map(|text| surface_words(text)));
            }
            if !terms.is_empty() {
                entry.fields.push(FieldTerms {
                    field: field.name.clone(),
                    terms,
                    boost: policy.boost * field.boost,
                });
            }
        }

        if field.store_in_index {
            let stored = if values.len() == 1 {
                values.swap_remove(0)
            } else {
                Value::List(values)
            };
            entry.stored.insert(field.stored_name().to_string(), stored);
        }
    }

    if let (Some(lat), Some(lng)) = (latitude, longitude) {
        entry.location = Some(GeoPoint::new(lat, lng).map_err(|err| {
            FathomError::transform(format!("invalid location: {err}"))
        })?);
    }

    if let Some(field) = &policy.timestamp_field
        && let Some(value) = document.get(field)
    {
        entry.timestamp = Some(parse_timestamp(field, value)?);
    }

    if let Some(field) = &policy.custom_sort_field {
        entry.sort_value = document
            .get(field)
            .filter(|value| value.to_text().is_some())
            .cloned();
    }

    Ok(entry)
}

/// Text of each value, HTML-stripped when the field asks for it.
fn field_texts(field: &Field, values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::to_text)
        .map(|text| {
            if field.html_strip {
                HtmlStripCharFilter::new().filter(&text)
            } else {
                text
            }
        })
        .collect()
}

fn field_terms(field: &Field, analyzer: &dyn Analyzer, texts: &[String]) -> Result<Vec<String>> {
    let mut terms = Vec::new();
    for text in texts {
        if field.analyze {
            terms.extend(analyzer.terms(text)?);
        } else {
            let exact = text.trim();
            if !exact.is_empty() {
                terms.push(exact.to_string());
            }
        }
    }
    Ok(terms)
}

fn coordinate(field: &Field, value: &Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        FathomError::transform(format!(
            "coordinate field `{}` holds non-numeric {}",
            field.name,
            value.kind()
        ))
    })
}

/// Accepts epoch seconds, RFC 3339 timestamps and `YYYY-MM-DD` dates.
pub(crate) fn parse_timestamp(field: &str, value: &Value) -> Result<DateTime<Utc>> {
    let invalid = || FathomError::transform(format!("field `{field}` holds no valid timestamp"));
    match value {
        Value::Integer(secs) => Utc.timestamp_opt(*secs, 0).single().ok_or_else(invalid),
        Value::Float(secs) => Utc
            .timestamp_opt(secs.trunc() as i64, 0)
            .single()
            .ok_or_else(invalid),
        Value::String(text) => {
            let text = text.trim();
            if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                return Ok(parsed.with_timezone(&Utc));
            }
            if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
                return date
                    .and_hms_opt(0, 0, 0)
                    .map(|naive| naive.and_utc())
                    .ok_or_else(invalid);
            }
            let secs: i64 = text.parse().map_err(|_| invalid())?;
            Utc.timestamp_opt(secs, 0).single().ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}
