//! In-memory inverted index.
//!
//! Documents are numbered in insertion order. Deleting a document removes its
//! postings immediately and leaves a tombstone in its slot, so document
//! numbers are never reused and "higher number" always means "indexed later".

use std::collections::BTreeMap;

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::document::Value;
use crate::index::payload::{Payload, TermPayload};
use crate::index::spatial::GeoPoint;
use crate::spelling::SpellingDictionary;

/// Position of a document in its index.
pub type DocNumber = u32;

/// One occurrence list entry: a document containing a term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
    pub doc: DocNumber,
    /// Occurrences of the term in the field.
    pub frequency: u32,
    pub payload: Payload,
}

/// Analyzed terms of one field of one document.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTerms {
    pub field: String,
    pub terms: Vec<String>,
    /// Effective boost recorded in the postings' payload.
    pub boost: f32,
}

/// A fully transformed document, ready to be added to an index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexEntry {
    pub id: String,
    /// Id of the repository document the entry was built from; differs
    /// from `id` when the policy takes ids from a custom field.
    pub source_id: Option<String>,
    pub fields: Vec<FieldTerms>,
    /// Raw values returned with detailed results, keyed by stored name.
    pub stored: BTreeMap<String, Value>,
    pub score: i64,
    pub timestamp: Option<DateTime<Utc>>,
    pub owner: String,
    pub location: Option<GeoPoint>,
    /// Value "always match" queries order by.
    pub sort_value: Option<Value>,
    /// Terms to feed into the index dictionary.
    pub dictionary_terms: Vec<String>,
}

/// What an index remembers about a live document.
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub id: String,
    pub source_id: Option<String>,
    pub stored: BTreeMap<String, Value>,
    pub score: i64,
    pub timestamp: Option<DateTime<Utc>>,
    pub owner: String,
    pub location: Option<GeoPoint>,
    pub sort_value: Option<Value>,
    field_lengths: AHashMap<String, u32>,
    keys: Vec<(String, String)>,
}

impl IndexedDocument {
    /// Number of terms indexed for `field`, 0 when absent.
    pub fn field_length(&self, field: &str) -> u32 {
        self.field_lengths.get(field).copied().unwrap_or(0)
    }
}

/// Summary numbers of one index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub name: String,
    pub doc_count: usize,
    pub deleted_count: usize,
    pub field_count: usize,
    pub term_count: usize,
    pub dictionary_size: usize,
    pub open: bool,
}

/// Terms → postings, per field, plus per-document metadata.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    fields: AHashMap<String, AHashMap<String, Vec<Posting>>>,
    docs: Vec<Option<IndexedDocument>>,
    ids: AHashMap<String, Vec<DocNumber>>,
    live: usize,
    dictionary: SpellingDictionary,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document and return its number. An existing document with the
    /// same id is kept; use [`delete`](Self::delete) first to replace it.
    pub fn add(&mut self, entry: IndexEntry) -> DocNumber {
        let doc = self.docs.len() as DocNumber;
        let mut field_lengths = AHashMap::new();
        let mut keys = Vec::new();

        for field_terms in &entry.fields {
            let mut frequencies: BTreeMap<&str, u32> = BTreeMap::new();
            for term in &field_terms.terms {
                *frequencies.entry(term.as_str()).or_insert(0) += 1;
            }
            *field_lengths.entry(field_terms.field.clone()).or_insert(0) +=
                field_terms.terms.len() as u32;

            let payload = TermPayload::new(field_terms.boost, entry.score).encode();
            let terms = self.fields.entry(field_terms.field.clone()).or_default();
            for (term, frequency) in frequencies {
                let postings = terms.entry(term.to_string()).or_default();
                // same field listed twice for one document: merge
                if let Some(last) = postings.last_mut().filter(|p| p.doc == doc) {
                    last.frequency += frequency;
                    continue;
                }
                postings.push(Posting {
                    doc,
                    frequency,
                    payload,
                });
                keys.push((field_terms.field.clone(), term.to_string()));
            }
        }

        if let Some(location) = entry.location {
            let payload = TermPayload::new(1.0, entry.score).encode();
            for cell in location.cells() {
                self.fields
                    .entry(cell.field())
                    .or_default()
                    .entry(cell.term())
                    .or_default()
                    .push(Posting {
                        doc,
                        frequency: 1,
                        payload,
                    });
                keys.push((cell.field(), cell.term()));
            }
        }

        for term in &entry.dictionary_terms {
            self.dictionary.increment_word(term);
        }

        self.ids.entry(entry.id.clone()).or_default().push(doc);
        self.docs.push(Some(IndexedDocument {
            id: entry.id,
            source_id: entry.source_id,
            stored: entry.stored,
            score: entry.score,
            timestamp: entry.timestamp,
            owner: entry.owner,
            location: entry.location,
            sort_value: entry.sort_value,
            field_lengths,
            keys,
        }));
        self.live += 1;
        doc
    }

    /// Remove every document indexed under `id`; returns how many were removed.
    pub fn delete(&mut self, id: &str) -> usize {
        let Some(numbers) = self.ids.remove(id) else {
            return 0;
        };
        numbers
            .into_iter()
            .filter(|doc| self.remove(*doc).is_some())
            .count()
    }

    /// Remove every document built from repository document `source`,
    /// whatever id it was indexed under; returns how many were removed.
    pub fn delete_source(&mut self, source: &str) -> usize {
        let numbers: Vec<DocNumber> = self
            .documents()
            .filter(|(_, indexed)| indexed.source_id.as_deref() == Some(source))
            .map(|(doc, _)| doc)
            .collect();
        let mut removed = 0;
        for doc in numbers {
            let Some(indexed) = self.remove(doc) else {
                continue;
            };
            if let Some(numbers) = self.ids.get_mut(&indexed.id) {
                numbers.retain(|n| *n != doc);
                if numbers.is_empty() {
                    self.ids.remove(&indexed.id);
                }
            }
            removed += 1;
        }
        removed
    }

    /// Tombstone `doc` and drop its postings. The id map is left to the caller.
    fn remove(&mut self, doc: DocNumber) -> Option<IndexedDocument> {
        let indexed = self.docs.get_mut(doc as usize).and_then(Option::take)?;
        for (field, term) in &indexed.keys {
            let Some(terms) = self.fields.get_mut(field) else {
                continue;
            };
            if let Some(postings) = terms.get_mut(term) {
                postings.retain(|p| p.doc != doc);
                if postings.is_empty() {
                    terms.remove(term);
                }
            }
            if terms.is_empty() {
                self.fields.remove(field);
            }
        }
        self.live -= 1;
        Some(indexed)
    }

    /// Drop all documents, postings and dictionary entries.
    pub fn clear(&mut self) {
        *self = InvertedIndex::default();
    }

    /// Live documents.
    pub fn num_docs(&self) -> usize {
        self.live
    }

    /// Slots ever allocated, including tombstones.
    pub fn max_doc(&self) -> DocNumber {
        self.docs.len() as DocNumber
    }

    pub fn doc_freq(&self, field: &str, term: &str) -> usize {
        self.postings(field, term).len()
    }

    /// Postings of `term` in `field`, ordered by document number.
    pub fn postings(&self, field: &str, term: &str) -> &[Posting] {
        self.fields
            .get(field)
            .and_then(|terms| terms.get(term))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn document(&self, doc: DocNumber) -> Option<&IndexedDocument> {
        self.docs.get(doc as usize).and_then(Option::as_ref)
    }

    /// Live documents in ascending number order.
    pub fn documents(&self) -> impl Iterator<Item = (DocNumber, &IndexedDocument)> {
        self.docs
            .iter()
            .enumerate()
            .filter_map(|(doc, slot)| slot.as_ref().map(|d| (doc as DocNumber, d)))
    }

    /// Numbers of the live documents indexed under `id`.
    pub fn doc_numbers(&self, id: &str) -> &[DocNumber] {
        self.ids.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_id(&self, id: &str) -> bool {
        !self.doc_numbers(id).is_empty()
    }

    /// Terms of `field` starting with `prefix`.
    pub fn terms_with_prefix<'a>(
        &'a self,
        field: &str,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .get(field)
            .into_iter()
            .flat_map(|terms| terms.keys())
            .filter(move |term| term.starts_with(prefix))
            .map(String::as_str)
    }

    pub fn dictionary(&self) -> &SpellingDictionary {
        &self.dictionary
    }

    pub fn stats(&self, name: &str, open: bool) -> IndexStats {
        IndexStats {
            name: name.to_string(),
            doc_count: self.live,
            deleted_count: self.docs.len() - self.live,
            field_count: self.fields.keys().filter(|f| !f.starts_with("_tier_")).count(),
            term_count: self
                .fields
                .iter()
                .filter(|(f, _)| !f.starts_with("_tier_"))
                .map(|(_, terms)| terms.len())
                .sum(),
            dictionary_size: self.dictionary.word_count(),
            open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::payload::TermPayload;

    fn entry(id: &str, title: &[&str], boost: f32) -> IndexEntry {
        IndexEntry {
            id: id.to_string(),
            fields: vec![FieldTerms {
                field: "title".to_string(),
                terms: title.iter().map(|t| t.to_string()).collect(),
                boost,
            }],
            owner: "all".to_string(),
            dictionary_terms: title.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_and_postings() {
        let mut index = InvertedIndex::new();
        let a = index.add(IndexEntry {
            score: 42,
            ..entry("a", &["rust", "search", "rust"], 2.0)
        });
        let b = index.add(entry("b", &["search"], 1.0));

        assert_eq!((a, b), (0, 1));
        assert_eq!(index.num_docs(), 2);
        assert_eq!(index.doc_freq("title", "search"), 2);

        let rust = index.postings("title", "rust");
        assert_eq!(rust.len(), 1);
        assert_eq!(rust[0].frequency, 2);
        assert_eq!(
            TermPayload::decode(&rust[0].payload).unwrap(),
            TermPayload::new(2.0, 42)
        );
        let search = index.postings("title", "search");
        assert_eq!(TermPayload::decode(&search[1].payload).unwrap().score, 0);
        assert_eq!(index.document(a).unwrap().field_length("title"), 3);
        assert_eq!(index.dictionary().frequency("search"), 2);
    }

    #[test]
    fn test_delete_leaves_tombstone() {
        let mut index = InvertedIndex::new();
        index.add(entry("a", &["rust"], 1.0));
        index.add(entry("a", &["rust", "fast"], 1.0));
        index.add(entry("b", &["fast"], 1.0));

        assert_eq!(index.delete("a"), 2);
        assert_eq!(index.delete("a"), 0);
        assert_eq!(index.num_docs(), 1);
        assert_eq!(index.max_doc(), 3);
        assert!(index.postings("title", "rust").is_empty());
        assert_eq!(index.doc_freq("title", "fast"), 1);
        assert!(index.document(0).is_none());

        // numbers keep growing after deletes
        assert_eq!(index.add(entry("a", &["rust"], 1.0)), 3);
        let stats = index.stats("books", true);
        assert_eq!(stats.doc_count, 2);
        assert_eq!(stats.deleted_count, 2);
    }

    #[test]
    fn test_delete_source_follows_custom_ids() {
        let mut index = InvertedIndex::new();
        index.add(IndexEntry {
            source_id: Some("b1".to_string()),
            ..entry("isbn-1", &["dune"], 1.0)
        });
        index.add(IndexEntry {
            source_id: Some("b2".to_string()),
            ..entry("isbn-2", &["emma"], 1.0)
        });
        index.add(IndexEntry {
            source_id: Some("b3".to_string()),
            ..entry("isbn-2", &["emma", "reissue"], 1.0)
        });

        assert_eq!(index.delete("b2"), 0);
        assert_eq!(index.delete_source("b2"), 1);
        assert_eq!(index.delete_source("b2"), 0);
        assert_eq!(index.doc_numbers("isbn-2"), &[2]);
        assert_eq!(index.doc_freq("title", "emma"), 1);
        assert_eq!(index.num_docs(), 2);

        assert_eq!(index.delete_source("b3"), 1);
        assert!(!index.contains_id("isbn-2"));
        assert!(index.contains_id("isbn-1"));
    }

    #[test]
    fn test_location_cells_indexed() {
        let mut index = InvertedIndex::new();
        let point = GeoPoint::new(48.8566, 2.3522).unwrap();
        let doc = index.add(IndexEntry {
            id: "paris".to_string(),
            score: 5,
            location: Some(point),
            ..Default::default()
        });

        let cell = point.cell(10);
        let posting = index.postings(&cell.field(), &cell.term())[0];
        assert_eq!(posting.doc, doc);
        assert_eq!(TermPayload::decode(&posting.payload).unwrap(), TermPayload::new(1.0, 5));
        assert_eq!(index.stats("geo", true).field_count, 0);

        index.delete("paris");
        assert!(index.postings(&cell.field(), &cell.term()).is_empty());
    }

    #[test]
    fn test_terms_with_prefix() {
        let mut index = InvertedIndex::new();
        index.add(entry("a", &["search", "seal", "index"], 1.0));
        let mut terms: Vec<_> = index.terms_with_prefix("title", "sea").collect();
        terms.sort();
        assert_eq!(terms, vec!["seal", "search"]);
    }
}
