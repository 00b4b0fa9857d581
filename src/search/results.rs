//! Ranked hits returned by the query engine.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::document::Value;
use crate::index::DocNumber;

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchDoc {
    /// Position of the document in its index.
    pub doc_number: DocNumber,
    pub id: String,
    pub score: f32,
    /// Stored values, filled for detailed searches only.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
}

/// One page of ranked hits.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub docs: Vec<SearchDoc>,
    /// Hits across all pages.
    pub total_hits: usize,
    /// Did-you-mean rewrite of the keywords, when one was requested and found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Ids of this page's hits, in rank order.
    pub fn ids(&self) -> Vec<&str> {
        self.docs.iter().map(|doc| doc.id.as_str()).collect()
    }

    /// Highest score on this page.
    pub fn max_score(&self) -> f32 {
        self.docs.iter().map(|doc| doc.score).fold(0.0, f32::max)
    }
}
