//! Query engine: ranked, paginated retrieval over an index.

use std::cmp::Ordering;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::registry::AnalyzerRegistry;
use crate::document::Value;
use crate::error::{FathomError, Result};
use crate::index::spatial::covering_cells;
use crate::index::{DistanceUnit, DocNumber, GeoPoint, IndexedDocument, InvertedIndex, IndexStore};
use crate::indexing::engine::parse_timestamp;
use crate::policy::index_policy::DEFAULT_OWNER;
use crate::policy::{IndexPolicy, LookupPolicy, QueryPolicy, ValueType};
use crate::search::criteria::{QueryCriteria, SpatialFilter};
use crate::search::results::{SearchDoc, SearchResults};
use crate::search::similarity::{ClassicSimilarity, Similarity};
use crate::spelling::{SuggestionConfig, SuggestionEngine, surface_words};

/// Upper bound on the page size of a single query.
pub const DEFAULT_MAX_LIMIT: usize = 2048;

/// Configuration for search operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Requested limits above this are lowered to it.
    pub max_limit: usize,
    /// Suggestions are computed when a query has at most this many hits.
    pub suggestion_threshold: usize,
    /// Candidates considered per misspelled word.
    pub max_suggestions: usize,
    /// Unit of spatial radii that do not name one.
    pub distance_unit: DistanceUnit,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_limit: DEFAULT_MAX_LIMIT,
            suggestion_threshold: 0,
            max_suggestions: 5,
            distance_unit: DistanceUnit::Miles,
        }
    }
}

/// Executes [`QueryCriteria`] against the indexes of an [`IndexStore`].
///
/// Each query works on a read snapshot of one index; indexing runs against the
/// same index wait for it and vice versa.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: Arc<IndexStore>,
    analyzers: Arc<AnalyzerRegistry>,
    similarity: Arc<dyn Similarity>,
    config: SearchConfig,
}

/// Field searched by a keyword query.
struct QueriedField<'a> {
    name: &'a str,
    boost: f32,
    analyzed: bool,
}

#[derive(Default)]
struct Accumulator {
    sum: f32,
    /// Document score decoded from the matched postings.
    score: i64,
    matched: usize,
    exact: bool,
}

struct Ranked<'a> {
    doc: DocNumber,
    score: f32,
    indexed: &'a IndexedDocument,
}

impl QueryEngine {
    pub fn new(store: Arc<IndexStore>, analyzers: Arc<AnalyzerRegistry>) -> Self {
        Self::with_config(store, analyzers, SearchConfig::default())
    }

    pub fn with_config(
        store: Arc<IndexStore>,
        analyzers: Arc<AnalyzerRegistry>,
        config: SearchConfig,
    ) -> Self {
        QueryEngine {
            store,
            analyzers,
            similarity: Arc::new(ClassicSimilarity::new()),
            config,
        }
    }

    /// Replace the term weighting.
    pub fn with_similarity(mut self, similarity: Arc<dyn Similarity>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run `criteria` against the index of `index_policy` and return the
    /// `[start, start + limit)` window of the ranking.
    ///
    /// - match-all returns every document, ordered by the policy's custom
    ///   sort field (descending) and then newest first
    /// - score-only ranks by the indexed document score
    /// - otherwise keywords are OR-ed across the query policy's fields and the
    ///   relevance is scaled by `1 + ln(1 + score)` and the recency decay
    ///
    /// Filters, the spatial circle and the owner partition narrow every mode.
    /// A window past the last hit is empty. `limit` is capped at
    /// [`SearchConfig::max_limit`].
    pub fn search(
        &self,
        criteria: &QueryCriteria,
        index_policy: &IndexPolicy,
        query_policy: &QueryPolicy,
        include_suggestions: bool,
        start: usize,
        limit: usize,
    ) -> Result<SearchResults> {
        criteria.validate()?;
        let limit = limit.min(self.config.max_limit);
        let handle = self.store.get(index_policy.index_name())?;
        let index = handle.read()?;
        let analyzer = self.analyzers.resolve(&index_policy.analyzer)?;

        // None: no restriction yet, every live document is a candidate
        let mut candidates: Option<AHashMap<DocNumber, f32>> = None;
        let keyword_scored = !criteria.match_all && criteria.has_keywords();
        if keyword_scored {
            candidates = Some(self.keyword_relevance(
                &index,
                analyzer.as_ref(),
                &criteria.keywords,
                index_policy,
                query_policy,
            )?);
        }
        for (field, text) in &criteria.filters {
            if let Some(matching) = filter_docs(&index, analyzer.as_ref(), index_policy, field, text)? {
                restrict(&mut candidates, &matching);
            }
        }
        if let Some(spatial) = &criteria.spatial {
            let matching = self.spatial_docs(&index, spatial)?;
            restrict(&mut candidates, &matching);
        }
        let candidates: Vec<(DocNumber, f32)> = match candidates {
            Some(map) => map.into_iter().collect(),
            None => index.documents().map(|(doc, _)| (doc, 1.0)).collect(),
        };

        let owner = criteria.owner.as_deref().filter(|owner| *owner != DEFAULT_OWNER);
        let now = Utc::now();
        let mut hits: Vec<Ranked<'_>> = candidates
            .into_iter()
            .filter_map(|(doc, relevance)| {
                let indexed = index.document(doc)?;
                if let Some(owner) = owner
                    && indexed.owner != owner
                    && indexed.owner != DEFAULT_OWNER
                {
                    return None;
                }
                let decay = match (&criteria.recency, indexed.timestamp) {
                    (Some(recency), Some(timestamp)) => recency.factor_at(timestamp, now) as f32,
                    _ => 1.0,
                };
                let score = if criteria.score_only {
                    indexed.score as f32
                } else if criteria.match_all {
                    decay
                } else if keyword_scored {
                    // keyword relevance already carries the payload score
                    relevance * decay
                } else {
                    relevance * score_factor(indexed.score) * decay
                };
                Some(Ranked {
                    doc,
                    score,
                    indexed,
                })
            })
            .collect();

        let tie_breakers: Vec<(&str, bool)> = query_policy
            .sort_fields()
            .into_iter()
            .map(|field| (stored_name(index_policy, &field.name), field.ascending))
            .collect();
        let by_sort_value = criteria.match_all && !criteria.score_only;
        hits.sort_by(|a, b| {
            let primary = if by_sort_value {
                compare_optional(a.indexed.sort_value.as_ref(), b.indexed.sort_value.as_ref(), false)
            } else {
                b.score.total_cmp(&a.score)
            };
            primary
                .then_with(|| {
                    if by_sort_value {
                        return Ordering::Equal;
                    }
                    tie_breakers.iter().fold(Ordering::Equal, |ord, (name, ascending)| {
                        ord.then_with(|| {
                            compare_optional(
                                a.indexed.stored.get(*name),
                                b.indexed.stored.get(*name),
                                *ascending,
                            )
                        })
                    })
                })
                .then_with(|| b.doc.cmp(&a.doc))
        });

        let total_hits = hits.len();
        let docs: Vec<SearchDoc> = hits
            .into_iter()
            .skip(start)
            .take(limit)
            .map(|hit| SearchDoc {
                doc_number: hit.doc,
                id: hit.indexed.id.clone(),
                score: hit.score,
                fields: if criteria.detailed {
                    hit.indexed.stored.clone()
                } else {
                    Default::default()
                },
            })
            .collect();

        let suggestion = if include_suggestions
            && criteria.has_keywords()
            && total_hits <= self.config.suggestion_threshold
        {
            self.suggest(&index, &criteria.keywords)
        } else {
            None
        };

        log::debug!(
            "search `{}` returned {} of {} hits",
            index_policy.index_name(),
            docs.len(),
            total_hits
        );
        Ok(SearchResults {
            docs,
            total_hits,
            suggestion,
        })
    }

    /// Autocomplete: distinct values of the lookup policy's return field for
    /// documents where a lookup field starts with `prefix`.
    pub fn lookup(
        &self,
        index_policy: &IndexPolicy,
        lookup_policy: &LookupPolicy,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        let limit = limit.min(self.config.max_limit);
        let return_field = lookup_policy.return_field().ok_or_else(|| {
            FathomError::query(format!("lookup policy `{}` has no fields", lookup_policy.id))
        })?;
        if prefix.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let handle = self.store.get(index_policy.index_name())?;
        let index = handle.read()?;
        let analyzer = self.analyzers.resolve(&index_policy.analyzer)?;

        let mut weights: AHashMap<DocNumber, f32> = AHashMap::new();
        for field in lookup_policy.fields.values() {
            let analyzed = index_policy.field(&field.name).is_some_and(|f| f.analyze);
            let matching = if analyzed {
                let mut terms = analyzer.terms(prefix)?;
                let Some(partial) = terms.pop() else {
                    continue;
                };
                let mut matching = prefix_docs(&index, &field.name, &partial);
                for term in &terms {
                    let exact: AHashSet<DocNumber> =
                        index.postings(&field.name, term).iter().map(|p| p.doc).collect();
                    matching.retain(|doc| exact.contains(doc));
                }
                matching
            } else {
                prefix_docs(&index, &field.name, prefix.trim())
            };
            for doc in matching {
                *weights.entry(doc).or_insert(0.0) += field.boost;
            }
        }

        let sort_fields: Vec<(&str, bool, ValueType)> = lookup_policy
            .sort_fields()
            .into_iter()
            .map(|field| (stored_name(index_policy, &field.name), field.ascending, field.value_type))
            .collect();
        let mut ranked: Vec<(DocNumber, f32, &IndexedDocument)> = weights
            .into_iter()
            .filter_map(|(doc, weight)| index.document(doc).map(|indexed| (doc, weight, indexed)))
            .collect();
        ranked.sort_by(|a, b| {
            sort_fields
                .iter()
                .fold(Ordering::Equal, |ord, (name, ascending, value_type)| {
                    ord.then_with(|| {
                        compare_typed(a.2.stored.get(*name), b.2.stored.get(*name), *value_type, *ascending)
                    })
                })
                .then_with(|| b.1.total_cmp(&a.1))
                .then_with(|| b.0.cmp(&a.0))
        });

        let stored = stored_name(index_policy, return_field);
        let mut seen = AHashSet::new();
        let mut values = Vec::new();
        for (_, _, indexed) in ranked {
            let Some(value) = indexed.stored.get(stored) else {
                continue;
            };
            let texts: Vec<String> = match value {
                Value::List(items) => items.iter().filter_map(Value::to_text).collect(),
                other => other.to_text().into_iter().collect(),
            };
            for text in texts {
                if seen.insert(text.clone()) {
                    values.push(text);
                    if values.len() == limit {
                        return Ok(values);
                    }
                }
            }
        }
        Ok(values)
    }

    /// Dictionary terms of an index starting with `prefix`, most frequent first.
    pub fn complete(&self, index: &str, prefix: &str, limit: usize) -> Result<Vec<(String, u32)>> {
        let handle = self.store.get(index)?;
        let index = handle.read()?;
        Ok(index
            .dictionary()
            .complete(&prefix.trim().to_lowercase(), limit.min(self.config.max_limit)))
    }

    fn keyword_relevance(
        &self,
        index: &InvertedIndex,
        analyzer: &dyn Analyzer,
        keywords: &str,
        index_policy: &IndexPolicy,
        query_policy: &QueryPolicy,
    ) -> Result<AHashMap<DocNumber, f32>> {
        let mut terms = analyzer.terms(keywords)?;
        let mut unique = AHashSet::new();
        terms.retain(|term| unique.insert(term.clone()));
        let exact = keywords.trim();

        let fields: Vec<QueriedField<'_>> = if query_policy.fields.is_empty() {
            index_policy
                .fields()
                .filter(|field| !field.is_spatial())
                .map(|field| QueriedField {
                    name: &field.name,
                    boost: 1.0,
                    analyzed: field.analyze,
                })
                .collect()
        } else {
            query_policy
                .fields
                .values()
                .map(|field| QueriedField {
                    name: &field.name,
                    boost: field.boost,
                    analyzed: index_policy.field(&field.name).is_none_or(|f| f.analyze),
                })
                .collect()
        };

        let num_docs = index.num_docs();
        let sim = self.similarity.as_ref();
        let mut accumulators: AHashMap<DocNumber, Accumulator> = AHashMap::new();
        let mut score_term = |field: &str, term: &str, boost: f32| -> Vec<DocNumber> {
            let postings = index.postings(field, term);
            let idf = sim.idf(postings.len(), num_docs);
            let mut docs = Vec::with_capacity(postings.len());
            for posting in postings {
                let length = index
                    .document(posting.doc)
                    .map_or(0, |doc| doc.field_length(field));
                let payload = sim.payload(&posting.payload);
                let score = sim.tf(posting.frequency as f32)
                    * idf
                    * idf
                    * boost
                    * sim.length_norm(length)
                    * payload.boost;
                let acc = accumulators.entry(posting.doc).or_default();
                acc.sum += score;
                acc.score = payload.score;
                docs.push(posting.doc);
            }
            docs
        };

        let mut matched_terms: Vec<(DocNumber, usize)> = Vec::new();
        let mut exact_hits: Vec<DocNumber> = Vec::new();
        for field in &fields {
            if field.analyzed {
                for (position, term) in terms.iter().enumerate() {
                    for doc in score_term(field.name, term, field.boost) {
                        matched_terms.push((doc, position));
                    }
                }
            } else if !exact.is_empty() {
                exact_hits.extend(score_term(field.name, exact, field.boost));
            }
        }

        // a term matched in several fields counts once for coordination
        matched_terms.sort_unstable();
        matched_terms.dedup();
        for (doc, _) in matched_terms {
            if let Some(acc) = accumulators.get_mut(&doc) {
                acc.matched += 1;
            }
        }
        for doc in exact_hits {
            if let Some(acc) = accumulators.get_mut(&doc) {
                acc.exact = true;
            }
        }

        let total = terms.len().max(1);
        Ok(accumulators
            .into_iter()
            .map(|(doc, acc)| {
                let matched = if acc.exact { total } else { acc.matched.min(total) };
                (doc, acc.sum * sim.coord(matched, total) * score_factor(acc.score))
            })
            .collect())
    }

    fn spatial_docs(&self, index: &InvertedIndex, spatial: &SpatialFilter) -> Result<AHashSet<DocNumber>> {
        let center = GeoPoint::new(spatial.latitude, spatial.longitude)
            .map_err(|err| FathomError::query(format!("invalid spatial center: {err}")))?;
        let unit = spatial.unit.unwrap_or(self.config.distance_unit);

        let mut docs: AHashSet<DocNumber> = match covering_cells(&center, spatial.radius, unit) {
            Some(cells) => cells
                .iter()
                .flat_map(|cell| index.postings(&cell.field(), &cell.term()))
                .map(|posting| posting.doc)
                .collect(),
            None => index.documents().map(|(doc, _)| doc).collect(),
        };
        docs.retain(|doc| {
            index
                .document(*doc)
                .and_then(|indexed| indexed.location)
                .is_some_and(|location| location.distance_to(&center, unit) <= spatial.radius)
        });
        Ok(docs)
    }

    /// Correction of the raw keywords against the index dictionary, or
    /// `None` when every word is known.
    fn suggest(&self, index: &InvertedIndex, keywords: &str) -> Option<String> {
        let dictionary = index.dictionary();
        let words = surface_words(keywords);
        if dictionary.is_empty() || words.is_empty() {
            return None;
        }
        let config = SuggestionConfig {
            max_suggestions: self.config.max_suggestions,
            ..Default::default()
        };
        SuggestionEngine::with_config(dictionary, config).suggest_phrase(&words.join(" "))
    }
}

/// Multiplier a document's indexed score applies to its keyword relevance.
pub fn score_factor(score: i64) -> f32 {
    1.0 + (1.0 + score.max(0) as f32).ln()
}

fn stored_name<'a>(index_policy: &'a IndexPolicy, field: &'a str) -> &'a str {
    index_policy.field(field).map_or(field, |f| f.stored_name())
}

/// Documents matching every term of `text` in `field`; `None` when the text
/// analyzes to nothing and so restricts nothing.
fn filter_docs(
    index: &InvertedIndex,
    analyzer: &dyn Analyzer,
    index_policy: &IndexPolicy,
    field: &str,
    text: &str,
) -> Result<Option<AHashSet<DocNumber>>> {
    let policy_field = index_policy.field(field).ok_or_else(|| {
        FathomError::query(format!(
            "filter field `{field}` is not indexed by `{}`",
            index_policy.id
        ))
    })?;
    let terms = if policy_field.analyze {
        analyzer.terms(text)?
    } else {
        vec![text.trim().to_string()]
    };
    let mut terms = terms.iter().filter(|term| !term.is_empty());
    let Some(first) = terms.next() else {
        return Ok(None);
    };
    let mut docs: AHashSet<DocNumber> = index.postings(field, first).iter().map(|p| p.doc).collect();
    for term in terms {
        let next: AHashSet<DocNumber> = index.postings(field, term).iter().map(|p| p.doc).collect();
        docs.retain(|doc| next.contains(doc));
    }
    Ok(Some(docs))
}

fn prefix_docs(index: &InvertedIndex, field: &str, prefix: &str) -> AHashSet<DocNumber> {
    index
        .terms_with_prefix(field, prefix)
        .flat_map(|term| index.postings(field, term))
        .map(|posting| posting.doc)
        .collect()
}

fn restrict(candidates: &mut Option<AHashMap<DocNumber, f32>>, matching: &AHashSet<DocNumber>) {
    match candidates {
        Some(map) => map.retain(|doc, _| matching.contains(doc)),
        None => *candidates = Some(matching.iter().map(|doc| (*doc, 1.0)).collect()),
    }
}

/// Numbers compare numerically, anything else by its text.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.to_text().cmp(&b.to_text()),
    }
}

/// Missing values sort last in either direction.
fn order_by<T>(
    a: Option<T>,
    b: Option<T>,
    ascending: bool,
    cmp: impl Fn(&T, &T) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ord = cmp(&a, &b);
            if ascending { ord } else { ord.reverse() }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_optional(a: Option<&Value>, b: Option<&Value>, ascending: bool) -> Ordering {
    order_by(a, b, ascending, |x, y| compare_values(x, y))
}

fn compare_typed(
    a: Option<&Value>,
    b: Option<&Value>,
    value_type: ValueType,
    ascending: bool,
) -> Ordering {
    match value_type {
        ValueType::Date => {
            let date = |value: Option<&Value>| value.and_then(|v| parse_timestamp("", v).ok());
            order_by(date(a), date(b), ascending, Ord::cmp)
        }
        ValueType::Number => {
            let number = |value: Option<&Value>| value.and_then(Value::as_f64);
            order_by(number(a), number(b), ascending, f64::total_cmp)
        }
        ValueType::String => {
            let text = |value: Option<&Value>| value.and_then(Value::to_text);
            order_by(text(a), text(b), ascending, Ord::cmp)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::document::Document;
    use crate::indexing::IndexingEngine;
    use crate::policy::{Field, LookupField, QueryField};

    struct Fixture {
        indexing: IndexingEngine,
        engine: QueryEngine,
        policy: IndexPolicy,
        query: QueryPolicy,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(IndexStore::new());
        let analyzers = Arc::new(AnalyzerRegistry::new());
        let mut policy = IndexPolicy::new("books")
            .with_field(Field::new("title").with_boost(2.0))
            .unwrap()
            .with_field(Field::new("body"))
            .unwrap()
            .with_field(Field::keyword("genre"))
            .unwrap()
            .with_field(Field::keyword("year"))
            .unwrap();
        policy.add_to_dictionary = true;
        let query = QueryPolicy::new("books")
            .with_field(QueryField::new("title").with_boost(2.0))
            .with_field(QueryField::new("body"))
            .with_field(QueryField::new("genre"))
            .with_field(QueryField::new("year").sorted(1, false));
        Fixture {
            indexing: IndexingEngine::new(store.clone(), analyzers.clone()),
            engine: QueryEngine::new(store, analyzers),
            policy,
            query,
        }
    }

    fn load(fx: &Fixture, docs: serde_json::Value) {
        let docs: Vec<Document> = docs
            .as_array()
            .unwrap()
            .iter()
            .map(|doc| Document::from_json(Some("books"), doc.clone()).unwrap())
            .collect();
        fx.indexing.index(&fx.policy, vec![Ok(docs)], true).unwrap();
    }

    fn library(fx: &Fixture) {
        load(
            fx,
            json!([
                {"_id": "dune", "title": "Dune", "body": "Spice and sand worms on a desert planet", "genre": "scifi", "year": 1965},
                {"_id": "emma", "title": "Emma", "body": "A comedy of manners in a quiet village", "genre": "classic", "year": 1815},
                {"_id": "sands", "title": "Desert Sands", "body": "Travel writing", "genre": "travel", "year": 2001},
                {"_id": "neuro", "title": "Neuromancer", "body": "Cyberspace and the matrix", "genre": "scifi", "year": 1984}
            ]),
        );
    }

    fn ids(results: &SearchResults) -> Vec<&str> {
        results.ids()
    }

    #[test]
    fn test_keyword_hits_and_field_boost() {
        let fx = fixture();
        library(&fx);
        let results = fx
            .engine
            .search(&QueryCriteria::keywords("desert"), &fx.policy, &fx.query, false, 0, 10)
            .unwrap();
        assert_eq!(results.total_hits, 2);
        // the title match carries the higher boost
        assert_eq!(ids(&results), vec!["sands", "dune"]);
    }

    #[test]
    fn test_coordination_prefers_full_matches() {
        let fx = fixture();
        library(&fx);
        let results = fx
            .engine
            .search(&QueryCriteria::keywords("spice matrix worms"), &fx.policy, &fx.query, false, 0, 10)
            .unwrap();
        assert_eq!(ids(&results), vec!["dune", "neuro"]);
    }

    #[test]
    fn test_exact_field_and_filters() {
        let fx = fixture();
        library(&fx);
        let results = fx
            .engine
            .search(&QueryCriteria::keywords("scifi"), &fx.policy, &fx.query, false, 0, 10)
            .unwrap();
        // equal relevance: the query policy sorts by year, descending
        assert_eq!(ids(&results), vec!["neuro", "dune"]);

        let filtered = QueryCriteria::match_all().filter("genre", "scifi").filter("body", "matrix");
        let results = fx.engine.search(&filtered, &fx.policy, &fx.query, false, 0, 10).unwrap();
        assert_eq!(ids(&results), vec!["neuro"]);

        let unknown = QueryCriteria::match_all().filter("isbn", "1");
        assert!(fx.engine.search(&unknown, &fx.policy, &fx.query, false, 0, 10).is_err());
    }

    #[test]
    fn test_match_all_newest_first_and_detailed() {
        let fx = fixture();
        library(&fx);
        let results = fx
            .engine
            .search(&QueryCriteria::match_all().detailed(true), &fx.policy, &fx.query, false, 0, 2)
            .unwrap();
        assert_eq!(results.total_hits, 4);
        assert_eq!(ids(&results), vec!["neuro", "sands"]);
        assert_eq!(results.docs[0].fields.get("title"), Some(&Value::from("Neuromancer")));

        let plain = fx
            .engine
            .search(&QueryCriteria::match_all(), &fx.policy, &fx.query, false, 0, 1)
            .unwrap();
        assert!(plain.docs[0].fields.is_empty());
    }

    #[test]
    fn test_custom_sort_field_orders_match_all() {
        let mut fx = fixture();
        fx.policy.custom_sort_field = Some("year".to_string());
        library(&fx);
        let results = fx
            .engine
            .search(&QueryCriteria::match_all(), &fx.policy, &QueryPolicy::new("books"), false, 0, 10)
            .unwrap();
        assert_eq!(ids(&results), vec!["sands", "neuro", "dune", "emma"]);
    }

    #[test]
    fn test_limit_cap_and_window() {
        let fx = fixture();
        library(&fx);
        let engine = QueryEngine::with_config(
            fx.engine.store.clone(),
            fx.engine.analyzers.clone(),
            SearchConfig {
                max_limit: 3,
                ..Default::default()
            },
        );
        let all = QueryCriteria::match_all();
        assert_eq!(engine.search(&all, &fx.policy, &fx.query, false, 0, 100).unwrap().len(), 3);
        assert_eq!(engine.search(&all, &fx.policy, &fx.query, false, 3, 100).unwrap().len(), 1);
        let past = engine.search(&all, &fx.policy, &fx.query, false, 50, 10).unwrap();
        assert!(past.is_empty());
        assert_eq!(past.total_hits, 4);
    }

    #[test]
    fn test_owner_partition() {
        let fx = fixture();
        library(&fx);
        let mut private = fx.policy.clone();
        private.owner = "alice".to_string();
        let doc = Document::from_json(Some("books"), json!({"_id": "diary", "title": "Desert diary"})).unwrap();
        fx.indexing.index(&private, vec![Ok(vec![doc])], true).unwrap();

        let search = |owner: &str| {
            fx.engine
                .search(&QueryCriteria::keywords("desert").owner(owner), &fx.policy, &fx.query, false, 0, 10)
                .unwrap()
                .total_hits
        };
        assert_eq!(search("alice"), 3);
        assert_eq!(search("bob"), 2);
        assert_eq!(search("all"), 3);
    }

    #[test]
    fn test_recency_decay_reorders() {
        let mut fx = fixture();
        fx.policy.timestamp_field = Some("published".to_string());
        load(
            &fx,
            json!([
                {"_id": "old", "title": "Jazz", "published": "2000-01-01"},
                {"_id": "new", "title": "Jazz", "published": "2020-01-01"}
            ]),
        );
        let reference = chrono::DateTime::parse_from_rfc3339("2020-01-02T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let criteria = QueryCriteria::keywords("jazz")
            .with_recency(crate::search::RecencyDecay::new(30.0).with_floor(0.1).as_of(reference));
        let results = fx.engine.search(&criteria, &fx.policy, &fx.query, false, 0, 10).unwrap();
        assert_eq!(ids(&results), vec!["new", "old"]);
        assert!(results.docs[1].score > 0.0);
    }

    #[test]
    fn test_suggestions() {
        let fx = fixture();
        library(&fx);
        let results = fx
            .engine
            .search(&QueryCriteria::keywords("desrt"), &fx.policy, &fx.query, true, 0, 10)
            .unwrap();
        assert_eq!(results.total_hits, 0);
        assert_eq!(results.suggestion.as_deref(), Some("desert"));

        let without = fx
            .engine
            .search(&QueryCriteria::keywords("desrt"), &fx.policy, &fx.query, false, 0, 10)
            .unwrap();
        assert_eq!(without.suggestion, None);
    }

    #[test]
    fn test_suggestions_use_surface_words_under_stemming() {
        let fx = fixture();
        let mut policy = IndexPolicy::new("shop")
            .with_field(Field::new("title"))
            .unwrap();
        policy.analyzer = "english".to_string();
        policy.add_to_dictionary = true;
        let docs = vec![
            Document::from_json(Some("shop"), json!({"_id": "1", "title": "Running shoes"})).unwrap(),
            Document::from_json(Some("shop"), json!({"_id": "2", "title": "Trail running"})).unwrap(),
        ];
        fx.indexing.index(&policy, vec![Ok(docs)], true).unwrap();
        let query = QueryPolicy::new("shop");

        let results = fx
            .engine
            .search(&QueryCriteria::keywords("runnin shoez"), &policy, &query, true, 0, 10)
            .unwrap();
        assert_eq!(results.total_hits, 0);
        assert_eq!(results.suggestion.as_deref(), Some("running shoes"));

        let completions = fx.engine.complete("shop", "run", 10).unwrap();
        assert_eq!(completions, vec![("running".to_string(), 2)]);
    }

    #[test]
    fn test_closed_index_fails_fast() {
        let fx = fixture();
        library(&fx);
        fx.engine.store.close("books").unwrap();
        let err = fx
            .engine
            .search(&QueryCriteria::match_all(), &fx.policy, &fx.query, false, 0, 10)
            .unwrap_err();
        assert!(matches!(err, FathomError::IndexClosed(_)));
    }

    #[test]
    fn test_lookup_and_complete() {
        let fx = fixture();
        library(&fx);
        let lookup = LookupPolicy::new("books")
            .with_field(LookupField::new("title"))
            .with_field(LookupField::new("year").with_value_type(ValueType::Number).sorted(1, true))
            .returning("title");
        let values = fx.engine.lookup(&fx.policy, &lookup, "des", 10).unwrap();
        assert_eq!(values, vec!["Desert Sands"]);

        let values = fx.engine.lookup(&fx.policy, &lookup, "19", 10).unwrap();
        assert_eq!(values, vec!["Dune", "Neuromancer"]);
        assert!(fx.engine.lookup(&fx.policy, &lookup, " ", 10).unwrap().is_empty());

        let completions = fx.engine.complete("books", "s", 10).unwrap();
        let words: Vec<&str> = completions.iter().map(|(w, _)| w.as_str()).collect();
        assert!(words.contains(&"spice"));
        assert!(words.contains(&"sands"));
    }

    #[test]
    fn test_score_factor() {
        assert_eq!(score_factor(0), 1.0);
        assert_eq!(score_factor(-5), 1.0);
        assert!(score_factor(42) > score_factor(7));
    }

    /// Classic weighting that reads every payload as unscored.
    #[derive(Debug)]
    struct UnscoredPayloads;

    impl Similarity for UnscoredPayloads {
        fn tf(&self, frequency: f32) -> f32 {
            ClassicSimilarity.tf(frequency)
        }

        fn idf(&self, doc_freq: usize, num_docs: usize) -> f32 {
            ClassicSimilarity.idf(doc_freq, num_docs)
        }

        fn length_norm(&self, num_terms: u32) -> f32 {
            ClassicSimilarity.length_norm(num_terms)
        }

        fn coord(&self, matched: usize, total: usize) -> f32 {
            ClassicSimilarity.coord(matched, total)
        }

        fn payload(&self, payload: &[u8]) -> crate::index::payload::TermPayload {
            let decoded = ClassicSimilarity.payload(payload);
            crate::index::payload::TermPayload::new(decoded.boost, 0)
        }

        fn name(&self) -> &'static str {
            "unscored"
        }
    }

    #[test]
    fn test_keyword_ranking_reads_score_from_payload() {
        let fx = fixture();
        let mut low = fx.policy.clone();
        low.score = 7;
        let mut high = fx.policy.clone();
        high.score = 42;
        let doc = |id: &str| {
            Document::from_json(Some("books"), json!({"_id": id, "title": "Dune"})).unwrap()
        };
        fx.indexing.update_documents(&low, &[doc("seven")]).unwrap();
        fx.indexing.update_documents(&high, &[doc("forty-two")]).unwrap();

        let criteria = QueryCriteria::keywords("dune");
        let scored = fx.engine.search(&criteria, &high, &fx.query, false, 0, 10).unwrap();
        assert_eq!(ids(&scored), vec!["forty-two", "seven"]);
        assert!(scored.docs[0].score > scored.docs[1].score);

        let unscored = QueryEngine::new(fx.engine.store.clone(), fx.engine.analyzers.clone())
            .with_similarity(Arc::new(UnscoredPayloads));
        let flat = unscored.search(&criteria, &high, &fx.query, false, 0, 10).unwrap();
        assert_eq!(flat.docs[0].score, flat.docs[1].score);
    }
}
