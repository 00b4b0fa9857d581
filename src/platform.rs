//! The assembled search platform.

use std::sync::Arc;

use crate::analysis::analyzer::registry::AnalyzerRegistry;
use crate::cache::CacheRegistry;
use crate::config::{ConfigurationRepository, PlatformConfig};
use crate::document::Document;
use crate::error::Result;
use crate::index::IndexStore;
use crate::indexing::{IndexReport, IndexingEngine, JoinSpec};
use crate::policy::QueryPolicy;
use crate::repository::{DocumentRepository, RepositoryFactory};
use crate::search::{QueryCriteria, QueryEngine, SearchResults};

/// Owns every component built from a [`PlatformConfig`] and ties policy
/// lookup to indexing and search.
///
/// ```
/// use fathom::config::PlatformConfig;
/// use fathom::platform::SearchPlatform;
/// use fathom::policy::{Field, IndexPolicy};
/// use fathom::document::Document;
/// use fathom::search::QueryCriteria;
///
/// let platform = SearchPlatform::new(PlatformConfig::default()).unwrap();
/// let policy = IndexPolicy::new("notes").with_field(Field::new("body")).unwrap();
/// platform.configuration().save_index_policy(&policy).unwrap();
///
/// let repo = platform.repository();
/// repo.create_database("notes").unwrap();
/// let note = Document::builder()
///     .database("notes")
///     .id("n1")
///     .put("body", "buy more coffee")
///     .unwrap()
///     .build()
///     .unwrap();
/// repo.save_document(&note, false).unwrap();
///
/// platform.index_database("notes", true).unwrap();
/// let hits = platform
///     .search("notes", "notes", &QueryCriteria::keywords("coffee"), false, 0, 10)
///     .unwrap();
/// assert_eq!(hits.ids(), vec!["n1"]);
/// ```
#[derive(Debug)]
pub struct SearchPlatform {
    config: PlatformConfig,
    repository: Arc<dyn DocumentRepository>,
    caches: CacheRegistry,
    configuration: ConfigurationRepository,
    store: Arc<IndexStore>,
    indexing: IndexingEngine,
    query: QueryEngine,
}

impl SearchPlatform {
    pub fn new(config: PlatformConfig) -> Result<Self> {
        config.validate()?;
        let repository = RepositoryFactory::create(&config.repository)?;
        let caches = CacheRegistry::new();
        let configuration =
            ConfigurationRepository::new(repository.clone(), &config.cache, &caches);

        let analyzers = Arc::new(AnalyzerRegistry::with_default(config.default_analyzer.as_str()));
        // fail at startup rather than on the first index run
        analyzers.get(&config.default_analyzer)?;

        let store = Arc::new(IndexStore::new());
        let indexing =
            IndexingEngine::with_config(store.clone(), analyzers.clone(), config.indexing.clone());
        let query = QueryEngine::with_config(store.clone(), analyzers, config.search.clone());

        log::info!(
            "search platform started with default analyzer `{}`",
            config.default_analyzer
        );
        Ok(SearchPlatform {
            config,
            repository,
            caches,
            configuration,
            store,
            indexing,
            query,
        })
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<dyn DocumentRepository> {
        &self.repository
    }

    pub fn configuration(&self) -> &ConfigurationRepository {
        &self.configuration
    }

    pub fn indexes(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub fn indexing(&self) -> &IndexingEngine {
        &self.indexing
    }

    pub fn query_engine(&self) -> &QueryEngine {
        &self.query
    }

    /// Index the database named `policy_id` under the stored index policy
    /// of the same id.
    pub fn index_database(&self, policy_id: &str, delete_existing: bool) -> Result<IndexReport> {
        let policy = self.configuration.get_index_policy(policy_id)?;
        self.indexing
            .index_using_primary_database(self.repository.clone(), &policy, delete_existing)
    }

    /// Index documents composed through a join database.
    pub fn index_joined(
        &self,
        policy_id: &str,
        join: &JoinSpec,
        delete_existing: bool,
    ) -> Result<IndexReport> {
        let policy = self.configuration.get_index_policy(policy_id)?;
        self.indexing.index_using_secondary_database(
            self.repository.clone(),
            &policy,
            join,
            delete_existing,
        )
    }

    /// Re-index `ids` from the policy's database.
    pub fn update_documents(&self, policy_id: &str, ids: &[String]) -> Result<IndexReport> {
        let policy = self.configuration.get_index_policy(policy_id)?;
        self.indexing
            .update_using_primary_database(self.repository.clone(), &policy, ids)
    }

    /// Search under stored policies. A missing query policy means every
    /// indexed field is searched with boost 1.
    pub fn search(
        &self,
        index_policy_id: &str,
        query_policy_id: &str,
        criteria: &QueryCriteria,
        include_suggestions: bool,
        start: usize,
        limit: usize,
    ) -> Result<SearchResults> {
        let index_policy = self.configuration.get_index_policy(index_policy_id)?;
        let query_policy = match self.configuration.get_query_policy(query_policy_id) {
            Ok(policy) => policy,
            Err(err) if err.is_not_found() => {
                log::debug!("no query policy `{query_policy_id}`, querying all fields");
                QueryPolicy::new(query_policy_id)
            }
            Err(err) => return Err(err),
        };
        self.query.search(
            criteria,
            &index_policy,
            &query_policy,
            include_suggestions,
            start,
            limit,
        )
    }

    /// Autocomplete values through a stored lookup policy.
    pub fn lookup(
        &self,
        index_policy_id: &str,
        lookup_policy_id: &str,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        let index_policy = self.configuration.get_index_policy(index_policy_id)?;
        let lookup_policy = self.configuration.get_lookup_policy(lookup_policy_id)?;
        self.query.lookup(&index_policy, &lookup_policy, prefix, limit)
    }

    /// Fetch the source documents of `results` from `database`, in rank
    /// order. Hits whose document has since been deleted are skipped.
    pub fn hydrate(&self, database: &str, results: &SearchResults) -> Result<Vec<Document>> {
        let ids: Vec<String> = results.docs.iter().map(|doc| doc.id.clone()).collect();
        self.repository.get_documents(database, &ids)
    }

    /// Clear every policy cache.
    pub fn flush_caches(&self) {
        self.caches.flush_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Field, IndexPolicy, QueryField};

    fn platform_with_books() -> SearchPlatform {
        let platform = SearchPlatform::new(PlatformConfig::default()).unwrap();
        let policy = IndexPolicy::new("books")
            .with_field(Field::new("title").with_boost(2.0))
            .unwrap()
            .with_field(Field::new("summary"))
            .unwrap();
        platform.configuration().save_index_policy(&policy).unwrap();

        let repo = platform.repository();
        repo.create_database("books").unwrap();
        for (id, title, summary) in [
            ("dune", "Dune", "a desert planet and its spice"),
            ("sands", "Children of the Sands", "dune seas of the desert"),
        ] {
            let doc = Document::builder()
                .database("books")
                .id(id)
                .put("title", title)
                .unwrap()
                .put("summary", summary)
                .unwrap()
                .build()
                .unwrap();
            repo.save_document(&doc, false).unwrap();
        }
        platform.index_database("books", true).unwrap();
        platform
    }

    #[test]
    fn test_search_without_query_policy_uses_all_fields() {
        let platform = platform_with_books();
        let results = platform
            .search("books", "books", &QueryCriteria::keywords("desert"), false, 0, 10)
            .unwrap();
        assert_eq!(results.total_hits, 2);
    }

    #[test]
    fn test_search_with_query_policy() {
        let platform = platform_with_books();
        let query = QueryPolicy::new("titles").with_field(QueryField::new("title"));
        platform.configuration().save_query_policy(&query).unwrap();

        let results = platform
            .search("books", "titles", &QueryCriteria::keywords("dune"), false, 0, 10)
            .unwrap();
        assert_eq!(results.ids(), vec!["dune"]);
    }

    #[test]
    fn test_hydrate_returns_source_documents() {
        let platform = platform_with_books();
        let results = platform
            .search("books", "books", &QueryCriteria::match_all(), false, 0, 10)
            .unwrap();
        let docs = platform.hydrate("books", &results).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|doc| doc.contains("summary")));
    }

    #[test]
    fn test_unknown_index_policy() {
        let platform = SearchPlatform::new(PlatformConfig::default()).unwrap();
        let err = platform.index_database("nothing", true).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unknown_default_analyzer_rejected() {
        let config = PlatformConfig {
            default_analyzer: "klingon".to_string(),
            ..PlatformConfig::default()
        };
        assert!(SearchPlatform::new(config).is_err());
    }

    #[test]
    fn test_flush_caches() {
        let platform = platform_with_books();
        platform.flush_caches();
        assert!(platform.configuration().get_index_policy("books").is_ok());
    }
}
