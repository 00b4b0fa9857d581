//! Cached access to the policies stored in the document repository.

use std::sync::Arc;

use crate::cache::{Cache, CacheConfig, CacheRegistry};
use crate::error::{FathomError, Result};
use crate::policy::{IndexPolicy, LookupPolicy, Policy, QueryPolicy};
use crate::repository::DocumentRepository;

/// A policy together with the revision of the document it was read from.
#[derive(Debug, Clone)]
struct Stored<P> {
    policy: P,
    revision: Option<String>,
}

/// One policy kind: its cache plus the conversions to and from documents.
#[derive(Debug)]
struct PolicyStore<P: Policy> {
    cache: Arc<Cache<String, Stored<P>>>,
}

impl<P: Policy + std::fmt::Debug> PolicyStore<P> {
    fn new(name: &str, config: &CacheConfig, registry: &CacheRegistry) -> Self {
        let cache = Arc::new(Cache::with_config(name, config));
        registry.register(cache.clone());
        PolicyStore { cache }
    }

    /// Cached entry for `id`, loading it on a miss. Absence is cached too.
    fn stored(&self, repository: &dyn DocumentRepository, id: &str) -> Result<Option<Stored<P>>> {
        self.cache.get_or_load(id.to_string(), || {
            match repository.get_document(P::DATABASE, &P::document_id(id)) {
                Ok(document) => Ok(Some(Stored {
                    policy: P::from_document(&document)?,
                    revision: document.revision().map(str::to_string),
                })),
                Err(err) if err.is_not_found() => Ok(None),
                Err(err) => Err(err),
            }
        })
    }

    fn get(&self, repository: &dyn DocumentRepository, id: &str) -> Result<P> {
        self.stored(repository, id)?
            .map(|stored| stored.policy)
            .ok_or_else(|| FathomError::not_found(P::document_id(id)))
    }

    /// Write-through save. The cache is updated before the write and rolled
    /// back if the repository rejects it.
    fn save(&self, repository: &dyn DocumentRepository, policy: &P) -> Result<P> {
        policy.validate()?;
        let id = policy.id().to_string();
        let revision = self.stored(repository, &id)?.and_then(|stored| stored.revision);

        self.cache.put(
            id.clone(),
            Stored {
                policy: policy.clone(),
                revision: revision.clone(),
            },
        );
        let saved = policy
            .to_document(revision.as_deref())
            .and_then(|document| repository.save_document(&document, false))
            .and_then(|saved| P::from_document(&saved).map(|converted| (saved, converted)));
        let (saved, converted) = match saved {
            Ok(saved) => saved,
            Err(err) => {
                self.cache.invalidate(&id);
                return Err(err);
            }
        };

        self.cache.put(
            id,
            Stored {
                policy: converted.clone(),
                revision: saved.revision().map(str::to_string),
            },
        );
        Ok(converted)
    }

    fn delete(&self, repository: &dyn DocumentRepository, id: &str) -> Result<()> {
        let revision = self.stored(repository, id)?.and_then(|stored| stored.revision);
        self.cache.invalidate(&id.to_string());
        repository.delete_document(P::DATABASE, &P::document_id(id), revision.as_deref())
    }
}

/// Reads and writes index, query and lookup policies through a
/// [`DocumentRepository`], with one cache per policy kind.
///
/// Policies live in the `index_policies`, `query_policies` and
/// `lookup_policies` databases under ids such as `index_policy_for_<id>`.
#[derive(Debug)]
pub struct ConfigurationRepository {
    repository: Arc<dyn DocumentRepository>,
    index_policies: PolicyStore<IndexPolicy>,
    query_policies: PolicyStore<QueryPolicy>,
    lookup_policies: PolicyStore<LookupPolicy>,
}

impl ConfigurationRepository {
    /// Create the policy databases if needed and register the policy caches
    /// with `registry`.
    pub fn new(
        repository: Arc<dyn DocumentRepository>,
        cache: &CacheConfig,
        registry: &CacheRegistry,
    ) -> Self {
        for database in [
            IndexPolicy::DATABASE,
            QueryPolicy::DATABASE,
            LookupPolicy::DATABASE,
        ] {
            // usually means it already exists
            if let Err(err) = repository.create_database(database) {
                log::debug!("create_database `{database}` failed, continuing: {err}");
            }
        }
        ConfigurationRepository {
            repository,
            index_policies: PolicyStore::new("index_policies", cache, registry),
            query_policies: PolicyStore::new("query_policies", cache, registry),
            lookup_policies: PolicyStore::new("lookup_policies", cache, registry),
        }
    }

    pub fn repository(&self) -> &Arc<dyn DocumentRepository> {
        &self.repository
    }

    pub fn get_index_policy(&self, id: &str) -> Result<IndexPolicy> {
        self.index_policies.get(self.repository.as_ref(), id)
    }

    pub fn get_query_policy(&self, id: &str) -> Result<QueryPolicy> {
        self.query_policies.get(self.repository.as_ref(), id)
    }

    pub fn get_lookup_policy(&self, id: &str) -> Result<LookupPolicy> {
        self.lookup_policies.get(self.repository.as_ref(), id)
    }

    /// Persist an index policy and return it as stored.
    ///
    /// The prior revision is reused, so a concurrent save that got there first
    /// makes this one fail with a conflict instead of being overwritten.
    pub fn save_index_policy(&self, policy: &IndexPolicy) -> Result<IndexPolicy> {
        self.index_policies.save(self.repository.as_ref(), policy)
    }

    pub fn save_query_policy(&self, policy: &QueryPolicy) -> Result<QueryPolicy> {
        self.query_policies.save(self.repository.as_ref(), policy)
    }

    pub fn save_lookup_policy(&self, policy: &LookupPolicy) -> Result<LookupPolicy> {
        self.lookup_policies.save(self.repository.as_ref(), policy)
    }

    pub fn delete_index_policy(&self, id: &str) -> Result<()> {
        self.index_policies.delete(self.repository.as_ref(), id)
    }

    pub fn delete_query_policy(&self, id: &str) -> Result<()> {
        self.query_policies.delete(self.repository.as_ref(), id)
    }

    pub fn delete_lookup_policy(&self, id: &str) -> Result<()> {
        self.lookup_policies.delete(self.repository.as_ref(), id)
    }
}
