//! Platform settings.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cache::CacheConfig;
use crate::error::{FathomError, Result};
use crate::indexing::IndexingConfig;
use crate::policy::index_policy::DEFAULT_ANALYZER;
use crate::repository::RepositoryConfig;
use crate::search::SearchConfig;

/// Everything a [`SearchPlatform`](crate::platform::SearchPlatform) is built from.
///
/// Every section has defaults, so `{}` is a valid configuration:
///
/// ```
/// use fathom::config::PlatformConfig;
///
/// let config = PlatformConfig::from_json(r#"{"search": {"max_limit": 100}}"#).unwrap();
/// assert_eq!(config.search.max_limit, 100);
/// assert_eq!(config.cache.capacity, 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Document store backend.
    pub repository: RepositoryConfig,
    /// Sizing of the policy caches.
    pub cache: CacheConfig,
    pub indexing: IndexingConfig,
    pub search: SearchConfig,
    /// Analyzer used by policies with an empty analyzer selector.
    pub default_analyzer: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        PlatformConfig {
            repository: RepositoryConfig::default(),
            cache: CacheConfig::default(),
            indexing: IndexingConfig::default(),
            search: SearchConfig::default(),
            default_analyzer: DEFAULT_ANALYZER.to_string(),
        }
    }
}

impl PlatformConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PlatformConfig = serde_json::from_str(json)
            .map_err(|e| FathomError::config(format!("failed to parse configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        log::debug!("loading configuration from {}", path.display());
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.capacity == 0 {
            return Err(FathomError::config("cache.capacity must be greater than 0"));
        }
        if self.indexing.batch_size == 0 {
            return Err(FathomError::config("indexing.batch_size must be greater than 0"));
        }
        if self.search.max_limit == 0 {
            return Err(FathomError::config("search.max_limit must be greater than 0"));
        }
        if self.default_analyzer.is_empty() {
            return Err(FathomError::config("default_analyzer must not be empty"));
        }
        Ok(())
    }
}
