//! # Fathom
//!
//! A policy-driven document indexing and search library for Rust.
//!
//! Documents live in a pluggable [`repository`]. An [`IndexPolicy`](policy::IndexPolicy)
//! decides how their attributes become index fields; query and lookup policies
//! decide how those fields are searched, sorted and returned.
//!
//! ## Features
//!
//! - Declarative index, query and lookup policies stored as documents
//! - Configurable analysis pipelines (stemming, folding, synonyms, phonetic)
//! - Payload-boosted term scoring with document scores and recency decay
//! - Radius filtering over spatial tier cells
//! - Spelling suggestions and prefix completion from the index dictionary
//! - TTL and capacity bounded caches with negative caching
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use fathom::analysis::analyzer::registry::AnalyzerRegistry;
//! use fathom::document::Document;
//! use fathom::index::IndexStore;
//! use fathom::indexing::IndexingEngine;
//! use fathom::policy::{Field, IndexPolicy, QueryPolicy};
//! use fathom::search::{QueryCriteria, QueryEngine};
//!
//! let store = Arc::new(IndexStore::new());
//! let analyzers = Arc::new(AnalyzerRegistry::new());
//! let indexing = IndexingEngine::new(store.clone(), analyzers.clone());
//! let query = QueryEngine::new(store, analyzers);
//!
//! let policy = IndexPolicy::new("books").with_field(Field::new("title")).unwrap();
//! let doc = Document::builder()
//!     .database("books")
//!     .id("dune")
//!     .put("title", "Dune")
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! indexing.update_documents(&policy, &[doc]).unwrap();
//!
//! let results = query
//!     .search(&QueryCriteria::keywords("dune"), &policy, &QueryPolicy::new("books"), false, 0, 10)
//!     .unwrap();
//! assert_eq!(results.ids(), vec!["dune"]);
//! ```

pub mod analysis;
pub mod cache;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod indexing;
pub mod platform;
pub mod policy;
pub mod repository;
pub mod search;
pub mod spelling;

pub mod prelude {
    pub use crate::config::{ConfigurationRepository, PlatformConfig};
    pub use crate::document::{Document, Value};
    pub use crate::error::{FathomError, Result};
    pub use crate::indexing::{IndexReport, IndexingEngine};
    pub use crate::platform::SearchPlatform;
    pub use crate::policy::{Field, IndexPolicy, LookupField, LookupPolicy, Policy, QueryField, QueryPolicy};
    pub use crate::repository::{DocumentRepository, MemoryRepository};
    pub use crate::search::{QueryCriteria, QueryEngine, SearchResults};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
