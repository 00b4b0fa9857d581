//! Named analyzers resolved from index policies.
//!
//! | name       | pipeline                                                  |
//! |------------|-----------------------------------------------------------|
//! | `standard` | unicode words → lowercase → English stop words           |
//! | `simple`   | unicode words → lowercase                                 |
//! | `keyword`  | whole input as one term                                   |
//! | `english`  | unicode words → lowercase → stop words → Snowball stemmer |
//! | `folding`  | unicode words → lowercase → diacritic folding → stop words|
//! | `phonetic` | unicode words → lowercase → word plus its Soundex code    |
//!
//! Deployments add their own pipelines with [`AnalyzerRegistry::register`].

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::pipeline::PipelineAnalyzer;
use crate::analysis::token_filter::ascii_folding::AsciiFoldingFilter;
use crate::analysis::token_filter::lowercase::LowercaseFilter;
use crate::analysis::token_filter::phonetic::PhoneticFilter;
use crate::analysis::token_filter::stem::StemFilter;
use crate::analysis::token_filter::stop::StopFilter;
use crate::analysis::token_filter::synonym::SynonymFilter;
use crate::analysis::tokenizer::keyword::KeywordTokenizer;
use crate::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
use crate::error::{FathomError, Result};

/// Thread-safe map from analyzer name to a shared analyzer instance.
pub struct AnalyzerRegistry {
    analyzers: RwLock<AHashMap<String, Arc<dyn Analyzer>>>,
    default_name: String,
}

impl AnalyzerRegistry {
    /// Registry holding the built-in analyzers, defaulting to `standard`.
    pub fn new() -> Self {
        Self::with_default("standard")
    }

    /// Registry holding the built-in analyzers with another default.
    pub fn with_default<S: Into<String>>(default_name: S) -> Self {
        let registry = AnalyzerRegistry {
            analyzers: RwLock::new(AHashMap::new()),
            default_name: default_name.into(),
        };
        for analyzer in Self::builtins() {
            registry.register(Arc::new(analyzer));
        }
        registry
    }

    fn builtins() -> Vec<PipelineAnalyzer> {
        let words = || PipelineAnalyzer::new(Arc::new(UnicodeWordTokenizer::new()));
        vec![
            standard_analyzer(),
            words()
                .add_filter(Arc::new(LowercaseFilter::new()))
                .with_name("simple"),
            PipelineAnalyzer::new(Arc::new(KeywordTokenizer::new())).with_name("keyword"),
            words()
                .add_filter(Arc::new(LowercaseFilter::new()))
                .add_filter(Arc::new(StopFilter::new()))
                .add_filter(Arc::new(StemFilter::new()))
                .with_name("english"),
            words()
                .add_filter(Arc::new(LowercaseFilter::new()))
                .add_filter(Arc::new(AsciiFoldingFilter::new()))
                .add_filter(Arc::new(StopFilter::new()))
                .with_name("folding"),
            words()
                .add_filter(Arc::new(LowercaseFilter::new()))
                .add_filter(Arc::new(PhoneticFilter::new().inject(true)))
                .with_name("phonetic"),
        ]
    }

    /// Register (or replace) an analyzer under its own name.
    pub fn register(&self, analyzer: Arc<dyn Analyzer>) {
        let name = analyzer.name().to_string();
        log::debug!("registering analyzer `{name}`");
        self.analyzers.write().insert(name, analyzer);
    }

    /// Register the standard pipeline extended with synonym expansion.
    pub fn register_synonyms<S: Into<String>>(&self, name: S, synonyms: SynonymFilter) {
        let analyzer = standard_analyzer()
            .add_filter(Arc::new(synonyms))
            .with_name(name);
        self.register(Arc::new(analyzer));
    }

    /// Look an analyzer up by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Analyzer>> {
        self.analyzers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| FathomError::analysis(format!("unknown analyzer `{name}`")))
    }

    /// Resolve a policy's selector; an empty selector means the default.
    pub fn resolve(&self, selector: &str) -> Result<Arc<dyn Analyzer>> {
        if selector.is_empty() {
            self.get(&self.default_name)
        } else {
            self.get(selector)
        }
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.analyzers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerRegistry")
            .field("analyzers", &self.names())
            .field("default_name", &self.default_name)
            .finish()
    }
}

fn standard_analyzer() -> PipelineAnalyzer {
    PipelineAnalyzer::new(Arc::new(UnicodeWordTokenizer::new()))
        .add_filter(Arc::new(LowercaseFilter::new()))
        .add_filter(Arc::new(StopFilter::new()))
        .with_name("standard")
}
