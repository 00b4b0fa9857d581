//! Analyzers: complete text-to-terms pipelines.
//!
//! ```text
//! Raw Text → Analyzer → Token Stream → Index
//!             ↓
//!         Char filters
//!             ↓
//!         Tokenizer
//!             ↓
//!         Filter 1 … Filter N
//! ```
//!
//! - [`pipeline::PipelineAnalyzer`] - Tokenizer plus char filter and token filter chains
//! - [`registry::AnalyzerRegistry`] - Named analyzers selected by index policies

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for analyzers that convert text into processed tokens.
///
/// Analyzers are shared between indexing threads and query threads, hence
/// `Send + Sync`.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Name this analyzer is registered under.
    fn name(&self) -> &str;

    /// Analyze and collect the surviving token texts, skipping stopped tokens.
    fn terms(&self, text: &str) -> Result<Vec<String>> {
        Ok(self
            .analyze(text)?
            .filter(|token| !token.is_stopped() && !token.is_empty())
            .map(|token| token.text)
            .collect())
    }
}

pub mod pipeline;
pub mod registry;
