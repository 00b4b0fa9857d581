//! Text analysis for indexing and querying.
//!
//! Analysis turns raw field text into the terms stored in the index. A pipeline
//! is built from small stateless stages applied in order:
//!
//! ```text
//! raw text → char filters → tokenizer → token filters → terms
//! ```
//!
//! The same analyzer must be used at index time and query time, so policies
//! refer to analyzers by name and both sides resolve them through one
//! [`AnalyzerRegistry`](analyzer::registry::AnalyzerRegistry).
//!
//! # Examples
//!
//! ```
//! use fathom::analysis::analyzer::Analyzer;
//! use fathom::analysis::analyzer::registry::AnalyzerRegistry;
//!
//! let registry = AnalyzerRegistry::new();
//! let analyzer = registry.get("english").unwrap();
//! let terms: Vec<_> = analyzer.analyze("The Running Dogs").unwrap().map(|t| t.text).collect();
//! assert_eq!(terms, vec!["run", "dog"]);
//! ```

pub mod analyzer;
pub mod char_filter;
pub mod token;
pub mod token_filter;
pub mod tokenizer;
