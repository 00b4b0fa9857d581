//! Tokenizers split text into tokens.
//!
//! - [`unicode_word::UnicodeWordTokenizer`] - Unicode word boundaries (UAX #29)
//! - [`whitespace::WhitespaceTokenizer`] - Splits on whitespace
//! - [`keyword::KeywordTokenizer`] - The whole input as one token
//!
//! # Examples
//!
//! ```
//! use fathom::analysis::tokenizer::Tokenizer;
//! use fathom::analysis::tokenizer::whitespace::WhitespaceTokenizer;
//!
//! let tokenizer = WhitespaceTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("Hello world").unwrap().collect();
//! assert_eq!(tokens.len(), 2);
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
///
/// Tokenizers are shared between indexing threads, hence `Send + Sync`.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Name of this tokenizer, for debugging and configuration.
    fn name(&self) -> &'static str;
}

pub mod keyword;
pub mod unicode_word;
pub mod whitespace;
