//! Token filters transform the token stream produced by a tokenizer.
//!
//! - [`lowercase::LowercaseFilter`] - Lowercases token text
//! - [`stop::StopFilter`] - Removes stop words
//! - [`stem::StemFilter`] - Snowball stemming via `rust-stemmers`
//! - [`ascii_folding::AsciiFoldingFilter`] - Strips diacritics
//! - [`synonym::SynonymFilter`] - Stacks synonyms on the original token
//! - [`phonetic::PhoneticFilter`] - Replaces words by their Soundex code
//!
//! # Examples
//!
//! ```
//! use fathom::analysis::token::Token;
//! use fathom::analysis::token_filter::Filter;
//! use fathom::analysis::token_filter::lowercase::LowercaseFilter;
//!
//! let filter = LowercaseFilter::new();
//! let tokens = vec![Token::new("Hello", 0), Token::new("WORLD", 1)];
//! let filtered: Vec<_> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();
//! assert_eq!(filtered[0].text, "hello");
//! assert_eq!(filtered[1].text, "world");
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
///
/// Filters receive a stream and produce a new one; they may rewrite, drop or
/// add tokens. Tokens already marked stopped are passed through untouched.
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Name of this filter, for debugging and configuration.
    fn name(&self) -> &'static str;
}

pub mod ascii_folding;
pub mod lowercase;
pub mod phonetic;
pub mod stem;
pub mod stop;
pub mod synonym;
