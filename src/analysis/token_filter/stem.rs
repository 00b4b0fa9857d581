//! Snowball stemming filter.

use rust_stemmers::{Algorithm, Stemmer};

use crate::analysis::token::{TokenStream, stream};
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// Reduces words to their stem with a Snowball algorithm (English by default).
pub struct StemFilter {
    algorithm: Algorithm,
    stemmer: Stemmer,
}

impl StemFilter {
    pub fn new() -> Self {
        Self::with_algorithm(Algorithm::English)
    }

    pub fn with_algorithm(algorithm: Algorithm) -> Self {
        StemFilter {
            algorithm,
            stemmer: Stemmer::create(algorithm),
        }
    }
}

impl Default for StemFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StemFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StemFilter")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl Filter for StemFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let stemmed = tokens
            .map(|token| {
                if token.is_stopped() {
                    return token;
                }
                let stem = self.stemmer.stem(&token.text).into_owned();
                token.with_text(stem)
            })
            .collect();
        Ok(stream(stemmed))
    }

    fn name(&self) -> &'static str {
        "stem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::Token;

    #[test]
    fn test_english_stemming() {
        let filter = StemFilter::new();
        let tokens = vec![
            Token::new("running", 0),
            Token::new("libraries", 1),
            Token::new("searched", 2),
        ];
        let result: Vec<String> = filter
            .filter(stream(tokens))
            .unwrap()
            .map(|t| t.text)
            .collect();
        assert_eq!(result, vec!["run", "librari", "search"]);
    }
}
