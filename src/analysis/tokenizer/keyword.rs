//! Keyword tokenizer: the whole (trimmed) input becomes one token.

use crate::analysis::token::{Token, TokenStream, stream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

#[derive(Clone, Debug, Default)]
pub struct KeywordTokenizer;

impl KeywordTokenizer {
    pub fn new() -> Self {
        KeywordTokenizer
    }
}

impl Tokenizer for KeywordTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(stream(Vec::new()));
        }
        let start = text.len() - text.trim_start().len();
        Ok(stream(vec![Token::with_offsets(
            trimmed,
            0,
            start,
            start + trimmed.len(),
        )]))
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_tokenizer() {
        let tokens: Vec<Token> = KeywordTokenizer::new()
            .tokenize("  New York City ")
            .unwrap()
            .collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "New York City");
        assert_eq!(tokens[0].start_offset, 2);
        assert!(KeywordTokenizer::new().tokenize("").unwrap().next().is_none());
    }
}
