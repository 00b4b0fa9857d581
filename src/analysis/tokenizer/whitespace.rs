//! Whitespace tokenizer.

use crate::analysis::token::{Token, TokenStream, stream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// Splits on Unicode whitespace and keeps everything else, punctuation included.
#[derive(Clone, Debug, Default)]
pub struct WhitespaceTokenizer;

impl WhitespaceTokenizer {
    pub fn new() -> Self {
        WhitespaceTokenizer
    }
}

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let mut tokens = Vec::new();
        let mut start = None;
        for (offset, ch) in text.char_indices() {
            match (ch.is_whitespace(), start) {
                (true, Some(begin)) => {
                    tokens.push(Token::with_offsets(&text[begin..offset], tokens.len(), begin, offset));
                    start = None;
                }
                (false, None) => start = Some(offset),
                _ => {}
            }
        }
        if let Some(begin) = start {
            tokens.push(Token::with_offsets(&text[begin..], tokens.len(), begin, text.len()));
        }
        Ok(stream(tokens))
    }

    fn name(&self) -> &'static str {
        "whitespace"
    }
}
