//! Diacritic folding filter.
//!
//! # Examples
//!
//! ```
//! use fathom::analysis::token::Token;
//! use fathom::analysis::token_filter::Filter;
//! use fathom::analysis::token_filter::ascii_folding::AsciiFoldingFilter;
//!
//! let filter = AsciiFoldingFilter::new();
//! let tokens = vec![Token::new("crème", 0), Token::new("brûlée", 1)];
//! let result: Vec<_> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();
//! assert_eq!(result[0].text, "creme");
//! assert_eq!(result[1].text, "brulee");
//! ```

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::analysis::token::{TokenStream, stream};
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// Decomposes text (NFD), drops combining marks, and maps the few Latin
/// letters without a decomposition to their ASCII spelling.
#[derive(Clone, Debug, Default)]
pub struct AsciiFoldingFilter;

impl AsciiFoldingFilter {
    pub fn new() -> Self {
        AsciiFoldingFilter
    }

    /// Fold a single string.
    pub fn fold(text: &str) -> String {
        if text.is_ascii() {
            return text.to_string();
        }
        let mut folded = String::with_capacity(text.len());
        for ch in text.nfd().filter(|c| !is_combining_mark(*c)) {
            match ch {
                'ß' => folded.push_str("ss"),
                'æ' => folded.push_str("ae"),
                'Æ' => folded.push_str("AE"),
                'œ' => folded.push_str("oe"),
                'Œ' => folded.push_str("OE"),
                'ø' => folded.push('o'),
                'Ø' => folded.push('O'),
                'ł' => folded.push('l'),
                'Ł' => folded.push('L'),
                'đ' => folded.push('d'),
                'Đ' => folded.push('D'),
                'þ' => folded.push_str("th"),
                _ => folded.push(ch),
            }
        }
        folded
    }
}

impl Filter for AsciiFoldingFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let folded = tokens
            .map(|token| {
                if token.is_stopped() || token.text.is_ascii() {
                    token
                } else {
                    let text = Self::fold(&token.text);
                    token.with_text(text)
                }
            })
            .collect();
        Ok(stream(folded))
    }

    fn name(&self) -> &'static str {
        "ascii_folding"
    }
}
