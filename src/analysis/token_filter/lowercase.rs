//! Lowercase filter.

use crate::analysis::token::{TokenStream, stream};
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// Converts token text to lowercase so matching is case-insensitive.
#[derive(Clone, Debug, Default)]
pub struct LowercaseFilter;

impl LowercaseFilter {
    pub fn new() -> Self {
        LowercaseFilter
    }
}

impl Filter for LowercaseFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered_tokens = tokens
            .map(|token| {
                if token.is_stopped() || !token.text.chars().any(char::is_uppercase) {
                    token
                } else {
                    let lower = token.text.to_lowercase();
                    token.with_text(lower)
                }
            })
            .collect();

        Ok(stream(filtered_tokens))
    }

    fn name(&self) -> &'static str {
        "lowercase"
    }
}
