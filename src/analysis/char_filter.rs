//! Char filters rewrite raw text before it reaches the tokenizer.
//!
//! - [`html_strip::HtmlStripCharFilter`] - Removes markup and decodes common entities

/// Trait for character filters that transform text before tokenization.
pub trait CharFilter: Send + Sync {
    /// Apply this filter to the input text.
    fn filter(&self, input: &str) -> String;

    /// Name of this char filter.
    fn name(&self) -> &'static str;
}

pub mod html_strip;
