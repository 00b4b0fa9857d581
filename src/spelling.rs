//! Term dictionaries, completion and "did you mean" suggestions.
//!
//! Every index with `add_to_dictionary` set keeps a [`SpellingDictionary`] of
//! the words it has seen, as lowercased surface forms rather than analyzed
//! terms, so suggestions read like what users type. The query engine uses it for prefix completion and
//! for suggesting corrections when a keyword query finds few or no hits.

pub mod dictionary;
pub mod levenshtein;
pub mod suggest;

use unicode_segmentation::UnicodeSegmentation;

pub use dictionary::SpellingDictionary;
pub use suggest::{Suggestion, SuggestionConfig, SuggestionEngine};

/// Lowercased Unicode words of `text`, in order.
pub fn surface_words(text: &str) -> Vec<String> {
    text.unicode_words().map(str::to_lowercase).collect()
}
