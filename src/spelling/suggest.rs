//! Spelling suggestion generation.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::spelling::dictionary::SpellingDictionary;
use crate::spelling::levenshtein::levenshtein_distance_threshold;

/// A spelling suggestion with a score indicating confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub word: String,
    /// Confidence score, higher is better (0.0 to 1.0).
    pub score: f64,
    /// Edit distance from the original word.
    pub distance: usize,
    /// Frequency of the suggested word in the dictionary.
    pub frequency: u32,
}

impl Suggestion {
    pub fn new(word: String, score: f64, distance: usize, frequency: u32) -> Self {
        Suggestion {
            word,
            score,
            distance,
            frequency,
        }
    }
}

/// Configuration for spelling suggestion generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    /// Maximum edit distance to consider.
    pub max_distance: usize,
    /// Maximum number of suggestions per word.
    pub max_suggestions: usize,
    /// Minimum frequency a candidate needs.
    pub min_frequency: u32,
    /// Weight of edit distance in the score.
    pub distance_weight: f64,
    /// Weight of word frequency in the score.
    pub frequency_weight: f64,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        SuggestionConfig {
            max_distance: 2,
            max_suggestions: 5,
            min_frequency: 1,
            distance_weight: 0.6,
            frequency_weight: 0.4,
        }
    }
}

/// Suggests dictionary words close to a (possibly misspelled) input.
pub struct SuggestionEngine<'a> {
    dictionary: &'a SpellingDictionary,
    config: SuggestionConfig,
}

impl<'a> SuggestionEngine<'a> {
    pub fn new(dictionary: &'a SpellingDictionary) -> Self {
        Self::with_config(dictionary, SuggestionConfig::default())
    }

    pub fn with_config(dictionary: &'a SpellingDictionary, config: SuggestionConfig) -> Self {
        SuggestionEngine { dictionary, config }
    }

    pub fn is_correct(&self, word: &str) -> bool {
        self.dictionary.contains(word)
    }

    /// Candidates for `word`, best first. A known word is its own only suggestion.
    pub fn suggest(&self, word: &str) -> Vec<Suggestion> {
        let word = word.to_lowercase();
        if word.is_empty() {
            return Vec::new();
        }
        if self.dictionary.contains(&word) {
            let frequency = self.dictionary.frequency(&word);
            return vec![Suggestion::new(word, 1.0, 0, frequency)];
        }

        let max_frequency = self.dictionary.max_frequency();
        let mut suggestions: Vec<Suggestion> = self
            .dictionary
            .iter()
            .filter(|(_, frequency)| *frequency >= self.config.min_frequency)
            .filter_map(|(candidate, frequency)| {
                let distance =
                    levenshtein_distance_threshold(&word, candidate, self.config.max_distance)?;
                let score = self.score(distance, frequency, max_frequency);
                Some(Suggestion::new(candidate.to_string(), score, distance, frequency))
            })
            .collect();

        suggestions.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.word.cmp(&b.word))
        });
        suggestions.truncate(self.config.max_suggestions);
        suggestions
    }

    /// Rewrite a whitespace separated phrase, replacing each unknown word by
    /// its best suggestion. `None` when nothing would change.
    pub fn suggest_phrase(&self, phrase: &str) -> Option<String> {
        let mut changed = false;
        let words: Vec<String> = phrase
            .split_whitespace()
            .map(|word| {
                let lower = word.to_lowercase();
                if self.is_correct(&lower) {
                    return lower;
                }
                match self.suggest(&lower).into_iter().next() {
                    Some(best) => {
                        changed = true;
                        best.word
                    }
                    None => lower,
                }
            })
            .collect();
        changed.then(|| words.join(" "))
    }

    fn score(&self, distance: usize, frequency: u32, max_frequency: u32) -> f64 {
        let closeness = 1.0 - distance as f64 / (self.config.max_distance as f64 + 1.0);
        let popularity = if max_frequency > 0 {
            (1.0 + frequency as f64).ln() / (1.0 + max_frequency as f64).ln()
        } else {
            0.0
        };
        self.config.distance_weight * closeness + self.config.frequency_weight * popularity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> SpellingDictionary {
        let mut dictionary = SpellingDictionary::new();
        dictionary.add_word("hello", 50);
        dictionary.add_word("help", 10);
        dictionary.add_word("world", 40);
        dictionary.add_word("word", 5);
        dictionary
    }

    #[test]
    fn test_known_word() {
        let dictionary = dictionary();
        let engine = SuggestionEngine::new(&dictionary);
        let suggestions = engine.suggest("Hello");
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].distance, 0);
    }

    #[test]
    fn test_typo_suggestions() {
        let dictionary = dictionary();
        let engine = SuggestionEngine::new(&dictionary);
        let suggestions = engine.suggest("helo");
        assert_eq!(suggestions[0].word, "hello");
        assert!(suggestions.iter().any(|s| s.word == "help"));
        assert!(engine.suggest("zzzzzzz").is_empty());
    }

    #[test]
    fn test_suggest_phrase() {
        let dictionary = dictionary();
        let engine = SuggestionEngine::new(&dictionary);
        assert_eq!(engine.suggest_phrase("helo wrld").as_deref(), Some("hello world"));
        assert_eq!(engine.suggest_phrase("hello world"), None);
    }
}
