//! Term dictionary with frequencies.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::ops::Bound;
use std::path::Path;

use crate::error::Result;

/// Words and how often they were seen, kept in lexical order so prefix
/// completion is a range scan.
#[derive(Debug, Clone, Default)]
pub struct SpellingDictionary {
    words: BTreeMap<String, u32>,
    total_count: u64,
}

impl SpellingDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the frequency of a word, replacing any previous value.
    pub fn add_word(&mut self, word: &str, frequency: u32) {
        let normalized = word.to_lowercase();
        let old = self.words.insert(normalized, frequency).unwrap_or(0);
        self.total_count = self.total_count - u64::from(old) + u64::from(frequency);
    }

    /// Increment the frequency of a word by one.
    pub fn increment_word(&mut self, word: &str) {
        let normalized = word.to_lowercase();
        *self.words.entry(normalized).or_insert(0) += 1;
        self.total_count += 1;
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(&word.to_lowercase())
    }

    pub fn frequency(&self, word: &str) -> u32 {
        self.words.get(&word.to_lowercase()).copied().unwrap_or(0)
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn total_frequency(&self) -> u64 {
        self.total_count
    }

    pub fn max_frequency(&self) -> u32 {
        self.words.values().copied().max().unwrap_or(0)
    }

    /// All words with their frequencies, in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.words.iter().map(|(word, freq)| (word.as_str(), *freq))
    }

    /// Words starting with `prefix`, most frequent first, then lexical.
    pub fn complete(&self, prefix: &str, limit: usize) -> Vec<(String, u32)> {
        let prefix = prefix.to_lowercase();
        let mut matches: Vec<(String, u32)> = self
            .words
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .take_while(|(word, _)| word.starts_with(&prefix))
            .map(|(word, freq)| (word.clone(), *freq))
            .collect();
        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        matches.truncate(limit);
        matches
    }

    /// Most frequent words, ties broken lexically.
    pub fn most_frequent_words(&self, limit: usize) -> Vec<(String, u32)> {
        let mut word_freq: Vec<(String, u32)> = self
            .words
            .iter()
            .map(|(word, freq)| (word.clone(), *freq))
            .collect();
        word_freq.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        word_freq.truncate(limit);
        word_freq
    }

    pub fn merge(&mut self, other: &SpellingDictionary) {
        for (word, frequency) in &other.words {
            *self.words.entry(word.clone()).or_insert(0) += frequency;
            self.total_count += u64::from(*frequency);
        }
    }

    pub fn clear(&mut self) {
        self.words.clear();
        self.total_count = 0;
    }

    /// Load a `word frequency` per line file. Malformed lines are skipped.
    pub fn load_from_frequency_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut dictionary = SpellingDictionary::new();
        let reader = BufReader::new(File::open(path)?);
        for line in reader.lines() {
            let line = line?;
            let mut parts = line.split_whitespace();
            if let (Some(word), Some(frequency)) = (parts.next(), parts.next())
                && let Ok(frequency) = frequency.parse::<u32>()
            {
                dictionary.add_word(word, frequency);
            }
        }
        Ok(dictionary)
    }

    /// Write a `word frequency` per line file, most frequent first.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for (word, frequency) in self.most_frequent_words(usize::MAX) {
            writeln!(writer, "{word} {frequency}")?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> SpellingDictionary {
        let mut dictionary = SpellingDictionary::new();
        for word in ["search", "search", "seal", "season", "Search", "index"] {
            dictionary.increment_word(word);
        }
        dictionary
    }

    #[test]
    fn test_frequencies() {
        let dictionary = sample();
        assert_eq!(dictionary.frequency("SEARCH"), 3);
        assert_eq!(dictionary.word_count(), 4);
        assert_eq!(dictionary.total_frequency(), 6);
        assert_eq!(dictionary.max_frequency(), 3);
    }

    #[test]
    fn test_complete_orders_by_frequency() {
        let dictionary = sample();
        let words: Vec<_> = dictionary
            .complete("sea", 10)
            .into_iter()
            .map(|(w, _)| w)
            .collect();
        assert_eq!(words, vec!["search", "seal", "season"]);
        assert_eq!(dictionary.complete("sea", 1).len(), 1);
        assert!(dictionary.complete("zzz", 10).is_empty());
    }

    #[test]
    fn test_add_word_replaces() {
        let mut dictionary = sample();
        dictionary.add_word("search", 10);
        assert_eq!(dictionary.frequency("search"), 10);
        assert_eq!(dictionary.total_frequency(), 13);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dictionary.txt");
        sample().save_to_file(&path).unwrap();

        let loaded = SpellingDictionary::load_from_frequency_file(&path).unwrap();
        assert_eq!(loaded.frequency("search"), 3);
        assert_eq!(loaded.word_count(), 4);
    }
}
