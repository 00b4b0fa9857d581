//! Single-word synonym expansion.

use ahash::AHashMap;

use crate::analysis::token::{Token, TokenStream, stream};
use crate::analysis::token_filter::Filter;
use crate::error::{FathomError, Result};

/// Emits every synonym of a token at the same position as the token itself
/// (position increment 0), so a query for either word matches both.
#[derive(Clone, Debug, Default)]
pub struct SynonymFilter {
    synonyms: AHashMap<String, Vec<String>>,
}

impl SynonymFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group of mutually equivalent words.
    pub fn add_group<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words.into_iter().map(Into::into).collect();
        for word in &words {
            let entry = self.synonyms.entry(word.clone()).or_default();
            for other in &words {
                if other != word && !entry.contains(other) {
                    entry.push(other.clone());
                }
            }
        }
        self
    }

    /// Parse Solr-style rules: one comma separated group per line, `#` comments.
    pub fn from_rules(rules: &str) -> Result<Self> {
        let mut filter = SynonymFilter::new();
        for (number, line) in rules.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let words: Vec<&str> = line
                .split(',')
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .collect();
            if words.len() < 2 {
                return Err(FathomError::analysis(format!(
                    "synonym rule on line {} needs at least two words",
                    number + 1
                )));
            }
            filter = filter.add_group(words);
        }
        Ok(filter)
    }

    pub fn synonyms_of(&self, word: &str) -> &[String] {
        self.synonyms.get(word).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Filter for SynonymFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let mut expanded = Vec::new();
        for token in tokens {
            let synonyms = if token.is_stopped() {
                &[][..]
            } else {
                self.synonyms_of(&token.text)
            };
            let extra: Vec<Token> = synonyms
                .iter()
                .map(|synonym| {
                    token
                        .clone()
                        .with_text(synonym.as_str())
                        .with_position_increment(0)
                })
                .collect();
            expanded.push(token);
            expanded.extend(extra);
        }
        Ok(stream(expanded))
    }

    fn name(&self) -> &'static str {
        "synonym"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expands_in_place() {
        let filter = SynonymFilter::new().add_group(["car", "auto", "automobile"]);
        let tokens = vec![Token::new("red", 0), Token::new("car", 1)];

        let result: Vec<Token> = filter.filter(stream(tokens)).unwrap().collect();
        let texts: Vec<_> = result.iter().map(|t| t.text.as_str()).collect();

        assert_eq!(texts, vec!["red", "car", "auto", "automobile"]);
        assert_eq!(result[2].position, 1);
        assert_eq!(result[2].position_increment, 0);
    }

    #[test]
    fn test_from_rules() {
        let filter = SynonymFilter::from_rules("# vehicles\ncar, auto\n\ntv, television\n").unwrap();
        assert_eq!(filter.synonyms_of("television"), ["tv".to_string()]);
        assert!(SynonymFilter::from_rules("lonely").is_err());
    }
}
