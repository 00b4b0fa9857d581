//! Phonetic (Soundex) encoding filter.

use crate::analysis::token::{Token, TokenStream, stream};
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// Replaces each alphabetic token with its American Soundex code, so that
/// similarly pronounced names ("Robert", "Rupert") index to the same term.
///
/// With `inject` set, the original token is kept and the code is stacked on
/// it at the same position.
#[derive(Clone, Debug, Default)]
pub struct PhoneticFilter {
    inject: bool,
}

impl PhoneticFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(mut self, inject: bool) -> Self {
        self.inject = inject;
        self
    }

    /// Soundex code of `word`, or `None` when it has no ASCII letter.
    pub fn soundex(word: &str) -> Option<String> {
        fn digit(c: char) -> Option<char> {
            match c {
                'b' | 'f' | 'p' | 'v' => Some('1'),
                'c' | 'g' | 'j' | 'k' | 'q' | 's' | 'x' | 'z' => Some('2'),
                'd' | 't' => Some('3'),
                'l' => Some('4'),
                'm' | 'n' => Some('5'),
                'r' => Some('6'),
                _ => None,
            }
        }

        let mut letters = word
            .chars()
            .filter(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_lowercase());
        let first = letters.next()?;
        let mut code = String::with_capacity(4);
        code.push(first.to_ascii_uppercase());
        let mut last = digit(first);
        for c in letters {
            let current = digit(c);
            if current.is_some() && current != last {
                if let Some(d) = current {
                    code.push(d);
                }
                if code.len() == 4 {
                    break;
                }
            }
            // h and w do not separate equal codes; vowels do
            if c != 'h' && c != 'w' {
                last = current;
            }
        }
        while code.len() < 4 {
            code.push('0');
        }
        Some(code)
    }
}

impl Filter for PhoneticFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let mut encoded: Vec<Token> = Vec::new();
        for token in tokens {
            let code = if token.is_stopped() {
                None
            } else {
                Self::soundex(&token.text)
            };
            match code {
                Some(code) if self.inject => {
                    let stacked = token.clone().with_text(code).with_position_increment(0);
                    encoded.push(token);
                    encoded.push(stacked);
                }
                Some(code) => encoded.push(token.with_text(code)),
                None => encoded.push(token),
            }
        }
        Ok(stream(encoded))
    }

    fn name(&self) -> &'static str {
        "phonetic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soundex_codes() {
        assert_eq!(PhoneticFilter::soundex("Robert").as_deref(), Some("R163"));
        assert_eq!(PhoneticFilter::soundex("Rupert").as_deref(), Some("R163"));
        assert_eq!(PhoneticFilter::soundex("Ashcraft").as_deref(), Some("A261"));
        assert_eq!(PhoneticFilter::soundex("Tymczak").as_deref(), Some("T522"));
        assert_eq!(PhoneticFilter::soundex("Lee").as_deref(), Some("L000"));
        assert_eq!(PhoneticFilter::soundex("42"), None);
    }

    #[test]
    fn test_inject_keeps_original() {
        let filter = PhoneticFilter::new().inject(true);
        let result: Vec<Token> = filter
            .filter(stream(vec![Token::new("smith", 0)]))
            .unwrap()
            .collect();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text, "smith");
        assert_eq!(result[1].text, "S530");
    }
}
