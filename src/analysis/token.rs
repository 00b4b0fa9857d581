//! Token types flowing through the analysis pipeline.
//!
//! # Examples
//!
//! ```
//! use fathom::analysis::token::Token;
//!
//! let token = Token::with_offsets("world", 1, 6, 11).with_boost(1.5);
//! assert_eq!(token.text, "world");
//! assert_eq!(token.start_offset, 6);
//! assert_eq!(token.boost, 1.5);
//! ```

use serde::{Deserialize, Serialize};

/// A single unit of text produced by a tokenizer and rewritten by filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The text content of the token
    pub text: String,

    /// Position in the token stream (0-based)
    pub position: usize,

    /// Byte offset where the token starts in the analyzed text
    pub start_offset: usize,

    /// Byte offset where the token ends in the analyzed text
    pub end_offset: usize,

    /// Boost factor for this token (default: 1.0)
    pub boost: f32,

    /// Whether a filter marked this token as removed
    pub stopped: bool,

    /// Position relative to the previous token. Zero stacks the token on the
    /// previous one, as synonym expansion does.
    pub position_increment: usize,
}

impl Token {
    /// Create a new token with the given text and position.
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset: 0,
            end_offset: 0,
            boost: 1.0,
            stopped: false,
            position_increment: 1,
        }
    }

    /// Create a new token with text, position and byte offsets.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            start_offset,
            end_offset,
            ..Token::new(text, position)
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Replace the text, keeping position and offsets.
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_position_increment(mut self, increment: usize) -> Self {
        self.position_increment = increment;
        self
    }

    /// Mark this token as stopped.
    pub fn stop(mut self) -> Self {
        self.stopped = true;
        self
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// A stream of tokens, as handed from one pipeline stage to the next.
pub type TokenStream = Box<dyn Iterator<Item = Token> + Send>;

/// Box a collected token vector into a [`TokenStream`].
pub fn stream(tokens: Vec<Token>) -> TokenStream {
    Box::new(tokens.into_iter())
}
