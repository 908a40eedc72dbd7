//! Cursor-based tokenizer over a raw command line.
//!
//! Provides the reads needed by routing and argument mappers:
//! - Whitespace-separated words
//! - Quoted spans (single or double quotes) that may contain whitespace
//! - Greedy reads of everything that is left
//!
//! The cursor only moves forward. Consumed and remaining input are
//! available at any point for error reporting and completion.

use crate::error::TokenizerError;

pub const SINGLE_QUOTE: char = '\'';
pub const DOUBLE_QUOTE: char = '"';

/// A forward-only reader over a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokenizer {
    input: String,
    cursor: usize,
}

impl Tokenizer {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            cursor: 0,
        }
    }

    /// The full, unmodified input.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Byte offset of the cursor.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the character under the cursor without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Moves past the character under the cursor.
    pub fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn can_read(&self) -> bool {
        self.cursor < self.input.len()
    }

    /// True if anything other than whitespace is left.
    pub fn can_read_non_whitespace(&self) -> bool {
        self.remaining().chars().any(|c| !c.is_whitespace())
    }

    /// True if the full input ends with whitespace.
    pub fn ends_with_whitespace(&self) -> bool {
        self.input.ends_with(char::is_whitespace)
    }

    /// The next word, without consuming it.
    pub fn peek_word(&self) -> Option<&str> {
        self.remaining().split_whitespace().next()
    }

    /// Skips leading whitespace and reads up to the next whitespace.
    pub fn read_word(&mut self) -> Result<String, TokenizerError> {
        self.skip_whitespace();
        let rest = self.remaining();
        if rest.is_empty() {
            return Err(TokenizerError::MissingInput);
        }

        let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let word = rest[..len].to_string();
        self.cursor += len;
        Ok(word)
    }

    /// Reads a word, or a quoted span if the word opens with a quote.
    ///
    /// Words of a quoted span are joined with a single space and the
    /// enclosing quotes are stripped: `"hello   world"` reads as
    /// `hello world`.
    pub fn read_quotable(&mut self) -> Result<String, TokenizerError> {
        self.skip_whitespace();
        let quote = match self.peek() {
            Some(c @ (SINGLE_QUOTE | DOUBLE_QUOTE)) => c,
            Some(_) => return self.read_word(),
            None => return Err(TokenizerError::MissingInput),
        };

        let mut spans: Vec<String> = Vec::new();
        loop {
            let span = self
                .read_word()
                .map_err(|_| TokenizerError::UnclosedQuote { quote })?;
            // The opening quote alone cannot close the span.
            let closes = if spans.is_empty() {
                span.len() > 1 && span.ends_with(quote)
            } else {
                span.ends_with(quote)
            };
            spans.push(span);
            if closes {
                break;
            }
        }

        let joined = spans.join(" ");
        Ok(joined[1..joined.len() - 1].to_string())
    }

    /// Reads every remaining word, joined with a single space.
    pub fn read_remaining(&mut self) -> Result<String, TokenizerError> {
        let words: Vec<&str> = self.remaining().split_whitespace().collect();
        if words.is_empty() {
            return Err(TokenizerError::MissingInput);
        }
        let joined = words.join(" ");
        self.cursor = self.input.len();
        Ok(joined)
    }

    /// Input before the cursor.
    pub fn consumed(&self) -> &str {
        &self.input[..self.cursor]
    }

    /// Input from the cursor on.
    pub fn remaining(&self) -> &str {
        &self.input[self.cursor..]
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }
}
