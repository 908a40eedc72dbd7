//! Built-in argument mappers.

use std::fmt::Display;
use std::marker::PhantomData;
use std::ops::RangeInclusive;
use std::str::FromStr;

use regex::Regex;

use super::mapper::ArgumentMapper;
use crate::context::CommandContext;
use crate::error::MappingError;
use crate::tokenizer::Tokenizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringKind {
    Word,
    Quotable,
    Greedy,
}

/// A user pattern alongside the anchored copy that is matched against.
#[derive(Debug, Clone)]
struct Pattern {
    source: String,
    anchored: Regex,
}

/// Maps text, optionally checked against a regular expression.
#[derive(Debug, Clone)]
pub struct StringMapper {
    kind: StringKind,
    pattern: Option<Pattern>,
}

impl StringMapper {
    /// A single whitespace-delimited word.
    pub fn word() -> Self {
        Self {
            kind: StringKind::Word,
            pattern: None,
        }
    }

    /// A word, or a quoted span that may contain whitespace.
    pub fn quotable() -> Self {
        Self {
            kind: StringKind::Quotable,
            pattern: None,
        }
    }

    /// Everything left on the line. Terminal.
    pub fn greedy() -> Self {
        Self {
            kind: StringKind::Greedy,
            pattern: None,
        }
    }

    /// Requires the whole mapped text to match `pattern`.
    pub fn matching(mut self, pattern: &Regex) -> Result<Self, regex::Error> {
        let anchored = Regex::new(&format!("^(?:{})$", pattern.as_str()))?;
        self.pattern = Some(Pattern {
            source: pattern.as_str().to_string(),
            anchored,
        });
        Ok(self)
    }
}

impl<S> ArgumentMapper<S, String> for StringMapper {
    fn map(&self, _context: &CommandContext<S>, input: &mut Tokenizer) -> Result<String, MappingError> {
        let text = match self.kind {
            StringKind::Word => input.read_word()?,
            StringKind::Quotable => input.read_quotable()?,
            StringKind::Greedy => input.read_remaining()?,
        };

        if let Some(pattern) = &self.pattern {
            if !pattern.anchored.is_match(&text) {
                return Err(MappingError::PatternMismatch {
                    input: text,
                    pattern: pattern.source.clone(),
                });
            }
        }
        Ok(text)
    }

    fn is_terminal(&self) -> bool {
        self.kind == StringKind::Greedy
    }
}

/// Maps a number, optionally bounded to an inclusive range.
#[derive(Debug, Clone)]
pub struct NumberMapper<N> {
    bounds: Option<(N, N)>,
}

impl<N> NumberMapper<N> {
    pub fn new() -> Self {
        Self { bounds: None }
    }

    pub fn range(range: RangeInclusive<N>) -> Self {
        Self {
            bounds: Some(range.into_inner()),
        }
    }
}

impl<N> Default for NumberMapper<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, N> ArgumentMapper<S, N> for NumberMapper<N>
where
    N: FromStr + PartialOrd + Display + Send + Sync,
{
    fn map(&self, _context: &CommandContext<S>, input: &mut Tokenizer) -> Result<N, MappingError> {
        let text = input.read_word()?;
        let value: N = text
            .parse()
            .map_err(|_| MappingError::InvalidNumber { input: text.clone() })?;

        if let Some((min, max)) = &self.bounds {
            // NaN compares false against both bounds.
            if !(value >= *min && value <= *max) {
                return Err(MappingError::OutOfRange {
                    input: text,
                    min: min.to_string(),
                    max: max.to_string(),
                });
            }
        }
        Ok(value)
    }
}

/// Maps `true/false`, `yes/no` or `on/off`, case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolMapper;

impl<S> ArgumentMapper<S, bool> for BoolMapper {
    fn map(&self, _context: &CommandContext<S>, input: &mut Tokenizer) -> Result<bool, MappingError> {
        let text = input.read_word()?;
        match text.to_lowercase().as_str() {
            "true" | "yes" | "on" => Ok(true),
            "false" | "no" | "off" => Ok(false),
            _ => Err(MappingError::InvalidBoolean { input: text }),
        }
    }

    fn complete(&self, _context: &CommandContext<S>, _input: &str) -> Vec<String> {
        vec!["true".to_string(), "false".to_string()]
    }
}

/// Maps a word consisting of exactly one character.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharMapper;

impl<S> ArgumentMapper<S, char> for CharMapper {
    fn map(&self, _context: &CommandContext<S>, input: &mut Tokenizer) -> Result<char, MappingError> {
        let text = input.read_word()?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(MappingError::InvalidChar { input: text }),
        }
    }
}

/// Maps a word onto one of a fixed set of named values.
#[derive(Debug, Clone)]
pub struct ChoiceMapper<T> {
    choices: Vec<(String, T)>,
    case_sensitive: bool,
}

impl<T> ChoiceMapper<T> {
    /// Names must match exactly.
    pub fn strict<I, N>(choices: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(|(n, v)| (n.into(), v)).collect(),
            case_sensitive: true,
        }
    }

    /// Names match ignoring ASCII case.
    pub fn lenient<I, N>(choices: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
    {
        Self {
            case_sensitive: false,
            ..Self::strict(choices)
        }
    }

    fn names(&self) -> Vec<String> {
        self.choices.iter().map(|(name, _)| name.clone()).collect()
    }
}

impl<S, T> ArgumentMapper<S, T> for ChoiceMapper<T>
where
    T: Clone + Send + Sync,
{
    fn map(&self, _context: &CommandContext<S>, input: &mut Tokenizer) -> Result<T, MappingError> {
        let text = input.read_word()?;
        self.choices
            .iter()
            .find(|(name, _)| {
                if self.case_sensitive {
                    *name == text
                } else {
                    name.eq_ignore_ascii_case(&text)
                }
            })
            .map(|(_, value)| value.clone())
            .ok_or_else(|| MappingError::InvalidChoice {
                input: text,
                choices: self.names(),
            })
    }

    fn complete(&self, _context: &CommandContext<S>, _input: &str) -> Vec<String> {
        self.names()
    }
}

/// Produces a fixed value without reading any input. Backs presence flags.
#[derive(Debug, Clone)]
pub struct ConstantMapper<T> {
    value: T,
}

impl<T> ConstantMapper<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<S, T> ArgumentMapper<S, T> for ConstantMapper<T>
where
    T: Clone + Send + Sync,
{
    fn map(&self, _context: &CommandContext<S>, _input: &mut Tokenizer) -> Result<T, MappingError> {
        Ok(self.value.clone())
    }
}

/// Maps by calling a closure over the tokenizer.
pub struct FnMapper<F, T> {
    read: F,
    _output: PhantomData<fn() -> T>,
}

impl<F, T> FnMapper<F, T> {
    pub fn new(read: F) -> Self {
        Self {
            read,
            _output: PhantomData,
        }
    }
}

impl<S, T, F> ArgumentMapper<S, T> for FnMapper<F, T>
where
    F: Fn(&mut Tokenizer) -> Result<T, MappingError> + Send + Sync,
{
    fn map(&self, _context: &CommandContext<S>, input: &mut Tokenizer) -> Result<T, MappingError> {
        (self.read)(input)
    }
}
