//! Error types for command-graph.
//!
//! Every failure surfaced by the dispatcher is a typed value. Parse-time
//! failures carry enough position information for completion to reason
//! about them without re-parsing.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::tokenizer::Tokenizer;

/// Why a command line did not fit its chain's arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxReason {
    /// At least one required argument was never supplied.
    TooFewArguments,
    /// Input remained after every required argument was consumed.
    TooManyArguments,
}

impl fmt::Display for SyntaxReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewArguments => write!(f, "Too few arguments"),
            Self::TooManyArguments => write!(f, "Too many arguments"),
        }
    }
}

/// A sibling route segment offered when routing fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    /// Primary name of the node.
    pub name: String,
    /// Secondary names of the node.
    pub aliases: Vec<String>,
}

/// Main error type for dispatching a command line.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Arity violation against the command chain.
    #[error("{reason}. Usage: {usage}")]
    Syntax { reason: SyntaxReason, usage: String },

    /// Position-aware failure while parsing an argument or flag.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// The router could not match a route segment.
    #[error("Unknown command '{argument}'{}", format_alternatives(.alternatives))]
    NoSuchCommand {
        /// Input consumed before the failing segment.
        consumed: String,
        /// The failing segment (empty if input ran out).
        argument: String,
        /// Children of the last matched node.
        alternatives: Vec<Alternative>,
    },

    /// The source lacks one or more permissions required by the chain.
    #[error("Missing permissions: {}", join(.lacking))]
    Authorization { lacking: BTreeSet<String> },

    /// A precondition attached to the chain was not met.
    #[error("Condition '{condition}' is not fulfilled")]
    UnfulfilledCondition { condition: String },

    /// The command action itself failed.
    #[error("Command failed: {0}")]
    Invocation(#[source] anyhow::Error),
}

impl CommandError {
    /// Creates a syntax error for the given chain usage string.
    pub fn syntax(reason: SyntaxReason, usage: impl Into<String>) -> Self {
        Self::Syntax {
            reason,
            usage: usage.into(),
        }
    }

    /// Wraps an action failure. Failures that already belong to the
    /// taxonomy are surfaced unchanged.
    pub fn from_action(error: anyhow::Error) -> Self {
        match error.downcast::<CommandError>() {
            Ok(error) => error,
            Err(error) => Self::Invocation(error),
        }
    }

    /// Returns the argument error if this is one.
    pub fn as_argument(&self) -> Option<&ArgumentError> {
        match self {
            Self::Argument(error) => Some(error),
            _ => None,
        }
    }

    /// Returns true for unrecognized and duplicate flag failures.
    pub fn is_flag_failure(&self) -> bool {
        self.as_argument().is_some_and(|error| {
            matches!(
                error.kind,
                ArgumentErrorKind::UnrecognizedFlag { .. } | ArgumentErrorKind::DuplicateFlag { .. }
            )
        })
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "Syntax Error",
            Self::Argument(_) => "Argument Error",
            Self::NoSuchCommand { .. } => "Unknown Command",
            Self::Authorization { .. } => "Authorization Error",
            Self::UnfulfilledCondition { .. } => "Condition Error",
            Self::Invocation(_) => "Invocation Error",
        }
    }
}

/// A failure tied to a position in the command line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}")]
pub struct ArgumentError {
    /// Input consumed up to and including the offending fragment.
    pub consumed: String,
    /// The offending fragment.
    pub argument: String,
    /// Input left after the offending fragment.
    pub remaining: String,
    /// What went wrong.
    pub kind: ArgumentErrorKind,
}

impl ArgumentError {
    /// Captures the tokenizer position around `argument`.
    pub fn at(input: &Tokenizer, argument: impl Into<String>, kind: ArgumentErrorKind) -> Self {
        Self {
            consumed: input.consumed().trim_end().to_string(),
            argument: argument.into(),
            remaining: input.remaining().trim().to_string(),
            kind,
        }
    }
}

/// Specializations of [`ArgumentError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentErrorKind {
    /// A flag name or shorthand that is not declared on the chain.
    #[error("Unrecognized flag '{flag}'")]
    UnrecognizedFlag { flag: String },

    /// A flag supplied more than once.
    #[error("Flag '--{name}' was supplied more than once")]
    DuplicateFlag { name: String },

    /// The argument mapper rejected its input.
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// Failures raised by the tokenizer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerError {
    /// Nothing (but whitespace) is left to read.
    #[error("Expected more input")]
    MissingInput,

    /// A quoted span was opened but never closed.
    #[error("Missing closing quote {quote}")]
    UnclosedQuote { quote: char },
}

/// Failures raised by argument mappers. Each mapper-specific variant
/// carries the raw offending text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("Expected more input")]
    MissingInput,

    #[error("Missing closing quote {quote}")]
    UnclosedQuote { quote: char },

    #[error("'{input}' is not a valid number")]
    InvalidNumber { input: String },

    #[error("'{input}' is out of range [{min}, {max}]")]
    OutOfRange {
        input: String,
        min: String,
        max: String,
    },

    #[error("'{input}' is not a valid boolean")]
    InvalidBoolean { input: String },

    #[error("'{input}' is not a single character")]
    InvalidChar { input: String },

    #[error("'{input}' is not one of: {}", .choices.join(", "))]
    InvalidChoice { input: String, choices: Vec<String> },

    #[error("'{input}' does not match pattern '{pattern}'")]
    PatternMismatch { input: String, pattern: String },

    #[error("'{input}' was rejected: {reason}")]
    Rejected { input: String, reason: String },
}

impl From<TokenizerError> for MappingError {
    fn from(error: TokenizerError) -> Self {
        match error {
            TokenizerError::MissingInput => Self::MissingInput,
            TokenizerError::UnclosedQuote { quote } => Self::UnclosedQuote { quote },
        }
    }
}

/// Registration-time and bookkeeping failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("A command route must contain at least one literal")]
    EmptyRoute,

    #[error("Literal '{value}' is blank or contains whitespace")]
    InvalidLiteral { value: String },

    #[error("An argument or flag named '{name}' is already declared")]
    DuplicateName { name: String },

    #[error("Cannot declare '{name}' after terminal argument '{terminal}'")]
    AfterTerminal { name: String, terminal: String },

    #[error("Flag '{name}' cannot use a terminal mapper")]
    TerminalFlag { name: String },

    #[error("Flag shorthand '{shorthand}' must be alphabetic")]
    InvalidShorthand { shorthand: char },

    #[error("Flag shorthand '{shorthand}' is already used by '{existing}'")]
    DuplicateShorthand { shorthand: char, existing: String },

    #[error("Command node '{name}' already exists")]
    NodeExists { name: String },

    #[error("Command node '{name}' carries a command and cannot have children")]
    NodeOccupied { name: String },

    #[error("No command node matches '{name}'")]
    MissingRoute { name: String },

    #[error("Command node '{name}' is not a leaf")]
    NotALeaf { name: String },

    #[error("Command '{route}' is already registered")]
    AlreadyRegistered { route: String },

    #[error("Command is not registered")]
    NotRegistered,

    #[error("A value is already stored under key {key}")]
    KeyOccupied { key: String },

    #[error("No value is stored under key {key}")]
    MissingValue { key: String },
}

/// Result type alias using CommandError.
pub type Result<T> = std::result::Result<T, CommandError>;

fn join(values: &BTreeSet<String>) -> String {
    values.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn format_alternatives(alternatives: &[Alternative]) -> String {
    if alternatives.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = alternatives.iter().map(|alt| alt.name.as_str()).collect();
    format!(" (expected one of: {})", names.join(", "))
}
