//! The argument parse loop.
//!
//! Parsing never returns early with an error. Failures are captured into
//! the [`ParseOutcome`] along with how far parsing got, so completion can
//! inspect them and dispatch can surface them afterwards.

use tracing::trace;

use crate::argument::{Flag, Required};
use crate::chain::CommandChain;
use crate::context::{CommandContext, ErasedValue};
use crate::error::{ArgumentError, ArgumentErrorKind, CommandError, MappingError, SyntaxReason};
use crate::key::KeyId;
use crate::tokenizer::Tokenizer;

/// An argument or flag of a chain.
pub enum ChainArgument<'a, S> {
    Required(&'a Required<S>),
    Flag(&'a Flag<S>),
}

impl<S> Clone for ChainArgument<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for ChainArgument<'_, S> {}

impl<S> ChainArgument<'_, S> {
    pub fn name(&self) -> &str {
        match self {
            Self::Required(argument) => argument.name(),
            Self::Flag(flag) => flag.name(),
        }
    }
}

/// How far the parse loop got over a chain.
pub struct ParseOutcome<'a, S> {
    remaining_arguments: Vec<&'a Required<S>>,
    remaining_flags: Vec<&'a Flag<S>>,
    last_argument: Option<ChainArgument<'a, S>>,
    last_input: Option<String>,
    error: Option<CommandError>,
}

impl<'a, S> ParseOutcome<'a, S> {
    fn new(chain: &'a CommandChain<S>) -> Self {
        Self {
            remaining_arguments: chain.arguments().iter().collect(),
            remaining_flags: chain.flags().iter().collect(),
            last_argument: None,
            last_input: None,
            error: None,
        }
    }

    /// Required arguments the loop never reached.
    pub fn remaining_arguments(&self) -> &[&'a Required<S>] {
        &self.remaining_arguments
    }

    /// Flags that were never supplied.
    pub fn remaining_flags(&self) -> &[&'a Flag<S>] {
        &self.remaining_flags
    }

    /// The argument being processed when parsing stopped.
    pub fn last_argument(&self) -> Option<ChainArgument<'a, S>> {
        self.last_argument
    }

    /// The raw fragment handed to the last argument, if there was one.
    pub fn last_input(&self) -> Option<&str> {
        self.last_input.as_deref()
    }

    pub fn error(&self) -> Option<&CommandError> {
        self.error.as_ref()
    }

    pub fn into_error(self) -> Option<CommandError> {
        self.error
    }

    /// True when nothing is left to parse.
    pub fn is_consumed(&self) -> bool {
        self.remaining_arguments.is_empty() && self.remaining_flags.is_empty()
    }

    fn begin(&mut self, argument: ChainArgument<'a, S>, input: Option<String>) {
        match argument {
            ChainArgument::Required(required) => self
                .remaining_arguments
                .retain(|candidate| !std::ptr::eq(*candidate, required)),
            ChainArgument::Flag(flag) => self
                .remaining_flags
                .retain(|candidate| !std::ptr::eq(*candidate, flag)),
        }
        self.last_argument = Some(argument);
        self.last_input = input;
    }
}

/// Runs the parse loop, storing parsed values into `context`.
pub fn parse<'a, S>(
    chain: &'a CommandChain<S>,
    input: &mut Tokenizer,
    context: &CommandContext<S>,
) -> ParseOutcome<'a, S> {
    let mut outcome = ParseOutcome::new(chain);
    if let Err(error) = parse_into(chain, input, context, &mut outcome) {
        trace!(%error, consumed = input.consumed(), "Captured parse failure");
        outcome.error = Some(error);
    }
    outcome
}

fn parse_into<'a, S>(
    chain: &'a CommandChain<S>,
    input: &mut Tokenizer,
    context: &CommandContext<S>,
    outcome: &mut ParseOutcome<'a, S>,
) -> Result<(), CommandError> {
    while let Some(word) = input.peek_word().map(str::to_string) {
        match classify(&word, chain.flags()) {
            Classified::Positional => parse_positional(chain, input, context, outcome, word)?,
            Classified::Group(group) => parse_group(chain, input, context, outcome, word, group)?,
            Classified::Unrecognized(flag) => {
                input.read_word().ok();
                return Err(ArgumentError::at(
                    input,
                    word,
                    ArgumentErrorKind::UnrecognizedFlag { flag },
                )
                .into());
            }
        }
    }

    let complete = chain
        .arguments()
        .iter()
        .all(|argument| context.contains_id(argument.key()));
    if !complete {
        return Err(CommandError::syntax(
            SyntaxReason::TooFewArguments,
            chain.usage(),
        ));
    }
    Ok(())
}

fn parse_positional<'a, S>(
    chain: &'a CommandChain<S>,
    input: &mut Tokenizer,
    context: &CommandContext<S>,
    outcome: &mut ParseOutcome<'a, S>,
    word: String,
) -> Result<(), CommandError> {
    let Some(argument) = outcome.remaining_arguments.first().copied() else {
        let unseen_flag = chain
            .flags()
            .iter()
            .any(|flag| !context.contains_id(flag.key()));
        if unseen_flag {
            // Looks positional, but only a flag could still take it.
            input.read_word().ok();
            return Err(ArgumentError::at(
                input,
                word.clone(),
                ArgumentErrorKind::UnrecognizedFlag { flag: word },
            )
            .into());
        }
        return Err(CommandError::syntax(
            SyntaxReason::TooManyArguments,
            chain.usage(),
        ));
    };

    outcome.begin(ChainArgument::Required(argument), Some(word.clone()));
    let value = argument
        .mapper()
        .map_erased(context, input)
        .map_err(|error| mapping_failure(chain, input, &word, error))?;
    store(context, input, argument.key(), argument.name(), &word, value)?;
    trace!(argument = argument.name(), "Parsed argument");
    Ok(())
}

fn parse_group<'a, S>(
    chain: &'a CommandChain<S>,
    input: &mut Tokenizer,
    context: &CommandContext<S>,
    outcome: &mut ParseOutcome<'a, S>,
    expression: String,
    group: Vec<&'a Flag<S>>,
) -> Result<(), CommandError> {
    input.read_word().ok();

    // The whole group is validated before any value is read.
    for (index, flag) in group.iter().enumerate() {
        let repeated = group[..index].iter().any(|earlier| earlier.key() == flag.key());
        if repeated || context.contains_id(flag.key()) {
            return Err(ArgumentError::at(
                input,
                expression,
                ArgumentErrorKind::DuplicateFlag {
                    name: flag.name().to_string(),
                },
            )
            .into());
        }
    }

    for flag in group {
        let fragment = if flag.is_presence() {
            Some(expression.clone())
        } else {
            input.peek_word().map(str::to_string)
        };
        outcome.begin(ChainArgument::Flag(flag), fragment.clone());

        let fragment = fragment.unwrap_or_default();
        let value = flag
            .mapper()
            .map_erased(context, input)
            .map_err(|error| mapping_failure(chain, input, &fragment, error))?;
        store(context, input, flag.key(), flag.name(), &fragment, value)?;
        trace!(flag = flag.name(), "Parsed flag");
    }
    Ok(())
}

enum Classified<'a, S> {
    Positional,
    Group(Vec<&'a Flag<S>>),
    Unrecognized(String),
}

/// Decides whether `word` is a flag expression and resolves its flags.
///
/// `--name` resolves one flag by exact name. `-abc` resolves each letter
/// as a shorthand. A dash followed by anything but letters is positional,
/// which keeps negative numbers usable as values.
fn classify<'a, S>(word: &str, flags: &'a [Flag<S>]) -> Classified<'a, S> {
    if !word.starts_with('-') || word.chars().count() < 2 {
        return Classified::Positional;
    }

    if let Some(name) = word.strip_prefix("--") {
        if name.is_empty() {
            return Classified::Positional;
        }
        return match flags.iter().find(|flag| flag.name() == name) {
            Some(flag) => Classified::Group(vec![flag]),
            None => Classified::Unrecognized(word.to_string()),
        };
    }

    let cluster = &word[1..];
    if !cluster.chars().all(char::is_alphabetic) {
        return Classified::Positional;
    }

    let mut group = Vec::with_capacity(cluster.len());
    for shorthand in cluster.chars() {
        match flags.iter().find(|flag| flag.shorthand() == Some(shorthand)) {
            Some(flag) => group.push(flag),
            None => return Classified::Unrecognized(format!("-{shorthand}")),
        }
    }
    Classified::Group(group)
}

fn mapping_failure<S>(
    chain: &CommandChain<S>,
    input: &Tokenizer,
    fragment: &str,
    error: MappingError,
) -> CommandError {
    match error {
        MappingError::MissingInput => {
            CommandError::syntax(SyntaxReason::TooFewArguments, chain.usage())
        }
        other => ArgumentError::at(input, fragment, other.into()).into(),
    }
}

fn store<S>(
    context: &CommandContext<S>,
    input: &Tokenizer,
    key: &KeyId,
    name: &str,
    fragment: &str,
    value: ErasedValue,
) -> Result<(), CommandError> {
    context.store_erased(key.clone(), value).map_err(|_| {
        ArgumentError::at(
            input,
            fragment,
            ArgumentErrorKind::DuplicateFlag {
                name: name.to_string(),
            },
        )
        .into()
    })
}
