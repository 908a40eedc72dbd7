//! Suggestions for partially typed arguments and flags.

use std::collections::HashSet;

use super::parse::{ChainArgument, ParseOutcome};
use crate::argument::{Flag, Required};
use crate::context::CommandContext;
use crate::error::{CommandError, SyntaxReason};
use crate::tokenizer::Tokenizer;

/// What the cursor is completing.
enum Target<'a, S> {
    /// Values of a required argument.
    Argument(&'a Required<S>),
    /// Values of a flag whose name was already typed.
    FlagValue(&'a Flag<S>),
    /// Flag names and shorthand clusters.
    FlagName,
}

/// Derives candidates from a parse outcome over the argument part of a line.
///
/// `input` is the tokenizer the parse loop ran on; its full input is the
/// whole line, so trailing whitespace is detected on the original text.
pub fn suggest<S>(
    context: &CommandContext<S>,
    outcome: &ParseOutcome<'_, S>,
    input: &Tokenizer,
) -> Vec<String> {
    // A bad flag with more input after it leaves nothing sensible to offer.
    if outcome.error().is_some_and(CommandError::is_flag_failure) && input.can_read() {
        return Vec::new();
    }

    let next_token = input.ends_with_whitespace();
    let partial = if next_token {
        ""
    } else {
        input.input().split_whitespace().last().unwrap_or("")
    };

    let Some(target) = select_target(outcome, next_token, partial) else {
        return Vec::new();
    };

    let unseen: Vec<&Flag<S>> = outcome
        .remaining_flags()
        .iter()
        .copied()
        .filter(|flag| !context.contains_id(flag.key()))
        .collect();

    let mut candidates = match target {
        Target::Argument(argument) => {
            let mut candidates = argument.mapper().complete(context, partial);
            if partial.starts_with('-') {
                candidates.extend(flag_forms(&unseen));
            }
            candidates
        }
        Target::FlagValue(flag) => flag.mapper().complete(context, partial),
        Target::FlagName => {
            let mut candidates = flag_forms(&unseen);
            candidates.extend(cluster_extensions(partial, &unseen));
            candidates
        }
    };

    let mut seen = HashSet::new();
    candidates.retain(|candidate| seen.insert(candidate.clone()));
    filter_prefix(candidates, partial.trim())
}

fn select_target<'a, S>(
    outcome: &ParseOutcome<'a, S>,
    next_token: bool,
    partial: &str,
) -> Option<Target<'a, S>> {
    let in_flight = outcome.last_argument().filter(|_| {
        if next_token {
            // A value flag reached the end of input before its value.
            outcome.last_input().is_none() && missing_input(outcome.error())
        } else {
            outcome.last_input() == Some(partial)
        }
    });

    match in_flight {
        Some(ChainArgument::Required(argument)) => return Some(Target::Argument(argument)),
        Some(ChainArgument::Flag(flag)) if !flag.is_presence() => {
            return Some(Target::FlagValue(flag));
        }
        Some(ChainArgument::Flag(_)) => return Some(Target::FlagName),
        None => {}
    }

    if let Some(argument) = outcome.remaining_arguments().first().copied() {
        return Some(Target::Argument(argument));
    }
    if !outcome.remaining_flags().is_empty() {
        return Some(Target::FlagName);
    }
    None
}

fn missing_input(error: Option<&CommandError>) -> bool {
    matches!(
        error,
        Some(CommandError::Syntax {
            reason: SyntaxReason::TooFewArguments,
            ..
        })
    )
}

/// `--name` and `-c` for every flag.
fn flag_forms<S>(flags: &[&Flag<S>]) -> Vec<String> {
    let mut forms = Vec::with_capacity(flags.len() * 2);
    for flag in flags {
        forms.push(flag.long_form());
        if let Some(short) = flag.short_form() {
            forms.push(short);
        }
    }
    forms
}

/// `-ab` extended by one more unused shorthand, e.g. `-abc`.
fn cluster_extensions<S>(partial: &str, flags: &[&Flag<S>]) -> Vec<String> {
    let Some(cluster) = partial.strip_prefix('-') else {
        return Vec::new();
    };
    if cluster.is_empty() || !cluster.chars().all(char::is_alphabetic) {
        return Vec::new();
    }

    flags
        .iter()
        .filter_map(|flag| flag.shorthand())
        .filter(|shorthand| !cluster.contains(*shorthand))
        .map(|shorthand| format!("{partial}{shorthand}"))
        .collect()
}

fn filter_prefix(candidates: Vec<String>, partial: &str) -> Vec<String> {
    let partial = partial.to_lowercase();
    candidates
        .into_iter()
        .filter(|candidate| candidate.to_lowercase().starts_with(&partial))
        .collect()
}
