//! Command chains and their staged builder.
//!
//! A chain is built in three stages: route literals, then required
//! arguments, then flags. Every `then` validates the new element against
//! what is already declared, so a malformed chain is rejected when its
//! module is registered rather than when it is first dispatched.

use std::fmt;
use std::sync::Arc;

use crate::argument::{Flag, Literal, Required};
use crate::condition::CommandCondition;
use crate::error::StateError;

/// Immutable description of one command.
pub struct CommandChain<S> {
    route: Vec<Literal<S>>,
    arguments: Vec<Required<S>>,
    flags: Vec<Flag<S>>,
}

impl<S> CommandChain<S> {
    pub fn route(&self) -> &[Literal<S>] {
        &self.route
    }

    pub fn arguments(&self) -> &[Required<S>] {
        &self.arguments
    }

    pub fn flags(&self) -> &[Flag<S>] {
        &self.flags
    }

    /// Route literal names joined by spaces.
    pub fn route_path(&self) -> String {
        self.route
            .iter()
            .map(Literal::name)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Every permission attached to the route, arguments and flags.
    pub fn permissions(&self) -> impl Iterator<Item = &str> {
        self.route
            .iter()
            .filter_map(Literal::permission)
            .chain(self.arguments.iter().filter_map(Required::permission))
            .chain(self.flags.iter().filter_map(Flag::permission))
    }

    /// Every condition attached to the route, arguments and flags, in
    /// declaration order.
    pub fn conditions(&self) -> impl Iterator<Item = &Arc<dyn CommandCondition<S>>> {
        self.route
            .iter()
            .filter_map(Literal::condition)
            .chain(self.arguments.iter().filter_map(Required::condition))
            .chain(self.flags.iter().filter_map(Flag::condition))
    }

    /// One-line usage, e.g. `team invite <player> [--role|-r <role>]`.
    pub fn usage(&self) -> String {
        let mut parts = vec![self.route_path()];
        for argument in &self.arguments {
            if argument.is_terminal() {
                parts.push(format!("<{}...>", argument.name()));
            } else {
                parts.push(format!("<{}>", argument.name()));
            }
        }
        for flag in &self.flags {
            let mut forms = flag.long_form();
            if let Some(short) = flag.short_form() {
                forms.push('|');
                forms.push_str(&short);
            }
            if flag.is_presence() {
                parts.push(format!("[{forms}]"));
            } else {
                parts.push(format!("[{forms} <{}>]", flag.name()));
            }
        }
        parts.join(" ")
    }
}

impl<S> fmt::Debug for CommandChain<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandChain")
            .field("route", &self.route)
            .field("arguments", &self.arguments)
            .field("flags", &self.flags)
            .finish()
    }
}

/// First stage: route literals.
pub struct RouteBuilder<S> {
    route: Vec<Literal<S>>,
}

impl<S> RouteBuilder<S> {
    pub fn new() -> Self {
        Self { route: Vec::new() }
    }

    pub fn then(mut self, literal: Literal<S>) -> Result<Self, StateError> {
        for name in literal.names() {
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(StateError::InvalidLiteral {
                    value: name.to_string(),
                });
            }
        }
        self.route.push(literal);
        Ok(self)
    }

    pub fn arguments(self) -> ArgumentsBuilder<S> {
        ArgumentsBuilder {
            route: self.route,
            arguments: Vec::new(),
        }
    }

    pub fn flags(self) -> FlagsBuilder<S> {
        self.arguments().flags()
    }

    pub fn build(self) -> Result<CommandChain<S>, StateError> {
        self.arguments().build()
    }
}

impl<S> Default for RouteBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Second stage: required arguments.
pub struct ArgumentsBuilder<S> {
    route: Vec<Literal<S>>,
    arguments: Vec<Required<S>>,
}

impl<S> ArgumentsBuilder<S> {
    pub fn then(mut self, argument: Required<S>) -> Result<Self, StateError> {
        validate(&self.arguments, &[], argument.name())?;
        self.arguments.push(argument);
        Ok(self)
    }

    pub fn flags(self) -> FlagsBuilder<S> {
        FlagsBuilder {
            route: self.route,
            arguments: self.arguments,
            flags: Vec::new(),
        }
    }

    pub fn build(self) -> Result<CommandChain<S>, StateError> {
        self.flags().build()
    }
}

/// Final stage: flags.
pub struct FlagsBuilder<S> {
    route: Vec<Literal<S>>,
    arguments: Vec<Required<S>>,
    flags: Vec<Flag<S>>,
}

impl<S> FlagsBuilder<S> {
    pub fn then(mut self, flag: Flag<S>) -> Result<Self, StateError> {
        validate(&self.arguments, &self.flags, flag.name())?;

        if flag.mapper().is_terminal() {
            return Err(StateError::TerminalFlag {
                name: flag.name().to_string(),
            });
        }

        if let Some(shorthand) = flag.shorthand() {
            if !shorthand.is_alphabetic() {
                return Err(StateError::InvalidShorthand { shorthand });
            }
            if let Some(existing) = self.flags.iter().find(|f| f.shorthand() == Some(shorthand)) {
                return Err(StateError::DuplicateShorthand {
                    shorthand,
                    existing: existing.name().to_string(),
                });
            }
        }

        self.flags.push(flag);
        Ok(self)
    }

    pub fn build(self) -> Result<CommandChain<S>, StateError> {
        if self.route.is_empty() {
            return Err(StateError::EmptyRoute);
        }
        Ok(CommandChain {
            route: self.route,
            arguments: self.arguments,
            flags: self.flags,
        })
    }
}

/// Checks a new argument or flag name against everything declared so far.
fn validate<S>(arguments: &[Required<S>], flags: &[Flag<S>], name: &str) -> Result<(), StateError> {
    if let Some(terminal) = arguments.iter().find(|a| a.is_terminal()) {
        return Err(StateError::AfterTerminal {
            name: name.to_string(),
            terminal: terminal.name().to_string(),
        });
    }

    let taken = arguments
        .iter()
        .map(Required::name)
        .chain(flags.iter().map(Flag::name))
        .any(|existing| existing.eq_ignore_ascii_case(name));
    if taken {
        return Err(StateError::DuplicateName {
            name: name.to_string(),
        });
    }
    Ok(())
}
