//! Argument model: literals, required arguments and flags.
//!
//! Arguments are built through [`ChainFactory`], which hands out one
//! builder per argument kind. The builders accept a permission and a
//! condition on every kind, then produce immutable values that a
//! [`CommandChain`](crate::CommandChain) holds.

pub mod builtin;
pub mod mapper;

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::chain::RouteBuilder;
use crate::condition::CommandCondition;
use crate::key::{Key, KeyId};

use builtin::ConstantMapper;
use mapper::{ArgumentMapper, ErasedMapper, Typed};

/// A fixed route segment with optional aliases.
pub struct Literal<S> {
    name: String,
    aliases: BTreeSet<String>,
    permission: Option<String>,
    condition: Option<Arc<dyn CommandCondition<S>>>,
}

impl<S> Literal<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &BTreeSet<String> {
        &self.aliases
    }

    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn condition(&self) -> Option<&Arc<dyn CommandCondition<S>>> {
        self.condition.as_ref()
    }

    /// The name followed by every alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// A positional argument that must be supplied.
pub struct Required<S> {
    key: KeyId,
    permission: Option<String>,
    condition: Option<Arc<dyn CommandCondition<S>>>,
    mapper: Arc<dyn ErasedMapper<S>>,
}

impl<S> Required<S> {
    pub fn name(&self) -> &str {
        self.key.label()
    }

    pub fn key(&self) -> &KeyId {
        &self.key
    }

    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn condition(&self) -> Option<&Arc<dyn CommandCondition<S>>> {
        self.condition.as_ref()
    }

    pub fn mapper(&self) -> &dyn ErasedMapper<S> {
        self.mapper.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.mapper.is_terminal()
    }
}

/// An optional named argument, addressed as `--name` or `-c`.
///
/// A presence flag stores `true` when it appears and reads no value. A
/// value flag reads its value with its mapper.
pub struct Flag<S> {
    key: KeyId,
    permission: Option<String>,
    condition: Option<Arc<dyn CommandCondition<S>>>,
    mapper: Arc<dyn ErasedMapper<S>>,
    shorthand: Option<char>,
    presence: bool,
}

impl<S> Flag<S> {
    pub fn name(&self) -> &str {
        self.key.label()
    }

    pub fn key(&self) -> &KeyId {
        &self.key
    }

    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn condition(&self) -> Option<&Arc<dyn CommandCondition<S>>> {
        self.condition.as_ref()
    }

    pub fn mapper(&self) -> &dyn ErasedMapper<S> {
        self.mapper.as_ref()
    }

    pub fn shorthand(&self) -> Option<char> {
        self.shorthand
    }

    pub fn is_presence(&self) -> bool {
        self.presence
    }

    /// `--name`, as typed on the command line.
    pub fn long_form(&self) -> String {
        format!("--{}", self.name())
    }

    /// `-c`, as typed on the command line.
    pub fn short_form(&self) -> Option<String> {
        self.shorthand.map(|c| format!("-{c}"))
    }
}

impl<S> Clone for Literal<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            aliases: self.aliases.clone(),
            permission: self.permission.clone(),
            condition: self.condition.clone(),
        }
    }
}

impl<S> Clone for Required<S> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            permission: self.permission.clone(),
            condition: self.condition.clone(),
            mapper: Arc::clone(&self.mapper),
        }
    }
}

impl<S> Clone for Flag<S> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            permission: self.permission.clone(),
            condition: self.condition.clone(),
            mapper: Arc::clone(&self.mapper),
            shorthand: self.shorthand,
            presence: self.presence,
        }
    }
}

impl<S> fmt::Debug for Literal<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Literal")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("permission", &self.permission)
            .finish_non_exhaustive()
    }
}

impl<S> fmt::Debug for Required<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Required")
            .field("key", &self.key)
            .field("permission", &self.permission)
            .field("terminal", &self.is_terminal())
            .finish_non_exhaustive()
    }
}

impl<S> fmt::Debug for Flag<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("key", &self.key)
            .field("shorthand", &self.shorthand)
            .field("presence", &self.presence)
            .field("permission", &self.permission)
            .finish_non_exhaustive()
    }
}

/// Hands out argument builders and chain builders for one source type.
pub struct ChainFactory<S> {
    _source: PhantomData<fn(S)>,
}

impl<S> ChainFactory<S> {
    pub fn new() -> Self {
        Self {
            _source: PhantomData,
        }
    }

    /// Starts a new chain.
    pub fn chain(&self) -> RouteBuilder<S> {
        RouteBuilder::new()
    }

    pub fn literal(&self, name: impl Into<String>) -> LiteralBuilder<S> {
        LiteralBuilder {
            name: name.into(),
            aliases: BTreeSet::new(),
            permission: None,
            condition: None,
        }
    }

    /// A positional argument whose value is stored under `key`.
    pub fn required<T, M>(&self, key: Key<T>, mapper: M) -> RequiredBuilder<S>
    where
        T: Send + Sync + 'static,
        M: ArgumentMapper<S, T> + 'static,
    {
        RequiredBuilder {
            key: key.id().clone(),
            permission: None,
            condition: None,
            mapper: Arc::new(Typed::<M, T>::new(mapper)),
        }
    }

    /// A flag that stores `true` under `Key::<bool>::named(name)` when present.
    pub fn presence_flag(&self, name: impl Into<Cow<'static, str>>) -> FlagBuilder<S> {
        let key = Key::<bool>::named(name);
        FlagBuilder {
            key: key.id().clone(),
            permission: None,
            condition: None,
            mapper: Arc::new(Typed::<_, bool>::new(ConstantMapper::new(true))),
            shorthand: None,
            presence: true,
        }
    }

    /// A flag whose value is read by `mapper` and stored under `key`.
    pub fn value_flag<T, M>(&self, key: Key<T>, mapper: M) -> FlagBuilder<S>
    where
        T: Send + Sync + 'static,
        M: ArgumentMapper<S, T> + 'static,
    {
        FlagBuilder {
            key: key.id().clone(),
            permission: None,
            condition: None,
            mapper: Arc::new(Typed::<M, T>::new(mapper)),
            shorthand: None,
            presence: false,
        }
    }
}

impl<S> Default for ChainFactory<S> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct LiteralBuilder<S> {
    name: String,
    aliases: BTreeSet<String>,
    permission: Option<String>,
    condition: Option<Arc<dyn CommandCondition<S>>>,
}

impl<S> LiteralBuilder<S> {
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.insert(alias.into());
        self
    }

    pub fn aliases<I, A>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn expect(mut self, condition: impl CommandCondition<S> + 'static) -> Self {
        self.condition = Some(Arc::new(condition));
        self
    }

    pub fn build(self) -> Literal<S> {
        Literal {
            name: self.name,
            aliases: self.aliases,
            permission: self.permission,
            condition: self.condition,
        }
    }
}

pub struct RequiredBuilder<S> {
    key: KeyId,
    permission: Option<String>,
    condition: Option<Arc<dyn CommandCondition<S>>>,
    mapper: Arc<dyn ErasedMapper<S>>,
}

impl<S> RequiredBuilder<S> {
    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn expect(mut self, condition: impl CommandCondition<S> + 'static) -> Self {
        self.condition = Some(Arc::new(condition));
        self
    }

    pub fn build(self) -> Required<S> {
        Required {
            key: self.key,
            permission: self.permission,
            condition: self.condition,
            mapper: self.mapper,
        }
    }
}

pub struct FlagBuilder<S> {
    key: KeyId,
    permission: Option<String>,
    condition: Option<Arc<dyn CommandCondition<S>>>,
    mapper: Arc<dyn ErasedMapper<S>>,
    shorthand: Option<char>,
    presence: bool,
}

impl<S> FlagBuilder<S> {
    pub fn shorthand(mut self, shorthand: char) -> Self {
        self.shorthand = Some(shorthand);
        self
    }

    /// Uses the first character of the flag name as its shorthand.
    pub fn assume_shorthand(mut self) -> Self {
        self.shorthand = self.key.label().chars().next();
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn expect(mut self, condition: impl CommandCondition<S> + 'static) -> Self {
        self.condition = Some(Arc::new(condition));
        self
    }

    pub fn build(self) -> Flag<S> {
        Flag {
            key: self.key,
            permission: self.permission,
            condition: self.condition,
            mapper: self.mapper,
            shorthand: self.shorthand,
            presence: self.presence,
        }
    }
}
