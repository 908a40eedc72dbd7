//! The argument mapper contract and its adapters.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::context::{CommandContext, ErasedValue};
use crate::error::MappingError;
use crate::tokenizer::Tokenizer;

/// Converts raw input into a typed value.
///
/// A mapper reads as much of the tokenizer as it needs. A terminal mapper
/// consumes everything that is left, so nothing may be declared after an
/// argument that uses one.
pub trait ArgumentMapper<S, T>: Send + Sync {
    fn map(&self, context: &CommandContext<S>, input: &mut Tokenizer) -> Result<T, MappingError>;

    fn is_terminal(&self) -> bool {
        false
    }

    /// Candidate values for the partial `input`. Callers filter by prefix.
    fn complete(&self, _context: &CommandContext<S>, _input: &str) -> Vec<String> {
        Vec::new()
    }
}

impl<S, T, M> ArgumentMapper<S, T> for Arc<M>
where
    M: ArgumentMapper<S, T> + ?Sized,
{
    fn map(&self, context: &CommandContext<S>, input: &mut Tokenizer) -> Result<T, MappingError> {
        (**self).map(context, input)
    }

    fn is_terminal(&self) -> bool {
        (**self).is_terminal()
    }

    fn complete(&self, context: &CommandContext<S>, input: &str) -> Vec<String> {
        (**self).complete(context, input)
    }
}

/// Adapters available on every mapper. The source type is only fixed where
/// the adapted mapper is used as an [`ArgumentMapper`].
pub trait ArgumentMapperExt: Sized {
    /// Transforms the mapped value.
    fn mapping<T, O, F>(self, transform: F) -> Mapping<Self, F, T>
    where
        F: Fn(T) -> O + Send + Sync,
    {
        Mapping {
            inner: self,
            transform,
            _input: PhantomData,
        }
    }

    /// Rejects mapped values that fail `predicate`.
    fn filtering<T, F>(self, predicate: F, reason: impl Into<String>) -> Filtering<Self, F, T>
    where
        F: Fn(&T) -> bool + Send + Sync,
    {
        Filtering {
            inner: self,
            predicate,
            reason: reason.into(),
            _value: PhantomData,
        }
    }
}

impl<M> ArgumentMapperExt for M {}

/// See [`ArgumentMapperExt::mapping`].
pub struct Mapping<M, F, T> {
    inner: M,
    transform: F,
    _input: PhantomData<fn(T)>,
}

impl<S, T, O, M, F> ArgumentMapper<S, O> for Mapping<M, F, T>
where
    M: ArgumentMapper<S, T>,
    F: Fn(T) -> O + Send + Sync,
{
    fn map(&self, context: &CommandContext<S>, input: &mut Tokenizer) -> Result<O, MappingError> {
        self.inner.map(context, input).map(&self.transform)
    }

    fn is_terminal(&self) -> bool {
        self.inner.is_terminal()
    }

    fn complete(&self, context: &CommandContext<S>, input: &str) -> Vec<String> {
        self.inner.complete(context, input)
    }
}

/// See [`ArgumentMapperExt::filtering`].
pub struct Filtering<M, F, T> {
    inner: M,
    predicate: F,
    reason: String,
    _value: PhantomData<fn(T)>,
}

impl<S, T, M, F> ArgumentMapper<S, T> for Filtering<M, F, T>
where
    M: ArgumentMapper<S, T>,
    F: Fn(&T) -> bool + Send + Sync,
{
    fn map(&self, context: &CommandContext<S>, input: &mut Tokenizer) -> Result<T, MappingError> {
        let start = input.cursor();
        let value = self.inner.map(context, input)?;
        if (self.predicate)(&value) {
            return Ok(value);
        }
        Err(MappingError::Rejected {
            input: input.input()[start..input.cursor()].trim().to_string(),
            reason: self.reason.clone(),
        })
    }

    fn is_terminal(&self) -> bool {
        self.inner.is_terminal()
    }

    fn complete(&self, context: &CommandContext<S>, input: &str) -> Vec<String> {
        self.inner.complete(context, input)
    }
}

/// A mapper with its output type erased, so chains can hold mappers of
/// different value types side by side.
pub trait ErasedMapper<S>: Send + Sync {
    fn map_erased(
        &self,
        context: &CommandContext<S>,
        input: &mut Tokenizer,
    ) -> Result<ErasedValue, MappingError>;

    fn is_terminal(&self) -> bool;

    fn complete(&self, context: &CommandContext<S>, input: &str) -> Vec<String>;
}

pub(crate) struct Typed<M, T> {
    mapper: M,
    _output: PhantomData<fn() -> T>,
}

impl<M, T> Typed<M, T> {
    pub(crate) fn new(mapper: M) -> Self {
        Self {
            mapper,
            _output: PhantomData,
        }
    }
}

impl<S, T, M> ErasedMapper<S> for Typed<M, T>
where
    M: ArgumentMapper<S, T>,
    T: Send + Sync + 'static,
{
    fn map_erased(
        &self,
        context: &CommandContext<S>,
        input: &mut Tokenizer,
    ) -> Result<ErasedValue, MappingError> {
        let value = self.mapper.map(context, input)?;
        Ok(Arc::new(value))
    }

    fn is_terminal(&self) -> bool {
        self.mapper.is_terminal()
    }

    fn complete(&self, context: &CommandContext<S>, input: &str) -> Vec<String> {
        self.mapper.complete(context, input)
    }
}
