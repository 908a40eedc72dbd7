//! Typed keys for the command context store.
//!
//! A [`Key<T>`] pairs a runtime type identity with an optional name. Two
//! keys are equal when both the type and the name are equal, so a key can
//! be recreated anywhere it is needed instead of being threaded through.

use std::any::{type_name, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Type-erased identity of a [`Key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyId {
    type_id: TypeId,
    type_name: &'static str,
    name: Option<Cow<'static, str>>,
}

impl KeyId {
    fn of<T: 'static>(name: Option<Cow<'static, str>>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            name,
        }
    }

    /// The optional name qualifier.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name of the value type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The qualifier if present, otherwise the unqualified type name.
    pub fn label(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => {
                let outer = self.type_name.split('<').next().unwrap_or(self.type_name);
                outer.rsplit("::").next().unwrap_or(outer)
            }
        }
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "'{}' ({})", name, self.type_name),
            None => write!(f, "({})", self.type_name),
        }
    }
}

/// A typed handle to a value in a [`CommandContext`](crate::CommandContext).
pub struct Key<T> {
    id: KeyId,
    _type: PhantomData<fn() -> T>,
}

impl<T: 'static> Key<T> {
    /// A key identified by its type alone.
    pub fn of() -> Self {
        Self {
            id: KeyId::of::<T>(None),
            _type: PhantomData,
        }
    }

    /// A key identified by its type and a name.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: KeyId::of::<T>(Some(name.into())),
            _type: PhantomData,
        }
    }
}

impl<T> Key<T> {
    pub fn id(&self) -> &KeyId {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.id.name()
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Key<T> {}

impl<T> Hash for Key<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.id).finish()
    }
}

impl<T> fmt::Display for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}
