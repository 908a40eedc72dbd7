//! Preconditions that gate command execution.
//!
//! Conditions are evaluated after authorization and before any argument
//! is parsed. The first unmet condition aborts dispatch.

use std::sync::Arc;

use crate::context::CommandContext;

/// A predicate over the dispatch context.
pub trait CommandCondition<S>: Send + Sync {
    /// Identifier reported when the condition is not met.
    fn id(&self) -> &str;

    fn evaluate(&self, context: &CommandContext<S>) -> bool;

    /// Returns the id of the condition that failed, if any. Composite
    /// conditions report the innermost failing member.
    fn unmet(&self, context: &CommandContext<S>) -> Option<String> {
        if self.evaluate(context) {
            None
        } else {
            Some(self.id().to_string())
        }
    }
}

/// A condition backed by a closure.
pub struct FnCondition<F> {
    id: String,
    predicate: F,
}

/// Creates a condition from an id and a predicate.
pub fn condition<S, F>(id: impl Into<String>, predicate: F) -> FnCondition<F>
where
    F: Fn(&CommandContext<S>) -> bool + Send + Sync,
{
    FnCondition {
        id: id.into(),
        predicate,
    }
}

impl<S, F> CommandCondition<S> for FnCondition<F>
where
    F: Fn(&CommandContext<S>) -> bool + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn evaluate(&self, context: &CommandContext<S>) -> bool {
        (self.predicate)(context)
    }
}

/// Met when every member is met.
pub struct AllOf<S> {
    id: String,
    conditions: Vec<Arc<dyn CommandCondition<S>>>,
}

/// Met when at least one member is met.
pub struct AnyOf<S> {
    id: String,
    conditions: Vec<Arc<dyn CommandCondition<S>>>,
}

pub fn all_of<S>(conditions: Vec<Arc<dyn CommandCondition<S>>>) -> AllOf<S> {
    let id = join_ids(&conditions, " & ");
    AllOf { id, conditions }
}

pub fn any_of<S>(conditions: Vec<Arc<dyn CommandCondition<S>>>) -> AnyOf<S> {
    let id = join_ids(&conditions, " | ");
    AnyOf { id, conditions }
}

fn join_ids<S>(conditions: &[Arc<dyn CommandCondition<S>>], separator: &str) -> String {
    conditions
        .iter()
        .map(|condition| condition.id())
        .collect::<Vec<_>>()
        .join(separator)
}

impl<S> CommandCondition<S> for AllOf<S> {
    fn id(&self) -> &str {
        &self.id
    }

    fn evaluate(&self, context: &CommandContext<S>) -> bool {
        self.conditions.iter().all(|c| c.evaluate(context))
    }

    fn unmet(&self, context: &CommandContext<S>) -> Option<String> {
        self.conditions.iter().find_map(|c| c.unmet(context))
    }
}

impl<S> CommandCondition<S> for AnyOf<S> {
    fn id(&self) -> &str {
        &self.id
    }

    fn evaluate(&self, context: &CommandContext<S>) -> bool {
        self.conditions.iter().any(|c| c.evaluate(context))
    }
}
