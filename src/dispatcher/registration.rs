//! Hooks observing registration changes.

use crate::chain::CommandChain;

/// Observes and may veto registration changes.
///
/// Returning `false` interrupts the change silently: the dispatcher
/// leaves its state untouched and reports success.
pub trait RegistrationHandler<S>: Send + Sync {
    fn on_register(&self, _chain: &CommandChain<S>) -> bool {
        true
    }

    fn on_unregister(&self, _chain: &CommandChain<S>) -> bool {
        true
    }
}

/// Accepts every change.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl<S> RegistrationHandler<S> for AcceptAll {}
