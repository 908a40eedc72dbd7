//! Command modules: a chain paired with the action it triggers.

use crate::argument::ChainFactory;
use crate::chain::CommandChain;
use crate::context::CommandContext;
use crate::error::StateError;

/// A registrable command.
///
/// `chain` is called once, at registration. Its result is cached for as
/// long as the module stays registered.
///
/// # Example
///
/// ```
/// use command_graph::argument::builtin::StringMapper;
/// use command_graph::{ChainFactory, CommandChain, CommandContext, CommandModule, Key, StateError};
///
/// struct Greet;
///
/// impl CommandModule<String> for Greet {
///     fn chain(&self, f: &ChainFactory<String>) -> Result<CommandChain<String>, StateError> {
///         f.chain()
///             .then(f.literal("greet").build())?
///             .arguments()
///             .then(f.required(Key::<String>::named("name"), StringMapper::word()).build())?
///             .build()
///     }
///
///     fn execute(&self, context: &CommandContext<String>) -> anyhow::Result<()> {
///         let name = context.require(&Key::<String>::named("name"))?;
///         println!("{} greets {}", context.source(), name);
///         Ok(())
///     }
/// }
/// ```
pub trait CommandModule<S>: Send + Sync {
    fn chain(&self, factory: &ChainFactory<S>) -> Result<CommandChain<S>, StateError>;

    fn execute(&self, context: &CommandContext<S>) -> anyhow::Result<()>;
}
