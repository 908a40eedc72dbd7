//! command-graph - typed command routing, flag parsing and tab-completion
//! for text command lines.
//!
//! A [`CommandModule`] describes its syntax as a [`CommandChain`]: a route
//! of literals, then positional required arguments, then flags. Registered
//! chains form an alias-aware routing tree inside a [`CommandDispatcher`],
//! which turns a raw line into typed values in a [`CommandContext`] and
//! runs the module, or suggests what to type next.
//!
//! The `shell` module hosts the `cgsh` demo binary on top of the library.

pub mod argument;
pub mod chain;
pub mod condition;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod graph;
pub mod key;
pub mod module;
pub mod shell;
pub mod tokenizer;

pub use argument::mapper::{ArgumentMapper, ArgumentMapperExt};
pub use argument::{ChainFactory, Flag, Literal, Required};
pub use chain::CommandChain;
pub use condition::{all_of, any_of, condition, CommandCondition};
pub use context::CommandContext;
pub use dispatcher::auth::CommandAuthorizer;
pub use dispatcher::registration::RegistrationHandler;
pub use dispatcher::{CommandDispatcher, DispatcherBuilder};
pub use error::{
    ArgumentError, ArgumentErrorKind, CommandError, MappingError, StateError, SyntaxReason,
};
pub use key::{Key, KeyId};
pub use module::CommandModule;
pub use tokenizer::Tokenizer;
