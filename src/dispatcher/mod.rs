//! Command registration, dispatch and completion.
//!
//! The dispatcher owns the routing tree and the chain of every registered
//! module. Registration mutates it and needs `&mut self`. Dispatch and
//! completion only read it, so a settled dispatcher can be shared behind
//! an `Arc` and used from many threads at once.

pub mod auth;
pub mod parse;
pub mod registration;
pub mod suggest;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::argument::ChainFactory;
use crate::chain::CommandChain;
use crate::context::CommandContext;
use crate::error::{CommandError, Result, StateError};
use crate::graph::{CommandGraph, RouteCompletion};
use crate::module::CommandModule;
use crate::tokenizer::Tokenizer;

use auth::{AllowAll, CommandAuthorizer};
use registration::{AcceptAll, RegistrationHandler};

/// Identity of a registered module: the address of its shared allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(usize);

impl ModuleId {
    pub fn of<S>(module: &Arc<dyn CommandModule<S>>) -> Self {
        Self(Arc::as_ptr(module) as *const () as usize)
    }
}

struct Registration<S> {
    module: Arc<dyn CommandModule<S>>,
    chain: CommandChain<S>,
}

/// Routes command lines to registered modules.
pub struct CommandDispatcher<S> {
    graph: CommandGraph<ModuleId>,
    registrations: HashMap<ModuleId, Registration<S>>,
    authorizer: Arc<dyn CommandAuthorizer<S>>,
    handler: Arc<dyn RegistrationHandler<S>>,
    factory: ChainFactory<S>,
}

impl<S> CommandDispatcher<S> {
    /// A dispatcher that allows every permission and accepts every
    /// registration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> DispatcherBuilder<S> {
        DispatcherBuilder {
            authorizer: Arc::new(AllowAll),
            handler: Arc::new(AcceptAll),
        }
    }

    /// Computes the module's chain and inserts it into the routing tree.
    pub fn register(&mut self, module: Arc<dyn CommandModule<S>>) -> std::result::Result<(), StateError> {
        let id = ModuleId::of(&module);
        let chain = module.chain(&self.factory)?;

        if self.registrations.contains_key(&id) {
            return Err(StateError::AlreadyRegistered {
                route: chain.route_path(),
            });
        }

        if !self.handler.on_register(&chain) {
            debug!(route = %chain.route_path(), "Registration interrupted by handler");
            return Ok(());
        }

        self.graph.insert(&chain, id)?;
        debug!(route = %chain.route_path(), "Registered command");
        self.registrations.insert(id, Registration { module, chain });
        Ok(())
    }

    /// Removes a previously registered module.
    pub fn unregister(&mut self, module: &Arc<dyn CommandModule<S>>) -> std::result::Result<(), StateError> {
        let id = ModuleId::of(module);
        let Some(registration) = self.registrations.get(&id) else {
            return Err(StateError::NotRegistered);
        };

        if !self.handler.on_unregister(&registration.chain) {
            debug!(route = %registration.chain.route_path(), "Unregistration interrupted by handler");
            return Ok(());
        }

        self.graph.delete(&registration.chain)?;
        debug!(route = %registration.chain.route_path(), "Unregistered command");
        self.registrations.remove(&id);
        Ok(())
    }

    pub fn is_registered(&self, module: &Arc<dyn CommandModule<S>>) -> bool {
        self.registrations.contains_key(&ModuleId::of(module))
    }

    /// Chains of every registered module, in no particular order.
    pub fn chains(&self) -> impl Iterator<Item = &CommandChain<S>> {
        self.registrations.values().map(|registration| &registration.chain)
    }

    /// Parses `line` and runs the matching module.
    pub fn dispatch(&self, source: S, line: &str) -> Result<()> {
        let mut input = Tokenizer::new(line);
        let registration = self.route(&mut input)?;
        let chain = &registration.chain;

        self.authorize(chain, &source)?;
        let context = CommandContext::new(source);
        check_conditions(chain, &context)?;

        let outcome = parse::parse(chain, &mut input, &context);
        if let Some(error) = outcome.into_error() {
            return Err(error);
        }

        debug!(route = %chain.route_path(), "Dispatching command");
        registration
            .module
            .execute(&context)
            .map_err(CommandError::from_action)
    }

    /// Candidate next tokens for a partial `line`. Never fails: anything
    /// that prevents completion yields an empty list.
    pub fn complete(&self, source: S, line: &str) -> Vec<String> {
        let mut input = Tokenizer::new(line);
        let id = match self.graph.complete(&mut input) {
            RouteCompletion::Candidates(candidates) => return candidates,
            RouteCompletion::Command(id) => id,
        };
        let Some(registration) = self.registrations.get(&id) else {
            return Vec::new();
        };
        let chain = &registration.chain;

        if let Err(error) = self.authorize(chain, &source) {
            trace!(%error, "Completion suppressed");
            return Vec::new();
        }

        let context = CommandContext::new(source);
        let outcome = parse::parse(chain, &mut input, &context);
        suggest::suggest(&context, &outcome, &input)
    }

    fn route(&self, input: &mut Tokenizer) -> Result<&Registration<S>> {
        let id = self.graph.search(input)?;
        self.registrations
            .get(&id)
            .ok_or_else(|| CommandError::NoSuchCommand {
                consumed: input.consumed().trim().to_string(),
                argument: String::new(),
                alternatives: Vec::new(),
            })
    }

    /// Checks every permission on the chain and reports all that are lacking.
    fn authorize(&self, chain: &CommandChain<S>, source: &S) -> Result<()> {
        let lacking: BTreeSet<String> = chain
            .permissions()
            .filter(|permission| !self.authorizer.authorize(permission, source))
            .map(str::to_string)
            .collect();
        if lacking.is_empty() {
            Ok(())
        } else {
            Err(CommandError::Authorization { lacking })
        }
    }
}

impl<S> Default for CommandDispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

fn check_conditions<S>(chain: &CommandChain<S>, context: &CommandContext<S>) -> Result<()> {
    for condition in chain.conditions() {
        if let Some(condition) = condition.unmet(context) {
            return Err(CommandError::UnfulfilledCondition { condition });
        }
    }
    Ok(())
}

/// Configures a [`CommandDispatcher`].
pub struct DispatcherBuilder<S> {
    authorizer: Arc<dyn CommandAuthorizer<S>>,
    handler: Arc<dyn RegistrationHandler<S>>,
}

impl<S> DispatcherBuilder<S> {
    pub fn authorizer(mut self, authorizer: impl CommandAuthorizer<S> + 'static) -> Self {
        self.authorizer = Arc::new(authorizer);
        self
    }

    pub fn registration_handler(mut self, handler: impl RegistrationHandler<S> + 'static) -> Self {
        self.handler = Arc::new(handler);
        self
    }

    pub fn build(self) -> CommandDispatcher<S> {
        CommandDispatcher {
            graph: CommandGraph::new(),
            registrations: HashMap::new(),
            authorizer: self.authorizer,
            handler: self.handler,
            factory: ChainFactory::new(),
        }
    }
}
