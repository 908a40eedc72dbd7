//! Alias-aware routing tree.
//!
//! Nodes live in an arena addressed by index. The root sits at index 0
//! and is never removed. Each node knows its parent's index, which is
//! only used to prune empty branches after a delete.
//!
//! Name and alias matching is ASCII case-insensitive.

use std::collections::BTreeSet;

use tracing::trace;

use crate::chain::CommandChain;
use crate::error::{Alternative, CommandError, StateError};
use crate::tokenizer::Tokenizer;

/// Index of a node in the arena.
pub type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug)]
struct CommandNode<C> {
    name: String,
    aliases: BTreeSet<String>,
    children: Vec<NodeId>,
    command: Option<C>,
    parent: Option<NodeId>,
}

impl<C> CommandNode<C> {
    fn new(name: String, aliases: BTreeSet<String>, parent: Option<NodeId>) -> Self {
        Self {
            name,
            aliases,
            children: Vec::new(),
            command: None,
            parent,
        }
    }

    fn matches(&self, query: &str) -> bool {
        self.names().any(|name| name.eq_ignore_ascii_case(query))
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn alternative(&self) -> Alternative {
        Alternative {
            name: self.name.clone(),
            aliases: self.aliases.iter().cloned().collect(),
        }
    }
}

/// Result of completing a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteCompletion<C> {
    /// Routing stopped inside the tree; these are the candidate segments.
    Candidates(Vec<String>),
    /// Routing reached a command and input continues past it.
    Command(C),
}

/// Routing tree mapping literal sequences to commands of type `C`.
#[derive(Debug)]
pub struct CommandGraph<C> {
    nodes: Vec<Option<CommandNode<C>>>,
    free: Vec<NodeId>,
}

impl<C: Clone> CommandGraph<C> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(CommandNode::new(String::new(), BTreeSet::new(), None))],
            free: Vec::new(),
        }
    }

    /// Number of nodes, not counting the root.
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.node(ROOT).children.is_empty()
    }

    /// Inserts `command` at the end of `chain`'s route.
    ///
    /// Existing nodes matched along the way absorb the literal's aliases.
    /// Fails without modifying the tree if the final node already exists
    /// or an intermediate node already carries a command.
    pub fn insert<S>(&mut self, chain: &CommandChain<S>, command: C) -> Result<(), StateError> {
        let route = chain.route();
        if route.is_empty() {
            return Err(StateError::EmptyRoute);
        }

        // Validate the whole walk before touching anything.
        let mut node = ROOT;
        for (depth, literal) in route.iter().enumerate() {
            let last = depth + 1 == route.len();
            let Some(child) = self.find_literal(node, literal.names()) else {
                break;
            };
            let existing = self.node(child);
            if last {
                return Err(StateError::NodeExists {
                    name: existing.name.clone(),
                });
            }
            if existing.command.is_some() {
                return Err(StateError::NodeOccupied {
                    name: existing.name.clone(),
                });
            }
            node = child;
        }

        let mut node = ROOT;
        for literal in route {
            node = match self.find_literal(node, literal.names()) {
                Some(child) => {
                    let aliases = literal.aliases().iter().cloned();
                    self.node_mut(child).aliases.extend(aliases);
                    child
                }
                None => {
                    let child = CommandNode::new(
                        literal.name().to_string(),
                        literal.aliases().clone(),
                        Some(node),
                    );
                    let id = self.allocate(child);
                    self.node_mut(node).children.push(id);
                    id
                }
            };
        }

        self.node_mut(node).command = Some(command);
        trace!(route = %chain.route_path(), "Inserted command node");
        Ok(())
    }

    /// Removes the command at the end of `chain`'s route and prunes any
    /// branch left empty. Returns the removed command.
    pub fn delete<S>(&mut self, chain: &CommandChain<S>) -> Result<C, StateError> {
        let mut node = ROOT;
        for literal in chain.route() {
            node = self
                .find_literal(node, literal.names())
                .ok_or_else(|| StateError::MissingRoute {
                    name: literal.name().to_string(),
                })?;
        }

        if node == ROOT {
            return Err(StateError::EmptyRoute);
        }
        let target = self.node(node);
        if !target.is_leaf() {
            return Err(StateError::NotALeaf {
                name: target.name.clone(),
            });
        }

        let command = self
            .node_mut(node)
            .command
            .take()
            .ok_or_else(|| StateError::MissingRoute {
                name: chain.route_path(),
            })?;

        while node != ROOT {
            let current = self.node(node);
            if !current.is_leaf() || current.command.is_some() {
                break;
            }
            let parent = current.parent.unwrap_or(ROOT);
            self.node_mut(parent).children.retain(|&child| child != node);
            self.release(node);
            node = parent;
        }

        trace!(route = %chain.route_path(), "Deleted command node");
        Ok(command)
    }

    /// Routes `input` to a command, consuming the route segments.
    pub fn search(&self, input: &mut Tokenizer) -> Result<C, CommandError> {
        let mut node = ROOT;
        loop {
            let consumed = input.consumed().trim().to_string();
            let Ok(word) = input.read_word() else {
                return Err(self.no_such_command(node, consumed, String::new()));
            };

            let Some(child) = self.find_child(node, &word) else {
                return Err(self.no_such_command(node, consumed, word));
            };
            node = child;

            let current = self.node(node);
            if current.is_leaf() {
                return current
                    .command
                    .clone()
                    .ok_or_else(|| self.no_such_command(node, consumed, word));
            }
        }
    }

    /// Completes a partial route.
    ///
    /// Returns [`RouteCompletion::Command`] only when a command was reached
    /// and more input follows it; argument completion is then up to the
    /// caller, which continues from the tokenizer's cursor.
    pub fn complete(&self, input: &mut Tokenizer) -> RouteCompletion<C> {
        if !input.can_read_non_whitespace() {
            return RouteCompletion::Candidates(self.child_names(ROOT, ""));
        }

        let mut node = ROOT;
        loop {
            let Ok(word) = input.read_word() else {
                // Input ended with whitespace right after a node.
                return RouteCompletion::Candidates(self.child_names(node, ""));
            };

            let Some(child) = self.find_child(node, &word) else {
                if input.can_read() {
                    return RouteCompletion::Candidates(Vec::new());
                }
                return RouteCompletion::Candidates(self.child_names(node, &word));
            };

            if !input.can_read() {
                // Ended exactly on a node: offer it and its siblings.
                return RouteCompletion::Candidates(self.child_names(node, &word));
            }

            let current = self.node(child);
            if current.is_leaf() {
                return match &current.command {
                    Some(command) => RouteCompletion::Command(command.clone()),
                    None => RouteCompletion::Candidates(Vec::new()),
                };
            }
            node = child;
        }
    }

    /// Child names and aliases of the node at `path`, or `None` if the
    /// path does not resolve.
    pub fn children(&self, path: &[&str]) -> Option<Vec<String>> {
        let mut node = ROOT;
        for segment in path {
            node = self.find_child(node, segment)?;
        }
        Some(self.child_names(node, ""))
    }

    fn no_such_command(&self, node: NodeId, consumed: String, argument: String) -> CommandError {
        let alternatives = self
            .node(node)
            .children
            .iter()
            .map(|&child| self.node(child).alternative())
            .collect();
        CommandError::NoSuchCommand {
            consumed,
            argument,
            alternatives,
        }
    }

    fn child_names(&self, node: NodeId, prefix: &str) -> Vec<String> {
        let prefix = prefix.to_lowercase();
        self.node(node)
            .children
            .iter()
            .flat_map(|&child| self.node(child).names())
            .filter(|name| name.to_lowercase().starts_with(&prefix))
            .map(str::to_string)
            .collect()
    }

    fn find_child(&self, node: NodeId, query: &str) -> Option<NodeId> {
        self.node(node)
            .children
            .iter()
            .copied()
            .find(|&child| self.node(child).matches(query))
    }

    fn find_literal<'a>(&self, node: NodeId, mut names: impl Iterator<Item = &'a str>) -> Option<NodeId> {
        names.find_map(|name| self.find_child(node, name))
    }

    fn allocate(&mut self, node: CommandNode<C>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        self.nodes[id] = None;
        self.free.push(id);
    }

    fn node(&self, id: NodeId) -> &CommandNode<C> {
        match self.nodes.get(id) {
            Some(Some(node)) => node,
            _ => unreachable!("dangling node id {id}"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut CommandNode<C> {
        match self.nodes.get_mut(id) {
            Some(Some(node)) => node,
            _ => unreachable!("dangling node id {id}"),
        }
    }
}

impl<C: Clone> Default for CommandGraph<C> {
    fn default() -> Self {
        Self::new()
    }
}
