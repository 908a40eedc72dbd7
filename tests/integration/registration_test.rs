//! Integration tests for registering and unregistering modules.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use command_graph::argument::builtin::StringMapper;
use command_graph::graph::CommandGraph;
use command_graph::{
    ChainFactory, CommandChain, CommandDispatcher, CommandError, Key, RegistrationHandler,
    StateError,
};
use pretty_assertions::assert_eq;

use super::common::{dispatcher, route_module, TestModule, TestSource};

fn route(names: &[&str]) -> CommandChain<()> {
    let f = ChainFactory::<()>::new();
    let mut builder = f.chain();
    for name in names {
        builder = builder.then(f.literal(*name).build()).unwrap();
    }
    builder.build().unwrap()
}

#[test]
fn test_register_twice_fails() {
    let mut dispatcher = dispatcher();
    let module = route_module(&["ping"]);

    dispatcher.register(Arc::clone(&module)).unwrap();
    assert!(dispatcher.is_registered(&module));

    let err = dispatcher.register(Arc::clone(&module)).unwrap_err();
    assert_eq!(
        err,
        StateError::AlreadyRegistered {
            route: "ping".to_string()
        }
    );
}

#[test]
fn test_unregister_unknown_fails() {
    let mut dispatcher = dispatcher();
    let module = route_module(&["ping"]);
    assert_eq!(dispatcher.unregister(&module).unwrap_err(), StateError::NotRegistered);
}

#[test]
fn test_unregister_removes_route() {
    let mut dispatcher = dispatcher();
    let ping = route_module(&["ping"]);
    let pong = route_module(&["pong"]);
    dispatcher.register(Arc::clone(&ping)).unwrap();
    dispatcher.register(Arc::clone(&pong)).unwrap();

    dispatcher.unregister(&ping).unwrap();
    assert!(!dispatcher.is_registered(&ping));
    assert_eq!(dispatcher.chains().count(), 1);

    let err = dispatcher.dispatch(TestSource::new(), "ping").unwrap_err();
    assert!(matches!(err, CommandError::NoSuchCommand { .. }));

    let source = TestSource::new();
    dispatcher.dispatch(source.clone(), "pong").unwrap();
    assert_eq!(source.entries(), vec!["pong"]);
}

#[test]
fn test_conflicting_route_is_rejected() {
    let mut dispatcher = dispatcher();
    dispatcher.register(route_module(&["team", "invite"])).unwrap();

    let err = dispatcher.register(route_module(&["team", "invite"])).unwrap_err();
    assert_eq!(
        err,
        StateError::NodeExists {
            name: "invite".to_string()
        }
    );

    let err = dispatcher.register(route_module(&["team"])).unwrap_err();
    assert!(matches!(err, StateError::NodeExists { .. }));
}

#[test]
fn test_sibling_delete_prunes_only_empty_branch() {
    let mut graph = CommandGraph::new();
    graph.insert(&route(&["a", "b"]), 1).unwrap();
    graph.insert(&route(&["a", "c"]), 2).unwrap();

    assert_eq!(graph.delete(&route(&["a", "b"])).unwrap(), 1);
    assert_eq!(graph.children(&["a"]), Some(vec!["c".to_string()]));

    assert_eq!(graph.delete(&route(&["a", "c"])).unwrap(), 2);
    assert_eq!(graph.children(&["a"]), None);
    assert!(graph.is_empty());
    assert_eq!(graph.len(), 0);
}

#[test]
fn test_argument_after_terminal_fails_at_build() {
    let f = ChainFactory::<TestSource>::new();
    let result = f
        .chain()
        .then(f.literal("say").build())
        .unwrap()
        .arguments()
        .then(f.required(Key::<String>::named("message"), StringMapper::greedy()).build())
        .unwrap()
        .then(f.required(Key::<String>::named("target"), StringMapper::word()).build());

    assert!(matches!(
        result,
        Err(StateError::AfterTerminal { ref name, ref terminal })
            if name == "target" && terminal == "message"
    ));
}

#[test]
fn test_invalid_chain_fails_registration() {
    let mut dispatcher = dispatcher();
    let module = TestModule::new(|f| {
        f.chain()
            .then(f.literal("cmd").build())?
            .flags()
            .then(f.presence_flag("all").assume_shorthand().build())?
            .then(f.presence_flag("any").assume_shorthand().build())?
            .build()
    })
    .shared();

    let err = dispatcher.register(Arc::clone(&module)).unwrap_err();
    assert_eq!(
        err,
        StateError::DuplicateShorthand {
            shorthand: 'a',
            existing: "all".to_string()
        }
    );
    assert!(!dispatcher.is_registered(&module));
}

/// Vetoes every registration under `blocked`, counting every call.
struct Gate {
    blocked: &'static str,
    calls: Arc<AtomicUsize>,
}

impl<S> RegistrationHandler<S> for Gate {
    fn on_register(&self, chain: &CommandChain<S>) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        chain.route()[0].name() != self.blocked
    }

    fn on_unregister(&self, _chain: &CommandChain<S>) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        false
    }
}

#[test]
fn test_registration_handler_can_veto() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut dispatcher = CommandDispatcher::<TestSource>::builder()
        .registration_handler(Gate {
            blocked: "forbidden",
            calls: Arc::clone(&calls),
        })
        .build();

    let forbidden = route_module(&["forbidden"]);
    let allowed = route_module(&["allowed"]);

    // A veto is silent.
    dispatcher.register(Arc::clone(&forbidden)).unwrap();
    assert!(!dispatcher.is_registered(&forbidden));
    assert!(dispatcher.dispatch(TestSource::new(), "forbidden").is_err());

    dispatcher.register(Arc::clone(&allowed)).unwrap();
    assert!(dispatcher.is_registered(&allowed));

    dispatcher.unregister(&allowed).unwrap();
    assert!(dispatcher.is_registered(&allowed));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
