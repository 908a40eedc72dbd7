//! Integration tests for dispatching command lines.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::bail;
use command_graph::argument::builtin::{ChoiceMapper, NumberMapper, StringMapper};
use command_graph::{
    all_of, any_of, condition, ArgumentErrorKind, ArgumentMapperExt, CommandCondition,
    CommandError, Key, MappingError, SyntaxReason,
};
use pretty_assertions::assert_eq;

use super::common::{dispatcher_with, route_module, Context, TestModule, TestSource};

fn name() -> Key<String> {
    Key::named("name")
}

fn greet() -> TestModule {
    TestModule::new(|f| {
        f.chain()
            .then(f.literal("greet").build())?
            .arguments()
            .then(f.required(name(), StringMapper::word()).build())?
            .build()
    })
    .with_action(|ctx: &Context| {
        ctx.source().record(ctx.require(&name())?);
        Ok(())
    })
}

/// `cmd [-a] [-b] [-c] [--verbose]`, recording which flags were set.
fn flagged() -> TestModule {
    TestModule::new(|f| {
        f.chain()
            .then(f.literal("cmd").build())?
            .flags()
            .then(f.presence_flag("alpha").shorthand('a').build())?
            .then(f.presence_flag("beta").shorthand('b').build())?
            .then(f.presence_flag("gamma").shorthand('c').build())?
            .then(f.presence_flag("verbose").build())?
            .build()
    })
    .with_action(|ctx: &Context| {
        for flag in ["alpha", "beta", "gamma", "verbose"] {
            if ctx.get_or(&Key::named(flag), false) {
                ctx.source().record(flag);
            }
        }
        Ok(())
    })
}

fn syntax_reason(error: &CommandError) -> Option<SyntaxReason> {
    match error {
        CommandError::Syntax { reason, .. } => Some(*reason),
        _ => None,
    }
}

#[test]
fn test_word_arguments_fill_in_order() {
    let keys: Vec<Key<String>> = ["first", "second", "third"]
        .into_iter()
        .map(Key::named)
        .collect();
    let module = {
        let keys = keys.clone();
        let read = keys.clone();
        TestModule::new(move |f| {
            let mut builder = f.chain().then(f.literal("cmd").build())?.arguments();
            for key in &keys {
                builder = builder.then(f.required(key.clone(), StringMapper::word()).build())?;
            }
            builder.build()
        })
        .with_action(move |ctx: &Context| {
            for key in &read {
                ctx.source().record(ctx.require(key)?);
            }
            Ok(())
        })
        .shared()
    };
    let dispatcher = dispatcher_with(&[module]);

    let source = TestSource::new();
    dispatcher.dispatch(source.clone(), "cmd one two three").unwrap();
    assert_eq!(source.entries(), vec!["one", "two", "three"]);
}

#[test]
fn test_greet_arity() {
    let dispatcher = dispatcher_with(&[greet().shared()]);

    let err = dispatcher.dispatch(TestSource::new(), "greet").unwrap_err();
    assert_eq!(syntax_reason(&err), Some(SyntaxReason::TooFewArguments));
    assert_eq!(err.to_string(), "Too few arguments. Usage: greet <name>");

    let err = dispatcher
        .dispatch(TestSource::new(), "greet Alice Bob")
        .unwrap_err();
    assert_eq!(syntax_reason(&err), Some(SyntaxReason::TooManyArguments));

    let source = TestSource::new();
    dispatcher.dispatch(source.clone(), "greet Alice").unwrap();
    assert_eq!(source.entries(), vec!["Alice"]);
}

#[test]
fn test_route_is_case_insensitive() {
    let dispatcher = dispatcher_with(&[greet().shared()]);
    let source = TestSource::new();
    dispatcher.dispatch(source.clone(), "GREET Alice").unwrap();
    assert_eq!(source.entries(), vec!["Alice"]);
}

#[test]
fn test_unknown_command_lists_alternatives() {
    let dispatcher = dispatcher_with(&[route_module(&["team", "invite"]), route_module(&["team", "info"])]);

    let err = dispatcher.dispatch(TestSource::new(), "team kick").unwrap_err();
    match &err {
        CommandError::NoSuchCommand {
            consumed,
            argument,
            alternatives,
        } => {
            assert_eq!(consumed, "team");
            assert_eq!(argument, "kick");
            let names: Vec<&str> = alternatives.iter().map(|a| a.name.as_str()).collect();
            assert_eq!(names, vec!["invite", "info"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.category(), "Unknown Command");
}

#[test]
fn test_incomplete_route_is_unknown_command() {
    let dispatcher = dispatcher_with(&[route_module(&["team", "invite"])]);
    let err = dispatcher.dispatch(TestSource::new(), "team").unwrap_err();
    assert!(matches!(
        err,
        CommandError::NoSuchCommand { ref argument, .. } if argument.is_empty()
    ));
}

#[test]
fn test_shorthand_cluster_in_any_order() {
    let dispatcher = dispatcher_with(&[flagged().shared()]);

    for line in ["cmd -abc", "cmd -cab", "cmd -b -ca"] {
        let source = TestSource::new();
        dispatcher.dispatch(source.clone(), line).unwrap();
        assert_eq!(source.entries(), vec!["alpha", "beta", "gamma"], "{line}");
    }
}

#[test]
fn test_unregistered_shorthand_is_named() {
    let source = TestSource::new();
    let dispatcher = dispatcher_with(&[flagged().shared()]);

    let err = dispatcher.dispatch(source.clone(), "cmd -abz").unwrap_err();
    let argument = err.as_argument().unwrap();
    assert_eq!(
        argument.kind,
        ArgumentErrorKind::UnrecognizedFlag {
            flag: "-z".to_string()
        }
    );
    assert_eq!(argument.argument, "-abz");
    assert_eq!(err.to_string(), "Unrecognized flag '-z'");
    // Nothing ran, so no partial group was applied.
    assert!(source.entries().is_empty());
}

#[test]
fn test_unknown_long_flag() {
    let dispatcher = dispatcher_with(&[flagged().shared()]);
    let err = dispatcher
        .dispatch(TestSource::new(), "cmd --verbos -a")
        .unwrap_err();
    let argument = err.as_argument().unwrap();
    assert_eq!(argument.consumed, "cmd --verbos");
    assert_eq!(argument.remaining, "-a");
    assert!(err.is_flag_failure());
}

#[test]
fn test_duplicate_flag() {
    let dispatcher = dispatcher_with(&[flagged().shared()]);

    let err = dispatcher
        .dispatch(TestSource::new(), "cmd --verbose --verbose")
        .unwrap_err();
    assert_eq!(
        err.as_argument().map(|a| a.kind.clone()),
        Some(ArgumentErrorKind::DuplicateFlag {
            name: "verbose".to_string()
        })
    );

    let err = dispatcher.dispatch(TestSource::new(), "cmd -aba").unwrap_err();
    assert!(err.is_flag_failure());

    let err = dispatcher.dispatch(TestSource::new(), "cmd -a --alpha").unwrap_err();
    assert!(err.to_string().contains("--alpha"));
}

#[test]
fn test_value_flags_in_group_read_in_order() {
    let first = Key::<String>::named("first");
    let second = Key::<i64>::named("second");
    let module = {
        let (first, second) = (first.clone(), second.clone());
        TestModule::new(move |f| {
            f.chain()
                .then(f.literal("cmd").build())?
                .flags()
                .then(f.value_flag(first.clone(), StringMapper::word()).shorthand('f').build())?
                .then(f.value_flag(second.clone(), NumberMapper::<i64>::new()).shorthand('s').build())?
                .build()
        })
    }
    .with_action(move |ctx: &Context| {
        let first = ctx.require(&first)?;
        let second = ctx.require(&second)?;
        ctx.source().record(format!("{first}={second}"));
        Ok(())
    });
    let dispatcher = dispatcher_with(&[module.shared()]);

    let source = TestSource::new();
    dispatcher.dispatch(source.clone(), "cmd -fs word 42").unwrap();
    assert_eq!(source.entries(), vec!["word=42"]);

    let err = dispatcher
        .dispatch(TestSource::new(), "cmd -sf word 42")
        .unwrap_err();
    assert!(matches!(
        err.as_argument().map(|a| &a.kind),
        Some(ArgumentErrorKind::Mapping(MappingError::InvalidNumber { .. }))
    ));
}

#[test]
fn test_flag_missing_value_is_too_few() {
    let role = Key::<String>::named("role");
    let module = TestModule::new(move |f| {
        f.chain()
            .then(f.literal("cmd").build())?
            .flags()
            .then(f.value_flag(role.clone(), StringMapper::word()).build())?
            .build()
    });
    let dispatcher = dispatcher_with(&[module.shared()]);

    let err = dispatcher.dispatch(TestSource::new(), "cmd --role").unwrap_err();
    assert_eq!(syntax_reason(&err), Some(SyntaxReason::TooFewArguments));
}

#[test]
fn test_negative_numbers_are_positional() {
    let amount = Key::<i64>::named("amount");
    let module = {
        let amount = amount.clone();
        TestModule::new(move |f| {
            f.chain()
                .then(f.literal("pay").build())?
                .arguments()
                .then(f.required(amount.clone(), NumberMapper::<i64>::new()).build())?
                .flags()
                .then(f.presence_flag("force").assume_shorthand().build())?
                .build()
        })
    }
    .with_action(move |ctx: &Context| {
        ctx.source().record(ctx.require(&amount)?.to_string());
        Ok(())
    });
    let dispatcher = dispatcher_with(&[module.shared()]);

    let source = TestSource::new();
    dispatcher.dispatch(source.clone(), "pay -15 -f").unwrap();
    assert_eq!(source.entries(), vec!["-15"]);
}

#[test]
fn test_mapping_failure_carries_position() {
    let level = Key::<u8>::named("level");
    let module = TestModule::new(move |f| {
        f.chain()
            .then(f.literal("level").build())?
            .arguments()
            .then(f.required(level.clone(), NumberMapper::<u8>::range(1..=10)).build())?
            .build()
    });
    let dispatcher = dispatcher_with(&[module.shared()]);

    let err = dispatcher.dispatch(TestSource::new(), "level 11").unwrap_err();
    let argument = err.as_argument().unwrap();
    assert_eq!(argument.argument, "11");
    assert_eq!(argument.consumed, "level 11");
    assert!(matches!(
        argument.kind,
        ArgumentErrorKind::Mapping(MappingError::OutOfRange { .. })
    ));
}

#[test]
fn test_greedy_argument_takes_rest_of_line() {
    let message = Key::<String>::named("message");
    let module = {
        let message = message.clone();
        TestModule::new(move |f| {
            f.chain()
                .then(f.literal("say").build())?
                .arguments()
                .then(f.required(message.clone(), StringMapper::greedy()).build())?
                .build()
        })
    }
    .with_action(move |ctx: &Context| {
        ctx.source().record(ctx.require(&message)?);
        Ok(())
    });
    let dispatcher = dispatcher_with(&[module.shared()]);

    let source = TestSource::new();
    dispatcher
        .dispatch(source.clone(), "say hello --there -x world")
        .unwrap();
    assert_eq!(source.entries(), vec!["hello --there -x world"]);
}

#[test]
fn test_lacking_permissions_are_accumulated() {
    let module = TestModule::new(|f| {
        f.chain()
            .then(f.literal("secure").permission("p1").build())?
            .flags()
            .then(f.presence_flag("force").permission("p2").build())?
            .build()
    });
    let dispatcher = dispatcher_with(&[module.shared()]);

    let err = dispatcher.dispatch(TestSource::new(), "secure").unwrap_err();
    match &err {
        CommandError::Authorization { lacking } => {
            let expected: BTreeSet<String> = ["p1", "p2"].iter().map(|p| p.to_string()).collect();
            assert_eq!(lacking, &expected);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), "Missing permissions: p1, p2");

    let err = dispatcher
        .dispatch(TestSource::granting(&["p1"]), "secure")
        .unwrap_err();
    assert!(matches!(err, CommandError::Authorization { ref lacking } if lacking.len() == 1));

    dispatcher
        .dispatch(TestSource::granting(&["p1", "p2"]), "secure")
        .unwrap();
}

#[test]
fn test_authorization_precedes_parsing() {
    let module = TestModule::new(|f| {
        f.chain()
            .then(f.literal("ban").permission("admin.ban").build())?
            .arguments()
            .then(f.required(Key::<String>::named("player"), StringMapper::word()).build())?
            .build()
    });
    let dispatcher = dispatcher_with(&[module.shared()]);

    let err = dispatcher.dispatch(TestSource::new(), "ban").unwrap_err();
    assert_eq!(err.category(), "Authorization Error");
}

#[test]
fn test_unfulfilled_condition() {
    let module = TestModule::new(|f| {
        let granted: Arc<dyn CommandCondition<TestSource>> =
            Arc::new(condition("granted", |ctx: &Context| ctx.source().has("gate")));
        let has_log: Arc<dyn CommandCondition<TestSource>> = Arc::new(condition(
            "has-log",
            |ctx: &Context| !ctx.source().entries().is_empty(),
        ));
        f.chain()
            .then(f.literal("gate").expect(all_of(vec![granted, has_log])).build())?
            .build()
    })
    .with_action(|ctx: &Context| {
        ctx.source().record("opened");
        Ok(())
    });
    let dispatcher = dispatcher_with(&[module.shared()]);

    let err = dispatcher.dispatch(TestSource::new(), "gate").unwrap_err();
    match err {
        CommandError::UnfulfilledCondition { condition } => assert_eq!(condition, "granted"),
        other => panic!("unexpected error: {other:?}"),
    }

    let source = TestSource::granting(&["gate"]);
    let err = dispatcher.dispatch(source.clone(), "gate").unwrap_err();
    assert_eq!(err.to_string(), "Condition 'has-log' is not fulfilled");

    source.record("seed");
    dispatcher.dispatch(source.clone(), "gate").unwrap();
    assert_eq!(source.entries(), vec!["seed", "opened"]);
}

#[test]
fn test_any_of_condition() {
    let module = TestModule::new(|f| {
        let admin: Arc<dyn CommandCondition<TestSource>> =
            Arc::new(condition("admin", |ctx: &Context| ctx.source().has("admin")));
        let moderator: Arc<dyn CommandCondition<TestSource>> =
            Arc::new(condition("moderator", |ctx: &Context| ctx.source().has("mod")));
        f.chain()
            .then(f.literal("mute").build())?
            .arguments()
            .then(
                f.required(Key::<String>::named("player"), StringMapper::word())
                    .expect(any_of(vec![admin, moderator]))
                    .build(),
            )?
            .build()
    });
    let dispatcher = dispatcher_with(&[module.shared()]);

    let err = dispatcher.dispatch(TestSource::new(), "mute Bob").unwrap_err();
    assert_eq!(err.to_string(), "Condition 'admin | moderator' is not fulfilled");

    dispatcher
        .dispatch(TestSource::granting(&["mod"]), "mute Bob")
        .unwrap();
}

#[test]
fn test_action_failure_is_wrapped() {
    let module = TestModule::new(|f| f.chain().then(f.literal("fail").build())?.build())
        .with_action(|_: &Context| bail!("disk full"));
    let dispatcher = dispatcher_with(&[module.shared()]);

    let err = dispatcher.dispatch(TestSource::new(), "fail").unwrap_err();
    assert!(matches!(err, CommandError::Invocation(_)));
    assert_eq!(err.to_string(), "Command failed: disk full");
}

#[test]
fn test_action_command_error_passes_through() {
    let module = TestModule::new(|f| f.chain().then(f.literal("deny").build())?.build())
        .with_action(|_: &Context| {
            Err(CommandError::UnfulfilledCondition {
                condition: "daylight".to_string(),
            }
            .into())
        });
    let dispatcher = dispatcher_with(&[module.shared()]);

    let err = dispatcher.dispatch(TestSource::new(), "deny").unwrap_err();
    assert!(matches!(
        err,
        CommandError::UnfulfilledCondition { ref condition } if condition == "daylight"
    ));
}

#[test]
fn test_choice_argument() {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Mode {
        Fast,
        Safe,
    }

    let mode = Key::<Mode>::named("mode");
    let module = {
        let mode = mode.clone();
        TestModule::new(move |f| {
            f.chain()
                .then(f.literal("run").build())?
                .arguments()
                .then(
                    f.required(
                        mode.clone(),
                        ChoiceMapper::lenient([("fast", Mode::Fast), ("safe", Mode::Safe)]),
                    )
                    .build(),
                )?
                .build()
        })
    }
    .with_action(move |ctx: &Context| {
        ctx.source().record(format!("{:?}", ctx.require(&mode)?));
        Ok(())
    });
    let dispatcher = dispatcher_with(&[module.shared()]);

    let source = TestSource::new();
    dispatcher.dispatch(source.clone(), "run SAFE").unwrap();
    assert_eq!(source.entries(), vec!["Safe"]);

    let err = dispatcher.dispatch(TestSource::new(), "run slow").unwrap_err();
    assert_eq!(err.to_string(), "'slow' is not one of: fast, safe");
}

#[test]
fn test_adapted_mappers_in_chain() {
    let len = Key::<usize>::named("len");
    let count = Key::<i64>::named("count");
    let module = {
        let (len, count) = (len.clone(), count.clone());
        TestModule::new(move |f| {
            f.chain()
                .then(f.literal("measure").build())?
                .arguments()
                .then(f.required(len.clone(), StringMapper::word().mapping(|s: String| s.len())).build())?
                .then(
                    f.required(
                        count.clone(),
                        NumberMapper::<i64>::new().filtering(|n: &i64| *n > 0, "must be positive"),
                    )
                    .build(),
                )?
                .build()
        })
    }
    .with_action(move |ctx: &Context| {
        let total = ctx.require(&len)? as i64 * ctx.require(&count)?;
        ctx.source().record(total.to_string());
        Ok(())
    });
    let dispatcher = dispatcher_with(&[module.shared()]);

    let source = TestSource::new();
    dispatcher.dispatch(source.clone(), "measure hello 3").unwrap();
    assert_eq!(source.entries(), vec!["15"]);

    let err = dispatcher
        .dispatch(TestSource::new(), "measure hello 0")
        .unwrap_err();
    assert_eq!(err.to_string(), "'0' was rejected: must be positive");
}
