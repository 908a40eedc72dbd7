//! Demo command modules served by cgsh.

use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, bail};

use super::source::ShellSource;
use crate::argument::builtin::{ChoiceMapper, NumberMapper, StringMapper};
use crate::argument::ChainFactory;
use crate::chain::CommandChain;
use crate::condition::condition;
use crate::context::CommandContext;
use crate::error::StateError;
use crate::key::Key;
use crate::module::CommandModule;

type Factory = ChainFactory<ShellSource>;
type Chain = std::result::Result<CommandChain<ShellSource>, StateError>;
type Context = CommandContext<ShellSource>;

/// Every demo module.
pub fn all() -> Vec<Arc<dyn CommandModule<ShellSource>>> {
    vec![
        Arc::new(Greet),
        Arc::new(Say),
        Arc::new(TeamInvite),
        Arc::new(TeamInfo),
        Arc::new(MathAdd),
        Arc::new(MathDiv),
        Arc::new(Kick),
    ]
}

fn name_key() -> Key<String> {
    Key::named("name")
}

fn player_key() -> Key<String> {
    Key::named("player")
}

/// `greet <name> [-l|--loud]`
pub struct Greet;

impl CommandModule<ShellSource> for Greet {
    fn chain(&self, f: &Factory) -> Chain {
        f.chain()
            .then(f.literal("greet").alias("hi").build())?
            .arguments()
            .then(f.required(name_key(), StringMapper::word()).build())?
            .flags()
            .then(f.presence_flag("loud").assume_shorthand().build())?
            .build()
    }

    fn execute(&self, context: &Context) -> anyhow::Result<()> {
        let name = context.require(&name_key())?;
        let greeting = format!("Hello, {name}!");
        if context.get_or(&Key::named("loud"), false) {
            context.source().reply(greeting.to_uppercase());
        } else {
            context.source().reply(greeting);
        }
        Ok(())
    }
}

/// `say <message...>`
pub struct Say;

impl Say {
    fn message_key() -> Key<String> {
        Key::named("message")
    }
}

impl CommandModule<ShellSource> for Say {
    fn chain(&self, f: &Factory) -> Chain {
        let not_muted = condition("not-muted", |ctx: &Context| !ctx.source().is_muted());
        f.chain()
            .then(f.literal("say").expect(not_muted).build())?
            .arguments()
            .then(f.required(Self::message_key(), StringMapper::greedy()).build())?
            .build()
    }

    fn execute(&self, context: &Context) -> anyhow::Result<()> {
        let message = context.require(&Self::message_key())?;
        let source = context.source();
        source.reply(format!("[{}] {}", source.name(), message));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Member,
    Officer,
    Leader,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member => write!(f, "member"),
            Self::Officer => write!(f, "officer"),
            Self::Leader => write!(f, "leader"),
        }
    }
}

/// `team invite <player> [--role|-r <role>]`
pub struct TeamInvite;

impl TeamInvite {
    fn role_key() -> Key<Role> {
        Key::named("role")
    }
}

impl CommandModule<ShellSource> for TeamInvite {
    fn chain(&self, f: &Factory) -> Chain {
        let roles = ChoiceMapper::lenient([
            ("member", Role::Member),
            ("officer", Role::Officer),
            ("leader", Role::Leader),
        ]);
        f.chain()
            .then(f.literal("team").permission("team.use").build())?
            .then(f.literal("invite").permission("team.invite").build())?
            .arguments()
            .then(f.required(player_key(), StringMapper::word()).build())?
            .flags()
            .then(f.value_flag(Self::role_key(), roles).assume_shorthand().build())?
            .build()
    }

    fn execute(&self, context: &Context) -> anyhow::Result<()> {
        let player = context.require(&player_key())?;
        let role = context.get_or(&Self::role_key(), Role::Member);
        context
            .source()
            .reply(format!("Invited {player} to the team as {role}"));
        Ok(())
    }
}

/// `team info [-v|--verbose]`
pub struct TeamInfo;

impl CommandModule<ShellSource> for TeamInfo {
    fn chain(&self, f: &Factory) -> Chain {
        f.chain()
            .then(f.literal("team").alias("t").permission("team.use").build())?
            .then(f.literal("info").build())?
            .flags()
            .then(f.presence_flag("verbose").assume_shorthand().build())?
            .build()
    }

    fn execute(&self, context: &Context) -> anyhow::Result<()> {
        let source = context.source();
        source.reply(format!("Team of {}: 1 member", source.name()));
        if context.get_or(&Key::named("verbose"), false) {
            source.reply(format!("  {} (leader)", source.name()));
        }
        Ok(())
    }
}

fn operand_keys() -> (Key<i64>, Key<i64>) {
    (Key::named("a"), Key::named("b"))
}

fn math_chain(f: &Factory, operation: &str) -> Chain {
    let (a, b) = operand_keys();
    f.chain()
        .then(f.literal("math").alias("m").build())?
        .then(f.literal(operation).build())?
        .arguments()
        .then(f.required(a, NumberMapper::<i64>::new()).build())?
        .then(f.required(b, NumberMapper::<i64>::new()).build())?
        .build()
}

fn operands(context: &Context) -> anyhow::Result<(i64, i64)> {
    let (a, b) = operand_keys();
    Ok((context.require(&a)?, context.require(&b)?))
}

/// `math add <a> <b>`
pub struct MathAdd;

impl CommandModule<ShellSource> for MathAdd {
    fn chain(&self, f: &Factory) -> Chain {
        math_chain(f, "add")
    }

    fn execute(&self, context: &Context) -> anyhow::Result<()> {
        let (a, b) = operands(context)?;
        let sum = a
            .checked_add(b)
            .ok_or_else(|| anyhow!("{a} + {b} overflows"))?;
        context.source().reply(sum.to_string());
        Ok(())
    }
}

/// `math div <a> <b>`
pub struct MathDiv;

impl CommandModule<ShellSource> for MathDiv {
    fn chain(&self, f: &Factory) -> Chain {
        math_chain(f, "div")
    }

    fn execute(&self, context: &Context) -> anyhow::Result<()> {
        let (a, b) = operands(context)?;
        if b == 0 {
            bail!("division by zero");
        }
        let quotient = a
            .checked_div(b)
            .ok_or_else(|| anyhow!("{a} / {b} overflows"))?;
        context.source().reply(quotient.to_string());
        Ok(())
    }
}

/// `kick <player> [--reason|-r "<text>"] [-s|--silent]`
pub struct Kick;

impl Kick {
    fn reason_key() -> Key<String> {
        Key::named("reason")
    }
}

impl CommandModule<ShellSource> for Kick {
    fn chain(&self, f: &Factory) -> Chain {
        f.chain()
            .then(f.literal("kick").permission("admin.kick").build())?
            .arguments()
            .then(f.required(player_key(), StringMapper::word()).build())?
            .flags()
            .then(
                f.value_flag(Self::reason_key(), StringMapper::quotable())
                    .assume_shorthand()
                    .build(),
            )?
            .then(f.presence_flag("silent").assume_shorthand().build())?
            .build()
    }

    fn execute(&self, context: &Context) -> anyhow::Result<()> {
        let source = context.source();
        let player = context.require(&player_key())?;
        if player.eq_ignore_ascii_case(source.name()) {
            bail!("{} cannot kick themselves", source.name());
        }

        let reason = context.get_or(&Self::reason_key(), "no reason given".to_string());
        if context.get_or(&Key::named("silent"), false) {
            source.reply(format!("Kicked {player} silently"));
        } else {
            source.reply(format!("Kicked {player}: {reason}"));
        }
        Ok(())
    }
}
