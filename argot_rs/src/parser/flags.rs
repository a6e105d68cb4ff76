//! Per-command flag and positional parsing.
//!
//! Given a command and its token slice, populate a [`Context`] in four
//! passes:
//!
//! 1. seed every visible flag: static default, then config layer, then env
//! 2. scan tokens left to right, storing explicit values and collecting
//!    positional overflow
//! 3. bind overflow to declared args by index
//! 4. check required flags, then run group and command validators
//!
//! The visible flag set is global ∪ group ∪ command.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace, warn};

use super::helpers::{FlagToken, split_flag, suggest};
use crate::app::App;
use crate::config;
use crate::context::{Context, Source};
use crate::error::{Error, ParseError, Result, ValidationError};
use crate::help::HelpTopic;
use crate::model::{Command, Flag, Value};

/// The flags visible to one command, indexed by name and short alias.
#[derive(Debug)]
pub struct FlagSet<'a> {
    flags: Vec<&'a Flag>,
    by_name: HashMap<&'a str, usize>,
    by_short: HashMap<char, usize>,
}

impl<'a> FlagSet<'a> {
    /// Collect global, group and command flags, rejecting any repeated name
    /// or short alias.
    pub fn assemble(app: &'a App, command: &'a Command) -> Result<Self, ValidationError> {
        let group_flags = command
            .group()
            .and_then(|name| app.get_group(name))
            .map(|group| group.flags())
            .unwrap_or_default();

        let mut set = FlagSet {
            flags: Vec::new(),
            by_name: HashMap::new(),
            by_short: HashMap::new(),
        };
        let scope = command.path();
        for flag in app.flags().iter().chain(group_flags).chain(command.flags()) {
            let index = set.flags.len();
            if set.by_name.insert(flag.name(), index).is_some() {
                return Err(ValidationError::DuplicateFlag {
                    name: format!("--{}", flag.name()),
                    scope,
                });
            }
            if let Some(short) = flag.short_name()
                && set.by_short.insert(short, index).is_some()
            {
                return Err(ValidationError::DuplicateFlag {
                    name: format!("-{}", short),
                    scope,
                });
            }
            set.flags.push(flag);
        }
        Ok(set)
    }

    pub fn long(&self, name: &str) -> Option<&'a Flag> {
        self.by_name.get(name).map(|&i| self.flags[i])
    }

    pub fn short(&self, short: char) -> Option<&'a Flag> {
        self.by_short.get(&short).map(|&i| self.flags[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Flag> + '_ {
        self.flags.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Parse `tokens` for the context's command and populate the context.
pub fn parse_into<'a>(ctx: &mut Context<'a>, tokens: &[String]) -> Result<()> {
    let app = ctx.app();
    let command = ctx.command();
    let set = FlagSet::assemble(app, command)?;

    seed(ctx, &set)?;
    let overflow = scan(ctx, &set, tokens)?;
    bind_positionals(ctx, command, overflow)?;
    check_required(ctx, &set)?;
    run_validators(ctx)?;
    Ok(())
}

// ============================================================================
// Pass 1: defaults, config, env
// ============================================================================

fn seed(ctx: &mut Context<'_>, set: &FlagSet<'_>) -> Result<()> {
    let command = ctx.command();
    let segments = command.path_segments();
    let layer = ctx.app().config_layer();

    for flag in set.iter() {
        ctx.set(flag.name(), flag.default_value().clone(), Source::Default);

        if let Some(raw) = layer.and_then(|layer| layer.lookup(&segments, flag.name())) {
            let value = match config::to_value(flag.kind(), raw) {
                Ok(value) => value,
                Err(reason) => {
                    warn!(flag = flag.name(), %reason, "config value does not fit flag type; stored raw");
                    Value::Str(raw.to_string())
                }
            };
            ctx.set(flag.name(), value, Source::Config);
        }

        if let Some(var) = flag.env_var()
            && let Ok(raw) = std::env::var(var)
        {
            flag.check(&raw)?;
            let value = match Value::parse(flag.kind(), &raw) {
                Ok(value) => value,
                Err(reason) => {
                    warn!(flag = flag.name(), env = var, %reason, "env value does not fit flag type; stored raw");
                    Value::Str(raw)
                }
            };
            trace!(flag = flag.name(), env = var, "flag seeded from environment");
            ctx.set(flag.name(), value, Source::Env);
        }
    }
    Ok(())
}

// ============================================================================
// Pass 2: token scan
// ============================================================================

fn scan(ctx: &mut Context<'_>, set: &FlagSet<'_>, tokens: &[String]) -> Result<Vec<String>> {
    let command = ctx.command();
    let mut overflow = Vec::new();
    let mut explicit_lists: HashSet<String> = HashSet::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        if token == "--" {
            overflow.extend(tokens[i + 1..].iter().cloned());
            break;
        }
        let Some(flag_token) = split_flag(token) else {
            overflow.push(token.clone());
            i += 1;
            continue;
        };

        match flag_token {
            FlagToken::Long { name, value } => {
                if name.is_empty() {
                    return Err(ParseError::MalformedFlag {
                        token: token.clone(),
                    }
                    .into());
                }
                let display = format!("--{}", name);
                let flag = match set.long(name) {
                    Some(flag) => flag,
                    None if name == "help" => {
                        return Err(Error::HelpRequested(HelpTopic::for_command(command)));
                    }
                    None => {
                        return Err(ParseError::UnknownFlag {
                            suggestion: suggest(name, set.iter().map(Flag::name)).map(|s| format!("--{}", s)),
                            flag: display,
                        }
                        .into());
                    }
                };
                let raw = take_value(flag, value, &display, tokens, &mut i)?;
                assign(ctx, flag, &display, &raw, &mut explicit_lists)?;
            }
            FlagToken::Short { chars, value } => {
                let Some((&last, init)) = chars.split_last() else {
                    return Err(ParseError::MalformedFlag {
                        token: token.clone(),
                    }
                    .into());
                };
                for &c in init {
                    let flag = short_flag(set, command, c)?;
                    if flag.takes_value() {
                        return Err(ParseError::BundledValue {
                            flag: c,
                            token: token.clone(),
                        }
                        .into());
                    }
                    assign(ctx, flag, &format!("-{}", c), "true", &mut explicit_lists)?;
                }
                let flag = short_flag(set, command, last)?;
                let display = format!("-{}", last);
                let raw = take_value(flag, value, &display, tokens, &mut i)?;
                assign(ctx, flag, &display, &raw, &mut explicit_lists)?;
            }
        }
        i += 1;
    }

    trace!(overflow = ?overflow, "token scan finished");
    Ok(overflow)
}

fn short_flag<'a>(set: &FlagSet<'a>, command: &Command, c: char) -> Result<&'a Flag> {
    match set.short(c) {
        Some(flag) => Ok(flag),
        None if c == 'h' => Err(Error::HelpRequested(HelpTopic::for_command(command))),
        None => Err(ParseError::UnknownFlag {
            flag: format!("-{}", c),
            suggestion: None,
        }
        .into()),
    }
}

/// The raw text for a flag: its inline value, `true` for a bare boolean, or
/// the next token.
fn take_value(
    flag: &Flag,
    inline: Option<&str>,
    display: &str,
    tokens: &[String],
    i: &mut usize,
) -> Result<String> {
    match inline {
        Some(value) => Ok(value.to_string()),
        None if !flag.takes_value() => Ok("true".to_string()),
        None => {
            *i += 1;
            tokens.get(*i).cloned().ok_or_else(|| {
                ParseError::MissingValue {
                    flag: display.to_string(),
                }
                .into()
            })
        }
    }
}

/// Parse, validate and store one explicit value. List flags replace their
/// seeded value on first occurrence and append afterwards.
fn assign(
    ctx: &mut Context<'_>,
    flag: &Flag,
    display: &str,
    raw: &str,
    explicit_lists: &mut HashSet<String>,
) -> Result<()> {
    let value = Value::parse(flag.kind(), raw).map_err(|reason| ParseError::InvalidValue {
        flag: display.to_string(),
        value: raw.to_string(),
        reason,
    })?;
    flag.check(raw)?;

    let value = if flag.kind().is_list() && !explicit_lists.insert(flag.name().to_string()) {
        append(ctx.value(flag.name()), value)
    } else {
        value
    };
    ctx.set(flag.name(), value, Source::Explicit);
    Ok(())
}

fn append(existing: Option<&Value>, value: Value) -> Value {
    match (existing, value) {
        (Some(Value::StrList(old)), Value::StrList(new)) => {
            Value::StrList(old.iter().cloned().chain(new).collect())
        }
        (Some(Value::IntList(old)), Value::IntList(new)) => {
            Value::IntList(old.iter().copied().chain(new).collect())
        }
        (_, value) => value,
    }
}

// ============================================================================
// Pass 3: positionals
// ============================================================================

fn bind_positionals(ctx: &mut Context<'_>, command: &Command, overflow: Vec<String>) -> Result<()> {
    let declared = command.args();
    let mut named: HashMap<String, String> = HashMap::new();
    let mut bound: Vec<String> = Vec::new();

    for (index, arg) in declared.iter().enumerate() {
        match overflow.get(index) {
            Some(token) => {
                named.insert(arg.name().to_string(), token.clone());
                bound.push(token.clone());
            }
            None if arg.is_required() => {
                return Err(ValidationError::MissingArg {
                    arg: arg.name().to_string(),
                }
                .into());
            }
            None => {
                if let Some(default) = arg.default_value() {
                    let text = default.as_string();
                    named.insert(arg.name().to_string(), text.clone());
                    bound.push(text);
                }
            }
        }
    }

    let args = if overflow.len() > declared.len() {
        overflow
    } else {
        bound
    };
    debug!(args = ?args, "positionals bound");
    ctx.bind_args(args, named);
    Ok(())
}

// ============================================================================
// Pass 4: required flags and validators
// ============================================================================

fn check_required(ctx: &Context<'_>, set: &FlagSet<'_>) -> Result<()> {
    for flag in set.iter().filter(|f| f.is_required()) {
        let provided = ctx
            .source(flag.name())
            .is_some_and(|source| source != Source::Default);
        if !provided {
            return Err(ValidationError::MissingFlag {
                flag: flag.name().to_string(),
            }
            .into());
        }
    }
    Ok(())
}

fn run_validators(ctx: &Context<'_>) -> Result<()> {
    let command = ctx.command();
    let group = command.group().and_then(|name| ctx.app().get_group(name));
    let group_validators = group.map(|g| g.validators.as_slice()).unwrap_or_default();

    for validator in group_validators.iter().chain(&command.validators) {
        validator(ctx).map_err(ValidationError::Command)?;
    }
    Ok(())
}
