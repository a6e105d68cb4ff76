//! Argument-vector resolution.
//!
//! One left-to-right scan with one token of lookahead splits argv into
//! global-flag tokens, a target (which command runs, or which condition to
//! report) and the tokens that belong to the target command.
//!
//! Lookup order for a non-flag token:
//!
//! ```text
//! command name -> command alias -> group:command -> group -> help / version
//! ```
//!
//! Unknown flags met before the command are not errors here. They are
//! deferred and forwarded to the command's own parser, which knows the
//! command's flags.

use tracing::{debug, trace};

use super::helpers::{FlagToken, is_flag_shaped, split_flag};
use crate::app::App;
use crate::error::ParseError;
use crate::model::{Command, Flag};

/// What argv resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// No command named; the root action (or app help) applies.
    Root,
    Command { group: Option<String>, name: String },
    /// A bare group with a registered action.
    GroupAction(String),
    /// The reserved `help` token followed by an optional path.
    Help(Vec<String>),
    /// The reserved `version` token.
    Version,
    RequiresSubcommand(String),
    UnknownCommand(String),
    UnknownSubcommand { group: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Recognised global-flag tokens, in order, with their values.
    pub global: Vec<String>,
    pub target: Target,
    /// Tokens for the target command: deferred unknown flags first, then
    /// everything after the command path.
    pub remaining: Vec<String>,
    /// `--help` / `-h` appeared before the command path.
    pub help: bool,
    /// `--version` / `-V` appeared before the command path.
    pub version: bool,
}

impl Resolution {
    fn new(target: Target) -> Self {
        Self {
            global: Vec::new(),
            target,
            remaining: Vec::new(),
            help: false,
            version: false,
        }
    }
}

/// A non-flag token looked up against the registry.
enum Lookup {
    Command(Target),
    Group(String),
    UnknownSubcommand { group: String, name: String },
    Help,
    Version,
    Nothing,
}

fn lookup(app: &App, token: &str) -> Lookup {
    if let Some(command) = app.get_command(token) {
        return Lookup::Command(Target::Command {
            group: None,
            name: command.name().to_string(),
        });
    }
    if let Some(command) = app.commands().find(|c| c.matches(token)) {
        return Lookup::Command(Target::Command {
            group: None,
            name: command.name().to_string(),
        });
    }
    if let Some((group_name, sub)) = token.split_once(':')
        && let Some(group) = app.get_group(group_name)
    {
        return match group.find(sub) {
            Some(command) => Lookup::Command(Target::Command {
                group: Some(group.name().to_string()),
                name: command.name().to_string(),
            }),
            None => Lookup::UnknownSubcommand {
                group: group.name().to_string(),
                name: sub.to_string(),
            },
        };
    }
    if let Some(group) = app.get_group(token) {
        return Lookup::Group(group.name().to_string());
    }
    match token {
        "help" => Lookup::Help,
        "version" => Lookup::Version,
        _ => Lookup::Nothing,
    }
}

/// Does `token` name something the registry can dispatch to?
fn resolves(app: &App, token: &str) -> bool {
    !is_flag_shaped(token) && matches!(lookup(app, token), Lookup::Command(_) | Lookup::Group(_))
}

fn global_long<'a>(app: &'a App, name: &str) -> Option<&'a Flag> {
    app.flags().iter().find(|f| f.name() == name)
}

fn global_short(app: &App, short: char) -> Option<&Flag> {
    app.flags().iter().find(|f| f.short_name() == Some(short))
}

/// Built-in `--help`/`-h` and `--version`/`-V`, unless a global flag owns
/// the spelling.
enum Builtin {
    Help,
    Version,
}

fn builtin(app: &App, token: &FlagToken<'_>) -> Option<Builtin> {
    match token {
        FlagToken::Long { name, value: None } => match *name {
            "help" if global_long(app, "help").is_none() => Some(Builtin::Help),
            "version" if global_long(app, "version").is_none() => Some(Builtin::Version),
            _ => None,
        },
        FlagToken::Short { chars, value: None } if chars.len() == 1 => match chars[0] {
            'h' if global_short(app, 'h').is_none() => Some(Builtin::Help),
            'V' if global_short(app, 'V').is_none() => Some(Builtin::Version),
            _ => None,
        },
        _ => None,
    }
}

/// How many following tokens a recognised global flag consumes, or `None`
/// when the token is not entirely made of global flags.
fn global_arity(app: &App, token: &FlagToken<'_>) -> Option<usize> {
    match token {
        FlagToken::Long { name, value } => {
            let flag = global_long(app, name)?;
            Some(usize::from(flag.takes_value() && value.is_none()))
        }
        FlagToken::Short { chars, value } => {
            let (last, init) = chars.split_last()?;
            for c in init {
                if global_short(app, *c)?.takes_value() {
                    return None;
                }
            }
            let flag = global_short(app, *last)?;
            Some(usize::from(flag.takes_value() && value.is_none()))
        }
    }
}

/// Resolve `argv` against the registry.
pub fn resolve(app: &App, argv: &[String]) -> Result<Resolution, ParseError> {
    if !app.has_commands() {
        return Ok(resolve_root_only(app, argv));
    }

    let mut global: Vec<String> = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut help = false;
    let mut version = false;
    let mut i = 0;

    while i < argv.len() {
        let token = &argv[i];

        if token == "--" {
            // One attempt to resolve the very next token, then everything is
            // positional.
            let mut resolution = match argv.get(i + 1) {
                Some(next) if resolves(app, next) => {
                    let mut rest = vec!["--".to_string()];
                    rest.extend(argv[i + 2..].iter().cloned());
                    resolve_at(app, next, &argv[i + 1..], rest, pending)
                }
                Some(next) => {
                    let mut resolution = Resolution::new(Target::UnknownCommand(next.clone()));
                    resolution.remaining = pending;
                    resolution
                }
                None => {
                    let mut resolution = Resolution::new(Target::Root);
                    resolution.remaining = pending;
                    resolution
                }
            };
            resolution.global = global;
            resolution.help |= help;
            resolution.version |= version;
            return Ok(resolution);
        }

        if let Some(flag) = split_flag(token) {
            match builtin(app, &flag) {
                Some(Builtin::Help) => {
                    help = true;
                    i += 1;
                    continue;
                }
                Some(Builtin::Version) => {
                    version = true;
                    i += 1;
                    continue;
                }
                None => {}
            }

            if let Some(arity) = global_arity(app, &flag) {
                global.push(token.clone());
                if arity == 1 {
                    let value = argv.get(i + 1).ok_or_else(|| ParseError::MissingValue {
                        flag: token.clone(),
                    })?;
                    global.push(value.clone());
                }
                i += 1 + arity;
                continue;
            }

            // Unknown here; defer to the command's parser.
            let inline = matches!(
                flag,
                FlagToken::Long { value: Some(_), .. } | FlagToken::Short { value: Some(_), .. }
            );
            pending.push(token.clone());
            match argv.get(i + 1) {
                Some(next)
                    if !inline && !is_flag_shaped(next) && !resolves(app, next) && next != "--" =>
                {
                    trace!(flag = %token, value = %next, "deferring unknown flag with value");
                    pending.push(next.clone());
                    i += 2;
                }
                _ => {
                    trace!(flag = %token, "deferring unknown flag");
                    i += 1;
                }
            }
            continue;
        }

        let rest: Vec<String> = argv[i + 1..].to_vec();
        let mut resolution = resolve_at(app, token, &argv[i..], rest, pending);
        resolution.global = global;
        resolution.help |= help;
        resolution.version |= version;
        debug!(target = ?resolution.target, "argv resolved");
        return Ok(resolution);
    }

    let mut resolution = Resolution::new(Target::Root);
    resolution.global = global;
    resolution.remaining = pending;
    resolution.help = help;
    resolution.version = version;
    Ok(resolution)
}

/// Resolve the command token `token`. `from_token` is argv starting at the
/// token; `rest` is what follows it (possibly with a forwarded `--`).
fn resolve_at(
    app: &App,
    token: &str,
    from_token: &[String],
    rest: Vec<String>,
    pending: Vec<String>,
) -> Resolution {
    let finish = |target: Target, tail: Vec<String>| {
        let mut resolution = Resolution::new(target);
        resolution.remaining = pending.clone();
        resolution.remaining.extend(tail);
        resolution
    };

    match lookup(app, token) {
        Lookup::Command(target) => finish(target, rest),
        Lookup::UnknownSubcommand { group, name } => {
            finish(Target::UnknownSubcommand { group, name }, rest)
        }
        Lookup::Group(group_name) => resolve_group(app, &group_name, rest, &finish),
        Lookup::Help => {
            let path = from_token[1..]
                .iter()
                .filter(|t| !is_flag_shaped(t) && *t != "--")
                .cloned()
                .collect();
            finish(Target::Help(path), Vec::new())
        }
        Lookup::Version => finish(Target::Version, Vec::new()),
        Lookup::Nothing => finish(Target::UnknownCommand(token.to_string()), rest),
    }
}

fn resolve_group(
    app: &App,
    group_name: &str,
    rest: Vec<String>,
    finish: &dyn Fn(Target, Vec<String>) -> Resolution,
) -> Resolution {
    let Some(group) = app.get_group(group_name) else {
        return finish(Target::UnknownCommand(group_name.to_string()), rest);
    };
    let next = rest.first().filter(|t| *t != "--");

    if let Some(command) = next
        .filter(|t| !is_flag_shaped(t))
        .and_then(|t| group.find(t))
    {
        return finish(
            Target::Command {
                group: Some(group.name().to_string()),
                name: command.name().to_string(),
            },
            rest[1..].to_vec(),
        );
    }

    if group.action_command().is_some() {
        return finish(Target::GroupAction(group.name().to_string()), rest);
    }

    match next {
        Some(token) if !is_flag_shaped(token) => finish(
            Target::UnknownSubcommand {
                group: group.name().to_string(),
                name: token.clone(),
            },
            rest[1..].to_vec(),
        ),
        _ => {
            let asks_help = rest.iter().any(|t| t == "--help" || t == "-h");
            let mut resolution =
                finish(Target::RequiresSubcommand(group.name().to_string()), rest);
            resolution.help |= asks_help;
            resolution
        }
    }
}

/// With no commands or groups registered, every token is input for the root
/// action. Only `--version`/`-V` before a `--` is intercepted.
fn resolve_root_only(app: &App, argv: &[String]) -> Resolution {
    let mut resolution = Resolution::new(Target::Root);
    let mut scanning = true;
    for token in argv {
        if token == "--" {
            scanning = false;
        }
        if scanning
            && let Some(flag) = split_flag(token)
            && matches!(builtin(app, &flag), Some(Builtin::Version))
            && !root_owns(app.root_action(), &flag)
        {
            resolution.version = true;
            continue;
        }
        resolution.remaining.push(token.clone());
    }
    resolution
}

fn root_owns(root: Option<&Command>, token: &FlagToken<'_>) -> bool {
    let Some(root) = root else { return false };
    match token {
        FlagToken::Long { name, .. } => root.flags().iter().any(|f| f.name() == *name),
        FlagToken::Short { chars, .. } => chars
            .iter()
            .any(|c| root.flags().iter().any(|f| f.short_name() == Some(*c))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Arg, Group};

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn app() -> App {
        App::new("t")
            .flag(Flag::bool("verbose").short('v'))
            .flag(Flag::string("output").short('o'))
            .command(Command::new("deploy").alias("ship"))
            .group(
                Group::new("users")
                    .command(Command::new("list").alias("ls"))
                    .command(Command::new("add").arg(Arg::required("name"))),
            )
            .group(
                Group::new("db")
                    .command(Command::new("migrate"))
                    .action(|_| Ok(())),
            )
    }

    fn target(tokens: &[&str]) -> Target {
        resolve(&app(), &argv(tokens)).unwrap().target
    }

    fn cmd(group: Option<&str>, name: &str) -> Target {
        Target::Command {
            group: group.map(String::from),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_direct_and_alias() {
        assert_eq!(target(&["deploy"]), cmd(None, "deploy"));
        assert_eq!(target(&["ship"]), cmd(None, "deploy"));
    }

    #[test]
    fn test_group_forms_agree() {
        assert_eq!(target(&["users", "list"]), cmd(Some("users"), "list"));
        assert_eq!(target(&["users:list"]), cmd(Some("users"), "list"));
        assert_eq!(target(&["users", "ls"]), cmd(Some("users"), "list"));
        assert_eq!(target(&["users:ls"]), cmd(Some("users"), "list"));
    }

    #[test]
    fn test_group_conditions() {
        assert_eq!(target(&["users"]), Target::RequiresSubcommand("users".into()));
        assert_eq!(
            target(&["users", "--flag"]),
            Target::RequiresSubcommand("users".into())
        );
        assert_eq!(
            target(&["users", "nope"]),
            Target::UnknownSubcommand {
                group: "users".into(),
                name: "nope".into()
            }
        );
        assert_eq!(
            target(&["users:nope"]),
            Target::UnknownSubcommand {
                group: "users".into(),
                name: "nope".into()
            }
        );
        assert_eq!(target(&["db"]), Target::GroupAction("db".into()));
        assert_eq!(target(&["db", "migrate"]), cmd(Some("db"), "migrate"));
        assert_eq!(target(&["db", "seed"]), Target::GroupAction("db".into()));
    }

    #[test]
    fn test_group_help_request() {
        let resolution = resolve(&app(), &argv(&["users", "--help"])).unwrap();
        assert_eq!(resolution.target, Target::RequiresSubcommand("users".into()));
        assert!(resolution.help);
    }

    #[test]
    fn test_global_flags_before_command() {
        let resolution = resolve(&app(), &argv(&["-v", "--output", "json", "deploy", "x"])).unwrap();
        assert_eq!(resolution.global, argv(&["-v", "--output", "json"]));
        assert_eq!(resolution.target, cmd(None, "deploy"));
        assert_eq!(resolution.remaining, argv(&["x"]));
    }

    #[test]
    fn test_global_flag_missing_value() {
        let err = resolve(&app(), &argv(&["--output"])).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingValue {
                flag: "--output".into()
            }
        );
    }

    #[test]
    fn test_unknown_flag_deferred() {
        // Next token resolves: the flag goes alone.
        let resolution = resolve(&app(), &argv(&["--force", "deploy", "x"])).unwrap();
        assert_eq!(resolution.target, cmd(None, "deploy"));
        assert_eq!(resolution.remaining, argv(&["--force", "x"]));

        // Next token does not resolve: tentatively consumed as the value.
        let resolution = resolve(&app(), &argv(&["--region", "eu", "deploy"])).unwrap();
        assert_eq!(resolution.target, cmd(None, "deploy"));
        assert_eq!(resolution.remaining, argv(&["--region", "eu"]));
    }

    #[test]
    fn test_unknown_flag_with_inline_value() {
        let resolution = resolve(&app(), &argv(&["--region=eu", "deplyo"])).unwrap();
        assert_eq!(resolution.target, Target::UnknownCommand("deplyo".into()));
        assert_eq!(resolution.remaining, argv(&["--region=eu"]));

        let resolution = resolve(&app(), &argv(&["-x=1", "deploy", "y"])).unwrap();
        assert_eq!(resolution.target, cmd(None, "deploy"));
        assert_eq!(resolution.remaining, argv(&["-x=1", "y"]));
    }

    #[test]
    fn test_double_dash() {
        let resolution = resolve(&app(), &argv(&["--", "deploy", "-x", "y"])).unwrap();
        assert_eq!(resolution.target, cmd(None, "deploy"));
        assert_eq!(resolution.remaining, argv(&["--", "-x", "y"]));

        let resolution = resolve(&app(), &argv(&["deploy", "--", "--not-a-flag"])).unwrap();
        assert_eq!(resolution.remaining, argv(&["--", "--not-a-flag"]));
    }

    #[test]
    fn test_reserved_tokens() {
        assert_eq!(target(&["help"]), Target::Help(vec![]));
        assert_eq!(
            target(&["help", "users", "list"]),
            Target::Help(argv(&["users", "list"]))
        );
        assert_eq!(target(&["version"]), Target::Version);

        let resolution = resolve(&app(), &argv(&["-V"])).unwrap();
        assert!(resolution.version);
    }

    #[test]
    fn test_user_command_beats_reserved_token() {
        let app = App::new("t").command(Command::new("help")).command(Command::new("x"));
        let resolution = resolve(&app, &argv(&["help"])).unwrap();
        assert_eq!(resolution.target, cmd(None, "help"));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(target(&["depoy"]), Target::UnknownCommand("depoy".into()));
        assert_eq!(target(&[]), Target::Root);
    }

    #[test]
    fn test_negative_number_is_not_a_flag() {
        let resolution = resolve(&app(), &argv(&["deploy", "-5"])).unwrap();
        assert_eq!(resolution.remaining, argv(&["-5"]));
    }

    #[test]
    fn test_no_commands_means_root_input() {
        let app = App::new("t").action(Command::new("t").run(|_| Ok(())));
        let resolution = resolve(&app, &argv(&["a", "--b", "c"])).unwrap();
        assert_eq!(resolution.target, Target::Root);
        assert_eq!(resolution.remaining, argv(&["a", "--b", "c"]));
    }
}
