//! The registry.
//!
//! [`App`] exclusively owns every definition: top-level commands, groups
//! (which own their subcommands), global flags and global middleware. It is
//! assembled once with builder methods; [`App::run`] borrows it immutably, so
//! nothing about the definitions changes across invocations.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::colors::Painter;
use crate::config::ConfigLayer;
use crate::context::Context;
use crate::dispatch::{self, middleware::Middleware};
use crate::error::{self, Error, ParseError, Result, ValidationError};
use crate::help::{self, HelpTopic};
use crate::io::Io;
use crate::model::{Command, Flag, Group};
use crate::parser::helpers::FlagToken;
use crate::parser::{self, Resolution, Target, helpers};
use crate::types::ColorMode;

pub struct App {
    name: String,
    version: String,
    about: String,
    commands: IndexMap<String, Command>,
    groups: IndexMap<String, Group>,
    flags: Vec<Flag>,
    pub(crate) middleware: Vec<Arc<dyn Middleware>>,
    root: Option<Command>,
    io: Io,
    interactive: Option<bool>,
    color: ColorMode,
    config: Option<ConfigLayer>,
}

impl App {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
            about: String::new(),
            commands: IndexMap::new(),
            groups: IndexMap::new(),
            flags: Vec::new(),
            middleware: Vec::new(),
            root: None,
            io: Io::std(),
            interactive: None,
            color: ColorMode::Auto,
            config: None,
        }
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = about.into();
        self
    }

    pub fn command(mut self, mut command: Command) -> Self {
        command.group = None;
        command.group_action = false;
        self.commands.insert(command.name().to_string(), command);
        self
    }

    pub fn group(mut self, group: Group) -> Self {
        self.groups.insert(group.name().to_string(), group);
        self
    }

    /// Register a global flag, visible to every command.
    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    /// Append global middleware. It runs inside command and group middleware.
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Root action: runs when argv names no command. With no commands or
    /// groups registered, every token is its positional input.
    pub fn action(mut self, mut command: Command) -> Self {
        command.group = None;
        command.group_action = false;
        self.root = Some(command);
        self
    }

    pub fn io(mut self, io: Io) -> Self {
        self.io = io;
        self
    }

    /// Override TTY detection when selecting handler variants.
    pub fn force_interactive(mut self, interactive: bool) -> Self {
        self.interactive = Some(interactive);
        self
    }

    pub fn color(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }

    /// Attach a config layer. Its values sit below env vars and explicit input.
    pub fn config(mut self, config: ConfigLayer) -> Self {
        self.config = Some(config);
        self
    }

    /// Load a TOML config layer from `path` (missing file -> empty layer).
    pub fn config_file(self, path: impl AsRef<Path>) -> Self {
        let layer = ConfigLayer::load_from_path(path.as_ref());
        self.config(layer)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version_text(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &str {
        &self.about
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    pub fn root_action(&self) -> Option<&Command> {
        self.root.as_ref()
    }

    pub fn io_handles(&self) -> &Io {
        &self.io
    }

    pub fn config_layer(&self) -> Option<&ConfigLayer> {
        self.config.as_ref()
    }

    /// Look up a top-level command by exact name.
    pub fn get_command(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn get_group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// Does the registry contain any command or group?
    pub fn has_commands(&self) -> bool {
        !self.commands.is_empty() || !self.groups.is_empty()
    }

    /// Every runnable command: top-level, group subcommands, group actions
    /// and the root action.
    pub fn all_commands(&self) -> Vec<&Command> {
        let mut all: Vec<&Command> = self.commands.values().collect();
        for group in self.groups.values() {
            all.extend(group.action_command());
            all.extend(group.commands());
        }
        all.extend(self.root.as_ref());
        all
    }

    /// Whether handler selection treats this invocation as interactive.
    pub fn is_interactive(&self) -> bool {
        self.interactive.unwrap_or_else(|| self.io.is_terminal())
    }

    fn painter(&self) -> Painter {
        Painter::new(self.color, self.io.is_terminal())
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check that no flag name or short alias repeats within any command's
    /// visible set (global + group + command).
    pub fn validate(&self) -> Result<(), ValidationError> {
        for command in self.all_commands() {
            parser::FlagSet::assemble(self, command)?;
        }
        Ok(())
    }

    // ========================================================================
    // Running
    // ========================================================================

    /// Classify `argv` without parsing flags or running anything.
    pub fn resolve<I, S>(&self, argv: I) -> Result<Resolution>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        Ok(parser::resolve(self, &argv)?)
    }

    /// Resolve and parse `argv` into a validated [`Context`] without
    /// dispatching. Help and version requests surface as errors.
    pub fn parse<I, S>(&self, argv: I) -> Result<Context<'_>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        let resolution = parser::resolve(self, &argv)?;
        let command = self.target_command(&resolution)?;
        self.build_context(command, &resolution)
    }

    /// Resolve, parse and dispatch `argv`, returning the raw outcome.
    ///
    /// Nothing is printed for errors; use [`App::run`] for the full CLI
    /// behavior (help rendering, error reporting, exit codes).
    pub fn try_run<I, S>(&self, argv: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        let resolution = parser::resolve(self, &argv)?;
        debug!(target = ?resolution.target, "resolved argv");

        if resolution.version || resolution.target == Target::Version {
            self.io.stdout.line(self.version_line());
            return Ok(());
        }

        let command = self.target_command(&resolution)?;
        if let Some(message) = command.deprecation() {
            let painter = self.painter();
            self.io.stderr.line(format!(
                "{} '{}' is deprecated: {}",
                painter.warn("[deprecated]"),
                command.path(),
                message
            ));
        }

        let mut ctx = self.build_context(command, &resolution)?;
        dispatch::execute(&mut ctx)
    }

    /// Run `argv` as a CLI: render help, report errors to the error stream
    /// and return the exit code.
    pub fn run<I, S>(&self, argv: I) -> i32
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.try_run(argv) {
            Ok(()) => 0,
            Err(err) => {
                if let Some(topic) = err.help_topic() {
                    self.io.stdout.line(help::render(self, topic, &self.painter()));
                    return 0;
                }
                let report = error::report(&err, &self.painter());
                if !report.is_empty() {
                    self.io.stderr.line(report);
                }
                error::exit_code(&err)
            }
        }
    }

    pub fn version_line(&self) -> String {
        if self.version.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.version)
        }
    }

    /// Map a resolution to the command that will run, or the error/sentinel
    /// it stands for.
    fn target_command(&self, resolution: &Resolution) -> Result<&Command> {
        let command = match &resolution.target {
            Target::Command { group: None, name } => self
                .commands
                .get(name)
                .ok_or_else(|| self.unknown_command(name))?,
            Target::Command {
                group: Some(group),
                name,
            } => self
                .groups
                .get(group)
                .and_then(|g| g.find(name))
                .ok_or_else(|| self.unknown_command(name))?,
            Target::GroupAction(group) => self
                .groups
                .get(group)
                .and_then(Group::action_command)
                .ok_or_else(|| ParseError::RequiresSubcommand {
                    group: group.clone(),
                })?,
            Target::Help(path) => return Err(Error::HelpRequested(self.help_topic(path)?)),
            Target::Version => {
                return Err(Error::exit_with(0, self.version_line()));
            }
            Target::RequiresSubcommand(group) => {
                if resolution.help {
                    return Err(Error::HelpRequested(HelpTopic::Group(group.clone())));
                }
                return Err(ParseError::RequiresSubcommand {
                    group: group.clone(),
                }
                .into());
            }
            Target::UnknownCommand(name) => return Err(self.unknown_command(name)),
            Target::UnknownSubcommand { group, name } => {
                let suggestion = self.groups.get(group).and_then(|g| {
                    let names: Vec<&str> = g.commands().map(Command::name).collect();
                    helpers::suggest(name, names)
                });
                return Err(ParseError::UnknownSubcommand {
                    group: group.clone(),
                    name: name.clone(),
                    suggestion,
                }
                .into());
            }
            Target::Root => match &self.root {
                Some(root) if !resolution.help => root,
                _ => {
                    if resolution.help || resolution.remaining.is_empty() {
                        return Err(Error::HelpRequested(HelpTopic::App));
                    }
                    let first = &resolution.remaining[0];
                    return Err(match helpers::split_flag(first) {
                        Some(flag) => self.unknown_global_flag(first, &flag),
                        None => self.unknown_command(first),
                    });
                }
            },
        };

        if resolution.help {
            return Err(Error::HelpRequested(HelpTopic::for_command(command)));
        }
        Ok(command)
    }

    fn build_context<'a>(&'a self, command: &'a Command, resolution: &Resolution) -> Result<Context<'a>> {
        let interactive = self.is_interactive();
        let mut ctx = Context::new(self, command, interactive, self.io.clone(), self.painter());
        let tokens: Vec<String> = resolution
            .global
            .iter()
            .chain(resolution.remaining.iter())
            .cloned()
            .collect();
        parser::parse_into(&mut ctx, &tokens)?;
        Ok(ctx)
    }

    /// An unrecognised flag ahead of any command, checked against the globals.
    fn unknown_global_flag(&self, token: &str, flag: &FlagToken<'_>) -> Error {
        let (flag, suggestion) = match flag {
            FlagToken::Long { name, .. } => (
                format!("--{}", name),
                helpers::suggest(name, self.flags.iter().map(Flag::name)).map(|s| format!("--{}", s)),
            ),
            FlagToken::Short { .. } => (token.to_string(), None),
        };
        ParseError::UnknownFlag { flag, suggestion }.into()
    }

    fn unknown_command(&self, name: &str) -> Error {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.extend(self.groups.keys().map(String::as_str));
        ParseError::UnknownCommand {
            name: name.to_string(),
            suggestion: helpers::suggest(name, names),
        }
        .into()
    }

    /// Resolve the path after the reserved `help` token.
    fn help_topic(&self, path: &[String]) -> Result<HelpTopic> {
        let Some(first) = path.first() else {
            return Ok(HelpTopic::App);
        };
        if let Some(command) = self.commands.get(first).or_else(|| {
            self.commands.values().find(|c| c.matches(first))
        }) {
            return Ok(HelpTopic::for_command(command));
        }
        if let Some((group, sub)) = first.split_once(':')
            && let Some(command) = self.groups.get(group).and_then(|g| g.find(sub))
        {
            return Ok(HelpTopic::for_command(command));
        }
        if let Some(group) = self.groups.get(first) {
            return match path.get(1) {
                None => Ok(HelpTopic::Group(group.name().to_string())),
                Some(sub) => group
                    .find(sub)
                    .map(HelpTopic::for_command)
                    .ok_or_else(|| {
                        ParseError::UnknownSubcommand {
                            group: group.name().to_string(),
                            name: sub.clone(),
                            suggestion: None,
                        }
                        .into()
                    }),
            };
        }
        Err(self.unknown_command(first))
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("groups", &self.groups.keys().collect::<Vec<_>>())
            .field("flags", &self.flags)
            .field("middleware", &self.middleware.len())
            .field("interactive", &self.interactive)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Arg;

    fn sample() -> (App, crate::io::Captured) {
        let (io, captured) = Io::capture("");
        let app = App::new("demo")
            .version("1.2.3")
            .io(io)
            .force_interactive(false)
            .color(ColorMode::Never)
            .flag(Flag::bool("verbose").short('v'))
            .command(
                Command::new("greet")
                    .about("Say hello")
                    .arg(Arg::optional("name"))
                    .run(|ctx| {
                        let name = ctx.arg_named("name").to_string();
                        ctx.info(format!("hello {}", name));
                        Ok(())
                    }),
            )
            .command(Command::new("empty"))
            .command(Command::new("old").deprecated("use 'greet'").run(|_| Ok(())))
            .group(
                Group::new("users")
                    .about("Manage users")
                    .command(Command::new("list").alias("ls").run(|_| Ok(()))),
            );
        (app, captured)
    }

    #[test]
    fn test_run_prints_and_returns_zero() {
        let (app, captured) = sample();
        assert_eq!(app.run(["greet", "Ada"]), 0);
        assert_eq!(captured.stdout(), "hello Ada\n");
    }

    #[test]
    fn test_version_token_and_flag() {
        let (app, captured) = sample();
        assert_eq!(app.run(["version"]), 0);
        assert_eq!(app.run(["--version"]), 0);
        assert_eq!(captured.stdout(), "demo 1.2.3\ndemo 1.2.3\n");
    }

    #[test]
    fn test_no_args_renders_help() {
        let (app, captured) = sample();
        assert_eq!(app.run(Vec::<String>::new()), 0);
        assert!(captured.stdout().contains("USAGE:"));
        assert!(captured.stdout().contains("greet"));
    }

    #[test]
    fn test_unknown_command_suggests() {
        let (app, captured) = sample();
        assert_eq!(app.run(["gret"]), 1);
        let err = captured.stderr();
        assert!(err.contains("unknown command 'gret'"));
        assert!(err.contains("did you mean 'greet'?"));
    }

    #[test]
    fn test_optional_arg_without_default_reads_empty() {
        let (app, captured) = sample();
        assert_eq!(app.run(["greet"]), 0);
        assert_eq!(captured.stdout(), "hello \n");
    }

    #[test]
    fn test_inline_unknown_flag_keeps_command_token() {
        let (app, captured) = sample();
        assert_eq!(app.run(["--region=eu", "gret"]), 1);
        let err = captured.stderr();
        assert!(err.contains("unknown command 'gret'"));
        assert!(err.contains("did you mean 'greet'?"));
    }

    #[test]
    fn test_unknown_global_flag_suggests() {
        let (app, captured) = sample();
        assert_eq!(app.run(["--verbos"]), 1);
        let err = captured.stderr();
        assert!(err.contains("unknown flag '--verbos'"));
        assert!(err.contains("did you mean '--verbose'?"));

        match app.try_run(["--verbos=1"]).unwrap_err() {
            Error::Parse(ParseError::UnknownFlag { flag, suggestion }) => {
                assert_eq!(flag, "--verbos");
                assert_eq!(suggestion.as_deref(), Some("--verbose"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_no_handler_defined() {
        let (app, _) = sample();
        let err = app.try_run(["empty"]).unwrap_err();
        assert!(matches!(err, Error::NoHandler(ref name) if name == "empty"));
    }

    #[test]
    fn test_deprecated_warns() {
        let (app, captured) = sample();
        assert_eq!(app.run(["old"]), 0);
        assert!(captured.stderr().contains("[deprecated] 'old' is deprecated: use 'greet'"));
    }

    #[test]
    fn test_help_paths() {
        let (app, _) = sample();
        let topic = |argv: &[&str]| app.try_run(argv.iter().copied()).unwrap_err();
        assert!(matches!(topic(&["help"]), Error::HelpRequested(HelpTopic::App)));
        assert!(matches!(
            topic(&["help", "users"]),
            Error::HelpRequested(HelpTopic::Group(ref g)) if g == "users"
        ));
        assert!(matches!(
            topic(&["help", "users", "ls"]),
            Error::HelpRequested(HelpTopic::Command { ref path }) if path == "users list"
        ));
        assert!(matches!(
            topic(&["greet", "--help"]),
            Error::HelpRequested(HelpTopic::Command { ref path }) if path == "greet"
        ));
        assert!(matches!(topic(&["help", "nope"]), Error::Parse(_)));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let app = App::new("dup")
            .flag(Flag::bool("verbose").short('v'))
            .command(Command::new("x").flag(Flag::string("value").short('v')));
        let err = app.validate().unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateFlag { .. }));
    }

    #[test]
    fn test_all_commands_includes_group_members() {
        let (app, _) = sample();
        let paths: Vec<String> = app.all_commands().iter().map(|c| c.path()).collect();
        assert_eq!(paths, vec!["greet", "empty", "old", "users list"]);
    }
}
