//! Command groups: one level of namespacing (`app users list`).

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::arg::Arg;
use super::command::{Command, ValidatorFn};
use super::flag::Flag;
use crate::context::Context;
use crate::dispatch::middleware::Middleware;
use crate::error::Result;

/// A namespace of related commands, optionally invocable bare via its own
/// action.
///
/// Group flags are visible to every subcommand and to the action. Group
/// middleware wraps inside the subcommand's middleware and outside the global
/// middleware; group validators run before the subcommand's validators.
#[derive(Clone)]
pub struct Group {
    name: String,
    about: String,
    hidden: bool,
    commands: IndexMap<String, Command>,
    action: Option<Command>,
    flags: Vec<Flag>,
    pub(crate) middleware: Vec<Arc<dyn Middleware>>,
    pub(crate) validators: Vec<ValidatorFn>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: String::new(),
            hidden: false,
            commands: IndexMap::new(),
            action: None,
            flags: Vec::new(),
            middleware: Vec::new(),
            validators: Vec::new(),
        }
    }

    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = about.into();
        if let Some(action) = self.action.take() {
            self.action = Some(action.about(self.about.clone()));
        }
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Add a subcommand. Its back-reference is set to this group's name.
    pub fn command(mut self, mut command: Command) -> Self {
        command.group = Some(self.name.clone());
        command.group_action = false;
        self.commands.insert(command.name().to_string(), command);
        self
    }

    /// Handler for a bare `app <group> [args...]` invocation. Tokens that do
    /// not name a subcommand are passed to it as positionals.
    pub fn action<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<()> + Send + Sync + 'static,
    {
        let command = self.take_action().run(handler);
        self.action = Some(command);
        self
    }

    /// Declare a positional slot for the group action.
    pub fn action_arg(mut self, arg: Arg) -> Self {
        let command = self.take_action().arg(arg);
        self.action = Some(command);
        self
    }

    fn take_action(&mut self) -> Command {
        self.action.take().unwrap_or_else(|| {
            let mut command = Command::new(self.name.clone()).about(self.about.clone());
            command.group = Some(self.name.clone());
            command.group_action = true;
            command
        })
    }

    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Context<'_>) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.about
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    /// The synthetic command carrying the group's own action, if registered.
    pub fn action_command(&self) -> Option<&Command> {
        self.action.as_ref()
    }

    /// Find a subcommand by exact name, then by alias.
    pub fn find(&self, token: &str) -> Option<&Command> {
        self.commands
            .get(token)
            .or_else(|| self.commands.values().find(|cmd| cmd.matches(token)))
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("action", &self.action.is_some())
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
