//! Command definitions.
//!
//! A [`Command`] owns its flags, args, validators, middleware and up to three
//! handler variants. The dispatcher picks exactly one variant per invocation:
//!
//! ```text
//! interactive  + interactive handler      -> interactive
//! !interactive + non-interactive handler  -> non-interactive
//! otherwise                               -> default (or "no handler defined")
//! ```

use std::fmt;
use std::sync::Arc;

use super::arg::Arg;
use super::flag::Flag;
use super::schema::{Options, flags_from_schema};
use crate::context::Context;
use crate::dispatch::middleware::Middleware;
use crate::error::Result;

/// A handler variant.
pub type HandlerFn = Arc<dyn Fn(&mut Context<'_>) -> Result<()> + Send + Sync>;

/// A command-level (or group-level) validator. Runs after flags and args are
/// bound and required fields are checked.
pub type ValidatorFn = Arc<dyn Fn(&Context<'_>) -> std::result::Result<(), String> + Send + Sync>;

#[derive(Clone, Default)]
pub(crate) struct Handlers {
    pub(crate) default: Option<HandlerFn>,
    pub(crate) interactive: Option<HandlerFn>,
    pub(crate) non_interactive: Option<HandlerFn>,
}

/// A runnable command.
#[derive(Clone)]
pub struct Command {
    name: String,
    about: String,
    long_about: String,
    deprecated: Option<String>,
    aliases: Vec<String>,
    hidden: bool,
    tool: bool,
    flags: Vec<Flag>,
    args: Vec<Arg>,
    pub(crate) validators: Vec<ValidatorFn>,
    pub(crate) middleware: Vec<Arc<dyn Middleware>>,
    pub(crate) handlers: Handlers,
    /// Name of the owning group. A handle, never a pointer.
    pub(crate) group: Option<String>,
    /// True for the synthetic command that carries a group's own action.
    pub(crate) group_action: bool,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: String::new(),
            long_about: String::new(),
            deprecated: None,
            aliases: Vec::new(),
            hidden: false,
            tool: false,
            flags: Vec::new(),
            args: Vec::new(),
            validators: Vec::new(),
            middleware: Vec::new(),
            handlers: Handlers::default(),
            group: None,
            group_action: false,
        }
    }

    // ========================================================================
    // Builder
    // ========================================================================

    /// One-line description shown in listings.
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = about.into();
        self
    }

    /// Longer description shown in the command's own help page.
    pub fn long_about(mut self, long_about: impl Into<String>) -> Self {
        self.long_about = long_about.into();
        self
    }

    /// Mark as deprecated; the message is printed before every run.
    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecated = Some(message.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Export this command through [`crate::tool_schema`].
    pub fn tool(mut self) -> Self {
        self.tool = true;
        self
    }

    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    /// Register every field of an [`Options`] schema as a flag.
    pub fn options<T: Options>(mut self) -> Self {
        self.flags.extend(flags_from_schema(&T::schema()));
        self
    }

    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Context<'_>) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Append middleware. The first-declared middleware runs outermost.
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Default handler.
    pub fn run<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.handlers.default = Some(Arc::new(handler));
        self
    }

    /// Handler used when both stdin and stdout are terminals.
    pub fn run_interactive<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.handlers.interactive = Some(Arc::new(handler));
        self
    }

    /// Handler used when the invocation is piped, scripted or in CI.
    pub fn run_non_interactive<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.handlers.non_interactive = Some(Arc::new(handler));
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

    pub fn long_description(&self) -> &str {
        &self.long_about
    }

    pub fn deprecation(&self) -> Option<&str> {
        self.deprecated.as_deref()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_tool(&self) -> bool {
        self.tool
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Name of the owning group, if any.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn is_group_action(&self) -> bool {
        self.group_action
    }

    /// Does `token` name this command, directly or via an alias?
    pub fn matches(&self, token: &str) -> bool {
        self.name == token || self.aliases.iter().any(|alias| alias == token)
    }

    /// Space-separated invocation path: `deploy`, `users list`, or `users`
    /// for a group action.
    pub fn path(&self) -> String {
        match (&self.group, self.group_action) {
            (Some(group), false) => format!("{} {}", group, self.name),
            _ => self.name.clone(),
        }
    }

    /// Path segments used for config-table lookup.
    pub fn path_segments(&self) -> Vec<&str> {
        match (&self.group, self.group_action) {
            (Some(group), false) => vec![group.as_str(), self.name.as_str()],
            _ => vec![self.name.as_str()],
        }
    }

    pub fn has_handler(&self) -> bool {
        self.handlers.default.is_some()
            || self.handlers.interactive.is_some()
            || self.handlers.non_interactive.is_some()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("aliases", &self.aliases)
            .field("flags", &self.flags)
            .field("args", &self.args)
            .field("validators", &self.validators.len())
            .field("middleware", &self.middleware.len())
            .field("hidden", &self.hidden)
            .field("tool", &self.tool)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_name_and_alias() {
        let cmd = Command::new("list").alias("ls");
        assert!(cmd.matches("list"));
        assert!(cmd.matches("ls"));
        assert!(!cmd.matches("l"));
    }

    #[test]
    fn test_path() {
        let mut cmd = Command::new("list");
        assert_eq!(cmd.path(), "list");
        cmd.group = Some("users".into());
        assert_eq!(cmd.path(), "users list");
        assert_eq!(cmd.path_segments(), vec!["users", "list"]);
        cmd.group_action = true;
        cmd.name = "users".into();
        assert_eq!(cmd.path(), "users");
    }

    #[test]
    fn test_has_handler() {
        assert!(!Command::new("x").has_handler());
        assert!(Command::new("x").run_interactive(|_| Ok(())).has_handler());
    }
}
