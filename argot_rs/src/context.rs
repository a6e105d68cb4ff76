//! Per-invocation state.
//!
//! A [`Context`] is created for one run of one command, threaded through
//! validators, middleware and the handler, then dropped. Flag reads never
//! fail: a missing or uncoercible value reads as the type's zero value.

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::time::Duration;

use crate::app::App;
use crate::colors::Painter;
use crate::io::Io;
use crate::model::{Command, Options, Value};
use crate::types::Severity;

/// Where a flag's current value came from, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    Default,
    Config,
    Env,
    Explicit,
}

impl Source {
    /// Env and explicit values mark a flag as set; defaults and config don't.
    pub fn is_set(self) -> bool {
        matches!(self, Source::Env | Source::Explicit)
    }
}

pub struct Context<'a> {
    app: &'a App,
    command: &'a Command,
    args: Vec<String>,
    named_args: HashMap<String, String>,
    values: HashMap<String, Value>,
    sources: HashMap<String, Source>,
    interactive: bool,
    io: Io,
    painter: Painter,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        app: &'a App,
        command: &'a Command,
        interactive: bool,
        io: Io,
        painter: Painter,
    ) -> Self {
        Self {
            app,
            command,
            args: Vec::new(),
            named_args: HashMap::new(),
            values: HashMap::new(),
            sources: HashMap::new(),
            interactive,
            io,
            painter,
        }
    }

    // ========================================================================
    // Flags
    // ========================================================================

    /// The stored value of `name`, if the flag is declared for this command.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn string(&self, name: &str) -> String {
        self.value(name).map(Value::as_string).unwrap_or_default()
    }

    pub fn bool(&self, name: &str) -> bool {
        self.value(name).is_some_and(Value::as_bool)
    }

    pub fn int(&self, name: &str) -> i64 {
        self.value(name).map(Value::as_int).unwrap_or_default()
    }

    pub fn float(&self, name: &str) -> f64 {
        self.value(name).map(Value::as_float).unwrap_or_default()
    }

    pub fn duration(&self, name: &str) -> Duration {
        self.value(name).map(Value::as_duration).unwrap_or_default()
    }

    pub fn strings(&self, name: &str) -> Vec<String> {
        self.value(name).map(Value::as_strings).unwrap_or_default()
    }

    pub fn ints(&self, name: &str) -> Vec<i64> {
        self.value(name).map(Value::as_ints).unwrap_or_default()
    }

    /// True iff the value came from the command line or an environment
    /// variable.
    pub fn is_set(&self, name: &str) -> bool {
        self.source(name).is_some_and(Source::is_set)
    }

    pub fn source(&self, name: &str) -> Option<Source> {
        self.sources.get(name).copied()
    }

    /// Decode a typed options struct from the current flag values.
    pub fn options<T: Options>(&self) -> T {
        T::from_context(self)
    }

    /// Store a value for `name`. Handlers and middleware may use this to
    /// inject derived values; the source is recorded as given.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>, source: Source) {
        let name = name.into();
        self.sources.insert(name.clone(), source);
        self.values.insert(name, value.into());
    }

    // ========================================================================
    // Positionals
    // ========================================================================

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Positional at `index`, or `""` when absent.
    pub fn arg(&self, index: usize) -> &str {
        self.args.get(index).map(String::as_str).unwrap_or("")
    }

    /// Positional bound to the declared [`crate::Arg`] `name`, or `""`.
    pub fn arg_named(&self, name: &str) -> &str {
        self.named_args.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn has_arg(&self, name: &str) -> bool {
        self.named_args.contains_key(name)
    }

    pub(crate) fn bind_args(&mut self, args: Vec<String>, named: HashMap<String, String>) {
        self.args = args;
        self.named_args = named;
    }

    // ========================================================================
    // Environment
    // ========================================================================

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn io(&self) -> &Io {
        &self.io
    }

    pub fn painter(&self) -> &Painter {
        &self.painter
    }

    pub fn app(&self) -> &'a App {
        self.app
    }

    pub fn command(&self) -> &'a Command {
        self.command
    }

    // ========================================================================
    // Output
    // ========================================================================

    pub fn success(&self, msg: impl Display) {
        self.emit(Severity::Success, msg);
    }

    pub fn info(&self, msg: impl Display) {
        self.emit(Severity::Info, msg);
    }

    /// Written to the error stream.
    pub fn warn(&self, msg: impl Display) {
        self.emit(Severity::Warn, msg);
    }

    /// Written to the error stream.
    pub fn fail(&self, msg: impl Display) {
        self.emit(Severity::Fail, msg);
    }

    fn emit(&self, severity: Severity, msg: impl Display) {
        let line = self.painter.severity(severity, &msg.to_string());
        if severity.is_error_stream() {
            self.io.stderr.line(line);
        } else {
            self.io.stdout.line(line);
        }
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("command", &self.command.path())
            .field("args", &self.args)
            .field("named_args", &self.named_args)
            .field("values", &self.values)
            .field("sources", &self.sources)
            .field("interactive", &self.interactive)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColorMode;

    #[test]
    fn test_reads_coerce_and_default_to_zero() {
        let (io, _) = Io::capture("");
        let app = App::new("t").io(io.clone());
        let cmd = Command::new("c");
        let mut ctx = Context::new(&app, &cmd, false, io, Painter::new(ColorMode::Never, false));

        ctx.set("count", "42", Source::Explicit);
        assert_eq!(ctx.int("count"), 42);
        assert_eq!(ctx.string("count"), "42");
        assert_eq!(ctx.float("count"), 42.0);

        assert_eq!(ctx.int("missing"), 0);
        assert_eq!(ctx.string("missing"), "");
        assert!(!ctx.bool("missing"));
        assert!(ctx.strings("missing").is_empty());
        assert_eq!(ctx.duration("missing"), Duration::ZERO);
    }

    #[test]
    fn test_is_set_by_source() {
        let (io, _) = Io::capture("");
        let app = App::new("t");
        let cmd = Command::new("c");
        let mut ctx = Context::new(&app, &cmd, false, io, Painter::plain());

        ctx.set("a", "x", Source::Default);
        ctx.set("b", "x", Source::Config);
        ctx.set("c", "x", Source::Env);
        ctx.set("d", "x", Source::Explicit);
        assert!(!ctx.is_set("a"));
        assert!(!ctx.is_set("b"));
        assert!(ctx.is_set("c"));
        assert!(ctx.is_set("d"));
        assert!(!ctx.is_set("e"));
    }

    #[test]
    fn test_output_streams() {
        let (io, captured) = Io::capture("");
        let app = App::new("t");
        let cmd = Command::new("c");
        let ctx = Context::new(&app, &cmd, false, io, Painter::plain());

        ctx.success("done");
        ctx.info("note");
        ctx.warn("careful");
        ctx.fail("broken");
        assert_eq!(captured.stdout(), "done\nnote\n");
        assert_eq!(captured.stderr(), "warning: careful\nerror: broken\n");
    }

    #[test]
    fn test_positional_access() {
        let (io, _) = Io::capture("");
        let app = App::new("t");
        let cmd = Command::new("c");
        let mut ctx = Context::new(&app, &cmd, false, io, Painter::plain());
        let named = HashMap::from([("name".to_string(), "Ada".to_string())]);
        ctx.bind_args(vec!["Ada".into()], named);

        assert_eq!(ctx.arg(0), "Ada");
        assert_eq!(ctx.arg(3), "");
        assert_eq!(ctx.arg_named("name"), "Ada");
        assert!(ctx.has_arg("name"));
        assert_eq!(ctx.arg_named("other"), "");
    }
}
