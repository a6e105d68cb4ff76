//! Flag definitions.

use std::fmt;
use std::sync::Arc;

use super::value::{FlagKind, Value};
use crate::error::ValidationError;

/// Per-flag validator: receives the raw text as typed by the user (or read
/// from the environment) and returns a message on rejection.
pub type FlagValidator = Arc<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

/// A typed, named flag.
///
/// ```
/// use argot::Flag;
///
/// let flag = Flag::string("format")
///     .short('f')
///     .help("Output format")
///     .env("APP_FORMAT")
///     .default("text")
///     .choices(["text", "json"]);
/// assert_eq!(flag.name(), "format");
/// ```
#[derive(Clone)]
pub struct Flag {
    name: String,
    short: Option<char>,
    help: String,
    env: Option<String>,
    kind: FlagKind,
    default: Value,
    required: bool,
    hidden: bool,
    choices: Vec<String>,
    validator: Option<FlagValidator>,
}

impl Flag {
    pub fn new(name: impl Into<String>, kind: FlagKind) -> Self {
        Self {
            name: name.into(),
            short: None,
            help: String::new(),
            env: None,
            kind,
            default: kind.zero(),
            required: false,
            hidden: false,
            choices: Vec::new(),
            validator: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::String)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Bool)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Float)
    }

    pub fn duration(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Duration)
    }

    pub fn strings(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::StringList)
    }

    pub fn ints(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::IntList)
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Bind an environment variable. Its presence overrides the default and
    /// marks the flag as set; an explicit CLI token still wins.
    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env = Some(var.into());
        self
    }

    /// Static default, converted to the flag's kind if given as another type.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into().convert(self.kind);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Restrict values to an exact-match set.
    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_name(&self) -> Option<char> {
        self.short
    }

    pub fn help_text(&self) -> &str {
        &self.help
    }

    pub fn env_var(&self) -> Option<&str> {
        self.env.as_deref()
    }

    pub fn kind(&self) -> FlagKind {
        self.kind
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn allowed(&self) -> &[String] {
        &self.choices
    }

    pub fn takes_value(&self) -> bool {
        self.kind.takes_value()
    }

    /// `-v, --verbose` or `--verbose`.
    pub fn display_name(&self) -> String {
        match self.short {
            Some(short) => format!("-{}, --{}", short, self.name),
            None => format!("    --{}", self.name),
        }
    }

    /// Check one raw value against the enum constraint and the custom
    /// validator. List flags check each comma-separated piece against the enum.
    pub(crate) fn check(&self, raw: &str) -> Result<(), ValidationError> {
        if !self.choices.is_empty() {
            let pieces: Vec<&str> = if self.kind.is_list() {
                raw.split(',').map(str::trim).filter(|p| !p.is_empty()).collect()
            } else {
                vec![raw]
            };
            if let Some(bad) = pieces
                .iter()
                .find(|p| !self.choices.iter().any(|c| c == *p))
            {
                return Err(ValidationError::NotAllowed {
                    flag: self.name.clone(),
                    value: bad.to_string(),
                    allowed: self.choices.clone(),
                });
            }
        }

        if let Some(validator) = &self.validator {
            validator(raw).map_err(|message| ValidationError::Flag {
                flag: self.name.clone(),
                message,
            })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("name", &self.name)
            .field("short", &self.short)
            .field("kind", &self.kind)
            .field("default", &self.default)
            .field("env", &self.env)
            .field("required", &self.required)
            .field("hidden", &self.hidden)
            .field("choices", &self.choices)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}
