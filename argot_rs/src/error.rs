//! Error taxonomy and exit-code mapping.
//!
//! # Taxonomy
//!
//! - [`ParseError`] - the argument vector does not fit the grammar
//! - [`ValidationError`] - it fits, but values or definitions are rejected
//! - [`HandlerError`] - opaque handler failure with optional hint/code/detail
//! - [`Error::HelpRequested`] - sentinel; help is rendered and the exit is clean
//! - [`Error::Exit`] - sentinel carrying an explicit exit code
//!
//! Parse and validation errors abort before any middleware or handler runs.
//!
//! # Exit Codes
//!
//! | Outcome              | Code |
//! |----------------------|------|
//! | success              | 0    |
//! | help requested       | 0    |
//! | explicit exit `N`    | N    |
//! | anything else        | 1    |
//!
//! Sentinels are found through wrapping: a handler that returns
//! `anyhow::Error::new(Error::exit(3)).context("deploy")` still exits with 3.

use std::fmt;

use thiserror::Error;

use crate::help::HelpTopic;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The argument vector does not fit the grammar.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown flag '{flag}'")]
    UnknownFlag {
        flag: String,
        suggestion: Option<String>,
    },

    #[error("flag '{flag}' requires a value")]
    MissingValue { flag: String },

    #[error("malformed flag '{token}'")]
    MalformedFlag { token: String },

    #[error("flag '-{flag}' takes a value and must come last in '{token}'")]
    BundledValue { flag: char, token: String },

    #[error("invalid value '{value}' for '{flag}': {reason}")]
    InvalidValue {
        flag: String,
        value: String,
        reason: String,
    },

    #[error("unknown command '{name}'")]
    UnknownCommand {
        name: String,
        suggestion: Option<String>,
    },

    #[error("unknown subcommand '{name}' for '{group}'")]
    UnknownSubcommand {
        group: String,
        name: String,
        suggestion: Option<String>,
    },

    #[error("'{group}' requires a subcommand")]
    RequiresSubcommand { group: String },
}

/// Values or definitions rejected after parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid value '{value}' for '--{flag}': allowed values are {}", .allowed.join(", "))]
    NotAllowed {
        flag: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("invalid value for '--{flag}': {message}")]
    Flag { flag: String, message: String },

    #[error("required flag '--{flag}' not provided")]
    MissingFlag { flag: String },

    #[error("required argument '<{arg}>' not provided")]
    MissingArg { arg: String },

    #[error("{0}")]
    Command(String),

    #[error("flag '{name}' is defined more than once for '{scope}'")]
    DuplicateFlag { name: String, scope: String },
}

/// A handler-side failure.
///
/// Wraps any error (as [`anyhow::Error`]) and optionally carries a hint, a
/// machine-readable code and a detail block, each printed on its own line.
pub struct HandlerError {
    source: anyhow::Error,
    hint: Option<String>,
    code: Option<String>,
    detail: Option<String>,
}

impl HandlerError {
    pub fn new(source: impl Into<anyhow::Error>) -> Self {
        Self {
            source: source.into(),
            hint: None,
            code: None,
            detail: None,
        }
    }

    pub fn msg(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self::new(anyhow::Error::msg(message))
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.source
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerError")
            .field("source", &self.source)
            .field("hint", &self.hint)
            .field("code", &self.code)
            .field("detail", &self.detail)
            .finish()
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.chain().nth(1)
    }
}

/// Top-level error returned by parsing, validation and dispatch.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error("help requested")]
    HelpRequested(HelpTopic),

    #[error("{}", .message.as_deref().unwrap_or("exit requested"))]
    Exit { code: i32, message: Option<String> },

    #[error("no handler defined for '{0}'")]
    NoHandler(String),
}

impl Error {
    /// Request a specific exit code without printing anything.
    pub fn exit(code: i32) -> Self {
        Error::Exit {
            code,
            message: None,
        }
    }

    /// Request a specific exit code and print `message` to the error stream.
    pub fn exit_with(code: i32, message: impl Into<String>) -> Self {
        Error::Exit {
            code,
            message: Some(message.into()),
        }
    }

    /// Shorthand for a plain [`HandlerError`].
    pub fn msg(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Error::Handler(HandlerError::msg(message))
    }

    pub fn hint(&self) -> Option<String> {
        match self {
            Error::Parse(ParseError::UnknownFlag {
                suggestion: Some(s),
                ..
            })
            | Error::Parse(ParseError::UnknownCommand {
                suggestion: Some(s),
                ..
            })
            | Error::Parse(ParseError::UnknownSubcommand {
                suggestion: Some(s),
                ..
            }) => Some(format!("did you mean '{}'?", s)),
            Error::Parse(ParseError::RequiresSubcommand { group }) => {
                Some(format!("run 'help {}' to list its subcommands", group))
            }
            Error::Handler(err) => err.hint().map(String::from),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Handler(err) => err.code(),
            _ => None,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Error::Handler(err) => err.detail(),
            _ => None,
        }
    }

    /// Is this error (or anything it wraps) the help sentinel?
    pub fn is_help(&self) -> bool {
        self.help_topic().is_some()
    }

    /// The help topic, found through wrapped errors.
    pub fn help_topic(&self) -> Option<&HelpTopic> {
        match self {
            Error::HelpRequested(topic) => Some(topic),
            Error::Handler(err) => err
                .inner()
                .chain()
                .find_map(|cause| cause.downcast_ref::<Error>().and_then(Error::help_topic)),
            _ => None,
        }
    }
}

/// Converting an `anyhow::Error` unwraps an `argot::Error` carried at the top
/// level; anything else becomes a [`HandlerError`].
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<Error>() {
            Ok(err) => err,
            Err(err) => Error::Handler(HandlerError::new(err)),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Handler(HandlerError::new(err))
    }
}

/// Map an error to its process exit code, looking through wrapped errors.
pub fn exit_code(err: &Error) -> i32 {
    sentinel_code(err).unwrap_or(1)
}

fn sentinel_code(err: &Error) -> Option<i32> {
    match err {
        Error::HelpRequested(_) => Some(0),
        Error::Exit { code, .. } => Some(*code),
        Error::Handler(handler) => handler
            .inner()
            .chain()
            .find_map(|cause| cause.downcast_ref::<Error>().and_then(sentinel_code)),
        _ => None,
    }
}

/// Render an error the way it is printed on the error stream: the message,
/// then optional `hint:`, `detail:` and `code:` lines.
pub fn report(err: &Error, painter: &crate::colors::Painter) -> String {
    let mut out = String::new();
    match err {
        Error::Exit { message: None, .. } => return out,
        Error::Exit {
            message: Some(message),
            ..
        } => out.push_str(message),
        _ => out.push_str(&format!("{} {}", painter.error("error:"), err)),
    }
    if let Some(hint) = err.hint() {
        out.push_str(&format!("\n  {} {}", painter.dim("hint:"), hint));
    }
    if let Some(detail) = err.detail() {
        out.push_str(&format!("\n  {} {}", painter.dim("detail:"), detail));
    }
    if let Some(code) = err.code() {
        out.push_str(&format!("\n  {} {}", painter.dim("code:"), code));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::Painter;
    use anyhow::Context as _;

    #[test]
    fn test_exit_code_top_level() {
        assert_eq!(exit_code(&Error::HelpRequested(HelpTopic::App)), 0);
        assert_eq!(exit_code(&Error::exit(7)), 7);
        assert_eq!(exit_code(&Error::msg("boom")), 1);
        assert_eq!(
            exit_code(&Error::Parse(ParseError::MissingValue { flag: "--x".into() })),
            1
        );
    }

    #[test]
    fn test_exit_code_through_wrapping() {
        let wrapped: anyhow::Result<()> = Err(Error::exit(3)).context("deploying");
        let err = Error::from(wrapped.unwrap_err());
        assert!(matches!(err, Error::Handler(_)));
        assert_eq!(exit_code(&err), 3);

        let nested = Error::Handler(HandlerError::new(
            anyhow::Error::new(Error::Handler(HandlerError::new(anyhow::Error::new(
                Error::exit(9),
            ))))
            .context("outer"),
        ));
        assert_eq!(exit_code(&nested), 9);
    }

    #[test]
    fn test_help_through_wrapping() {
        let inner = anyhow::Error::new(Error::HelpRequested(HelpTopic::App)).context("while running");
        let err = Error::from(inner);
        assert!(err.is_help());
        assert_eq!(exit_code(&err), 0);
    }

    #[test]
    fn test_from_anyhow_unwraps_top_level() {
        let err = Error::from(anyhow::Error::new(Error::exit(4)));
        assert!(matches!(err, Error::Exit { code: 4, .. }));
    }

    #[test]
    fn test_report_lines() {
        let err = Error::Handler(
            HandlerError::msg("deploy failed")
                .with_hint("check your credentials")
                .with_code("E_AUTH")
                .with_detail("401 from registry"),
        );
        let text = report(&err, &Painter::plain());
        assert_eq!(
            text,
            "error: deploy failed\n  hint: check your credentials\n  detail: 401 from registry\n  code: E_AUTH"
        );
    }

    #[test]
    fn test_report_suggestion() {
        let err = Error::Parse(ParseError::UnknownCommand {
            name: "depoy".into(),
            suggestion: Some("deploy".into()),
        });
        let text = report(&err, &Painter::plain());
        assert!(text.starts_with("error: unknown command 'depoy'"));
        assert!(text.contains("hint: did you mean 'deploy'?"));
    }

    #[test]
    fn test_report_silent_exit() {
        assert_eq!(report(&Error::exit(2), &Painter::plain()), "");
        assert_eq!(report(&Error::exit_with(2, "bye"), &Painter::plain()), "bye");
    }
}
