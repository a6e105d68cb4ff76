//! # argot
//!
//! **Command resolution and dispatch engine** for multi-command CLIs.
//!
//! Given a raw argument vector, argot decides which registered command should
//! run (optionally nested one level inside a named group), extracts and
//! validates that command's flags and positional arguments, selects a handler
//! variant based on interactivity, and runs it inside an ordered middleware
//! chain.
//!
//! ## Features
//!
//! - **Groups & aliases** - `app users list`, `app users:list`, `app users ls`
//! - **Typed flags** - string, bool, int, float, duration, string and int lists
//! - **Precedence** - explicit CLI value > environment variable > config file > default
//! - **Validation** - enums, per-flag validators, required flags/args, command validators
//! - **Handler variants** - default, interactive and non-interactive handlers
//! - **Middleware** - ordered before/after wrappers, panic recovery, confirmation
//! - **Metadata consumers** - help text, shell completion, tool-schema export
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use argot::{App, Arg, Command, Flag};
//!
//! let app = App::new("hello")
//!     .version("1.0.0")
//!     .flag(Flag::bool("verbose").short('v').help("Verbose output"))
//!     .command(
//!         Command::new("greet")
//!             .about("Say hello")
//!             .arg(Arg::optional("name"))
//!             .run(|ctx| {
//!                 let name = ctx.arg_named("name");
//!                 ctx.success(format!("Hello, {}!", if name.is_empty() { "World" } else { name }));
//!                 Ok(())
//!             }),
//!     );
//!
//! std::process::exit(app.run(std::env::args().skip(1)));
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! argv -> Resolver -> {global tokens, target, remaining}
//!      -> Flag/Arg parser (defaults, config, env, tokens)
//!      -> Context -> Dispatcher (handler variant + middleware) -> exit code
//! ```

// ============================================================================
// Core Modules
// ============================================================================

/// Definitions: flags, values, args, commands, groups and field schemas.
pub mod model;

/// Argument-vector resolution and per-command flag/arg parsing.
///
/// # Submodules
///
/// - [`parser::resolver`] - argv classification into global tokens + command path
/// - [`parser::flags`] - token scan, positional binding, required checks
pub mod parser;

/// Handler selection, middleware composition and stock middleware.
pub mod dispatch;

/// The registry that owns every definition.
pub mod app;

/// Per-invocation state handed to validators, middleware and handlers.
pub mod context;

/// Error taxonomy and exit-code mapping.
pub mod error;

// ============================================================================
// Metadata Consumers
// ============================================================================

pub mod colors;
pub mod completion;
pub mod config;
pub mod help;
pub mod io;
pub mod tool_schema;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use app::App;
pub use context::{Context, Source};
pub use dispatch::middleware::{self, Middleware, Next};
pub use error::{Error, HandlerError, ParseError, Result, ValidationError, exit_code};
pub use help::HelpTopic;
pub use io::Io;
pub use model::{Arg, Command, FieldSpec, Flag, FlagKind, Group, Options, Value};
pub use types::ColorMode;
