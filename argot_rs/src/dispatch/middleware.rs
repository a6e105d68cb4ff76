//! Middleware: ordered wrappers around a handler.
//!
//! A middleware receives the [`Context`] and a [`Next`] continuation. Calling
//! [`Next::run`] runs the rest of the chain (and finally the handler); not
//! calling it short-circuits.
//!
//! The chain for one invocation is assembled as
//!
//! ```text
//! command middleware -> group middleware -> global middleware -> handler
//! ```
//!
//! with the first-declared entry of each list outermost.
//!
//! # Stock middleware
//!
//! - [`before`] / [`after`] - hooks around the rest of the chain
//! - [`recover`] - converts a panic into a [`HandlerError`]
//! - [`confirm`] - blocking `[y/N]` prompt, skippable with a boolean flag
//! - [`trace`] - one `tracing` span per command with elapsed time

use std::any::Any;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info_span, warn};

use crate::context::Context;
use crate::error::{Error, HandlerError, Result};
use crate::model::HandlerFn;

pub trait Middleware: Send + Sync {
    fn handle(&self, ctx: &mut Context<'_>, next: Next<'_>) -> Result<()>;
}

/// The remainder of a middleware chain.
pub struct Next<'m> {
    chain: &'m [Arc<dyn Middleware>],
    handler: &'m HandlerFn,
}

impl<'m> Next<'m> {
    pub(crate) fn new(chain: &'m [Arc<dyn Middleware>], handler: &'m HandlerFn) -> Self {
        Self { chain, handler }
    }

    /// Run the remaining middleware and then the handler.
    pub fn run(self, ctx: &mut Context<'_>) -> Result<()> {
        match self.chain.split_first() {
            Some((first, rest)) => first.handle(ctx, Next::new(rest, self.handler)),
            None => (self.handler)(ctx),
        }
    }
}

// ============================================================================
// Closure adapters
// ============================================================================

/// Middleware built from a closure taking the context and the continuation.
pub struct FnMiddleware<F>(F);

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut Context<'_>, Next<'_>) -> Result<()> + Send + Sync,
{
    fn handle(&self, ctx: &mut Context<'_>, next: Next<'_>) -> Result<()> {
        (self.0)(ctx, next)
    }
}

pub fn from_fn<F>(f: F) -> FnMiddleware<F>
where
    F: Fn(&mut Context<'_>, Next<'_>) -> Result<()> + Send + Sync,
{
    FnMiddleware(f)
}

pub struct Before<F>(F);

impl<F> Middleware for Before<F>
where
    F: Fn(&mut Context<'_>) -> Result<()> + Send + Sync,
{
    fn handle(&self, ctx: &mut Context<'_>, next: Next<'_>) -> Result<()> {
        (self.0)(ctx)?;
        next.run(ctx)
    }
}

/// Run `f` before the rest of the chain. An error aborts the chain.
pub fn before<F>(f: F) -> Before<F>
where
    F: Fn(&mut Context<'_>) -> Result<()> + Send + Sync,
{
    Before(f)
}

pub struct After<F>(F);

impl<F> Middleware for After<F>
where
    F: Fn(&mut Context<'_>) -> Result<()> + Send + Sync,
{
    fn handle(&self, ctx: &mut Context<'_>, next: Next<'_>) -> Result<()> {
        let outcome = next.run(ctx);
        let cleanup = (self.0)(ctx);
        match (outcome, cleanup) {
            (Err(err), Err(cleanup_err)) => {
                warn!(error = %cleanup_err, "after-hook failed while handling an earlier error");
                Err(err)
            }
            (Err(err), Ok(())) => Err(err),
            (Ok(()), cleanup) => cleanup,
        }
    }
}

/// Run `f` after the rest of the chain, whether it succeeded or not.
///
/// The inner error wins; `f`'s error surfaces only when the inner chain
/// succeeded.
pub fn after<F>(f: F) -> After<F>
where
    F: Fn(&mut Context<'_>) -> Result<()> + Send + Sync,
{
    After(f)
}

// ============================================================================
// Recover
// ============================================================================

pub struct Recover;

impl Middleware for Recover {
    fn handle(&self, ctx: &mut Context<'_>, next: Next<'_>) -> Result<()> {
        match panic::catch_unwind(AssertUnwindSafe(|| next.run(ctx))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(command = %ctx.command().path(), %message, "recovered from panic");
                Err(HandlerError::msg(format!("panic: {}", message))
                    .with_code("panic")
                    .into())
            }
        }
    }
}

/// Convert a panic anywhere inside into a [`HandlerError`] with code `panic`.
pub fn recover() -> Recover {
    Recover
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// ============================================================================
// Confirm
// ============================================================================

pub struct Confirm {
    prompt: String,
    skip_flag: Option<String>,
}

impl Confirm {
    /// A boolean flag (e.g. `yes` for `--yes`) that bypasses the prompt.
    /// The flag itself must be declared on the command, group or app.
    pub fn skip_with(mut self, flag: impl Into<String>) -> Self {
        self.skip_flag = Some(flag.into());
        self
    }
}

impl Middleware for Confirm {
    fn handle(&self, ctx: &mut Context<'_>, next: Next<'_>) -> Result<()> {
        if let Some(flag) = &self.skip_flag
            && ctx.bool(flag)
        {
            debug!(flag = %flag, "confirmation skipped");
            return next.run(ctx);
        }

        if !ctx.is_interactive() {
            let mut err = HandlerError::msg("confirmation required in non-interactive mode")
                .with_code("confirm");
            if let Some(flag) = &self.skip_flag {
                err = err.with_hint(format!("pass --{} to skip the prompt", flag));
            }
            return Err(err.into());
        }

        let mut out = ctx.io().stdout.clone();
        write!(out, "{} [y/N] ", self.prompt)?;
        out.flush()?;

        // Blocks until a line arrives; EOF counts as "no".
        let answer = ctx.io().stdin.read_line()?.unwrap_or_default();
        if is_yes(&answer) {
            next.run(ctx)
        } else {
            Err(HandlerError::msg("aborted by user").with_code("aborted").into())
        }
    }
}

/// Ask `prompt [y/N]` and run the rest of the chain only on a yes.
pub fn confirm(prompt: impl Into<String>) -> Confirm {
    Confirm {
        prompt: prompt.into(),
        skip_flag: None,
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

// ============================================================================
// Trace
// ============================================================================

pub struct Trace;

impl Middleware for Trace {
    fn handle(&self, ctx: &mut Context<'_>, next: Next<'_>) -> Result<()> {
        let path = ctx.command().path();
        let span = info_span!("command", path = %path);
        let _guard = span.enter();

        let start = Instant::now();
        let outcome = next.run(ctx);
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &outcome {
            Ok(()) => debug!(elapsed_ms, "command finished"),
            Err(Error::HelpRequested(_)) | Err(Error::Exit { .. }) => {
                debug!(elapsed_ms, "command exited early")
            }
            Err(err) => debug!(elapsed_ms, error = %err, "command failed"),
        }
        outcome
    }
}

/// Open a `tracing` span around the command and log its elapsed time.
pub fn trace() -> Trace {
    Trace
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("sure"));
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("static msg");
        assert_eq!(panic_message(boxed.as_ref()), "static msg");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned msg"));
        assert_eq!(panic_message(boxed.as_ref()), "owned msg");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic payload");
    }
}
