//! Handler selection and middleware execution.

pub mod middleware;

use std::sync::Arc;

use tracing::debug;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::model::{Command, HandlerFn};
use middleware::{Middleware, Next};

/// Which handler variant ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Default,
    Interactive,
    NonInteractive,
}

/// Pick the handler variant for an invocation.
///
/// Interactive invocations prefer the interactive handler, non-interactive
/// ones the non-interactive handler; both fall back to the default.
pub fn select_handler(command: &Command, interactive: bool) -> Result<(Variant, &HandlerFn)> {
    let handlers = &command.handlers;
    let picked = match (interactive, &handlers.interactive, &handlers.non_interactive) {
        (true, Some(handler), _) => Some((Variant::Interactive, handler)),
        (false, _, Some(handler)) => Some((Variant::NonInteractive, handler)),
        _ => handlers.default.as_ref().map(|h| (Variant::Default, h)),
    };
    picked.ok_or_else(|| Error::NoHandler(command.path()))
}

/// The full middleware chain for `command`, outermost first.
pub(crate) fn chain_for(ctx: &Context<'_>) -> Vec<Arc<dyn Middleware>> {
    let command = ctx.command();
    let app = ctx.app();
    let mut chain: Vec<Arc<dyn Middleware>> = command.middleware.clone();
    if let Some(group) = command.group().and_then(|name| app.get_group(name)) {
        chain.extend(group.middleware.iter().cloned());
    }
    chain.extend(app.middleware.iter().cloned());
    chain
}

/// Select a handler for the context's command and run it inside the chain.
pub fn execute(ctx: &mut Context<'_>) -> Result<()> {
    let command = ctx.command();
    let (variant, handler) = select_handler(command, ctx.is_interactive())?;
    let chain = chain_for(ctx);
    debug!(
        command = %command.path(),
        ?variant,
        middleware = chain.len(),
        "dispatching"
    );
    Next::new(&chain, handler).run(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(tag: &'static str) -> impl Fn(&mut Context<'_>) -> Result<()> + Send + Sync {
        move |ctx| {
            ctx.info(tag);
            Ok(())
        }
    }

    #[test]
    fn test_select_prefers_matching_variant() {
        let cmd = Command::new("s")
            .run(tagged("default"))
            .run_interactive(tagged("tty"))
            .run_non_interactive(tagged("pipe"));
        assert_eq!(select_handler(&cmd, true).unwrap().0, Variant::Interactive);
        assert_eq!(select_handler(&cmd, false).unwrap().0, Variant::NonInteractive);
    }

    #[test]
    fn test_select_falls_back_to_default() {
        let cmd = Command::new("s").run(tagged("default")).run_interactive(tagged("tty"));
        assert_eq!(select_handler(&cmd, false).unwrap().0, Variant::Default);

        let cmd = Command::new("s").run_non_interactive(tagged("pipe"));
        assert!(matches!(select_handler(&cmd, true), Err(Error::NoHandler(_))));
    }
}
