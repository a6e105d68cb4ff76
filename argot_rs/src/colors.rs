//! ANSI styling for help pages, error reports and the severity writers on
//! [`crate::Context`].

use crate::types::{ColorMode, Severity};

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Applies ANSI styles when enabled and returns text untouched otherwise.
///
/// Whether a painter is enabled is decided once, from the app's
/// [`ColorMode`] and whether the stream it paints for is a terminal.
#[derive(Clone, Copy, Debug)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(mode: ColorMode, terminal: bool) -> Self {
        let enabled = match mode {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => terminal,
        };
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn error(&self, s: &str) -> String {
        self.paint(s, RED)
    }

    pub fn warn(&self, s: &str) -> String {
        self.paint(s, YELLOW)
    }

    pub fn ok(&self, s: &str) -> String {
        self.paint(s, GREEN)
    }

    /// Command, group and flag names in help output.
    pub fn name(&self, s: &str) -> String {
        self.paint(s, CYAN)
    }

    /// Section headers (`USAGE:`, `OPTIONS:`).
    pub fn header(&self, s: &str) -> String {
        self.paint(s, BOLD)
    }

    /// Labels of secondary report lines (`hint:`, `code:`).
    pub fn dim(&self, s: &str) -> String {
        self.paint(s, DIM)
    }

    /// Success text is green and info text is bare. Warnings and failures
    /// carry a `warning:` / `error:` label.
    pub fn severity(&self, severity: Severity, msg: &str) -> String {
        match severity {
            Severity::Success => self.ok(msg),
            Severity::Info => msg.to_string(),
            Severity::Warn => format!("{} {}", self.warn("warning:"), msg),
            Severity::Fail => format!("{} {}", self.error("error:"), msg),
        }
    }

    fn paint(&self, s: &str, code: &str) -> String {
        if self.enabled {
            format!("{code}{s}{RESET}")
        } else {
            s.to_string()
        }
    }
}
