//! Argument parsing.
//!
//! Parsing happens in two stages:
//!
//! 1. [`resolver`] classifies the whole argv: global-flag tokens, the target
//!    command path, and the tokens that belong to the command
//! 2. [`flags`] parses the command's tokens against its visible flags and
//!    declared args into a [`crate::Context`]

pub mod flags;
pub mod helpers;
pub mod resolver;

pub use flags::{FlagSet, parse_into};
pub use resolver::{Resolution, Target, resolve};
