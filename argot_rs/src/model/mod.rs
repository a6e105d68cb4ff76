//! Definition types.
//!
//! Everything here is built once at startup with builder methods and is
//! read-only once an [`crate::App`] starts dispatching.
//!
//! - [`flag`] - typed flags with env binding, enum and validator
//! - [`value`] - the tagged value union and its coercions
//! - [`arg`] - positional slots
//! - [`command`] - commands and handler variants
//! - [`group`] - one level of command namespacing
//! - [`schema`] - explicit field descriptors and the [`Options`] trait

pub mod arg;
pub mod command;
pub mod flag;
pub mod group;
pub mod schema;
pub mod value;

pub use arg::Arg;
pub use command::{Command, HandlerFn, ValidatorFn};
pub use flag::{Flag, FlagValidator};
pub use group::Group;
pub use schema::{FieldSpec, Options, flags_from_schema};
pub use value::{FlagKind, Value};
