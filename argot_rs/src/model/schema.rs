//! Explicit field descriptors.
//!
//! A [`FieldSpec`] list describes a set of flags as plain data, so the same
//! runtime parser serves hand-written schemas, generated ones, or ones a
//! derive macro might emit. An [`Options`] type pairs a schema with a decoder
//! that reads its typed struct back out of a [`Context`].
//!
//! ```
//! use argot::{Context, FieldSpec, FlagKind, Options};
//!
//! struct DeployOptions {
//!     replicas: i64,
//!     region: String,
//! }
//!
//! impl Options for DeployOptions {
//!     fn schema() -> Vec<FieldSpec> {
//!         vec![
//!             FieldSpec::new("replicas", FlagKind::Int).short('r').default("1"),
//!             FieldSpec::new("region", FlagKind::String)
//!                 .env("DEPLOY_REGION")
//!                 .choices(&["eu", "us"])
//!                 .required(),
//!         ]
//!     }
//!
//!     fn from_context(ctx: &Context<'_>) -> Self {
//!         Self {
//!             replicas: ctx.int("replicas"),
//!             region: ctx.string("region"),
//!         }
//!     }
//! }
//! ```

use super::flag::Flag;
use super::value::{FlagKind, Value};
use crate::context::Context;

/// Declarative description of one flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FlagKind,
    pub short: Option<char>,
    pub help: &'static str,
    /// Default in its textual form, parsed with the field's kind.
    pub default: Option<&'static str>,
    pub env: Option<&'static str>,
    pub choices: &'static [&'static str],
    pub required: bool,
    pub hidden: bool,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FlagKind) -> Self {
        Self {
            name,
            kind,
            short: None,
            help: "",
            default: None,
            env: None,
            choices: &[],
            required: false,
            hidden: false,
        }
    }

    pub const fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub const fn help(mut self, help: &'static str) -> Self {
        self.help = help;
        self
    }

    pub const fn default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn env(mut self, env: &'static str) -> Self {
        self.env = Some(env);
        self
    }

    pub const fn choices(mut self, choices: &'static [&'static str]) -> Self {
        self.choices = choices;
        self
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Build the runtime [`Flag`]. A default that does not parse as the
    /// field's kind is coerced best-effort (and reads as zero if hopeless).
    pub fn to_flag(&self) -> Flag {
        let mut flag = Flag::new(self.name, self.kind).help(self.help);
        if let Some(short) = self.short {
            flag = flag.short(short);
        }
        if let Some(env) = self.env {
            flag = flag.env(env);
        }
        if let Some(raw) = self.default {
            let value = Value::parse(self.kind, raw).unwrap_or_else(|_| Value::Str(raw.to_string()));
            flag = flag.default(value);
        }
        if !self.choices.is_empty() {
            flag = flag.choices(self.choices.iter().copied());
        }
        if self.required {
            flag = flag.required();
        }
        if self.hidden {
            flag = flag.hidden();
        }
        flag
    }
}

/// Build flags for every field of a schema, in order.
pub fn flags_from_schema(fields: &[FieldSpec]) -> Vec<Flag> {
    fields.iter().map(FieldSpec::to_flag).collect()
}

/// A typed options struct described by an explicit schema.
pub trait Options: Sized {
    fn schema() -> Vec<FieldSpec>;

    fn from_context(ctx: &Context<'_>) -> Self;
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::new("count", FlagKind::Int).short('n').default("5"),
        FieldSpec::new("mode", FlagKind::String)
            .choices(&["fast", "slow"])
            .env("MODE")
            .required(),
        FieldSpec::new("secret", FlagKind::Bool).hidden(),
    ];

    #[test]
    fn test_flags_from_schema() {
        let flags = flags_from_schema(FIELDS);
        assert_eq!(flags.len(), 3);

        assert_eq!(flags[0].short_name(), Some('n'));
        assert_eq!(flags[0].default_value(), &Value::Int(5));

        assert_eq!(flags[1].allowed(), ["fast", "slow"]);
        assert_eq!(flags[1].env_var(), Some("MODE"));
        assert!(flags[1].is_required());

        assert!(flags[2].is_hidden());
        assert_eq!(flags[2].kind(), FlagKind::Bool);
    }

    #[test]
    fn test_unparsable_default_is_coerced() {
        let flag = FieldSpec::new("n", FlagKind::Int).default("many").to_flag();
        assert_eq!(flag.default_value(), &Value::Int(0));
    }
}
