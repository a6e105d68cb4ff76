//! TOML config layer.
//!
//! Values from a config file sit between static defaults and environment
//! variables. Top-level keys apply to every command; a table named after a
//! command, or a nested group table, applies to that command only:
//!
//! ```toml
//! verbose = true          # any command with a --verbose flag
//!
//! [deploy]
//! replicas = 3            # only `deploy`
//!
//! [users]
//! org = "acme"            # every `users` subcommand
//!
//! [users.list]
//! limit = 50              # only `users list`
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::model::value::{FlagKind, Value};

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ConfigLayer {
    root: toml::Table,
}

impl ConfigLayer {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load a layer from `path`.
    /// Returns an empty layer if the file doesn't exist or is invalid.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "no config file");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(layer) => layer,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to parse config");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read config");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// The value for `flag` as seen by the command at `segments`
    /// (`["deploy"]`, `["users", "list"]`), most specific table first.
    pub fn lookup(&self, segments: &[&str], flag: &str) -> Option<&toml::Value> {
        (0..=segments.len()).rev().find_map(|depth| {
            let mut table = &self.root;
            for segment in &segments[..depth] {
                table = table.get(*segment)?.as_table()?;
            }
            table.get(flag).filter(|value| !value.is_table())
        })
    }
}

/// Convert a TOML value to a flag value of `kind`.
///
/// Strings go through the same parser as CLI input, so `timeout = "30s"` and
/// `tags = "a,b"` work as expected.
pub fn to_value(kind: FlagKind, raw: &toml::Value) -> Result<Value, String> {
    use toml::Value as T;

    if let T::String(text) = raw {
        return Value::parse(kind, text);
    }

    match (kind, raw) {
        (FlagKind::String, T::Integer(i)) => Ok(Value::Str(i.to_string())),
        (FlagKind::String, T::Float(f)) => Ok(Value::Str(f.to_string())),
        (FlagKind::String, T::Boolean(b)) => Ok(Value::Str(b.to_string())),
        (FlagKind::Bool, T::Boolean(b)) => Ok(Value::Bool(*b)),
        (FlagKind::Int, T::Integer(i)) => Ok(Value::Int(*i)),
        (FlagKind::Float, T::Float(f)) => Ok(Value::Float(*f)),
        (FlagKind::Float, T::Integer(i)) => Ok(Value::Float(*i as f64)),
        (FlagKind::Duration, T::Integer(secs)) if *secs >= 0 => {
            Ok(Value::Duration(Duration::from_secs(*secs as u64)))
        }
        (FlagKind::StringList, T::Array(items)) => items
            .iter()
            .map(|item| match item {
                T::String(s) => Ok(s.clone()),
                T::Integer(i) => Ok(i.to_string()),
                T::Float(f) => Ok(f.to_string()),
                T::Boolean(b) => Ok(b.to_string()),
                other => Err(format!("unsupported list item {}", other)),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::StrList),
        (FlagKind::IntList, T::Array(items)) => items
            .iter()
            .map(|item| match item {
                T::Integer(i) => Ok(*i),
                T::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| format!("expected an integer, got '{}'", s)),
                other => Err(format!("expected an integer, got {}", other)),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::IntList),
        (kind, other) => Err(format!(
            "cannot use {} as {}",
            other.type_str(),
            kind.placeholder()
        )),
    }
}
