//! Typed flag values.
//!
//! Every flag stores one [`Value`]. Reads coerce between variants with an
//! explicit match; a value that cannot be coerced reads as the target type's
//! zero value instead of failing.

use std::fmt;
use std::time::Duration;

/// The declared type of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    String,
    Bool,
    Int,
    Float,
    Duration,
    StringList,
    IntList,
}

impl FlagKind {
    /// Zero value for this kind.
    pub fn zero(self) -> Value {
        match self {
            FlagKind::String => Value::Str(String::new()),
            FlagKind::Bool => Value::Bool(false),
            FlagKind::Int => Value::Int(0),
            FlagKind::Float => Value::Float(0.0),
            FlagKind::Duration => Value::Duration(Duration::ZERO),
            FlagKind::StringList => Value::StrList(Vec::new()),
            FlagKind::IntList => Value::IntList(Vec::new()),
        }
    }

    /// Booleans never consume a following token.
    pub fn takes_value(self) -> bool {
        !matches!(self, FlagKind::Bool)
    }

    pub fn is_list(self) -> bool {
        matches!(self, FlagKind::StringList | FlagKind::IntList)
    }

    /// Placeholder shown in help output, e.g. `--timeout <duration>`.
    pub fn placeholder(self) -> &'static str {
        match self {
            FlagKind::String => "string",
            FlagKind::Bool => "bool",
            FlagKind::Int => "int",
            FlagKind::Float => "float",
            FlagKind::Duration => "duration",
            FlagKind::StringList => "strings",
            FlagKind::IntList => "ints",
        }
    }
}

/// A typed flag value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Duration(Duration),
    StrList(Vec<String>),
    IntList(Vec<i64>),
}

impl Value {
    pub fn kind(&self) -> FlagKind {
        match self {
            Value::Str(_) => FlagKind::String,
            Value::Bool(_) => FlagKind::Bool,
            Value::Int(_) => FlagKind::Int,
            Value::Float(_) => FlagKind::Float,
            Value::Duration(_) => FlagKind::Duration,
            Value::StrList(_) => FlagKind::StringList,
            Value::IntList(_) => FlagKind::IntList,
        }
    }

    /// Strictly parse raw CLI/env text as `kind`.
    ///
    /// List kinds split on commas and drop empty pieces.
    pub fn parse(kind: FlagKind, raw: &str) -> Result<Value, String> {
        match kind {
            FlagKind::String => Ok(Value::Str(raw.to_string())),
            FlagKind::Bool => parse_bool(raw)
                .map(Value::Bool)
                .ok_or_else(|| "expected a boolean (true/false)".to_string()),
            FlagKind::Int => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| "expected an integer".to_string()),
            FlagKind::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| "expected a number".to_string()),
            FlagKind::Duration => parse_duration(raw).map(Value::Duration),
            FlagKind::StringList => Ok(Value::StrList(split_list(raw).map(String::from).collect())),
            FlagKind::IntList => split_list(raw)
                .map(|piece| {
                    piece
                        .parse::<i64>()
                        .map_err(|_| format!("expected a list of integers, got '{}'", piece))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::IntList),
        }
    }

    /// Best-effort conversion to `kind`. Used for defaults and config values
    /// declared with a different type than their flag.
    pub fn convert(&self, kind: FlagKind) -> Value {
        if self.kind() == kind {
            return self.clone();
        }
        match kind {
            FlagKind::String => Value::Str(self.as_string()),
            FlagKind::Bool => Value::Bool(self.as_bool()),
            FlagKind::Int => Value::Int(self.as_int()),
            FlagKind::Float => Value::Float(self.as_float()),
            FlagKind::Duration => Value::Duration(self.as_duration()),
            FlagKind::StringList => Value::StrList(self.as_strings()),
            FlagKind::IntList => Value::IntList(self.as_ints()),
        }
    }

    // ========================================================================
    // Coercing reads
    // ========================================================================

    pub fn as_string(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Duration(d) => format_duration(*d),
            Value::StrList(items) => items.join(","),
            Value::IntList(items) => items
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Str(s) => parse_bool(s).unwrap_or(false),
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Duration(d) => !d.is_zero(),
            Value::StrList(items) => !items.is_empty(),
            Value::IntList(items) => !items.is_empty(),
        }
    }

    pub fn as_int(&self) -> i64 {
        match self {
            Value::Int(i) => *i,
            Value::Bool(b) => i64::from(*b),
            Value::Float(f) if f.is_finite() => f.trunc() as i64,
            Value::Float(_) => 0,
            Value::Str(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                    .unwrap_or(0)
            }
            Value::Duration(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
            Value::StrList(items) => items
                .first()
                .map(|s| Value::Str(s.clone()).as_int())
                .unwrap_or(0),
            Value::IntList(items) => items.first().copied().unwrap_or(0),
        }
    }

    pub fn as_float(&self) -> f64 {
        match self {
            Value::Float(f) => *f,
            Value::Int(i) => *i as f64,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Str(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            Value::Duration(d) => d.as_secs_f64(),
            Value::StrList(items) => items
                .first()
                .map(|s| s.trim().parse::<f64>().unwrap_or(0.0))
                .unwrap_or(0.0),
            Value::IntList(items) => items.first().map(|i| *i as f64).unwrap_or(0.0),
        }
    }

    pub fn as_duration(&self) -> Duration {
        match self {
            Value::Duration(d) => *d,
            Value::Str(s) => parse_duration(s).unwrap_or(Duration::ZERO),
            Value::Int(i) => u64::try_from(*i)
                .map(Duration::from_secs)
                .unwrap_or(Duration::ZERO),
            Value::Float(f) => Duration::try_from_secs_f64(*f).unwrap_or(Duration::ZERO),
            _ => Duration::ZERO,
        }
    }

    pub fn as_strings(&self) -> Vec<String> {
        match self {
            Value::StrList(items) => items.clone(),
            Value::IntList(items) => items.iter().map(i64::to_string).collect(),
            Value::Str(s) => split_list(s).map(String::from).collect(),
            other => vec![other.as_string()],
        }
    }

    pub fn as_ints(&self) -> Vec<i64> {
        match self {
            Value::IntList(items) => items.clone(),
            Value::StrList(items) => items.iter().filter_map(|s| s.trim().parse().ok()).collect(),
            Value::Str(s) => split_list(s).filter_map(|s| s.parse().ok()).collect(),
            Value::Int(i) => vec![*i],
            Value::Bool(_) | Value::Float(_) | Value::Duration(_) => vec![self.as_int()],
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Duration> for Value {
    fn from(value: Duration) -> Self {
        Value::Duration(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::StrList(value)
    }
}

impl From<Vec<&str>> for Value {
    fn from(value: Vec<&str>) -> Self {
        Value::StrList(value.into_iter().map(String::from).collect())
    }
}

impl From<Vec<i64>> for Value {
    fn from(value: Vec<i64>) -> Self {
        Value::IntList(value)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|piece| !piece.is_empty())
}

/// Parse a boolean spelled `true/false`, `1/0`, `yes/no` or `on/off`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "0" | "no" | "n" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Parse a duration such as `90s`, `1h30m`, `250ms` or `1.5h`.
///
/// A bare number is read as seconds. Units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`, `d`.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err("expected a duration like 30s or 1h30m".to_string());
    }
    if let Ok(secs) = text.parse::<f64>() {
        return seconds(secs, raw);
    }

    let mut total = 0f64;
    let mut rest = text;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(format!("invalid duration '{}'", raw));
        }
        let number: f64 = rest[..number_len]
            .parse()
            .map_err(|_| format!("invalid duration '{}'", raw))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            "d" => 86_400.0,
            "" => return Err(format!("missing unit in duration '{}'", raw)),
            unit => return Err(format!("unknown unit '{}' in duration '{}'", unit, raw)),
        };
        total += number * scale;
        rest = &rest[unit_len..];
    }
    seconds(total, raw)
}

fn seconds(secs: f64, raw: &str) -> Result<Duration, String> {
    Duration::try_from_secs_f64(secs).map_err(|_| format!("invalid duration '{}'", raw))
}

/// Render a duration compactly: `1h30m`, `45s`, `250ms`, `0s`.
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }
    if duration.subsec_nanos() != 0 {
        if duration.subsec_nanos() % 1_000_000 == 0 {
            return format!("{}ms", duration.as_millis());
        }
        return format!("{}ns", duration.as_nanos());
    }

    let mut secs = duration.as_secs();
    let mut out = String::new();
    for (unit, size) in [("h", 3600), ("m", 60), ("s", 1)] {
        if secs >= size {
            out.push_str(&format!("{}{}", secs / size, unit));
            secs %= size;
        }
    }
    out
}
