//! Positional argument slots.

use super::value::Value;

/// A declared, named positional slot.
///
/// Args bind to positional tokens by index in declaration order.
#[derive(Debug, Clone)]
pub struct Arg {
    name: String,
    description: String,
    required: bool,
    default: Option<Value>,
}

impl Arg {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name)
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Fallback used when the slot is left empty. Only meaningful for
    /// optional args; bound as its string form.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// `<name>` for required slots, `[name]` for optional ones.
    pub fn usage(&self) -> String {
        if self.required {
            format!("<{}>", self.name)
        } else {
            format!("[{}]", self.name)
        }
    }
}
