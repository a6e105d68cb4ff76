//! Tool-schema export.
//!
//! Commands marked with [`Command::tool`] are described as JSON tool
//! definitions (`name`, `description`, `input_schema`) so an agent runtime
//! can call the CLI. Flags and declared args become JSON-Schema properties.
//! Global flags are left out; they describe the process, not the tool.

use serde_json::{Map, Value as Json, json};

use crate::app::App;
use crate::error::{HandlerError, Result};
use crate::model::value::format_duration;
use crate::model::{Command, Flag, FlagKind, Value};

/// Every tool-marked command, in declaration order.
pub fn export(app: &App) -> Json {
    Json::Array(
        app.all_commands()
            .into_iter()
            .filter(|command| command.is_tool())
            .map(|command| command_schema(app, command))
            .collect(),
    )
}

/// Tool definition for one command. Spaces in the path become underscores
/// (`users list` -> `users_list`).
pub fn command_schema(app: &App, command: &Command) -> Json {
    let mut properties = Map::new();
    let mut required: Vec<String> = Vec::new();

    let group_flags = command
        .group()
        .and_then(|name| app.get_group(name))
        .map(|group| group.flags())
        .unwrap_or_default();

    for flag in group_flags.iter().chain(command.flags()) {
        if flag.is_hidden() {
            continue;
        }
        properties.insert(flag.name().to_string(), flag_property(flag));
        if flag.is_required() {
            required.push(flag.name().to_string());
        }
    }

    for arg in command.args() {
        let mut property = json!({
            "type": "string",
            "description": arg.description(),
        });
        if let Some(default) = arg.default_value() {
            property["default"] = json!(default.as_string());
        }
        properties.insert(arg.name().to_string(), property);
        if arg.is_required() {
            required.push(arg.name().to_string());
        }
    }

    let description = if command.long_description().is_empty() {
        command.description()
    } else {
        command.long_description()
    };

    json!({
        "name": command.path().replace(' ', "_"),
        "description": description,
        "input_schema": {
            "type": "object",
            "properties": properties,
            "required": required,
        },
    })
}

fn flag_property(flag: &Flag) -> Json {
    let mut property = match flag.kind() {
        FlagKind::String => json!({ "type": "string" }),
        FlagKind::Bool => json!({ "type": "boolean" }),
        FlagKind::Int => json!({ "type": "integer" }),
        FlagKind::Float => json!({ "type": "number" }),
        FlagKind::Duration => json!({ "type": "string", "format": "duration" }),
        FlagKind::StringList => json!({ "type": "array", "items": { "type": "string" } }),
        FlagKind::IntList => json!({ "type": "array", "items": { "type": "integer" } }),
    };

    if !flag.help_text().is_empty() {
        property["description"] = json!(flag.help_text());
    }
    if !flag.allowed().is_empty() {
        let choices = json!(flag.allowed());
        if flag.kind().is_list() {
            property["items"]["enum"] = choices;
        } else {
            property["enum"] = choices;
        }
    }
    if flag.default_value() != &flag.kind().zero() {
        property["default"] = to_json(flag.default_value());
    }
    property
}

fn to_json(value: &Value) -> Json {
    match value {
        Value::Str(s) => json!(s),
        Value::Bool(b) => json!(b),
        Value::Int(i) => json!(i),
        Value::Float(f) => json!(f),
        Value::Duration(d) => json!(format_duration(*d)),
        Value::StrList(items) => json!(items),
        Value::IntList(items) => json!(items),
    }
}

/// A `tools` command printing [`export`] as pretty JSON.
pub fn command() -> Command {
    Command::new("tools")
        .about("Print tool definitions as JSON")
        .run(|ctx| {
            let text = serde_json::to_string_pretty(&export(ctx.app())).map_err(HandlerError::new)?;
            ctx.io().stdout.line(text);
            Ok(())
        })
}

/// Validate that every tool-marked command has a description; agents rely on
/// it to pick a tool.
pub fn check(app: &App) -> Result<()> {
    let missing: Vec<String> = app
        .all_commands()
        .into_iter()
        .filter(|command| command.is_tool() && command.description().is_empty())
        .map(Command::path)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(HandlerError::msg(format!("tools without a description: {}", missing.join(", ")))
            .with_code("tool_schema")
            .into())
    }
}
