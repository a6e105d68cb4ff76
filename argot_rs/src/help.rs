//! Help text rendering.
//!
//! Help is generated from registry metadata: the app page lists commands and
//! groups, a group page lists its subcommands, and a command page lists its
//! flags (own, group and global) and arguments. Hidden entries are skipped.

use crate::app::App;
use crate::colors::Painter;
use crate::model::{Arg, Command, Flag, Group};

/// What help was asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelpTopic {
    App,
    Group(String),
    /// Space-separated command path, e.g. `deploy` or `users list`.
    Command { path: String },
}

impl HelpTopic {
    /// A group action's help is the group page.
    pub fn for_command(command: &Command) -> Self {
        match command.group() {
            Some(group) if command.is_group_action() => HelpTopic::Group(group.to_string()),
            _ => HelpTopic::Command {
                path: command.path(),
            },
        }
    }
}

const COLUMN: usize = 26;

/// Render the help page for `topic`. Unknown paths fall back to app help.
pub fn render(app: &App, topic: &HelpTopic, painter: &Painter) -> String {
    match topic {
        HelpTopic::App => render_app(app, painter),
        HelpTopic::Group(name) => match app.get_group(name) {
            Some(group) => render_group(app, group, painter),
            None => render_app(app, painter),
        },
        HelpTopic::Command { path } => match find_command(app, path) {
            Some(command) => render_command(app, command, painter),
            None => render_app(app, painter),
        },
    }
}

fn find_command<'a>(app: &'a App, path: &str) -> Option<&'a Command> {
    let mut segments = path.split_whitespace();
    let first = segments.next()?;
    match segments.next() {
        Some(sub) => app.get_group(first)?.find(sub),
        None => app
            .get_command(first)
            .or_else(|| app.get_group(first).and_then(Group::action_command)),
    }
}

fn render_app(app: &App, painter: &Painter) -> String {
    let mut help = String::new();
    help.push_str(&title(painter, &app.version_line(), app.description()));

    help.push_str(&painter.header("USAGE:"));
    help.push('\n');
    if app.has_commands() {
        help.push_str(&format!("    {} [OPTIONS] <COMMAND> [ARGS...]\n", app.name()));
    }
    if let Some(root) = app.root_action() {
        help.push_str(&format!("    {} [OPTIONS]{}\n", app.name(), args_usage(root.args())));
    }
    if !app.has_commands() && app.root_action().is_none() {
        help.push_str(&format!("    {} [OPTIONS]\n", app.name()));
    }

    if app.has_commands() {
        help.push_str(&format!("\n{}\n", painter.header("COMMANDS:")));
        for command in app.commands().filter(|c| !c.is_hidden()) {
            help.push_str(&entry(&command_label(command), command.description()));
        }
        for group in app.groups().filter(|g| !g.is_hidden()) {
            help.push_str(&entry(&format!("{} <COMMAND>", group.name()), group.description()));
        }
    }

    let mut options: Vec<&Flag> = app.flags().iter().collect();
    if let Some(root) = app.root_action() {
        options.extend(root.flags());
    }
    let section = options_section(painter, "OPTIONS:", &options);
    help.push_str(&builtin_lines(app, section, true));

    if let Some(root) = app.root_action() {
        help.push_str(&arguments_section(painter, root.args()));
    }

    if app.has_commands() {
        help.push_str(&format!(
            "\nRun '{} help <command>' for more information on a command.",
            app.name()
        ));
    }
    help
}

fn render_group(app: &App, group: &Group, painter: &Painter) -> String {
    let mut help = String::new();
    let path = format!("{} {}", app.name(), group.name());
    help.push_str(&title(painter, &path, group.description()));

    help.push_str(&painter.header("USAGE:"));
    help.push('\n');
    help.push_str(&format!("    {} <COMMAND> [OPTIONS]\n", path));
    if let Some(action) = group.action_command() {
        help.push_str(&format!("    {} [OPTIONS]{}\n", path, args_usage(action.args())));
    }

    help.push_str(&format!("\n{}\n", painter.header("COMMANDS:")));
    for command in group.commands().filter(|c| !c.is_hidden()) {
        help.push_str(&entry(&command_label(command), command.description()));
    }

    let own: Vec<&Flag> = group.flags().iter().collect();
    let global: Vec<&Flag> = app.flags().iter().collect();
    let mut sections = options_section(painter, "OPTIONS:", &own);
    sections.push_str(&options_section(painter, "GLOBAL OPTIONS:", &global));
    help.push_str(&builtin_lines(app, sections, false));
    help.trim_end().to_string()
}

fn render_command(app: &App, command: &Command, painter: &Painter) -> String {
    let mut help = String::new();
    let path = format!("{} {}", app.name(), command.path());
    help.push_str(&title(painter, &path, command.description()));

    help.push_str(&painter.header("USAGE:"));
    help.push('\n');
    help.push_str(&format!("    {} [OPTIONS]{}\n", path, args_usage(command.args())));

    if !command.long_description().is_empty() {
        help.push_str(&format!("\n{}\n", painter.header("DESCRIPTION:")));
        for line in command.long_description().lines() {
            help.push_str(&format!("    {}\n", line));
        }
    }

    if !command.aliases().is_empty() {
        help.push_str(&format!("\n{}\n", painter.header("ALIASES:")));
        help.push_str(&format!("    {}\n", command.aliases().join(", ")));
    }

    if let Some(message) = command.deprecation() {
        help.push_str(&format!("\n{}\n", painter.warn("DEPRECATED:")));
        help.push_str(&format!("    {}\n", message));
    }

    let own: Vec<&Flag> = command.flags().iter().collect();
    let mut sections = options_section(painter, "OPTIONS:", &own);

    let group_flags: Vec<&Flag> = command
        .group()
        .and_then(|name| app.get_group(name))
        .map(|group| group.flags().iter().collect())
        .unwrap_or_default();
    if let Some(group) = command.group() {
        sections.push_str(&options_section(
            painter,
            &format!("{} OPTIONS:", group.to_uppercase()),
            &group_flags,
        ));
    }

    let global: Vec<&Flag> = app.flags().iter().collect();
    sections.push_str(&options_section(painter, "GLOBAL OPTIONS:", &global));
    help.push_str(&builtin_lines(app, sections, false));

    help.push_str(&arguments_section(painter, command.args()));
    help.trim_end().to_string()
}

// ============================================================================
// Pieces
// ============================================================================

fn title(painter: &Painter, name: &str, about: &str) -> String {
    if about.is_empty() {
        format!("{}\n\n", painter.name(name))
    } else {
        format!("{} - {}\n\n", painter.name(name), about)
    }
}

fn entry(left: &str, right: &str) -> String {
    if right.is_empty() {
        format!("    {}\n", left)
    } else {
        format!("    {:<width$} {}\n", left, right, width = COLUMN)
    }
}

fn command_label(command: &Command) -> String {
    let mut label = command.name().to_string();
    if !command.aliases().is_empty() {
        label.push_str(&format!(" ({})", command.aliases().join(", ")));
    }
    if command.deprecation().is_some() {
        label.push_str(" [deprecated]");
    }
    label
}

fn args_usage(args: &[Arg]) -> String {
    args.iter().map(|arg| format!(" {}", arg.usage())).collect()
}

pub(crate) fn flag_usage(flag: &Flag) -> String {
    if flag.takes_value() {
        format!("{} <{}>", flag.display_name(), flag.kind().placeholder())
    } else {
        flag.display_name()
    }
}

fn flag_details(flag: &Flag) -> String {
    let mut right = flag.help_text().to_string();
    let mut extra: Vec<String> = Vec::new();
    if flag.default_value() != &flag.kind().zero() {
        extra.push(format!("default: {}", flag.default_value()));
    }
    if let Some(var) = flag.env_var() {
        extra.push(format!("env: {}", var));
    }
    if !flag.allowed().is_empty() {
        extra.push(format!("values: {}", flag.allowed().join(", ")));
    }
    if flag.is_required() {
        extra.push("required".to_string());
    }
    for item in extra {
        if !right.is_empty() {
            right.push(' ');
        }
        right.push_str(&format!("[{}]", item));
    }
    right
}

fn options_section(painter: &Painter, header: &str, flags: &[&Flag]) -> String {
    let visible: Vec<&&Flag> = flags.iter().filter(|f| !f.is_hidden()).collect();
    if visible.is_empty() {
        return String::new();
    }
    let mut section = format!("\n{}\n", painter.header(header));
    for flag in visible {
        section.push_str(&entry(&flag_usage(flag), &flag_details(flag)));
    }
    section
}

/// Append the built-in `--help` line (and `--version` on the app page) to
/// the rendered option sections, opening an `OPTIONS:` header if none was
/// printed.
fn builtin_lines(app: &App, sections: String, app_scope: bool) -> String {
    let mut lines = sections;
    if lines.is_empty() {
        lines.push_str("\nOPTIONS:\n");
    }
    if !app.flags().iter().any(|f| f.name() == "help") {
        lines.push_str(&entry("-h, --help", "Show this help message"));
    }
    if app_scope
        && !app.version_text().is_empty()
        && !app.flags().iter().any(|f| f.name() == "version")
    {
        lines.push_str(&entry("-V, --version", "Show version information"));
    }
    lines
}

fn arguments_section(painter: &Painter, args: &[Arg]) -> String {
    if args.is_empty() {
        return String::new();
    }
    let mut section = format!("\n{}\n", painter.header("ARGUMENTS:"));
    for arg in args {
        let mut right = arg.description().to_string();
        if let Some(default) = arg.default_value() {
            if !right.is_empty() {
                right.push(' ');
            }
            right.push_str(&format!("[default: {}]", default));
        }
        section.push_str(&entry(&arg.usage(), &right));
    }
    section
}
