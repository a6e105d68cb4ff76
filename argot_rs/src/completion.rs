//! Shell completion scripts.
//!
//! Scripts are generated from the visible command, group and flag metadata.
//! They complete command names, group subcommands and flag names; flag values
//! are left to the shell's default (file) completion.

use std::fmt;
use std::str::FromStr;

use crate::app::App;
use crate::model::{Arg, Command, Flag, Group};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

impl Shell {
    pub const ALL: [Shell; 3] = [Shell::Bash, Shell::Zsh, Shell::Fish];

    pub fn name(self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
            Shell::Fish => "fish",
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Shell {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bash" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            "fish" => Ok(Shell::Fish),
            _ => Err(format!("unsupported shell '{}'. Use: bash, zsh, or fish.", s)),
        }
    }
}

/// Generate the completion script for `shell`.
pub fn generate(app: &App, shell: Shell) -> String {
    match shell {
        Shell::Bash => bash(app),
        Shell::Zsh => zsh(app),
        Shell::Fish => fish(app),
    }
}

/// A `completion <shell>` command printing [`generate`]'s output.
pub fn command() -> Command {
    Command::new("completion")
        .about("Print a shell completion script (bash, zsh, fish)")
        .arg(Arg::required("shell").describe("Target shell"))
        .validator(|ctx| ctx.arg_named("shell").parse::<Shell>().map(|_| ()))
        .run(|ctx| {
            let shell: Shell = ctx.arg_named("shell").parse().map_err(crate::Error::msg)?;
            ctx.io().stdout.line(generate(ctx.app(), shell));
            Ok(())
        })
}

// ============================================================================
// Metadata
// ============================================================================

fn visible_commands(app: &App) -> impl Iterator<Item = &Command> {
    app.commands().filter(|c| !c.is_hidden())
}

fn visible_groups(app: &App) -> impl Iterator<Item = &Group> {
    app.groups().filter(|g| !g.is_hidden())
}

fn visible_flags<'a>(flags: impl IntoIterator<Item = &'a Flag>) -> Vec<&'a Flag> {
    flags.into_iter().filter(|f| !f.is_hidden()).collect()
}

/// Long and short spellings of every visible flag.
fn spellings(flags: &[&Flag]) -> Vec<String> {
    let mut words = Vec::new();
    for flag in flags {
        words.push(format!("--{}", flag.name()));
        if let Some(short) = flag.short_name() {
            words.push(format!("-{}", short));
        }
    }
    words
}

/// Top-level words: commands, aliases, groups and reserved tokens.
fn top_words(app: &App) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for command in visible_commands(app) {
        words.push(command.name().to_string());
        words.extend(command.aliases().iter().cloned());
    }
    words.extend(visible_groups(app).map(|g| g.name().to_string()));
    for reserved in ["help", "version"] {
        if !words.iter().any(|w| w == reserved) {
            words.push(reserved.to_string());
        }
    }
    words
}

fn sh_quote(text: &str) -> String {
    text.replace('\'', "'\\''")
}

// ============================================================================
// Bash
// ============================================================================

fn bash(app: &App) -> String {
    let name = app.name();
    let func = format!("_{}", name.replace('-', "_"));
    let global = visible_flags(app.flags());
    let mut cases = String::new();

    for group in visible_groups(app) {
        let group_flags = visible_flags(group.flags());
        for command in group.commands().filter(|c| !c.is_hidden()) {
            let mut flags = group_flags.clone();
            flags.extend(visible_flags(command.flags()));
            flags.extend(global.iter().copied());
            let mut keys = vec![format!("\"{} {}\"", group.name(), command.name())];
            keys.extend(
                command
                    .aliases()
                    .iter()
                    .map(|alias| format!("\"{} {}\"", group.name(), alias)),
            );
            cases.push_str(&format!(
                "        {})\n            opts=\"{}\"\n            ;;\n",
                keys.join("|"),
                spellings(&flags).join(" ")
            ));
        }
        let mut words: Vec<String> = group
            .commands()
            .filter(|c| !c.is_hidden())
            .map(|c| c.name().to_string())
            .collect();
        words.extend(spellings(&group_flags));
        cases.push_str(&format!(
            "        {})\n            opts=\"{}\"\n            ;;\n",
            group.name(),
            words.join(" ")
        ));
    }

    for command in visible_commands(app) {
        let mut flags = visible_flags(command.flags());
        flags.extend(global.iter().copied());
        let mut keys = vec![command.name().to_string()];
        keys.extend(command.aliases().iter().cloned());
        cases.push_str(&format!(
            "        {})\n            opts=\"{}\"\n            ;;\n",
            keys.join("|"),
            spellings(&flags).join(" ")
        ));
    }

    let mut top = top_words(app);
    top.extend(spellings(&global));

    format!(
        r#"# bash completion for {name}
{func}() {{
    local cur key opts
    cur="${{COMP_WORDS[COMP_CWORD]}}"
    key="${{COMP_WORDS[1]}}"
    if [[ ${{COMP_CWORD}} -gt 2 ]]; then
        key="${{COMP_WORDS[1]}} ${{COMP_WORDS[2]}}"
    fi

    if [[ ${{COMP_CWORD}} -eq 1 ]]; then
        opts="{top}"
    else
        case "${{key}}" in
{cases}        *)
            key="${{COMP_WORDS[1]}}"
            case "${{key}}" in
{cases}            *) opts="" ;;
            esac
            ;;
        esac
    fi

    COMPREPLY=( $(compgen -W "${{opts}}" -- "${{cur}}") )
    return 0
}}
complete -F {func} {name}
"#,
        name = name,
        func = func,
        top = top.join(" "),
        cases = cases,
    )
}

// ============================================================================
// Zsh
// ============================================================================

fn zsh_flag_specs(flags: &[&Flag]) -> String {
    flags
        .iter()
        .map(|flag| {
            let help = sh_quote(flag.help_text());
            let value = if flag.takes_value() {
                format!(":{}:", flag.kind().placeholder())
            } else {
                String::new()
            };
            match flag.short_name() {
                Some(short) => format!(
                    "        '(-{short} --{name})'{{-{short},--{name}}}'[{help}]{value}' \\\n",
                    short = short,
                    name = flag.name(),
                    help = help,
                    value = value
                ),
                None => format!(
                    "        '--{name}[{help}]{value}' \\\n",
                    name = flag.name(),
                    help = help,
                    value = value
                ),
            }
        })
        .collect()
}

fn zsh_describe(entries: &[(String, String)]) -> String {
    entries
        .iter()
        .map(|(name, about)| format!("        '{}:{}'\n", name, sh_quote(about)))
        .collect()
}

fn zsh(app: &App) -> String {
    let name = app.name();
    let global = visible_flags(app.flags());

    let mut top: Vec<(String, String)> = visible_commands(app)
        .map(|c| (c.name().to_string(), c.description().to_string()))
        .collect();
    top.extend(visible_groups(app).map(|g| (g.name().to_string(), g.description().to_string())));

    let mut cases = String::new();
    for command in visible_commands(app) {
        let mut flags = visible_flags(command.flags());
        flags.extend(global.iter().copied());
        let mut keys = vec![command.name().to_string()];
        keys.extend(command.aliases().iter().cloned());
        cases.push_str(&format!(
            "        {})\n            _arguments \\\n{}        '*::arg:_files'\n            ;;\n",
            keys.join("|"),
            zsh_flag_specs(&flags)
        ));
    }
    for group in visible_groups(app) {
        let subs: Vec<(String, String)> = group
            .commands()
            .filter(|c| !c.is_hidden())
            .map(|c| (c.name().to_string(), c.description().to_string()))
            .collect();
        cases.push_str(&format!(
            "        {})\n            local -a subcommands\n            subcommands=(\n{}            )\n            _describe 'subcommand' subcommands\n            ;;\n",
            group.name(),
            zsh_describe(&subs)
        ));
    }

    format!(
        r#"#compdef {name}

_{func}() {{
    local -a commands
    commands=(
{top}    )

    if (( CURRENT == 2 )); then
        _describe 'command' commands
        return
    fi

    case $words[2] in
{cases}    esac
}}

compdef _{func} {name}
"#,
        name = name,
        func = name.replace('-', "_"),
        top = zsh_describe(&top),
        cases = cases,
    )
}

// ============================================================================
// Fish
// ============================================================================

fn fish_quote(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}

fn fish_flag(name: &str, condition: Option<&str>, flag: &Flag) -> String {
    let mut line = format!("complete -c {}", name);
    if let Some(condition) = condition {
        line.push_str(&format!(" -n '{}'", condition));
    }
    line.push_str(&format!(" -l {}", flag.name()));
    if let Some(short) = flag.short_name() {
        line.push_str(&format!(" -s {}", short));
    }
    if flag.takes_value() {
        line.push_str(" -r");
    }
    if !flag.allowed().is_empty() {
        line.push_str(&format!(" -a '{}'", flag.allowed().join(" ")));
    }
    if !flag.help_text().is_empty() {
        line.push_str(&format!(" -d '{}'", fish_quote(flag.help_text())));
    }
    line.push('\n');
    line
}

fn fish(app: &App) -> String {
    let name = app.name();
    let mut script = format!("# fish completion for {}\n", name);

    for flag in visible_flags(app.flags()) {
        script.push_str(&fish_flag(name, None, flag));
    }

    for command in visible_commands(app) {
        script.push_str(&format!(
            "complete -c {} -f -n '__fish_use_subcommand' -a {} -d '{}'\n",
            name,
            command.name(),
            fish_quote(command.description())
        ));
        let condition = format!("__fish_seen_subcommand_from {}", command.name());
        for flag in visible_flags(command.flags()) {
            script.push_str(&fish_flag(name, Some(&condition), flag));
        }
    }

    for group in visible_groups(app) {
        script.push_str(&format!(
            "complete -c {} -f -n '__fish_use_subcommand' -a {} -d '{}'\n",
            name,
            group.name(),
            fish_quote(group.description())
        ));
        let in_group = format!("__fish_seen_subcommand_from {}", group.name());
        for command in group.commands().filter(|c| !c.is_hidden()) {
            script.push_str(&format!(
                "complete -c {} -f -n '{}' -a {} -d '{}'\n",
                name,
                in_group,
                command.name(),
                fish_quote(command.description())
            ));
        }
        for flag in visible_flags(group.flags()) {
            script.push_str(&fish_flag(name, Some(&in_group), flag));
        }
        for command in group.commands().filter(|c| !c.is_hidden()) {
            let condition = format!("{}; and __fish_seen_subcommand_from {}", in_group, command.name());
            for flag in visible_flags(command.flags()) {
                script.push_str(&fish_flag(name, Some(&condition), flag));
            }
        }
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new("demo")
            .flag(Flag::bool("verbose").short('v').help("Verbose output"))
            .command(
                Command::new("deploy")
                    .about("Deploy it")
                    .alias("ship")
                    .flag(Flag::int("replicas").short('r').help("Replica count")),
            )
            .command(Command::new("secret").hidden())
            .group(
                Group::new("users")
                    .about("Manage users")
                    .command(Command::new("list").about("List users").flag(Flag::int("limit"))),
            )
    }

    #[test]
    fn test_shell_from_str() {
        assert_eq!("BASH".parse::<Shell>(), Ok(Shell::Bash));
        assert!("tcsh".parse::<Shell>().is_err());
    }

    #[test]
    fn test_bash_script() {
        let script = generate(&app(), Shell::Bash);
        assert!(script.contains("complete -F _demo demo"));
        assert!(script.contains("deploy ship users help version --verbose -v"));
        assert!(script.contains("deploy|ship)"));
        assert!(script.contains("--replicas -r --verbose -v"));
        assert!(script.contains("\"users list\")"));
        assert!(!script.contains("secret"));
    }

    #[test]
    fn test_zsh_script() {
        let script = generate(&app(), Shell::Zsh);
        assert!(script.starts_with("#compdef demo"));
        assert!(script.contains("'deploy:Deploy it'"));
        assert!(script.contains("'list:List users'"));
    }

    #[test]
    fn test_fish_script() {
        let script = generate(&app(), Shell::Fish);
        assert!(script.contains("complete -c demo -l verbose -s v -d 'Verbose output'"));
        assert!(script.contains("-a deploy -d 'Deploy it'"));
        assert!(script.contains("__fish_seen_subcommand_from deploy' -l replicas -s r -r"));
        assert!(script.contains("__fish_seen_subcommand_from users; and __fish_seen_subcommand_from list' -l limit -r"));
    }
}
