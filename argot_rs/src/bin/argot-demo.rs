//! argot-demo: a small multi-command CLI exercising the whole engine.
//!
//! Logging goes to stderr and is controlled with `ARGOT_LOG` (default `warn`).
//! A TOML config layer is read from the path in `ARGOT_DEMO_CONFIG`, if set,
//! and `ARGOT_COLOR` (`auto`, `always`, `never`) overrides color detection.

use std::any::Any;
use std::panic;
use std::process::ExitCode;
use std::time::Duration;

use argot::model::value::format_duration;
use argot::{
    App, Arg, ColorMode, Command, Context, Error, FieldSpec, Flag, FlagKind, Group, HandlerError, Options,
    completion, middleware, tool_schema,
};
use serde_json::json;
use tracing::{debug, warn};

const KNOWN_USERS: &[&str] = &["ada", "grace", "linus", "barbara"];

fn install_broken_pipe_handler() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let is_broken = <dyn Any>::downcast_ref::<&str>(payload)
            .is_some_and(|s| s.contains("Broken pipe"))
            || <dyn Any>::downcast_ref::<String>(payload)
                .is_some_and(|s| s.contains("Broken pipe"));

        if is_broken {
            // Quietly exit when downstream closes the pipe (e.g. piping to `head`).
            std::process::exit(0);
        }

        default_hook(info);
    }));
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("ARGOT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}

fn json_output(ctx: &Context<'_>) -> bool {
    ctx.string("output") == "json"
}

// ============================================================================
// greet / run / sum
// ============================================================================

fn greet() -> Command {
    Command::new("greet")
        .about("Say hello")
        .alias("hi")
        .flag(Flag::bool("shout").short('s').help("Uppercase the greeting"))
        .flag(
            Flag::string("greeting")
                .short('g')
                .help("Greeting word")
                .env("DEMO_GREETING")
                .default("Hello"),
        )
        .arg(Arg::optional("name").describe("Who to greet").default("World"))
        .tool()
        .run(|ctx| {
            let mut message = format!("{}, {}!", ctx.string("greeting"), ctx.arg_named("name"));
            if ctx.bool("shout") {
                message = message.to_uppercase();
            }
            if json_output(ctx) {
                ctx.io().stdout.line(json!({ "greeting": message }));
            } else {
                ctx.success(message);
            }
            Ok(())
        })
}

fn bundled() -> Command {
    Command::new("run")
        .about("Show bundled short flags")
        .flag(Flag::bool("all").short('a'))
        .flag(Flag::bool("brief").short('b'))
        .flag(Flag::bool("color").short('c'))
        .run(|ctx| {
            ctx.info(format!(
                "a={} b={} c={}",
                ctx.bool("all"),
                ctx.bool("brief"),
                ctx.bool("color")
            ));
            Ok(())
        })
}

fn sum() -> Command {
    Command::new("sum")
        .about("Add integers (negative numbers welcome)")
        .run(|ctx| {
            let mut total: i64 = 0;
            for raw in ctx.args() {
                let n: i64 = raw.parse().map_err(|_| {
                    HandlerError::msg(format!("'{}' is not an integer", raw))
                        .with_hint("pass whole numbers, e.g. `sum 1 -2 3`")
                })?;
                total = total.checked_add(n).ok_or_else(|| {
                    HandlerError::msg("sum overflows a 64-bit integer").with_hint("use smaller numbers")
                })?;
            }
            ctx.info(total);
            Ok(())
        })
}

// ============================================================================
// deploy
// ============================================================================

struct DeployOptions {
    replicas: i64,
    timeout: Duration,
    region: String,
}

impl Options for DeployOptions {
    fn schema() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("replicas", FlagKind::Int)
                .short('r')
                .help("Number of replicas")
                .env("DEMO_REPLICAS")
                .default("1"),
            FieldSpec::new("timeout", FlagKind::Duration)
                .help("Rollout timeout")
                .default("30s"),
            FieldSpec::new("region", FlagKind::String)
                .help("Target region")
                .choices(&["eu", "us", "ap"])
                .default("eu"),
            FieldSpec::new("yes", FlagKind::Bool)
                .short('y')
                .help("Skip the confirmation prompt"),
        ]
    }

    fn from_context(ctx: &Context<'_>) -> Self {
        Self {
            replicas: ctx.int("replicas"),
            timeout: ctx.duration("timeout"),
            region: ctx.string("region"),
        }
    }
}

fn deploy() -> Command {
    Command::new("deploy")
        .about("Deploy a target")
        .long_about("Rolls the target out to the selected region.\nAsks for confirmation unless --yes is given.")
        .arg(Arg::required("target").describe("What to deploy"))
        .options::<DeployOptions>()
        .validator(|ctx| {
            if ctx.int("replicas") < 1 {
                return Err("replicas must be at least 1".to_string());
            }
            Ok(())
        })
        .middleware(middleware::confirm("Deploy now?").skip_with("yes"))
        .tool()
        .run(|ctx| {
            let opts: DeployOptions = ctx.options();
            if ctx.bool("verbose") {
                ctx.warn(format!("replicas from {:?}", ctx.source("replicas")));
            }
            ctx.success(format!(
                "deployed {} to {} with {} replica(s), timeout {}",
                ctx.arg_named("target"),
                opts.region,
                opts.replicas,
                format_duration(opts.timeout)
            ));
            Ok(())
        })
}

// ============================================================================
// status / exit / fail / panic
// ============================================================================

fn status() -> Command {
    Command::new("status")
        .about("Report status (prompt-friendly when interactive)")
        .run_interactive(|ctx| {
            ctx.success("all systems go");
            Ok(())
        })
        .run_non_interactive(|ctx| {
            ctx.info("status=ok");
            Ok(())
        })
}

fn exit() -> Command {
    Command::new("exit")
        .about("Exit with the given code")
        .arg(Arg::required("code"))
        .run(|ctx| {
            let code: i32 = ctx
                .arg_named("code")
                .parse()
                .map_err(|_| Error::msg(format!("invalid exit code '{}'", ctx.arg_named("code"))))?;
            Err(Error::exit(code))
        })
}

fn fail() -> Command {
    Command::new("fail")
        .about("Fail with a structured error")
        .hidden()
        .run(|_| {
            let cause = anyhow::anyhow!("registry returned 401");
            Err(HandlerError::new(cause.context("push failed"))
                .with_hint("run `login` first")
                .with_code("E_AUTH")
                .with_detail("token expired")
                .into())
        })
}

fn boom() -> Command {
    Command::new("panic")
        .about("Panic inside a recovered handler")
        .hidden()
        .middleware(middleware::recover())
        .run(|_| panic!("boom"))
}

fn legacy() -> Command {
    Command::new("hello")
        .about("Old spelling of greet")
        .deprecated("use 'greet' instead")
        .run(|ctx| {
            ctx.info("Hello, World!");
            Ok(())
        })
}

// ============================================================================
// users group
// ============================================================================

fn users() -> Group {
    Group::new("users")
        .about("Manage users")
        .flag(
            Flag::string("org")
                .help("Organization")
                .env("DEMO_ORG")
                .default("acme"),
        )
        .command(
            Command::new("list")
                .alias("ls")
                .about("List users")
                .flag(Flag::int("limit").short('n').help("Maximum rows").default(10))
                .tool()
                .run(|ctx| {
                    let limit = usize::try_from(ctx.int("limit")).unwrap_or(0);
                    let names: Vec<&str> = KNOWN_USERS.iter().copied().take(limit).collect();
                    if json_output(ctx) {
                        ctx.io().stdout.line(json!({ "org": ctx.string("org"), "users": names }));
                    } else {
                        for name in names {
                            ctx.info(format!("{}/{}", ctx.string("org"), name));
                        }
                    }
                    Ok(())
                }),
        )
        .command(
            Command::new("add")
                .about("Add a user")
                .arg(Arg::required("name"))
                .flag(Flag::bool("admin").help("Grant admin rights"))
                .flag(Flag::strings("tag").short('t').help("Tags (repeatable)"))
                .run(|ctx| {
                    let role = if ctx.bool("admin") { "admin" } else { "member" };
                    let tags = ctx.strings("tag");
                    let mut line = format!("added {} to {} as {}", ctx.arg_named("name"), ctx.string("org"), role);
                    if !tags.is_empty() {
                        line.push_str(&format!(" [{}]", tags.join(",")));
                    }
                    ctx.success(line);
                    Ok(())
                }),
        )
        .action_arg(Arg::optional("filter"))
        .action(|ctx| {
            let filter = ctx.arg_named("filter").to_string();
            let count = KNOWN_USERS
                .iter()
                .filter(|name| name.contains(filter.as_str()))
                .count();
            ctx.info(format!("{} user(s) in {} match '{}'", count, ctx.string("org"), filter));
            Ok(())
        })
}

// ============================================================================
// App
// ============================================================================

fn build_app() -> App {
    let mut app = App::new("argot-demo")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Demo CLI for the argot dispatch engine")
        .flag(Flag::bool("verbose").short('v').help("Verbose output"))
        .flag(
            Flag::string("output")
                .short('o')
                .help("Output format")
                .choices(["text", "json"])
                .default("text"),
        )
        .middleware(middleware::trace())
        .command(greet())
        .command(bundled())
        .command(sum())
        .command(deploy())
        .command(status())
        .command(exit())
        .command(fail())
        .command(boom())
        .command(legacy())
        .command(completion::command())
        .command(tool_schema::command())
        .group(users());

    if let Ok(raw) = std::env::var("ARGOT_COLOR") {
        match raw.parse::<ColorMode>() {
            Ok(mode) => app = app.color(mode),
            Err(e) => warn!("{}", e),
        }
    }
    if let Ok(path) = std::env::var("ARGOT_DEMO_CONFIG") {
        debug!(%path, "loading config layer");
        app = app.config_file(path);
    }
    app
}

fn main() -> ExitCode {
    install_broken_pipe_handler();
    init_tracing();

    let app = build_app();
    if let Err(err) = app.validate() {
        eprintln!("error: {}", err);
        return ExitCode::from(2);
    }
    if let Err(err) = tool_schema::check(&app) {
        eprintln!("error: {}", err);
        return ExitCode::from(2);
    }

    // Only the low byte reaches the parent process, as with a shell `exit`.
    let code = app.run(std::env::args().skip(1));
    ExitCode::from((code & 0xff) as u8)
}
