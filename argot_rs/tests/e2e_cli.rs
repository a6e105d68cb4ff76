//! End-to-end tests running the argot-demo binary.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn demo() -> Command {
    let mut cmd = cargo_bin_cmd!("argot-demo");
    cmd.env_remove("DEMO_GREETING")
        .env_remove("DEMO_REPLICAS")
        .env_remove("DEMO_ORG")
        .env_remove("ARGOT_DEMO_CONFIG")
        .env_remove("ARGOT_LOG")
        .env_remove("ARGOT_COLOR");
    cmd
}

// ============================================
// Help & version
// ============================================

mod cli_basics {
    use super::*;

    #[test]
    fn no_args_shows_help() {
        demo()
            .assert()
            .success()
            .stdout(predicate::str::contains("USAGE:"))
            .stdout(predicate::str::contains("greet"))
            .stdout(predicate::str::contains("users <COMMAND>"));
    }

    #[test]
    fn shows_version() {
        demo()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
        demo()
            .arg("version")
            .assert()
            .success()
            .stdout(format!("argot-demo {}\n", env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn command_help() {
        demo()
            .args(["deploy", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("argot-demo deploy [OPTIONS] <target>"))
            .stdout(predicate::str::contains("--replicas <int>"));
    }

    #[test]
    fn help_path() {
        demo()
            .args(["help", "users", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("argot-demo users list"))
            .stdout(predicate::str::contains("--limit"));
    }

    #[test]
    fn forced_color() {
        demo()
            .env("ARGOT_COLOR", "always")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("\x1b[1mUSAGE:\x1b[0m"));
    }

    #[test]
    fn group_help() {
        demo()
            .args(["users", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("List users"));
    }
}

// ============================================
// Resolution
// ============================================

mod resolution {
    use super::*;

    #[test]
    fn greet_default_and_named() {
        demo().arg("greet").assert().success().stdout("Hello, World!\n");
        demo().args(["greet", "Ada"]).assert().success().stdout("Hello, Ada!\n");
        demo().args(["hi", "Ada", "--shout"]).assert().success().stdout("HELLO, ADA!\n");
    }

    #[test]
    fn bundled_shorts() {
        demo()
            .args(["run", "-abc"])
            .assert()
            .success()
            .stdout("a=true b=true c=true\n");
    }

    #[test]
    fn unknown_short_in_bundle_fails() {
        demo()
            .args(["run", "-abx"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("unknown flag '-x'"));
    }

    #[test]
    fn negative_numbers_are_values() {
        demo().args(["sum", "-5", "3", "-.5e0"]).assert().code(1);
        demo().args(["sum", "-5", "3", "10"]).assert().success().stdout("8\n");
    }

    #[test]
    fn sum_overflow_is_an_error() {
        demo()
            .args(["sum", "9223372036854775807", "1"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("sum overflows a 64-bit integer"));
    }

    #[test]
    fn group_forms_agree() {
        for argv in [["users", "list"], ["users", "ls"]] {
            demo()
                .args(argv)
                .arg("-n")
                .arg("2")
                .assert()
                .success()
                .stdout("acme/ada\nacme/grace\n");
        }
        demo()
            .args(["users:ls", "-n", "1"])
            .assert()
            .success()
            .stdout("acme/ada\n");
    }

    #[test]
    fn group_action_receives_unknown_token() {
        demo()
            .args(["users", "a"])
            .assert()
            .success()
            .stdout("3 user(s) in acme match 'a'\n");
    }

    #[test]
    fn compact_unknown_subcommand() {
        demo()
            .arg("users:nope")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("unknown subcommand 'nope' for 'users'"));
    }

    #[test]
    fn unknown_command_suggests() {
        demo()
            .arg("deplyo")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("unknown command 'deplyo'"))
            .stderr(predicate::str::contains("did you mean 'deploy'?"));
    }

    #[test]
    fn global_flag_after_command() {
        demo()
            .args(["greet", "Ada", "-o", "json"])
            .assert()
            .success()
            .stdout("{\"greeting\":\"Hello, Ada!\"}\n");
    }

    #[test]
    fn global_flag_before_command() {
        demo()
            .args(["--output=json", "users", "list", "-n", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"users\":[\"ada\"]"));
    }

    #[test]
    fn enum_violation_lists_allowed_values() {
        demo()
            .args(["greet", "--output", "xml"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("allowed values are text, json"));
    }
}

// ============================================
// Dispatch & exit codes
// ============================================

mod dispatch {
    use super::*;

    #[test]
    fn deploy_with_global_verbose() {
        demo()
            .args(["deploy", "-v", "web", "--yes", "-r", "3"])
            .assert()
            .success()
            .stdout("deployed web to eu with 3 replica(s), timeout 30s\n")
            .stderr(predicate::str::contains("replicas from Some(Explicit)"));
    }

    #[test]
    fn deploy_requires_confirmation_when_piped() {
        demo()
            .args(["deploy", "web"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("confirmation required"))
            .stderr(predicate::str::contains("hint: pass --yes to skip the prompt"));
    }

    #[test]
    fn deploy_missing_target() {
        demo()
            .args(["deploy", "--yes"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("required argument '<target>' not provided"));
    }

    #[test]
    fn deploy_validator_rejects_zero_replicas() {
        demo()
            .args(["deploy", "web", "-y", "--replicas=0"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("replicas must be at least 1"));
    }

    #[test]
    fn oversized_duration_is_rejected() {
        for raw in ["1e20", "99999999999999999h"] {
            demo()
                .args(["deploy", "web", "-y", "--timeout", raw])
                .assert()
                .code(1)
                .stderr(predicate::str::contains(format!("invalid value '{}' for '--timeout'", raw)));
        }
    }

    #[test]
    fn non_interactive_handler_selected() {
        demo().arg("status").assert().success().stdout("status=ok\n");
    }

    #[test]
    fn explicit_exit_code() {
        demo().args(["exit", "7"]).assert().code(7).stderr("");
    }

    #[test]
    fn exit_code_keeps_low_byte() {
        demo().args(["exit", "258"]).assert().code(2).stderr("");
    }

    #[test]
    fn structured_error_lines() {
        demo()
            .arg("fail")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("error: push failed"))
            .stderr(predicate::str::contains("hint: run `login` first"))
            .stderr(predicate::str::contains("detail: token expired"))
            .stderr(predicate::str::contains("code: E_AUTH"));
    }

    #[test]
    fn panic_is_recovered() {
        demo()
            .arg("panic")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("error: panic: boom"));
    }

    #[test]
    fn deprecated_command_warns() {
        demo()
            .arg("hello")
            .assert()
            .success()
            .stdout("Hello, World!\n")
            .stderr(predicate::str::contains("[deprecated] 'hello' is deprecated"));
    }
}

// ============================================
// Env & config precedence
// ============================================

mod precedence {
    use super::*;

    #[test]
    fn env_beats_default() {
        demo()
            .env("DEMO_GREETING", "Hey")
            .arg("greet")
            .assert()
            .success()
            .stdout("Hey, World!\n");
    }

    #[test]
    fn explicit_beats_env() {
        demo()
            .env("DEMO_GREETING", "Hey")
            .args(["greet", "-g", "Yo"])
            .assert()
            .success()
            .stdout("Yo, World!\n");
    }

    #[test]
    fn config_below_env() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("demo.toml");
        std::fs::write(&path, "org = \"globex\"\n\n[deploy]\nreplicas = 4\nregion = \"us\"\n")
            .expect("write config");

        demo()
            .env("ARGOT_DEMO_CONFIG", &path)
            .args(["deploy", "web", "--yes"])
            .assert()
            .success()
            .stdout("deployed web to us with 4 replica(s), timeout 30s\n");

        demo()
            .env("ARGOT_DEMO_CONFIG", &path)
            .env("DEMO_REPLICAS", "6")
            .args(["deploy", "web", "--yes"])
            .assert()
            .success()
            .stdout("deployed web to us with 6 replica(s), timeout 30s\n");

        demo()
            .env("ARGOT_DEMO_CONFIG", &path)
            .args(["users", "list", "-n", "1"])
            .assert()
            .success()
            .stdout("globex/ada\n");
    }
}

// ============================================
// Metadata consumers
// ============================================

mod metadata {
    use super::*;

    #[test]
    fn completion_scripts() {
        demo()
            .args(["completion", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("complete -F _argot_demo argot-demo"));
        demo()
            .args(["completion", "fish"])
            .assert()
            .success()
            .stdout(predicate::str::contains("complete -c argot-demo"));
        demo()
            .args(["completion", "tcsh"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("unsupported shell 'tcsh'"));
    }

    #[test]
    fn tool_export() {
        let output = demo().arg("tools").output().expect("run demo");
        assert!(output.status.success());
        let tools: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
        let names: Vec<&str> = tools
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|tool| tool["name"].as_str())
            .collect();
        assert_eq!(names, vec!["greet", "deploy", "users_list"]);
        assert_eq!(
            tools[1]["input_schema"]["properties"]["region"]["enum"],
            serde_json::json!(["eu", "us", "ap"])
        );
    }
}
