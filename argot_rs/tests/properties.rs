//! Property tests for flag parsing and resolution.

use argot::parser::Target;
use argot::{App, Arg, Command, Flag, Group, Source};
use proptest::prelude::*;

fn app() -> App {
    App::new("p")
        .flag(Flag::bool("verbose").short('v'))
        .command(
            Command::new("calc")
                .flag(Flag::int("count").short('c').default(1))
                .flag(Flag::string("label").short('l'))
                .flag(Flag::strings("tag").short('t'))
                .arg(Arg::optional("first")),
        )
        .group(
            Group::new("users")
                .command(Command::new("list").alias("ls"))
                .command(Command::new("add").arg(Arg::required("name"))),
        )
}

fn label() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}

proptest! {
    #[test]
    fn equals_and_space_forms_agree(value in label()) {
        let app = app();
        let spaced = app.parse(["calc", "--label", value.as_str()]).expect("parse");
        let joined_arg = format!("--label={}", value);
        let joined = app.parse(["calc", joined_arg.as_str()]).expect("parse");
        prop_assert_eq!(spaced.string("label"), value.clone());
        prop_assert_eq!(joined.string("label"), value);
    }

    #[test]
    fn explicit_value_always_wins(n in -1000i64..1000) {
        let app = app();
        let n_text = n.to_string();
        let ctx = app.parse(["calc", "--count", n_text.as_str()]).expect("parse");
        prop_assert_eq!(ctx.int("count"), n);
        prop_assert_eq!(ctx.source("count"), Some(Source::Explicit));
    }

    #[test]
    fn negative_numbers_are_positionals(n in -100000i64..-1) {
        let app = app();
        let n_text = n.to_string();
        let ctx = app.parse(["calc", n_text.as_str()]).expect("parse");
        prop_assert_eq!(ctx.arg_named("first"), n_text.as_str());
        prop_assert_eq!(ctx.int("count"), 1);
    }

    #[test]
    fn repeated_list_flags_keep_order(tags in proptest::collection::vec(label(), 1..6)) {
        let app = app();
        let mut argv = vec!["calc".to_string()];
        for tag in &tags {
            argv.push("-t".to_string());
            argv.push(tag.clone());
        }
        let ctx = app.parse(argv).expect("parse");
        prop_assert_eq!(ctx.strings("tag"), tags);
    }

    #[test]
    fn resolution_is_deterministic(
        tokens in proptest::collection::vec(
            prop_oneof![
                Just("users".to_string()),
                Just("list".to_string()),
                Just("ls".to_string()),
                Just("calc".to_string()),
                Just("-v".to_string()),
                Just("--".to_string()),
                label(),
            ],
            0..6,
        )
    ) {
        let app = app();
        let first = app.resolve(tokens.clone());
        let second = app.resolve(tokens);
        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "outcomes differ"),
        }
    }

    #[test]
    fn reparsing_is_identical(
        pieces in proptest::collection::vec(
            prop_oneof![
                label().prop_map(|v| vec!["-t".to_string(), v]),
                label().prop_map(|v| vec![format!("--tag={}", v)]),
                label().prop_map(|v| vec!["--label".to_string(), v]),
                (0i64..50).prop_map(|n| vec!["-c".to_string(), n.to_string()]),
                Just(vec!["-v".to_string()]),
                label().prop_map(|v| vec![v]),
            ],
            0..8,
        )
    ) {
        let app = app();
        let mut argv = vec!["calc".to_string()];
        argv.extend(pieces.into_iter().flatten());

        match (app.parse(argv.clone()), app.parse(argv)) {
            (Ok(first), Ok(second)) => {
                for name in ["verbose", "count", "label", "tag"] {
                    prop_assert_eq!(first.value(name), second.value(name));
                    prop_assert_eq!(first.source(name), second.source(name));
                }
                prop_assert_eq!(first.args(), second.args());
            }
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "outcomes differ"),
        }
    }

    #[test]
    fn compact_and_spaced_group_forms_agree(name in label(), compact in any::<bool>()) {
        let app = app();
        let argv: Vec<String> = if compact {
            vec!["users:add".into(), name.clone()]
        } else {
            vec!["users".into(), "add".into(), name.clone()]
        };
        let resolution = app.resolve(argv).expect("resolve");
        prop_assert_eq!(
            resolution.target,
            Target::Command { group: Some("users".into()), name: "add".into() }
        );
        prop_assert_eq!(resolution.remaining, vec![name]);
    }
}
