// End-to-end: registry -> clap command -> parsed argv -> registry

use knobs_cli::{apply_matches, command, CliError, CommandOptions};
use knobs_engine::error::SettingsError;
use knobs_engine::registry::Registry;
use knobs_engine::setting::SettingBuilder;
use knobs_engine::value::{Kind, Value};

fn sample() -> Registry {
    let mut registry = Registry::new();
    registry.add(("verbose", false)).unwrap();
    registry.add(("autosave", true)).unwrap();
    registry
        .add(
            SettingBuilder::new("count", 5)
                .with_bounds((0, 10))
                .with_tooltip("how many"),
        )
        .unwrap();
    registry
        .add(SettingBuilder::new("mode", "fast").with_choices(["fast", "slow"]))
        .unwrap();
    registry
        .add(SettingBuilder::new("limit", Value::Null).with_kind(Kind::Int))
        .unwrap();
    registry
        .add(SettingBuilder::new("tags", Vec::<String>::new()))
        .unwrap();
    registry
        .add(SettingBuilder::new("internal", 1).with_hidden(true))
        .unwrap();
    registry
}

fn parse(registry: &mut Registry, argv: &[&str]) -> Result<(), CliError> {
    let cmd = command("app", registry, &CommandOptions::default()).unwrap();
    let matches = cmd.try_get_matches_from(argv).unwrap();
    apply_matches(registry, &matches)
}

#[test]
fn test_bool_flags() {
    let mut registry = sample();
    parse(&mut registry, &["app", "--verbose", "--no-autosave"]).unwrap();
    assert_eq!(registry.get("verbose").unwrap(), Value::Bool(true));
    assert_eq!(registry.get("autosave").unwrap(), Value::Bool(false));
}

#[test]
fn test_typed_option() {
    let mut registry = sample();
    parse(&mut registry, &["app", "--count", "7"]).unwrap();
    assert_eq!(registry.get("count").unwrap(), Value::Int(7));
}

#[test]
fn test_unsupplied_args_leave_settings_alone() {
    let mut registry = sample();
    registry.set("count", 9).unwrap();
    registry.set("mode", "slow").unwrap();

    // clap fills in defaults for --count and --mode; those must not
    // overwrite the values already in the registry
    parse(&mut registry, &["app", "--verbose"]).unwrap();
    assert_eq!(registry.get("count").unwrap(), Value::Int(9));
    assert_eq!(registry.get("mode").unwrap(), Value::from("slow"));
    assert_eq!(registry.get("verbose").unwrap(), Value::Bool(true));
}

#[test]
fn test_choice_enforced_by_parser() {
    let registry = sample();
    let cmd = command("app", &registry, &CommandOptions::default()).unwrap();
    assert!(cmd
        .clone()
        .try_get_matches_from(["app", "--mode", "slow"])
        .is_ok());
    assert!(cmd
        .try_get_matches_from(["app", "--mode", "sideways"])
        .is_err());
}

#[test]
fn test_nullable_scalar() {
    let mut registry = sample();
    registry.set("limit", 3).unwrap();

    // Bare flag clears the setting back to null
    parse(&mut registry, &["app", "--limit"]).unwrap();
    assert_eq!(registry.get("limit").unwrap(), Value::Null);

    parse(&mut registry, &["app", "--limit", "8"]).unwrap();
    assert_eq!(registry.get("limit").unwrap(), Value::Int(8));
}

#[test]
fn test_variadic() {
    let mut registry = sample();
    parse(&mut registry, &["app", "--tags", "x", "y"]).unwrap();
    assert_eq!(registry.get("tags").unwrap(), Value::from(vec!["x", "y"]));

    parse(&mut registry, &["app", "--tags"]).unwrap();
    assert_eq!(registry.get("tags").unwrap(), Value::List(vec![]));
}

#[test]
fn test_variadic_cardinality() {
    let mut registry = Registry::new();
    registry
        .add(SettingBuilder::new("points", vec![1, 2]).with_bounds((2, 3)))
        .unwrap();

    let cmd = command("app", &registry, &CommandOptions::default()).unwrap();
    // Token counts outside the declared cardinality fail in the parser
    assert!(cmd
        .clone()
        .try_get_matches_from(["app", "--points", "1"])
        .is_err());

    let matches = cmd
        .try_get_matches_from(["app", "--points", "1", "2", "3"])
        .unwrap();
    apply_matches(&mut registry, &matches).unwrap();
    assert_eq!(registry.get("points").unwrap(), Value::from(vec![1, 2, 3]));
}

#[test]
fn test_multi_choice() {
    let mut registry = Registry::new();
    registry
        .add(
            SettingBuilder::new("fields", vec!["a"])
                .with_choices(["a", "b", "c"])
                .with_bounds((1, 2)),
        )
        .unwrap();

    let cmd = command("app", &registry, &CommandOptions::default()).unwrap();
    assert!(cmd
        .clone()
        .try_get_matches_from(["app", "--fields", "z"])
        .is_err());
    assert!(cmd
        .clone()
        .try_get_matches_from(["app", "--fields", "a", "b", "c"])
        .is_err());

    let matches = cmd
        .try_get_matches_from(["app", "--fields", "b", "c"])
        .unwrap();
    apply_matches(&mut registry, &matches).unwrap();
    assert_eq!(registry.get("fields").unwrap(), Value::from(vec!["b", "c"]));
}

#[test]
fn test_bad_token_is_a_parse_error() {
    let mut registry = sample();
    let err = parse(&mut registry, &["app", "--count", "seven"]).unwrap_err();
    assert!(matches!(err, CliError::Parse { .. }));
    // Untouched on failure
    assert_eq!(registry.get("count").unwrap(), Value::Int(5));
}

#[test]
fn test_engine_rejection_surfaces() {
    let mut registry = sample();
    // "11" parses fine; the engine's range check rejects it
    let err = parse(&mut registry, &["app", "--count", "11"]).unwrap_err();
    assert!(matches!(
        err,
        CliError::Settings(SettingsError::Rejected { .. })
    ));
    assert_eq!(registry.get("count").unwrap(), Value::Int(5));
}

#[test]
fn test_hidden_settings_excluded_by_default() {
    let registry = sample();
    let cmd = command("app", &registry, &CommandOptions::default()).unwrap();
    assert!(cmd
        .try_get_matches_from(["app", "--internal", "2"])
        .is_err());

    let options = CommandOptions {
        include_hidden: true,
        ..CommandOptions::default()
    };
    let mut registry = sample();
    let cmd = command("app", &registry, &options).unwrap();
    let matches = cmd
        .try_get_matches_from(["app", "--internal", "2"])
        .unwrap();
    apply_matches(&mut registry, &matches).unwrap();
    assert_eq!(registry.get("internal").unwrap(), Value::Int(2));
}

#[test]
fn test_explicit_name_selection() {
    let registry = sample();
    let options = CommandOptions {
        names: Some(vec!["count".into(), "internal".into()]),
        include_hidden: false,
    };
    let cmd = command("app", &registry, &options).unwrap();
    // Only the requested settings exist as arguments, hidden or not
    assert!(cmd
        .clone()
        .try_get_matches_from(["app", "--internal", "2"])
        .is_ok());
    assert!(cmd.try_get_matches_from(["app", "--verbose"]).is_err());

    let options = CommandOptions {
        names: Some(vec!["missing".into()]),
        include_hidden: false,
    };
    assert!(matches!(
        command_err(&registry, &options),
        CliError::Settings(SettingsError::NotFound(_))
    ));
}

fn command_err(registry: &Registry, options: &CommandOptions) -> CliError {
    command("app", registry, options).unwrap_err()
}

#[test]
fn test_help_text_from_tooltip() {
    let registry = sample();
    let mut cmd = command("app", &registry, &CommandOptions::default()).unwrap();
    let help = cmd.render_long_help().to_string();
    assert!(help.contains("--count"));
    assert!(help.contains("how many"));
    assert!(help.contains("--no-autosave"));
    assert!(!help.contains("--internal"));
}
