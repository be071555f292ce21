// Command-line binding for a settings registry
//
// `command` turns a registry into a `clap::Command`, one argument per
// setting, following the specs the engine derives. `apply_matches` routes
// parsed values back through `Registry::set`, so the engine owns value
// validation; clap only enforces token counts and string choice sets.

use clap::parser::ValueSource;
use clap::{Arg, ArgMatches, Command};

use knobs_engine::error::SettingsError;
use knobs_engine::parser::{ArgAction, ParserArg};
use knobs_engine::registry::Registry;
use knobs_engine::value::{Kind, Value};

/// Which settings become arguments.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Exactly these settings, in this order, hidden or not. `None`
    /// means every setting in declaration order.
    pub names: Option<Vec<String>>,
    /// Include hidden settings when `names` is `None`.
    pub include_hidden: bool,
}

/// Error type for the command-line binding.
#[derive(Debug)]
pub enum CliError {
    /// A command-line token could not be read as the setting's type
    Parse {
        name: String,
        token: String,
        kind: Kind,
    },
    /// The engine rejected the parsed value, or a requested setting
    /// does not exist
    Settings(SettingsError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Parse { name, token, kind } => {
                write!(f, "{:?} is not a valid {} for --{}", token, kind, name)
            }
            CliError::Settings(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CliError {}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        CliError::Settings(err)
    }
}

/// Build a command with one argument per selected setting.
pub fn command(
    name: &str,
    registry: &Registry,
    options: &CommandOptions,
) -> Result<Command, CliError> {
    let specs = registry.parser_args(options.names.as_deref(), options.include_hidden)?;
    let mut command = Command::new(name.to_string());
    for spec in &specs {
        command = command.arg(build_arg(spec));
    }
    Ok(command)
}

/// Write parsed values back into the registry.
///
/// Only values the user actually supplied on the command line are
/// applied; defaults clap filled in are left alone, so an untouched flag
/// never overwrites a loaded setting. Writes go through [`Registry::set`]
/// in declaration order, parent gating included.
pub fn apply_matches(registry: &mut Registry, matches: &ArgMatches) -> Result<(), CliError> {
    let specs = registry.parser_args(None, true)?;
    for spec in specs {
        // Settings left out of the command have no id to look up
        if matches.try_contains_id(&spec.name).is_err() {
            continue;
        }
        if matches.value_source(&spec.name) != Some(ValueSource::CommandLine) {
            continue;
        }
        let value = match &spec.action {
            ArgAction::StoreTrue => Value::Bool(true),
            ArgAction::StoreFalse => Value::Bool(false),
            ArgAction::Variadic { subtype, .. } => {
                let tokens: Vec<String> = matches
                    .get_many::<String>(&spec.name)
                    .map(|tokens| tokens.cloned().collect())
                    .unwrap_or_default();
                Value::List(
                    tokens
                        .iter()
                        .map(|token| parse_token(&spec.name, token, *subtype))
                        .collect::<Result<_, _>>()?,
                )
            }
            ArgAction::OptionalValue { kind } => match matches.get_one::<String>(&spec.name) {
                Some(token) => parse_token(&spec.name, token, *kind)?,
                // Bare flag: explicit null
                None => Value::Null,
            },
            ArgAction::Value { kind } => match matches.get_one::<String>(&spec.name) {
                Some(token) => parse_token(&spec.name, token, *kind)?,
                None => continue,
            },
        };
        registry.set(&spec.name, value)?;
    }
    Ok(())
}

fn build_arg(spec: &ParserArg) -> Arg {
    let long = spec.flag.trim_start_matches('-').to_string();
    let mut arg = Arg::new(spec.name.clone())
        .long(long)
        .help(spec.help.clone());

    match &spec.action {
        // The stored bool comes from the spec's action, not from clap:
        // both spellings are plain presence flags.
        ArgAction::StoreTrue | ArgAction::StoreFalse => {
            arg = arg.action(clap::ArgAction::SetTrue);
        }
        ArgAction::Variadic { count, .. } => {
            arg = match count {
                Some(count) => arg.num_args(count.lo as usize..=count.hi as usize),
                None => arg.num_args(0..),
            };
        }
        ArgAction::OptionalValue { .. } => {
            arg = arg.num_args(0..=1);
        }
        ArgAction::Value { .. } => {
            arg = arg.num_args(1);
            if !spec.default.is_null() {
                arg = arg.default_value(spec.default.to_string());
            }
        }
    }

    // String choice sets are enforced at the parser; everything else the
    // engine checks on write.
    if !spec.choices.is_empty() {
        let strings: Option<Vec<String>> = spec
            .choices
            .iter()
            .map(|choice| choice.as_str().map(str::to_string))
            .collect();
        if let Some(strings) = strings {
            arg = arg.value_parser(clap::builder::PossibleValuesParser::new(strings));
        }
    }
    arg
}

fn parse_token(name: &str, token: &str, kind: Kind) -> Result<Value, CliError> {
    let parsed = match kind {
        Kind::Bool => token.parse::<bool>().ok().map(Value::Bool),
        Kind::Int => token.parse::<i64>().ok().map(Value::Int),
        Kind::Float => token.parse::<f64>().ok().map(Value::Float),
        Kind::Str => Some(Value::from(token)),
        // List elements are scalars; a list subtype never occurs
        Kind::List => None,
    };
    parsed.ok_or_else(|| CliError::Parse {
        name: name.to_string(),
        token: token.to_string(),
        kind,
    })
}
