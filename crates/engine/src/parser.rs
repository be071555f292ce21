//! Command-line argument specs derived from setting declarations.
//!
//! A [`ParserArg`] is parser-agnostic: it says what flag to declare, how
//! many tokens it takes, and how to read them back, without naming any
//! particular argument-parsing library. The mapping mirrors common CLI
//! conventions:
//!
//! * bool settings become bare flags; a truthy default flips the spelling
//!   to `--no-<name>` storing `false`, so the flag always means "change
//!   the default"
//! * list settings take zero or more tokens, capped by the declared
//!   cardinality
//! * nullable scalars may be given bare, which stores `Null`
//! * everything else takes exactly one token

use crate::constraint::Bounds;
use crate::setting::Setting;
use crate::value::{Kind, Value};

/// How an argument consumes command-line tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgAction {
    /// Bare flag storing `true`.
    StoreTrue,
    /// Bare flag storing `false`, spelled `--no-<name>`.
    StoreFalse,
    /// Tokens collected into a list, each parsed as `subtype`. `count`
    /// carries the declared cardinality, when one exists.
    Variadic {
        subtype: Kind,
        count: Option<Bounds>,
    },
    /// One token parsed as `kind`, or none at all: the bare flag stores
    /// `Null`.
    OptionalValue { kind: Kind },
    /// Exactly one token parsed as `kind`.
    Value { kind: Kind },
}

/// Everything a command-line parser needs to declare one argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserArg {
    /// Setting name, the key parsed values are written back under.
    pub name: String,
    /// Long flag, leading dashes included.
    pub flag: String,
    /// Help text, taken from the setting's tooltip.
    pub help: String,
    pub action: ArgAction,
    /// The setting's default, for display in help output.
    pub default: Value,
    /// Closed token set, empty when unconstrained.
    pub choices: Vec<Value>,
}

impl ParserArg {
    /// Derive the argument spec for a setting. Bool wins over the other
    /// facets, then list, then nullable; underscores in the name stay as
    /// they are in the flag.
    pub fn from_setting(setting: &Setting) -> ParserArg {
        let name = setting.name().to_string();
        let (flag, action) = if setting.kind() == Kind::Bool {
            if setting.default().is_truthy() {
                (format!("--no-{}", name), ArgAction::StoreFalse)
            } else {
                (format!("--{}", name), ArgAction::StoreTrue)
            }
        } else if setting.kind() == Kind::List {
            (
                format!("--{}", name),
                ArgAction::Variadic {
                    subtype: setting.subtype().unwrap_or(Kind::Str),
                    count: setting.constraint().bounds(),
                },
            )
        } else if setting.nullable() {
            (
                format!("--{}", name),
                ArgAction::OptionalValue {
                    kind: setting.kind(),
                },
            )
        } else {
            (
                format!("--{}", name),
                ArgAction::Value {
                    kind: setting.kind(),
                },
            )
        };

        ParserArg {
            name,
            flag,
            help: setting.tooltip().to_string(),
            action,
            default: setting.default().clone(),
            choices: setting
                .constraint()
                .choices()
                .map(<[Value]>::to_vec)
                .unwrap_or_default(),
        }
    }
}
