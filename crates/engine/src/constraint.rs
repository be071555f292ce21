//! Value constraints and the validator.
//!
//! Constrains what a setting will accept: a closed choice set, an inclusive
//! numeric or length range, or a bounded subset of choices (multi-choice).
//! The mode is decided once, when the setting is declared, and never changes.
//!
//! ## Check order
//!
//! The type check always runs before constraint checks, and the multi-choice
//! check before the single-mode checks (the modes are mutually exclusive).
//! `Null` short-circuits everything when the setting is nullable.

use std::fmt;

use crate::value::{Kind, Value};

/// Inclusive bounds, `lo <= x <= hi`.
///
/// Serves three roles: a value range for numeric settings, a length range
/// for string and list settings, and a selection count for multi-choice
/// settings. A single number `n` collapses to `(n, n)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lo: f64,
    pub hi: f64,
}

impl Bounds {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Degenerate range holding exactly `n`.
    pub fn single(n: f64) -> Self {
        Self::new(n, n)
    }

    pub fn contains(&self, x: f64) -> bool {
        self.lo <= x && x <= self.hi
    }

    /// True when `hi < lo` (no value can satisfy the range).
    pub fn is_inverted(&self) -> bool {
        self.hi < self.lo
    }
}

impl From<(f64, f64)> for Bounds {
    fn from((lo, hi): (f64, f64)) -> Self {
        Bounds::new(lo, hi)
    }
}

impl From<(i64, i64)> for Bounds {
    fn from((lo, hi): (i64, i64)) -> Self {
        Bounds::new(lo as f64, hi as f64)
    }
}

impl From<(i32, i32)> for Bounds {
    fn from((lo, hi): (i32, i32)) -> Self {
        Bounds::new(lo as f64, hi as f64)
    }
}

impl From<f64> for Bounds {
    fn from(n: f64) -> Self {
        Bounds::single(n)
    }
}

impl From<i64> for Bounds {
    fn from(n: i64) -> Self {
        Bounds::single(n as f64)
    }
}

impl From<i32> for Bounds {
    fn from(n: i32) -> Self {
        Bounds::single(n as f64)
    }
}

/// The constraint a setting applies to candidate values.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// No constraint beyond the type check.
    Free,
    /// Value must be a member of the closed set.
    Choice(Vec<Value>),
    /// Numeric value range, or length range for strings and lists.
    Range(Bounds),
    /// Value is a list whose elements come from `choices` and whose
    /// length lies in `count`.
    MultiChoice { choices: Vec<Value>, count: Bounds },
}

impl Constraint {
    /// The declared choice set, if any.
    pub fn choices(&self) -> Option<&[Value]> {
        match self {
            Constraint::Choice(choices) => Some(choices),
            Constraint::MultiChoice { choices, .. } => Some(choices),
            _ => None,
        }
    }

    /// The declared bounds (range or multi-choice count), if any.
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            Constraint::Range(bounds) => Some(*bounds),
            Constraint::MultiChoice { count, .. } => Some(*count),
            _ => None,
        }
    }
}

/// Why a candidate value was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidValue {
    /// Wrong type for the setting, or `Null` for a non-nullable setting
    /// (`found` is `None` for `Null`).
    TypeMismatch { expected: Kind, found: Option<Kind> },
    /// Value (or a list element) is not in the choice set.
    ChoiceViolation { value: Value },
    /// Numeric value, length, or selection count outside the bounds.
    RangeViolation { size: f64, lo: f64, hi: f64 },
}

impl fmt::Display for InvalidValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidValue::TypeMismatch { expected, found } => match found {
                Some(found) => write!(f, "expected {}, found {}", expected, found),
                None => write!(f, "expected {}, found null", expected),
            },
            InvalidValue::ChoiceViolation { value } => {
                write!(f, "{:?} is not one of the choices", value.to_string())
            }
            InvalidValue::RangeViolation { size, lo, hi } => {
                write!(f, "{} is outside the range ({}, {})", size, lo, hi)
            }
        }
    }
}

/// The measure a range constraint applies to: the numeric value itself for
/// `Int`/`Float`, the character count for `Str`, the element count for
/// `List`. `Bool` and `Null` have no size.
pub fn size_of(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(x) => Some(*x),
        Value::Str(s) => Some(s.chars().count() as f64),
        Value::List(items) => Some(items.len() as f64),
        Value::Null | Value::Bool(_) => None,
    }
}

/// Check a candidate value against a declared type and constraint.
///
/// Pure function; the [`Setting`](crate::setting::Setting) owns when it is
/// called, this owns what it means.
pub fn validate(
    value: &Value,
    kind: Kind,
    subtype: Option<Kind>,
    constraint: &Constraint,
    nullable: bool,
) -> Result<(), InvalidValue> {
    // Null bypasses all other validation when permitted.
    if value.is_null() {
        if nullable {
            return Ok(());
        }
        return Err(InvalidValue::TypeMismatch {
            expected: kind,
            found: None,
        });
    }

    if value.kind() != Some(kind) {
        return Err(InvalidValue::TypeMismatch {
            expected: kind,
            found: value.kind(),
        });
    }

    // List elements must match the subtype when one is declared.
    if let (Value::List(items), Some(subtype)) = (value, subtype) {
        for item in items {
            if item.kind() != Some(subtype) {
                return Err(InvalidValue::TypeMismatch {
                    expected: subtype,
                    found: item.kind(),
                });
            }
        }
    }

    match constraint {
        Constraint::Free => Ok(()),
        Constraint::MultiChoice { choices, count } => {
            let len = value.as_list().map(|items| items.len()).unwrap_or(0) as f64;
            if !count.contains(len) {
                return Err(InvalidValue::RangeViolation {
                    size: len,
                    lo: count.lo,
                    hi: count.hi,
                });
            }
            if let Some(items) = value.as_list() {
                for item in items {
                    if !choices.contains(item) {
                        return Err(InvalidValue::ChoiceViolation {
                            value: item.clone(),
                        });
                    }
                }
            }
            Ok(())
        }
        Constraint::Choice(choices) => {
            if choices.contains(value) {
                Ok(())
            } else {
                Err(InvalidValue::ChoiceViolation {
                    value: value.clone(),
                })
            }
        }
        Constraint::Range(bounds) => {
            let size = match size_of(value) {
                Some(size) => size,
                // Unreachable for well-formed settings: the builder rejects
                // a range constraint on a bool.
                None => {
                    return Err(InvalidValue::TypeMismatch {
                        expected: kind,
                        found: value.kind(),
                    })
                }
            };
            if bounds.contains(size) {
                Ok(())
            } else {
                Err(InvalidValue::RangeViolation {
                    size,
                    lo: bounds.lo,
                    hi: bounds.hi,
                })
            }
        }
    }
}
