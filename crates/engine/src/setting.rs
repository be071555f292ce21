//! A single named, typed, constrained configuration value.
//!
//! Settings are declared through [`SettingBuilder`], which resolves the
//! type, normalizes the constraints, and validates the default before any
//! `Setting` exists. A failed `build()` leaves nothing behind; a built
//! setting can only change through [`Setting::set`] and [`Setting::reset`].

use indexmap::IndexMap;

use crate::constraint::{validate, Bounds, Constraint};
use crate::error::SettingsError;
use crate::parser::ParserArg;
use crate::value::{Kind, Value};

/// Built-in property keys, in the order `properties()` emits them.
const BUILTIN_PROPERTIES: &[&str] = &[
    "name", "data_type", "subtype", "default", "value", "choices", "minmax", "nullable", "hidden",
    "label", "tooltip", "parent",
];

/// One configuration key: a typed value with constraints and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    name: String,
    kind: Kind,
    subtype: Option<Kind>,
    default: Value,
    value: Value,
    constraint: Constraint,
    nullable: bool,
    hidden: bool,
    label: String,
    tooltip: String,
    parent: Option<String>,
    meta: IndexMap<String, Value>,
}

impl Setting {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Element kind for list settings, when one is declared or inferable.
    pub fn subtype(&self) -> Option<Kind> {
        self.subtype
    }

    pub fn default(&self) -> &Value {
        &self.default
    }

    /// The stored value. Parent gating applies at the registry level, not
    /// here: a lone setting has no parent context to consult.
    pub fn get(&self) -> &Value {
        &self.value
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    /// Whether `Null` is a legal value. Always true when the default is
    /// `Null` (a setting must be able to hold its own default).
    pub fn nullable(&self) -> bool {
        self.nullable
    }

    /// Static visibility flag for UI/CLI enumeration. Never affects
    /// get/set.
    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn tooltip(&self) -> &str {
        &self.tooltip
    }

    /// Name of the setting whose truthiness gates this one, if any.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// User-supplied extra metadata, in insertion order.
    pub fn meta(&self) -> &IndexMap<String, Value> {
        &self.meta
    }

    /// Validate and store a new value.
    ///
    /// On rejection the previous value is untouched; nothing is coerced or
    /// retried.
    pub fn set(&mut self, value: Value) -> Result<(), SettingsError> {
        validate(&value, self.kind, self.subtype, &self.constraint, self.nullable).map_err(
            |reason| SettingsError::Rejected {
                name: self.name.clone(),
                reason,
            },
        )?;
        self.value = value;
        Ok(())
    }

    /// Restore the default value. The default was validated at build time,
    /// so this cannot fail.
    pub fn reset(&mut self) {
        self.value = self.default.clone();
    }

    /// True when the current value differs from the default.
    pub fn is_modified(&self) -> bool {
        self.value != self.default
    }

    /// Read a property by key: any built-in (`name`, `data_type`,
    /// `subtype`, `default`, `value`, `choices`, `minmax`, `nullable`,
    /// `hidden`, `label`, `tooltip`, `parent`) or a user metadata key.
    /// Absent optional built-ins read as `Null`.
    pub fn property(&self, key: &str) -> Result<Value, SettingsError> {
        if let Some(value) = self.builtin_property(key) {
            return Ok(value);
        }
        self.meta
            .get(key)
            .cloned()
            .ok_or_else(|| SettingsError::UnknownProperty {
                name: self.name.clone(),
                property: key.to_string(),
            })
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.builtin_property(key).is_some() || self.meta.contains_key(key)
    }

    /// Full metadata map: built-ins first, then user metadata, in a stable
    /// order. Kinds render as their identifier strings, `minmax` as a
    /// two-element list.
    pub fn properties(&self) -> IndexMap<String, Value> {
        let mut map = IndexMap::new();
        for key in BUILTIN_PROPERTIES {
            if let Some(value) = self.builtin_property(key) {
                map.insert((*key).to_string(), value);
            }
        }
        for (key, value) in &self.meta {
            map.insert(key.clone(), value.clone());
        }
        map
    }

    /// Derive the command-line argument spec for this setting.
    pub fn parser_arg(&self) -> ParserArg {
        ParserArg::from_setting(self)
    }

    fn builtin_property(&self, key: &str) -> Option<Value> {
        match key {
            "name" => Some(Value::from(self.name.as_str())),
            "data_type" => Some(Value::from(self.kind.name())),
            "subtype" => Some(Value::from(self.subtype.map(|k| k.name()))),
            "default" => Some(self.default.clone()),
            "value" => Some(self.value.clone()),
            "choices" => Some(match self.constraint.choices() {
                Some(choices) => Value::List(choices.to_vec()),
                None => Value::Null,
            }),
            "minmax" => Some(self.minmax_property()),
            "nullable" => Some(Value::Bool(self.nullable)),
            "hidden" => Some(Value::Bool(self.hidden)),
            "label" => Some(Value::from(self.label.as_str())),
            "tooltip" => Some(Value::from(self.tooltip.as_str())),
            "parent" => Some(Value::from(self.parent.as_deref())),
            _ => None,
        }
    }

    // Bounds render integer-valued except for float settings, where the
    // range is a value range.
    fn minmax_property(&self) -> Value {
        match self.constraint.bounds() {
            Some(bounds) if self.kind == Kind::Float => {
                Value::List(vec![Value::Float(bounds.lo), Value::Float(bounds.hi)])
            }
            Some(bounds) => Value::List(vec![
                Value::Int(bounds.lo as i64),
                Value::Int(bounds.hi as i64),
            ]),
            None => Value::Null,
        }
    }
}

/// Declares a [`Setting`]. All structural checks and the default-value
/// validation happen in [`build`](SettingBuilder::build); an invalid
/// declaration never produces a partially built setting.
#[derive(Debug, Clone)]
pub struct SettingBuilder {
    name: String,
    default: Value,
    kind: Option<Kind>,
    subtype: Option<Kind>,
    choices: Option<Vec<Value>>,
    bounds: Option<Bounds>,
    nullable: bool,
    hidden: bool,
    label: Option<String>,
    tooltip: String,
    parent: Option<String>,
    meta: IndexMap<String, Value>,
}

impl SettingBuilder {
    /// Start a declaration from a name and a default value. Use
    /// `Value::Null` for a setting with no default; the type must then
    /// come from `with_kind` or `with_choices`.
    pub fn new(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
            kind: None,
            subtype: None,
            choices: None,
            bounds: None,
            nullable: false,
            hidden: false,
            label: None,
            tooltip: String::new(),
            parent: None,
            meta: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared parent, before the registry resolves it.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Declare the type explicitly instead of inferring it from the
    /// default or choices.
    pub fn with_kind(mut self, kind: Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Declare the element type for a list setting.
    pub fn with_subtype(mut self, kind: Kind) -> Self {
        self.subtype = Some(kind);
        self
    }

    /// Restrict values to a closed set. Combined with `with_bounds`, the
    /// setting becomes a multi-choice list and the bounds cap how many
    /// choices may be selected.
    pub fn with_choices<I, T>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Inclusive value range for numeric settings, or length range for
    /// strings and lists. A single number `n` means exactly `n`.
    pub fn with_bounds(mut self, bounds: impl Into<Bounds>) -> Self {
        self.bounds = Some(bounds.into());
        self
    }

    /// Allow `Null` as a value, bypassing all other validation.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Hide the setting from UI/CLI enumeration.
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Display name. Defaults to the setting name with underscores
    /// replaced by spaces.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Description used for widget tooltips and parser help.
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    /// Gate this setting on another setting's truthiness. The parent must
    /// already exist when this setting is added to a registry.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Attach an arbitrary metadata key. Readable through
    /// [`Setting::property`]; no behavioral effect.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Resolve, normalize, and validate the declaration.
    pub fn build(self) -> Result<Setting, SettingsError> {
        let name = self.name;
        if name.is_empty() {
            return Err(declaration(&name, "setting names must not be empty"));
        }
        if name.contains(char::is_whitespace) {
            return Err(declaration(
                &name,
                "setting names must not contain whitespace",
            ));
        }

        // Choices plus bounds force multi-choice mode; the bounds become a
        // selection count instead of a value range.
        let multi_choice = self.choices.is_some() && self.bounds.is_some();

        let (kind, subtype, constraint) = if multi_choice {
            let choices = self.choices.unwrap_or_default();
            let count = self.bounds.unwrap_or(Bounds::single(0.0));
            resolve_multi_choice(&name, choices, count, self.subtype)?
        } else {
            let kind = resolve_kind(&name, self.kind, &self.default, self.choices.as_deref())?;
            let subtype = resolve_subtype(&name, kind, self.subtype, &self.default)?;
            let constraint =
                resolve_constraint(&name, kind, self.choices, self.bounds)?;
            (kind, subtype, constraint)
        };

        // A setting must be able to hold its own default.
        let nullable = self.nullable || self.default.is_null();
        let label = self
            .label
            .unwrap_or_else(|| name.replace('_', " "));

        validate(&self.default, kind, subtype, &constraint, nullable).map_err(|reason| {
            SettingsError::Rejected {
                name: name.clone(),
                reason,
            }
        })?;

        Ok(Setting {
            value: self.default.clone(),
            name,
            kind,
            subtype,
            default: self.default,
            constraint,
            nullable,
            hidden: self.hidden,
            label,
            tooltip: self.tooltip,
            parent: self.parent,
            meta: self.meta,
        })
    }
}

/// Two-field literal form: `("name", value)`.
impl<N: Into<String>, V: Into<Value>> From<(N, V)> for SettingBuilder {
    fn from((name, value): (N, V)) -> Self {
        SettingBuilder::new(name, value)
    }
}

fn declaration(name: &str, message: impl Into<String>) -> SettingsError {
    SettingsError::Declaration {
        name: name.to_string(),
        message: message.into(),
    }
}

/// Exactly one of the explicit kind, the default, or the choices must
/// supply the type.
fn resolve_kind(
    name: &str,
    explicit: Option<Kind>,
    default: &Value,
    choices: Option<&[Value]>,
) -> Result<Kind, SettingsError> {
    if let Some(kind) = explicit {
        return Ok(kind);
    }
    if let Some(kind) = default.kind() {
        return Ok(kind);
    }
    if let Some(kind) = choices.and_then(|c| c.first()).and_then(Value::kind) {
        return Ok(kind);
    }
    Err(declaration(
        name,
        "unknown type: give a data type, choices, or a non-null default",
    ))
}

fn resolve_subtype(
    name: &str,
    kind: Kind,
    explicit: Option<Kind>,
    default: &Value,
) -> Result<Option<Kind>, SettingsError> {
    if kind != Kind::List {
        if explicit.is_some() {
            return Err(declaration(name, "subtype only applies to list settings"));
        }
        return Ok(None);
    }
    let inferred = match explicit {
        Some(subtype) => Some(subtype),
        None => match default.as_list() {
            Some(items) => {
                let mut found = None;
                for item in items {
                    match (found, item.kind()) {
                        (None, element) => found = element,
                        (Some(expected), Some(element)) if element == expected => {}
                        _ => {
                            return Err(declaration(
                                name,
                                "list elements must share a single type",
                            ))
                        }
                    }
                }
                found
            }
            None => None,
        },
    };
    if inferred == Some(Kind::List) {
        return Err(declaration(name, "lists cannot nest"));
    }
    Ok(inferred)
}

fn resolve_constraint(
    name: &str,
    kind: Kind,
    choices: Option<Vec<Value>>,
    bounds: Option<Bounds>,
) -> Result<Constraint, SettingsError> {
    if let Some(choices) = choices {
        if choices.is_empty() {
            return Err(declaration(name, "choices must not be empty"));
        }
        for choice in &choices {
            if choice.kind() != Some(kind) {
                return Err(declaration(
                    name,
                    format!("choices do not match the {} type", kind),
                ));
            }
        }
        return Ok(Constraint::Choice(choices));
    }
    if let Some(bounds) = bounds {
        if kind == Kind::Bool {
            return Err(declaration(name, "a range does not apply to bool"));
        }
        if bounds.is_inverted() {
            return Err(declaration(
                name,
                format!("range ({}, {}) is inverted", bounds.lo, bounds.hi),
            ));
        }
        if matches!(kind, Kind::Str | Kind::List) && bounds.lo < 0.0 {
            return Err(declaration(name, "a length range cannot be negative"));
        }
        return Ok(Constraint::Range(bounds));
    }
    Ok(Constraint::Free)
}

/// Multi-choice mode: a list of string choices with a bounded selection
/// count. The count must be satisfiable by the choice set.
fn resolve_multi_choice(
    name: &str,
    choices: Vec<Value>,
    count: Bounds,
    explicit_subtype: Option<Kind>,
) -> Result<(Kind, Option<Kind>, Constraint), SettingsError> {
    if choices.is_empty() {
        return Err(declaration(name, "choices must not be empty"));
    }
    // Only string elements are supported in multi-choice mode for now.
    for choice in &choices {
        if choice.kind() != Some(Kind::Str) {
            return Err(declaration(name, "multi-choice lists must be strings"));
        }
    }
    if let Some(subtype) = explicit_subtype {
        if subtype != Kind::Str {
            return Err(declaration(name, "multi-choice lists must be strings"));
        }
    }
    if count.is_inverted() {
        return Err(declaration(
            name,
            format!("count range ({}, {}) is inverted", count.lo, count.hi),
        ));
    }
    if count.lo < 0.0 {
        return Err(declaration(name, "a count range cannot be negative"));
    }
    if count.hi > choices.len() as f64 {
        return Err(declaration(
            name,
            format!(
                "count range ({}, {}) cannot be satisfied by {} choices",
                count.lo,
                count.hi,
                choices.len()
            ),
        ));
    }
    Ok((
        Kind::List,
        Some(Kind::Str),
        Constraint::MultiChoice { choices, count },
    ))
}
