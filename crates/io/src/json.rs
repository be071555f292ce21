// JSON import and export for a settings registry

use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde_json::Value as Json;

use knobs_engine::constraint::Bounds;
use knobs_engine::registry::Registry;
use knobs_engine::setting::SettingBuilder;
use knobs_engine::value::{Kind, Value};

use crate::IoError;

/// Identifier to kind lookup used when `data_type`/`subtype` strings come
/// back from a file.
///
/// The five built-in names always resolve; callers insert their own
/// aliases on top. Resolution is this table and nothing else, never
/// evaluation of anything found in the file. It still trusts the file to
/// name types honestly, so treat untrusted input as unsafe.
#[derive(Debug, Clone, Default)]
pub struct KindTable {
    aliases: Vec<(String, Kind)>,
}

impl KindTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an alias. Later entries win over earlier ones and over the
    /// built-in names.
    pub fn insert(&mut self, alias: impl Into<String>, kind: Kind) {
        self.aliases.push((alias.into(), kind));
    }

    pub fn resolve(&self, name: &str) -> Option<Kind> {
        self.aliases
            .iter()
            .rev()
            .find(|(alias, _)| alias == name)
            .map(|(_, kind)| *kind)
            .or_else(|| Kind::from_name(name))
    }
}

/// Serialize the full `{name: {properties}}` form, pretty-printed, in
/// declaration order.
pub fn to_json(registry: &Registry) -> Result<String, IoError> {
    Ok(serde_json::to_string_pretty(&registry.as_properties())?)
}

/// Serialize the plain `{name: value}` form, pretty-printed, in
/// declaration order.
pub fn to_json_values(registry: &Registry) -> Result<String, IoError> {
    Ok(serde_json::to_string_pretty(&registry.as_values())?)
}

/// Build a registry from JSON, recognizing the built-in kind names only.
pub fn from_json(text: &str) -> Result<Registry, IoError> {
    from_json_with(text, &KindTable::new())
}

/// Build a registry from JSON.
///
/// Settings come in several forms, so hand-written files can pick
/// whichever reads best:
///
/// * object of property objects: `{name: {properties}}`
/// * object of plain values: `{name: value}`
/// * list of single-entry objects, in either of the above shapes
/// * list of `[name, value]` pairs
///
/// Key order in the file becomes declaration order, so parents must be
/// written before their children. A property object's `value` is restored
/// after construction when it differs from the default.
pub fn from_json_with(text: &str, kinds: &KindTable) -> Result<Registry, IoError> {
    let parsed: Json = serde_json::from_str(text)?;
    let mut registry = Registry::new();
    match parsed {
        Json::Object(entries) => {
            for (name, data) in &entries {
                add_entry(&mut registry, name, data, kinds)?;
            }
        }
        Json::Array(items) => {
            for item in &items {
                match item {
                    Json::Object(entries) => {
                        for (name, data) in entries {
                            add_entry(&mut registry, name, data, kinds)?;
                        }
                    }
                    Json::Array(pair) if pair.len() == 2 => {
                        let name = pair[0].as_str().ok_or_else(|| {
                            IoError::Parse("setting pairs must start with a name".into())
                        })?;
                        add_entry(&mut registry, name, &pair[1], kinds)?;
                    }
                    other => {
                        return Err(IoError::Parse(format!(
                            "unsupported settings entry: {}",
                            other
                        )))
                    }
                }
            }
        }
        other => {
            return Err(IoError::Parse(format!(
                "settings must be an object or a list, got {}",
                other
            )))
        }
    }
    Ok(registry)
}

/// Write the registry to a file, creating parent directories as needed.
pub fn save(path: &Path, registry: &Registry, values_only: bool) -> Result<(), IoError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    if values_only {
        serde_json::to_writer_pretty(writer, &registry.as_values())?;
    } else {
        serde_json::to_writer_pretty(writer, &registry.as_properties())?;
    }
    Ok(())
}

/// Read a registry back from a file.
pub fn load(path: &Path) -> Result<Registry, IoError> {
    load_with(path, &KindTable::new())
}

pub fn load_with(path: &Path, kinds: &KindTable) -> Result<Registry, IoError> {
    let text = fs::read_to_string(path)?;
    from_json_with(&text, kinds)
}

/// Default settings file location for an application, under the platform
/// config directory.
pub fn default_path(app: &str) -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(app)
        .join("settings.json")
}

fn add_entry(
    registry: &mut Registry,
    name: &str,
    data: &Json,
    kinds: &KindTable,
) -> Result<(), IoError> {
    match data {
        Json::Object(properties) => {
            let (builder, stored) = builder_from_properties(name, properties, kinds)?;
            registry.add(builder)?;
            if let Some(value) = stored {
                registry.restore(name, value)?;
            }
        }
        other => {
            registry.add((name, to_value(other)?))?;
        }
    }
    Ok(())
}

fn builder_from_properties(
    name: &str,
    properties: &serde_json::Map<String, Json>,
    kinds: &KindTable,
) -> Result<(SettingBuilder, Option<Value>), IoError> {
    let default = match properties.get("default") {
        Some(data) => to_value(data)?,
        None => Value::Null,
    };
    let mut builder = SettingBuilder::new(name, default.clone());
    let mut stored = None;

    for (key, data) in properties {
        match key.as_str() {
            // `name` repeats the entry key in exported files
            "name" | "default" => {}
            "value" => {
                let value = to_value(data)?;
                if value != default {
                    stored = Some(value);
                }
            }
            "data_type" => {
                if !data.is_null() {
                    builder = builder.with_kind(resolve_kind(kinds, data)?);
                }
            }
            "subtype" => {
                if !data.is_null() {
                    builder = builder.with_subtype(resolve_kind(kinds, data)?);
                }
            }
            "choices" => match data {
                Json::Null => {}
                Json::Array(items) => {
                    let choices = items.iter().map(to_value).collect::<Result<Vec<_>, _>>()?;
                    builder = builder.with_choices(choices);
                }
                other => {
                    return Err(IoError::Parse(format!(
                        "choices must be a list, got {}",
                        other
                    )))
                }
            },
            "minmax" => {
                if !data.is_null() {
                    builder = builder.with_bounds(to_bounds(data)?);
                }
            }
            "nullable" => builder = builder.with_nullable(to_flag(key, data)?),
            "hidden" => builder = builder.with_hidden(to_flag(key, data)?),
            "label" => {
                if let Some(label) = data.as_str() {
                    builder = builder.with_label(label);
                }
            }
            "tooltip" => {
                if let Some(tooltip) = data.as_str() {
                    builder = builder.with_tooltip(tooltip);
                }
            }
            "parent" => {
                if let Some(parent) = data.as_str() {
                    builder = builder.with_parent(parent);
                }
            }
            // Everything else is user metadata
            _ => builder = builder.with_meta(key.clone(), to_value(data)?),
        }
    }
    Ok((builder, stored))
}

fn resolve_kind(kinds: &KindTable, data: &Json) -> Result<Kind, IoError> {
    let name = data
        .as_str()
        .ok_or_else(|| IoError::Parse(format!("type names must be strings, got {}", data)))?;
    kinds
        .resolve(name)
        .ok_or_else(|| IoError::Parse(format!("unknown type name {:?}", name)))
}

fn to_value(data: &Json) -> Result<Value, IoError> {
    match data {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => {
            if let Some(n) = n.as_i64() {
                Ok(Value::Int(n))
            } else if let Some(x) = n.as_f64() {
                Ok(Value::Float(x))
            } else {
                Err(IoError::Parse(format!("number {} is out of range", n)))
            }
        }
        Json::String(s) => Ok(Value::Str(s.clone())),
        Json::Array(items) => Ok(Value::List(
            items.iter().map(to_value).collect::<Result<_, _>>()?,
        )),
        Json::Object(_) => Err(IoError::Parse("maps are not valid setting values".into())),
    }
}

fn to_bounds(data: &Json) -> Result<Bounds, IoError> {
    match data {
        Json::Number(n) => n
            .as_f64()
            .map(Bounds::single)
            .ok_or_else(|| IoError::Parse(format!("number {} is out of range", n))),
        Json::Array(items) if items.len() == 2 => {
            let lo = items[0]
                .as_f64()
                .ok_or_else(|| IoError::Parse("minmax entries must be numbers".into()))?;
            let hi = items[1]
                .as_f64()
                .ok_or_else(|| IoError::Parse("minmax entries must be numbers".into()))?;
            Ok(Bounds::new(lo, hi))
        }
        other => Err(IoError::Parse(format!(
            "minmax must be a number or a two-element list, got {}",
            other
        ))),
    }
}

fn to_flag(key: &str, data: &Json) -> Result<bool, IoError> {
    data.as_bool()
        .ok_or_else(|| IoError::Parse(format!("{} must be a bool, got {}", key, data)))
}
