//! The settings collection: ordered lookup, parent gating, change events.
//!
//! Settings are stored in declaration order and addressed by name. A
//! setting declared with a parent is gated on that parent's truthiness:
//! reads of a gated setting yield `Null`, writes fail. Gating is evaluated
//! against the live parent chain on every call; the child's stored value
//! is never touched and comes back when the chain is truthy again.

use std::fmt;

use indexmap::IndexMap;

use crate::error::SettingsError;
use crate::events::{ChangeCallback, ChangeEvent, SubscriptionId};
use crate::parser::ParserArg;
use crate::setting::{Setting, SettingBuilder};
use crate::value::Value;

#[derive(Default)]
pub struct Registry {
    settings: IndexMap<String, Setting>,
    subscribers: Vec<(SubscriptionId, ChangeCallback)>,
    next_subscription: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a sequence of declarations, failing on the
    /// first invalid one.
    pub fn from_builders<I, B>(builders: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = B>,
        B: Into<SettingBuilder>,
    {
        let mut registry = Self::new();
        for builder in builders {
            registry.add(builder)?;
        }
        Ok(registry)
    }

    /// Declare a setting. Names are unique, and a declared parent must
    /// already be present, so parents always precede their children.
    pub fn add(&mut self, builder: impl Into<SettingBuilder>) -> Result<(), SettingsError> {
        let builder = builder.into();
        if self.settings.contains_key(builder.name()) {
            return Err(SettingsError::Duplicate(builder.name().to_string()));
        }
        if let Some(parent) = builder.parent() {
            if !self.settings.contains_key(parent) {
                return Err(SettingsError::Declaration {
                    name: builder.name().to_string(),
                    message: format!("parent setting {:?} does not exist", parent),
                });
            }
        }
        let setting = builder.build()?;
        self.settings.insert(setting.name().to_string(), setting);
        Ok(())
    }

    /// Read a setting's value. A setting whose parent chain is not truthy
    /// reads as `Null`; its stored value is untouched.
    pub fn get(&self, name: &str) -> Result<Value, SettingsError> {
        let setting = self.lookup(name)?;
        if let Some(parent) = setting.parent() {
            if !self.chain_is_truthy(parent) {
                return Ok(Value::Null);
            }
        }
        Ok(setting.get().clone())
    }

    /// Validate and store a new value, then notify subscribers.
    ///
    /// Fails with [`SettingsError::ParentDisabled`] when the parent chain
    /// is not truthy. No event is emitted for a failed write.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), SettingsError> {
        let value = value.into();
        let setting = self.lookup(name)?;
        if let Some(parent) = setting.parent() {
            if !self.chain_is_truthy(parent) {
                return Err(SettingsError::ParentDisabled {
                    name: name.to_string(),
                    parent: parent.to_string(),
                });
            }
        }
        let event = ChangeEvent {
            name: name.to_string(),
            value: value.clone(),
        };
        // Second lookup: the gate check above held a shared borrow.
        let setting = self
            .settings
            .get_mut(name)
            .ok_or_else(|| SettingsError::NotFound(name.to_string()))?;
        setting.set(value)?;
        self.emit(event);
        Ok(())
    }

    /// Put every setting back to its default, in declaration order,
    /// notifying subscribers per setting. Resets ignore parent gating.
    pub fn reset(&mut self) {
        let mut events = Vec::with_capacity(self.settings.len());
        for setting in self.settings.values_mut() {
            setting.reset();
            events.push(ChangeEvent {
                name: setting.name().to_string(),
                value: setting.get().clone(),
            });
        }
        for event in events {
            self.emit(event);
        }
    }

    /// Validate and store a value without gate checks or notifications.
    /// This is the write path for loading persisted state: a value saved
    /// under a truthy parent must restore even when the parent currently
    /// reads falsy.
    pub fn restore(&mut self, name: &str, value: impl Into<Value>) -> Result<(), SettingsError> {
        let setting = self
            .settings
            .get_mut(name)
            .ok_or_else(|| SettingsError::NotFound(name.to_string()))?;
        setting.set(value.into())
    }

    /// Whether the setting's value is truthy, accounting for the parent
    /// chain. This is the condition that gates its children.
    pub fn is_enabled(&self, name: &str) -> Result<bool, SettingsError> {
        self.lookup(name)?;
        Ok(self.chain_is_truthy(name))
    }

    /// The settings directly gated on `name`, in declaration order. First
    /// generation only, never recursive.
    pub fn dependents(&self, name: &str) -> Result<Vec<&Setting>, SettingsError> {
        self.lookup(name)?;
        Ok(self
            .settings
            .values()
            .filter(|setting| setting.parent() == Some(name))
            .collect())
    }

    pub fn property(&self, name: &str, key: &str) -> Result<Value, SettingsError> {
        self.lookup(name)?.property(key)
    }

    pub fn properties(&self, name: &str) -> Result<IndexMap<String, Value>, SettingsError> {
        Ok(self.lookup(name)?.properties())
    }

    /// Direct access to a setting's declaration and metadata.
    pub fn setting(&self, name: &str) -> Option<&Setting> {
        self.settings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.settings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.settings.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Setting> {
        self.settings.values()
    }

    /// True when at least one setting is not hidden.
    pub fn has_visible(&self) -> bool {
        self.settings.values().any(|setting| !setting.hidden())
    }

    /// Snapshot of stored values by name, in declaration order. Stored
    /// values, not gated reads: persisting a gated child must not flatten
    /// it to `Null`.
    pub fn as_values(&self) -> IndexMap<String, Value> {
        self.settings
            .iter()
            .map(|(name, setting)| (name.clone(), setting.get().clone()))
            .collect()
    }

    /// Full property maps by name, in declaration order.
    pub fn as_properties(&self) -> IndexMap<String, IndexMap<String, Value>> {
        self.settings
            .iter()
            .map(|(name, setting)| (name.clone(), setting.properties()))
            .collect()
    }

    /// Argument specs for a command-line parser.
    ///
    /// With `names`, exactly those settings in the given order, hidden or
    /// not; an unknown name fails. Without, every setting in declaration
    /// order, skipping hidden ones unless `include_hidden`.
    pub fn parser_args(
        &self,
        names: Option<&[String]>,
        include_hidden: bool,
    ) -> Result<Vec<ParserArg>, SettingsError> {
        match names {
            Some(names) => names
                .iter()
                .map(|name| Ok(self.lookup(name)?.parser_arg()))
                .collect(),
            None => Ok(self
                .settings
                .values()
                .filter(|setting| include_hidden || !setting.hidden())
                .map(Setting::parser_arg)
                .collect()),
        }
    }

    /// Register a callback for change events. Events fire synchronously,
    /// in subscription order, once per accepted write.
    pub fn subscribe(&mut self, callback: ChangeCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, callback));
        id
    }

    /// Remove a subscription. Returns false when the id was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    fn lookup(&self, name: &str) -> Result<&Setting, SettingsError> {
        self.settings
            .get(name)
            .ok_or_else(|| SettingsError::NotFound(name.to_string()))
    }

    // Walk the parent chain from `name` upward. Parents always precede
    // their children and never change, so the walk terminates.
    fn chain_is_truthy(&self, name: &str) -> bool {
        let mut current = self.settings.get(name);
        while let Some(setting) = current {
            if !setting.get().is_truthy() {
                return false;
            }
            match setting.parent() {
                Some(parent) => current = self.settings.get(parent),
                None => return true,
            }
        }
        false
    }

    fn emit(&mut self, event: ChangeEvent) {
        for (_, callback) in &mut self.subscribers {
            callback(event.clone());
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("settings", &self.settings)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
