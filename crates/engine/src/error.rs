//! Error type for the settings engine.
//!
//! Every failure is reported synchronously to the caller; nothing is
//! retried, coerced, or swallowed. Validation failures carry an
//! [`InvalidValue`] so consumers can present a precise message.

use crate::constraint::InvalidValue;

/// Error type for setting declaration and mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// Malformed setting declaration (ambiguous type, infeasible
    /// constraints, malformed bounds, bad name, missing parent).
    Declaration { name: String, message: String },
    /// A value failed validation against the setting's constraints.
    Rejected { name: String, reason: InvalidValue },
    /// Write attempted while the setting's parent gate is closed.
    ParentDisabled { name: String, parent: String },
    /// Unknown setting name.
    NotFound(String),
    /// A setting with this name already exists.
    Duplicate(String),
    /// Unknown property key.
    UnknownProperty { name: String, property: String },
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Declaration { name, message } => {
                write!(f, "Invalid declaration for setting {:?}: {}", name, message)
            }
            SettingsError::Rejected { name, reason } => {
                write!(f, "Invalid value for setting {:?}: {}", name, reason)
            }
            SettingsError::ParentDisabled { name, parent } => {
                write!(
                    f,
                    "Setting {:?} cannot be set, parent {:?} is not enabled",
                    name, parent
                )
            }
            SettingsError::NotFound(name) => write!(f, "No setting exists for: {:?}", name),
            SettingsError::Duplicate(name) => write!(f, "Setting already exists: {:?}", name),
            SettingsError::UnknownProperty { name, property } => {
                write!(f, "Setting {:?} has no property {:?}", name, property)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
