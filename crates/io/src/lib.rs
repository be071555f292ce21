// Settings persistence

use knobs_engine::error::SettingsError;

pub mod json;

/// Error type for reading and writing settings files.
#[derive(Debug)]
pub enum IoError {
    /// File read or write failure
    Io(String),
    /// Malformed JSON, or a shape none of the settings forms cover
    Parse(String),
    /// The file parsed, but the engine rejected its declarations
    Settings(SettingsError),
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoError::Io(msg) => write!(f, "I/O error: {}", msg),
            IoError::Parse(msg) => write!(f, "Parse error: {}", msg),
            IoError::Settings(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for IoError {}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        IoError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(err: serde_json::Error) -> Self {
        IoError::Parse(err.to_string())
    }
}

impl From<SettingsError> for IoError {
    fn from(err: SettingsError) -> Self {
        IoError::Settings(err)
    }
}
