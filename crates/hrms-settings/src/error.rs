//! Error types for settings persistence.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for settings operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading or writing the settings file failed.
    #[error("settings file {path} could not be accessed")]
    Io {
        /// Settings file location.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },
    /// The settings file is not a JSON object.
    #[error("settings file {path} is malformed")]
    Malformed {
        /// Settings file location.
        path: PathBuf,
        /// Parse failure detail.
        #[source]
        source: serde_json::Error,
    },
    /// A stored value could not be converted to the requested type.
    #[error("stored value for '{key}' has an unexpected shape")]
    InvalidValue {
        /// Storage key.
        key: String,
        /// Conversion failure detail.
        #[source]
        source: serde_json::Error,
    },
    /// No platform configuration directory could be located.
    #[error("no configuration directory available; pass an explicit settings path")]
    NoConfigDir,
}

/// Convenience alias for settings results.
pub type SettingsResult<T> = Result<T, SettingsError>;
