//! Error types for the settings crate.
//!
//! Covers configuration file I/O, format detection, validation and the
//! objective table loader.

use stagekit_core::ObjectiveError;
use std::io;
use thiserror::Error;

/// Errors that can occur during settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The file extension is neither `.json` nor `.toml`.
    #[error("Unsupported file format: {0} (expected .json or .toml)")]
    UnsupportedFormat(String),

    /// A configuration value is invalid.
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    /// The configuration directory could not be resolved.
    #[error("Config directory error: {0}")]
    ConfigDirectory(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML parse error.
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML write error: {0}")]
    TomlWriteError(#[from] toml::ser::Error),

    /// The objective table failed validation.
    #[error("Objective table error: {0}")]
    Objectives(#[from] ObjectiveError),
}

impl SettingsError {
    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_error_display() {
        let err = SettingsError::InvalidSetting {
            key: "connection.timeout_ms".to_string(),
            reason: "must be > 0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid setting 'connection.timeout_ms': must be > 0"
        );

        let err = SettingsError::UnsupportedFormat("yaml".to_string());
        assert_eq!(
            err.to_string(),
            "Unsupported file format: yaml (expected .json or .toml)"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: SettingsError = ObjectiveError::EmptyTable.into();
        assert!(matches!(err, SettingsError::Objectives(_)));

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: SettingsError = io_err.into();
        assert!(matches!(err, SettingsError::IoError(_)));
    }
}
