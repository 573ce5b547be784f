//! Configuration management for StageKit
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats; the default file lives in the platform config
//! directory.
//!
//! Configuration is organized into sections:
//! - Connection settings (port, baud rate, reply timeout)
//! - Polling settings (status query spacing, busy-wait guard)
//! - Acquisition settings (backlash compensation)
//! - The objective table file

use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Supported configuration file formats, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// `.json`
    Json,
    /// `.toml`
    Toml,
}

impl FileFormat {
    /// Detect the format from a path's extension
    pub fn from_path(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            other => Err(SettingsError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Serial connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Last used port; empty when none has been chosen
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Reply timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: 115200,
            timeout_ms: 1000,
        }
    }
}

/// Busy-wait polling settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// Delay between status queries; 0 polls back-to-back
    pub poll_interval_ms: u64,
    /// Abort a step whose busy wait exceeds this; unset waits forever
    pub max_wait_ms: Option<u64>,
}

/// Acquisition settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionSettings {
    /// Backlash compensation on X
    pub backlash_x: f64,
    /// Backlash compensation on Y
    pub backlash_y: f64,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            backlash_x: 0.05,
            backlash_y: 0.05,
        }
    }
}

/// Complete application configuration
///
/// Missing sections and keys fall back to their defaults, so a file only
/// needs to hold what differs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Objective table loaded by `stagekit run` when none is given
    pub objectives_file: Option<PathBuf>,
    /// Connection settings
    pub connection: ConnectionSettings,
    /// Polling settings
    pub polling: PollingSettings,
    /// Acquisition settings
    pub acquisition: AcquisitionSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location: `<config dir>/stagekit/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("stagekit").join("config.toml"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no platform config directory".to_string())
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = FileFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            FileFormat::Json => serde_json::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load config from `path`, or defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match FileFormat::from_path(path)? {
            FileFormat::Json => serde_json::to_string_pretty(self)?,
            FileFormat::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if self.connection.timeout_ms == 0 {
            return Err(SettingsError::invalid(
                "connection.timeout_ms",
                "must be > 0",
            ));
        }

        if self.connection.baud_rate == 0 {
            return Err(SettingsError::invalid("connection.baud_rate", "must be > 0"));
        }

        if self.polling.max_wait_ms == Some(0) {
            return Err(SettingsError::invalid(
                "polling.max_wait_ms",
                "must be > 0 when set",
            ));
        }

        for (key, value) in [
            ("acquisition.backlash_x", self.acquisition.backlash_x),
            ("acquisition.backlash_y", self.acquisition.backlash_y),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SettingsError::invalid(
                    key,
                    format!("{} is not a non-negative number", value),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.connection.baud_rate, 115200);
        assert_eq!(config.connection.timeout_ms, 1000);
        assert_eq!(config.polling.poll_interval_ms, 0);
        assert_eq!(config.polling.max_wait_ms, None);
        assert_eq!(config.acquisition.backlash_x, 0.05);
        assert!(config.objectives_file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::new();
        config.connection.port = "/dev/ttyUSB0".to_string();
        config.polling.max_wait_ms = Some(30_000);
        config.objectives_file = Some(PathBuf::from("objectives.json"));
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::new();
        config.acquisition.backlash_y = 0.1;
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[connection]\nport = \"COM3\"\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.connection.port, "COM3");
        assert_eq!(config.connection.baud_rate, 115200);
        assert_eq!(config.acquisition, AcquisitionSettings::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::new();
        config.connection.timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::InvalidSetting { ref key, .. }) if key == "connection.timeout_ms"
        ));

        let mut config = Config::new();
        config.acquisition.backlash_x = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.polling.max_wait_ms = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        assert!(matches!(
            Config::new().save_to_file(&path),
            Err(SettingsError::UnsupportedFormat(ref ext)) if ext == "yaml"
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
