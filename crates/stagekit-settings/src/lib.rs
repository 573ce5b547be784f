//! StageKit Settings Crate
//!
//! Handles the application configuration file and objective table files.

pub mod config;
pub mod error;
pub mod objectives;

pub use config::{AcquisitionSettings, Config, ConnectionSettings, FileFormat, PollingSettings};
pub use error::{SettingsError, SettingsResult};
pub use objectives::{load_objectives, parse_objectives, save_objectives};
