//! Objective table files
//!
//! `.json` files hold an array of `{ "label", "dx", "dy" }` objects.
//! `.toml` files hold `[[objective]]` tables with the same keys:
//!
//! ```toml
//! [[objective]]
//! label = "10x"
//! dx = 1.0
//! dy = 2.0
//! ```

use crate::config::FileFormat;
use crate::error::SettingsResult;
use serde::{Deserialize, Serialize};
use stagekit_core::{ObjectiveEntry, ObjectiveTable};
use std::path::Path;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ObjectiveFile {
    #[serde(default)]
    objective: Vec<ObjectiveEntry>,
}

/// Parse an objective table from text in the given format
pub fn parse_objectives(content: &str, format: FileFormat) -> SettingsResult<ObjectiveTable> {
    let entries = match format {
        FileFormat::Json => serde_json::from_str::<Vec<ObjectiveEntry>>(content)?,
        FileFormat::Toml => toml::from_str::<ObjectiveFile>(content)?.objective,
    };
    Ok(ObjectiveTable::from_entries(entries)?)
}

/// Load an objective table, choosing the format by extension
pub fn load_objectives(path: &Path) -> SettingsResult<ObjectiveTable> {
    let format = FileFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    let table = parse_objectives(&content, format)?;
    tracing::info!(
        "Loaded {} objectives from {}",
        table.len(),
        path.display()
    );
    Ok(table)
}

/// Write an objective table, choosing the format by extension
pub fn save_objectives(table: &ObjectiveTable, path: &Path) -> SettingsResult<()> {
    let entries: Vec<ObjectiveEntry> = table.iter().cloned().collect();
    let content = match FileFormat::from_path(path)? {
        FileFormat::Json => serde_json::to_string_pretty(&entries)?,
        FileFormat::Toml => toml::to_string_pretty(&ObjectiveFile { objective: entries })?,
    };
    std::fs::write(path, content)?;
    Ok(())
}
