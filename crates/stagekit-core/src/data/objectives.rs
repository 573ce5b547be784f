//! Objective lookup table
//!
//! One row per physical objective, each with the mechanical (dx, dy) offset
//! the stage must be recentred by when that objective is in use. The table
//! is immutable once loaded and replaced wholesale on reload.

use crate::error::ObjectiveError;
use serde::{Deserialize, Serialize};

/// A single objective and its physical offset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveEntry {
    /// Display label (e.g. "10x Plan Apo")
    pub label: String,
    /// X offset in stage units
    pub dx: f64,
    /// Y offset in stage units
    pub dy: f64,
}

impl ObjectiveEntry {
    /// Create a new objective entry
    pub fn new(label: impl Into<String>, dx: f64, dy: f64) -> Self {
        Self {
            label: label.into(),
            dx,
            dy,
        }
    }
}

impl std::fmt::Display for ObjectiveEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (dx={}, dy={})", self.label, self.dx, self.dy)
    }
}

/// Ordered, index-addressable set of objectives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveTable {
    entries: Vec<ObjectiveEntry>,
}

impl ObjectiveTable {
    /// Build a table from loaded rows
    ///
    /// Rejects empty tables, empty labels and non-finite offsets.
    pub fn from_entries(entries: Vec<ObjectiveEntry>) -> Result<Self, ObjectiveError> {
        if entries.is_empty() {
            return Err(ObjectiveError::EmptyTable);
        }

        for (index, entry) in entries.iter().enumerate() {
            if entry.label.trim().is_empty() {
                return Err(ObjectiveError::MissingLabel { index });
            }
            if !entry.dx.is_finite() || !entry.dy.is_finite() {
                return Err(ObjectiveError::NonFiniteOffset {
                    label: entry.label.clone(),
                });
            }
        }

        Ok(Self { entries })
    }

    /// Look up an objective by selection index
    pub fn get(&self, index: usize) -> Option<&ObjectiveEntry> {
        self.entries.get(index)
    }

    /// Number of objectives
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels in selection order
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    /// Iterate the entries in selection order
    pub fn iter(&self) -> impl Iterator<Item = &ObjectiveEntry> {
        self.entries.iter()
    }
}
