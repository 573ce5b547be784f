//! Data models for the acquisition core
//!
//! This module provides:
//! - The objective lookup table and its entries
//! - Raw and validated scan parameters

pub mod objectives;
pub mod scan;

pub use objectives::{ObjectiveEntry, ObjectiveTable};
pub use scan::{ScanForm, ScanRequest};
