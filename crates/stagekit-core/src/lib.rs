//! # StageKit Core
//!
//! Core types, errors, and session state for StageKit.
//! Provides the data model shared by the protocol driver, the acquisition
//! sequencer and the user-facing session layer.

pub mod core;
pub mod data;
pub mod error;

pub use self::core::{Capability, EventDispatcher, SessionEvent, SessionState};

pub use data::{ObjectiveEntry, ObjectiveTable, ScanForm, ScanRequest};

pub use error::{
    AcquisitionError, ConnectionError, Error, ErrorKind, ObjectiveError, ProtocolError, Result,
    SessionError,
};
