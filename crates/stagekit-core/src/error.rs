//! Error handling for StageKit
//!
//! Provides error types for every layer of the stage controller:
//! - Connection errors (serial transport)
//! - Protocol errors (reply validation, busy polling)
//! - Acquisition errors (preconditions and scan parameters)
//! - Objective table errors
//! - Session errors (state machine capabilities)
//!
//! All error types use `thiserror` for ergonomic error handling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Connection error type
///
/// Represents failures of the serial transport itself: opening the port,
/// writing a line, or waiting for a reply line.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectionError {
    /// The port could not be opened
    #[error("Port {port} unavailable: {reason}")]
    PortUnavailable {
        /// The name of the port that failed to open.
        port: String,
        /// The reason reported by the operating system.
        reason: String,
    },

    /// Baud rate not supported by the controller
    #[error("Baud rate {baud} not supported")]
    UnsupportedBaudRate {
        /// The unsupported baud rate.
        baud: u32,
    },

    /// No complete reply line arrived in time
    #[error("Read timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Writing to the port failed (broken pipe, device removed)
    #[error("Write failed: {reason}")]
    IoWrite {
        /// The reason for the write failure.
        reason: String,
    },

    /// Reading from the port failed
    #[error("Read failed: {reason}")]
    IoRead {
        /// The reason for the read failure.
        reason: String,
    },

    /// The connection has already been closed
    #[error("Connection is not open")]
    NotOpen,

    /// Port enumeration failed
    #[error("Failed to enumerate ports: {reason}")]
    EnumerationFailed {
        /// The reason enumeration failed.
        reason: String,
    },
}

/// Protocol error type
///
/// Raised when the device answers with something other than what the
/// command/response protocol expects.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// Reply was not the acknowledgement token
    #[error("Unexpected reply to '{command}': '{reply}'")]
    UnexpectedReply {
        /// The command that was sent.
        command: String,
        /// The reply line received (empty on timeout).
        reply: String,
    },

    /// The device kept reporting busy past the configured guard
    #[error("Device still busy after {waited_ms}ms")]
    BusyWaitExceeded {
        /// How long the poller waited in milliseconds.
        waited_ms: u64,
    },
}

/// Acquisition error type
///
/// Precondition and parameter failures detected before any command is sent,
/// plus cooperative cancellation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AcquisitionError {
    /// No open connection
    #[error("Serial port not connected")]
    NotConnected,

    /// No objective was selected
    #[error("No objective selected")]
    NoObjectiveSelected,

    /// The selected objective index is past the end of the table
    #[error("Objective index {index} out of range ({len} objectives loaded)")]
    ObjectiveOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of objectives in the table.
        len: usize,
    },

    /// A scan parameter failed to parse or was negative
    #[error("Invalid {field}: {reason}")]
    InvalidParameter {
        /// The form field name.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The sequence was cancelled at a step boundary
    #[error("Acquisition cancelled after {completed_steps} steps")]
    Cancelled {
        /// Number of commands acknowledged before cancellation.
        completed_steps: usize,
    },
}

/// Objective table error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObjectiveError {
    /// The loaded table has no rows
    #[error("Objective table is empty")]
    EmptyTable,

    /// A row has an empty label
    #[error("Objective {index} has an empty label")]
    MissingLabel {
        /// Row index.
        index: usize,
    },

    /// A row has a non-finite offset
    #[error("Objective '{label}' has a non-finite offset")]
    NonFiniteOffset {
        /// Row label.
        label: String,
    },
}

/// Session error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The requested action is not enabled in the current state
    #[error("{capability} is not available while {state}")]
    CapabilityUnavailable {
        /// The requested capability.
        capability: String,
        /// The current session state.
        state: String,
    },

    /// The port was not part of the last scan
    #[error("Port {port} was not found by the last scan")]
    PortNotScanned {
        /// The requested port name.
        port: String,
    },
}

/// User-facing error category
///
/// The coarse classification the UI collaborator uses to decide how to
/// notify the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Port could not be opened
    PortUnavailable,
    /// No reply line in time
    Timeout,
    /// Transport write/read failure
    Io,
    /// Reply was not the acknowledgement
    UnexpectedReply,
    /// Busy guard exceeded
    BusyTimeout,
    /// No open connection
    NotConnected,
    /// No objective selected
    NoObjectiveSelected,
    /// Bad scan parameter or configuration value
    InvalidInput,
    /// Acquisition cancelled by the user
    Cancelled,
    /// Action not allowed in the current state
    NotAllowed,
    /// Anything else
    Other,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PortUnavailable => write!(f, "Port Unavailable"),
            Self::Timeout => write!(f, "Timeout"),
            Self::Io => write!(f, "I/O Error"),
            Self::UnexpectedReply => write!(f, "Unexpected Reply"),
            Self::BusyTimeout => write!(f, "Busy Timeout"),
            Self::NotConnected => write!(f, "Not Connected"),
            Self::NoObjectiveSelected => write!(f, "No Objective Selected"),
            Self::InvalidInput => write!(f, "Invalid Input"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::NotAllowed => write!(f, "Not Allowed"),
            Self::Other => write!(f, "Error"),
        }
    }
}

/// Main error type for StageKit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Protocol error
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Acquisition error
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    /// Objective table error
    #[error(transparent)]
    Objective(#[from] ObjectiveError),

    /// Session error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Classify this error for user notification
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Connection(ConnectionError::PortUnavailable { .. })
            | Error::Connection(ConnectionError::EnumerationFailed { .. }) => {
                ErrorKind::PortUnavailable
            }
            Error::Connection(ConnectionError::UnsupportedBaudRate { .. }) => ErrorKind::InvalidInput,
            Error::Connection(ConnectionError::Timeout { .. }) => ErrorKind::Timeout,
            Error::Connection(ConnectionError::NotOpen) => ErrorKind::NotConnected,
            Error::Connection(_) | Error::Io(_) => ErrorKind::Io,
            Error::Protocol(ProtocolError::UnexpectedReply { .. }) => ErrorKind::UnexpectedReply,
            Error::Protocol(ProtocolError::BusyWaitExceeded { .. }) => ErrorKind::BusyTimeout,
            Error::Acquisition(AcquisitionError::NotConnected) => ErrorKind::NotConnected,
            Error::Acquisition(AcquisitionError::NoObjectiveSelected) => {
                ErrorKind::NoObjectiveSelected
            }
            Error::Acquisition(AcquisitionError::Cancelled { .. }) => ErrorKind::Cancelled,
            Error::Acquisition(_) | Error::Objective(_) => ErrorKind::InvalidInput,
            Error::Session(_) => ErrorKind::NotAllowed,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Connection(ConnectionError::Timeout { .. }))
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a protocol error
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }

    /// Whether the device state is unknown after this error
    ///
    /// Transport and protocol failures invalidate the assumed device state,
    /// so the connection must be dropped and re-established.
    pub fn requires_disconnect(&self) -> bool {
        matches!(
            self,
            Error::Connection(ConnectionError::Timeout { .. })
                | Error::Connection(ConnectionError::IoWrite { .. })
                | Error::Connection(ConnectionError::IoRead { .. })
                | Error::Protocol(_)
                | Error::Io(_)
        )
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
