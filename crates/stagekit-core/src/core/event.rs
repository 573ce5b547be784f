//! Event system for the session log stream
//!
//! Provides:
//! - Event types for wire traffic, session state and acquisition progress
//! - Event dispatcher for publishing events to subscribers
//!
//! The stream is append-only and ordered: subscribers see events in the
//! order they were published.

use crate::core::state::SessionState;
use crate::error::ErrorKind;
use tokio::sync::broadcast;

/// Session event types
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A command line was written to the port
    CommandSent(String),
    /// A reply line was read from the port
    ReplyReceived(String),
    /// Port opened
    Connected {
        /// Port name.
        port: String,
        /// Baud rate.
        baud_rate: u32,
    },
    /// Port closed
    Disconnected,
    /// Session state changed
    StateChanged(SessionState),
    /// A sequence step is about to be sent
    StepStarted {
        /// 1-based step number.
        index: usize,
        /// Total number of steps.
        total: usize,
        /// The command line for this step.
        command: String,
    },
    /// All steps acknowledged and the device reported idle
    AcquisitionFinished,
    /// An error was surfaced to the user
    Error {
        /// Error category.
        kind: ErrorKind,
        /// Human readable message.
        message: String,
    },
}

impl SessionEvent {
    /// Whether this event belongs in the wire log
    pub fn is_wire_traffic(&self) -> bool {
        matches!(
            self,
            SessionEvent::CommandSent(_) | SessionEvent::ReplyReceived(_)
        )
    }
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::CommandSent(cmd) => write!(f, "> {}", cmd),
            SessionEvent::ReplyReceived(reply) => write!(f, "< {}", reply),
            SessionEvent::Connected { port, baud_rate } => {
                write!(f, "Connected to {} at {}", port, baud_rate)
            }
            SessionEvent::Disconnected => write!(f, "Disconnected from serial port."),
            SessionEvent::StateChanged(state) => write!(f, "State: {}", state),
            SessionEvent::StepStarted {
                index,
                total,
                command,
            } => write!(f, "Step {}/{}: {}", index, total, command),
            SessionEvent::AcquisitionFinished => write!(f, "Acquisition finished"),
            SessionEvent::Error { kind, message } => write!(f, "{}: {}", kind, message),
        }
    }
}

/// Event dispatcher for publishing events to subscribers
#[derive(Clone)]
pub struct EventDispatcher {
    /// Broadcast sender channel for session events.
    tx: broadcast::Sender<SessionEvent>,
}

impl EventDispatcher {
    /// Create a new event dispatcher
    ///
    /// # Arguments
    /// * `buffer_size` - Size of the broadcast buffer (default 256)
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size);
        Self { tx }
    }

    /// Create a new event dispatcher with default buffer size
    pub fn default_with_buffer() -> Self {
        Self::new(256)
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all subscribers
    ///
    /// Returns the number of subscribers that received it. Publishing with
    /// nobody listening is not an error for the log stream.
    pub fn publish(&self, event: SessionEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::default_with_buffer()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
