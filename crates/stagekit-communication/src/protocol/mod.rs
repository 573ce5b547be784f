//! Command/response protocol driver
//!
//! The controller answers every command with exactly one line. `:A` means
//! the command was accepted; anything else, including silence until the
//! read timeout, is treated as an unexpected reply. Only one command is ever
//! outstanding on a connection.

pub mod command;
pub mod poller;

pub use command::{ArgValue, Backlash, Command, ScanPattern, StageAxis, TtlMode};
pub use poller::{is_busy, BusyPoller, WaitOutcome};

use crate::communication::Connection;
use stagekit_core::{ConnectionError, Error, EventDispatcher, ProtocolError, Result, SessionEvent};

/// Acknowledgement reply
pub const ACK: &str = ":A";

/// Status query opcode
pub const STATUS_QUERY: &str = "/";

/// Token a status reply contains while the stage is busy
pub const BUSY_TOKEN: char = 'B';

/// Sends commands and classifies replies
///
/// Every line written and read is published on the event stream as
/// `CommandSent` / `ReplyReceived`.
#[derive(Debug, Clone, Default)]
pub struct ProtocolDriver {
    events: EventDispatcher,
}

impl ProtocolDriver {
    /// Create a driver publishing to `events`
    pub fn new(events: EventDispatcher) -> Self {
        Self { events }
    }

    /// Event stream this driver publishes to
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// Send a command and require the acknowledgement
    ///
    /// A read timeout counts as an empty, and therefore unexpected, reply.
    pub fn send_command(&self, connection: &mut Connection, command: &Command) -> Result<()> {
        let line = command.to_string();
        let reply = match self.query(connection, &line) {
            Ok(reply) => reply,
            Err(Error::Connection(ConnectionError::Timeout { timeout_ms })) => {
                tracing::warn!("No reply to '{}' within {}ms", line, timeout_ms);
                String::new()
            }
            Err(e) => return Err(e),
        };

        if reply != ACK {
            tracing::error!("Unexpected reply to '{}': '{}'", line, reply);
            return Err(ProtocolError::UnexpectedReply {
                command: line,
                reply,
            }
            .into());
        }

        Ok(())
    }

    /// Write one line and read one reply line without classifying it
    pub fn query(&self, connection: &mut Connection, line: &str) -> Result<String> {
        connection.write_line(line)?;
        tracing::debug!("> {}", line);
        self.events.publish(SessionEvent::CommandSent(line.to_string()));

        let reply = connection.read_line()?;
        tracing::debug!("< {}", reply);
        self.events.publish(SessionEvent::ReplyReceived(reply.clone()));

        Ok(reply)
    }
}
