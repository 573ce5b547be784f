//! Line-oriented transport to the stage controller
//!
//! A [`Connection`] owns one byte-level [`SerialLink`] and layers the
//! controller's line framing on top of it: every written line is terminated
//! with `\r\n`, and reads block until a full line arrives or the read timeout
//! expires. Bytes received after a terminator are kept for the next read.

pub mod serial;
pub mod simulated;

use serde::{Deserialize, Serialize};
use stagekit_core::{ConnectionError, Result};
use std::io;
use std::time::{Duration, Instant};

/// Line terminator appended to every command
pub const LINE_TERMINATOR: &str = "\r\n";

/// Baud rates offered for the controller
pub const SUPPORTED_BAUD_RATES: [u32; 4] = [9600, 19200, 28800, 115200];

/// Default time to wait for a reply line
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Connection parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Port name (e.g. "/dev/ttyUSB0", "COM3")
    pub port: String,
    /// Baud rate, one of [`SUPPORTED_BAUD_RATES`]
    pub baud_rate: u32,
    /// Reply line timeout in milliseconds
    pub timeout_ms: u64,
}

impl ConnectionParams {
    /// Create parameters with the default read timeout
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }

    /// Set the reply line timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Read timeout as a duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Reject baud rates the controller does not offer
    pub fn validate(&self) -> std::result::Result<(), ConnectionError> {
        if !SUPPORTED_BAUD_RATES.contains(&self.baud_rate) {
            return Err(ConnectionError::UnsupportedBaudRate {
                baud: self.baud_rate,
            });
        }
        Ok(())
    }
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self::new("", 115200)
    }
}

/// Byte-level link to the controller
///
/// Implemented by the OS serial port and by [`simulated::SimulatedLink`].
/// `read` may return `Ok(0)` or an `io::ErrorKind::TimedOut` error when no
/// bytes are pending; [`Connection`] keeps polling until its own deadline.
pub trait SerialLink: Send {
    /// Write all bytes
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read whatever bytes are available
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Link name for logging
    fn name(&self) -> String;

    /// Release the underlying handle
    fn close(&mut self) -> io::Result<()>;
}

/// An open (or closed) connection to the controller
pub struct Connection {
    port: String,
    baud_rate: u32,
    read_timeout: Duration,
    link: Option<Box<dyn SerialLink>>,
    rx_buffer: Vec<u8>,
}

impl Connection {
    /// Open the OS serial port described by `params`
    pub fn open(params: &ConnectionParams) -> Result<Self> {
        params.validate()?;
        let port = serial::RealSerialPort::open(params)?;
        tracing::info!("Connected to {} at {}", params.port, params.baud_rate);
        Ok(Self::with_link(params, Box::new(port)))
    }

    /// Wrap an already-open link
    pub fn with_link(params: &ConnectionParams, link: Box<dyn SerialLink>) -> Self {
        tracing::debug!("Using {} link for {}", link.name(), params.port);
        Self {
            port: params.port.clone(),
            baud_rate: params.baud_rate,
            read_timeout: params.read_timeout(),
            link: Some(link),
            rx_buffer: Vec::new(),
        }
    }

    /// A connection that was never opened
    pub fn closed(params: &ConnectionParams) -> Self {
        Self {
            port: params.port.clone(),
            baud_rate: params.baud_rate,
            read_timeout: params.read_timeout(),
            link: None,
            rx_buffer: Vec::new(),
        }
    }

    /// Port name
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Baud rate
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Reply line timeout
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Whether the link is still held
    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    /// Release the link. Safe to call on a closed connection.
    pub fn close(&mut self) {
        if let Some(mut link) = self.link.take() {
            if let Err(e) = link.close() {
                tracing::warn!("Error closing {}: {}", self.port, e);
            }
            tracing::info!("Disconnected from {}", self.port);
        }
        self.rx_buffer.clear();
    }

    /// Write `text` followed by the line terminator
    pub fn write_line(&mut self, text: &str) -> Result<()> {
        let link = self.link.as_mut().ok_or(ConnectionError::NotOpen)?;
        let framed = format!("{}{}", text, LINE_TERMINATOR);
        link.write_all(framed.as_bytes())
            .map_err(|e| ConnectionError::IoWrite {
                reason: e.to_string(),
            })?;
        Ok(())
    }

    /// Read one line, blocking up to the read timeout
    ///
    /// The terminator and surrounding whitespace are stripped.
    pub fn read_line(&mut self) -> Result<String> {
        let deadline = Instant::now() + self.read_timeout;
        let mut chunk = [0u8; 256];

        loop {
            if let Some(pos) = self.rx_buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = self.rx_buffer.drain(..=pos).collect();
                return Ok(String::from_utf8_lossy(&line).trim().to_string());
            }

            if Instant::now() >= deadline {
                return Err(ConnectionError::Timeout {
                    timeout_ms: self.read_timeout.as_millis() as u64,
                }
                .into());
            }

            let link = self.link.as_mut().ok_or(ConnectionError::NotOpen)?;
            match link.read(&mut chunk) {
                Ok(0) => std::thread::sleep(Duration::from_millis(1)),
                Ok(n) => self.rx_buffer.extend_from_slice(&chunk[..n]),
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut
                            | io::ErrorKind::WouldBlock
                            | io::ErrorKind::Interrupted
                    ) => {}
                Err(e) => {
                    return Err(ConnectionError::IoRead {
                        reason: e.to_string(),
                    }
                    .into())
                }
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("port", &self.port)
            .field("baud_rate", &self.baud_rate)
            .field("open", &self.is_open())
            .finish()
    }
}
