//! In-process controller link
//!
//! [`SimulatedLink`] implements [`SerialLink`] without hardware. Each complete
//! line written to it is recorded in a shared [`Transcript`] and handed to a
//! responder closure whose answer (if any) is queued as the reply line.
//! Used by `stagekit run --simulate` and by the integration tests.

use crate::communication::SerialLink;
use crate::protocol::{ACK, STATUS_QUERY};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

/// Computes the reply to one received line; `None` sends nothing
pub type Responder = Box<dyn FnMut(&str) -> Option<String> + Send>;

/// Shared record of every line the link received, terminator stripped
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Transcript {
    /// All lines received so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Received lines excluding status queries
    pub fn commands(&self) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|line| line.as_str() != STATUS_QUERY)
            .cloned()
            .collect()
    }

    /// Number of status queries received
    pub fn status_queries(&self) -> usize {
        self.lines
            .lock()
            .iter()
            .filter(|line| line.as_str() == STATUS_QUERY)
            .count()
    }

    /// Whether nothing has been received
    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    fn len(&self) -> usize {
        self.lines.lock().len()
    }

    fn push(&self, line: String) {
        self.lines.lock().push(line);
    }
}

/// Simulated stage controller link
pub struct SimulatedLink {
    responder: Responder,
    transcript: Transcript,
    inbound: Vec<u8>,
    outbound: VecDeque<u8>,
    write_limit: Option<usize>,
    read_limit: Option<usize>,
}

impl SimulatedLink {
    /// Create a link answering through `responder`
    pub fn new(responder: impl FnMut(&str) -> Option<String> + Send + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            transcript: Transcript::default(),
            inbound: Vec::new(),
            outbound: VecDeque::new(),
            write_limit: None,
            read_limit: None,
        }
    }

    /// Emulate a controller that acknowledges every command
    ///
    /// After each command the status query reports busy (`B`) `busy_polls`
    /// times before reporting idle (`N`).
    pub fn controller(busy_polls: usize) -> Self {
        let mut busy_remaining = 0usize;
        Self::new(move |line| {
            if line == STATUS_QUERY {
                if busy_remaining > 0 {
                    busy_remaining -= 1;
                    Some("B".to_string())
                } else {
                    Some("N".to_string())
                }
            } else {
                busy_remaining = busy_polls;
                Some(ACK.to_string())
            }
        })
    }

    /// Answer each received line with the next scripted reply
    ///
    /// Once the script runs out nothing more is sent, so reads time out.
    pub fn scripted<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut replies: VecDeque<String> = replies.into_iter().map(Into::into).collect();
        Self::new(move |_| replies.pop_front())
    }

    /// Fail every write with a broken pipe once `lines` lines were received
    ///
    /// Status queries count towards `lines`.
    pub fn fail_writes_after(mut self, lines: usize) -> Self {
        self.write_limit = Some(lines);
        self
    }

    /// Fail every read with a broken pipe once `lines` lines were received
    pub fn fail_reads_after(mut self, lines: usize) -> Self {
        self.read_limit = Some(lines);
        self
    }

    /// Handle to the record of received lines
    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }

    /// Queue raw bytes as if the controller had sent them unprompted
    pub fn inject(&mut self, bytes: &[u8]) {
        self.outbound.extend(bytes);
    }

    fn take_line(&mut self) -> Option<String> {
        let pos = self.inbound.iter().position(|b| *b == b'\n')?;
        let raw: Vec<u8> = self.inbound.drain(..=pos).collect();
        Some(
            String::from_utf8_lossy(&raw)
                .trim_end_matches(['\r', '\n'])
                .to_string(),
        )
    }
}

impl SerialLink for SimulatedLink {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if self.write_limit.is_some_and(|n| self.transcript.len() >= n) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device removed"));
        }
        self.inbound.extend_from_slice(data);
        while let Some(line) = self.take_line() {
            tracing::trace!("simulated link received '{}'", line);
            self.transcript.push(line.clone());
            if let Some(reply) = (self.responder)(&line) {
                self.outbound.extend(reply.as_bytes());
                self.outbound.extend(b"\r\n");
            }
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.read_limit.is_some_and(|n| self.transcript.len() >= n) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device removed"));
        }
        let n = buf.len().min(self.outbound.len());
        for (slot, byte) in buf.iter_mut().zip(self.outbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn name(&self) -> String {
        "simulated".to_string()
    }

    fn close(&mut self) -> io::Result<()> {
        self.outbound.clear();
        Ok(())
    }
}
