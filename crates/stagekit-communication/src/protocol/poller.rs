//! Busy-state polling
//!
//! After each motion command the stage is polled with the status query until
//! a reply without the busy token arrives. The reply is only tested for the
//! busy token; it is never checked against the acknowledgement.

use super::{ProtocolDriver, BUSY_TOKEN, STATUS_QUERY};
use crate::cancel::CancelToken;
use crate::communication::Connection;
use stagekit_core::{ProtocolError, Result};
use std::time::{Duration, Instant};

/// Whether a status reply reports the stage as busy
pub fn is_busy(reply: &str) -> bool {
    reply.contains(BUSY_TOKEN)
}

/// How a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// An idle reply was seen after `polls` status queries
    Idle {
        /// Number of status queries sent, including the idle one.
        polls: usize,
    },
    /// The cancel token was set before an idle reply was seen
    Cancelled,
}

/// Blocking gate that returns once the stage reports idle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BusyPoller {
    /// Delay between consecutive status queries
    pub poll_interval: Duration,
    /// Give up with `BusyWaitExceeded` after this long; `None` waits forever
    pub max_wait: Option<Duration>,
}

impl BusyPoller {
    /// Poll back-to-back with no time limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delay between status queries
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the maximum time to wait for idle
    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Send status queries until a reply without the busy token arrives
    ///
    /// Returns on the first idle reply. Transport failures propagate,
    /// including a status reply that does not arrive within the read timeout:
    /// a silent controller is reported as `Timeout`, never taken as idle.
    pub fn wait_until_idle(
        &self,
        driver: &ProtocolDriver,
        connection: &mut Connection,
        cancel: &CancelToken,
    ) -> Result<WaitOutcome> {
        let started = Instant::now();
        let mut polls = 0usize;

        loop {
            if cancel.is_cancelled() {
                tracing::info!("Busy wait cancelled after {} polls", polls);
                return Ok(WaitOutcome::Cancelled);
            }

            let reply = driver.query(connection, STATUS_QUERY)?;
            polls += 1;

            if !is_busy(&reply) {
                tracing::trace!("Stage idle after {} polls", polls);
                return Ok(WaitOutcome::Idle { polls });
            }

            if let Some(max_wait) = self.max_wait {
                let waited = started.elapsed();
                if waited >= max_wait {
                    tracing::error!("Stage still busy after {:?}", waited);
                    return Err(ProtocolError::BusyWaitExceeded {
                        waited_ms: waited.as_millis() as u64,
                    }
                    .into());
                }
            }

            if !self.poll_interval.is_zero() {
                std::thread::sleep(self.poll_interval);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_substring() {
        assert!(is_busy("B"));
        assert!(is_busy(":A B"));
        assert!(!is_busy("N"));
        assert!(!is_busy(":A"));
        assert!(!is_busy(""));
    }

    #[test]
    fn test_builder() {
        let poller = BusyPoller::new()
            .with_poll_interval(Duration::from_millis(5))
            .with_max_wait(Some(Duration::from_secs(30)));
        assert_eq!(poller.poll_interval, Duration::from_millis(5));
        assert_eq!(poller.max_wait, Some(Duration::from_secs(30)));
        assert_eq!(BusyPoller::new().max_wait, None);
    }
}
