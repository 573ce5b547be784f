//! Raster-scan acquisition sequencer
//!
//! Turns a validated [`ScanRequest`] and the selected objective into the
//! ten-command acquisition sequence and drives it through the protocol
//! driver, waiting for the stage to go idle after every command.
//!
//! The first failure aborts the whole sequence. Transport and protocol
//! failures also close the connection: the device state is unknown after a
//! bad reply, so the only recovery is to reconnect and start again from the
//! first step.

pub mod task;

pub use task::{spawn_acquisition, AcquisitionOutcome};

use crate::cancel::CancelToken;
use crate::communication::Connection;
use crate::protocol::{
    Backlash, BusyPoller, Command, ProtocolDriver, ScanPattern, StageAxis, TtlMode, WaitOutcome,
};
use stagekit_core::{
    AcquisitionError, EventDispatcher, ObjectiveEntry, Result, ScanRequest, SessionEvent,
};

/// The ordered commands for one acquisition
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionPlan {
    commands: Vec<Command>,
}

impl AcquisitionPlan {
    /// Build the sequence for `request` using `objective`'s offset
    pub fn build(request: &ScanRequest, objective: &ObjectiveEntry, backlash: Backlash) -> Self {
        let commands = vec![
            Command::ttl(TtlMode::Disabled),
            Command::scan_pattern(StageAxis::Y, StageAxis::X, ScanPattern::Raster),
            Command::scan_time(request.exposure),
            Command::backlash(backlash),
            Command::relative_move(objective.dx, objective.dy),
            Command::zero(),
            Command::scan_range(request.nx, request.ny, request.rx, request.ry),
            Command::home_offset(request.x_offset(), request.y_offset()),
            Command::ttl(TtlMode::ScanTrigger),
            Command::start_scan(),
        ];
        Self { commands }
    }

    /// Commands in send order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Command lines in send order
    pub fn lines(&self) -> Vec<String> {
        self.commands.iter().map(|c| c.to_string()).collect()
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the plan has no steps
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Summary of a completed acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionReport {
    /// Commands acknowledged
    pub steps: usize,
    /// Status queries sent across all busy waits
    pub status_polls: usize,
}

/// Drives an [`AcquisitionPlan`] over a connection
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    driver: ProtocolDriver,
    poller: BusyPoller,
    backlash: Backlash,
}

impl Sequencer {
    /// Create a sequencer publishing to `events`
    pub fn new(events: EventDispatcher) -> Self {
        Self {
            driver: ProtocolDriver::new(events),
            poller: BusyPoller::default(),
            backlash: Backlash::default(),
        }
    }

    /// Use a configured busy poller
    pub fn with_poller(mut self, poller: BusyPoller) -> Self {
        self.poller = poller;
        self
    }

    /// Use non-default backlash compensation
    pub fn with_backlash(mut self, backlash: Backlash) -> Self {
        self.backlash = backlash;
        self
    }

    /// Busy poller in use
    pub fn poller(&self) -> &BusyPoller {
        &self.poller
    }

    /// Backlash written in step 4
    pub fn backlash(&self) -> Backlash {
        self.backlash
    }

    /// Build the plan this sequencer would run
    pub fn plan(&self, request: &ScanRequest, objective: &ObjectiveEntry) -> AcquisitionPlan {
        AcquisitionPlan::build(request, objective, self.backlash)
    }

    /// Run the full acquisition sequence
    ///
    /// Preconditions are checked before anything is written: the connection
    /// must be open and an objective must be given. On any transport or
    /// protocol failure the connection is closed before the error is
    /// returned.
    pub fn run_acquisition(
        &self,
        connection: &mut Connection,
        request: &ScanRequest,
        objective: Option<&ObjectiveEntry>,
        cancel: &CancelToken,
    ) -> Result<AcquisitionReport> {
        if !connection.is_open() {
            return Err(AcquisitionError::NotConnected.into());
        }
        let objective = objective.ok_or(AcquisitionError::NoObjectiveSelected)?;

        let plan = self.plan(request, objective);
        tracing::info!(
            "Starting acquisition on {}: {}x{} grid, objective '{}'",
            connection.port(),
            request.nx,
            request.ny,
            objective.label
        );

        match self.execute(connection, &plan, cancel) {
            Ok(report) => {
                tracing::info!(
                    "Acquisition finished: {} steps, {} status polls",
                    report.steps,
                    report.status_polls
                );
                self.driver.events().publish(SessionEvent::AcquisitionFinished);
                Ok(report)
            }
            Err(e) => {
                if e.requires_disconnect() {
                    tracing::error!("Aborting acquisition and disconnecting: {}", e);
                    connection.close();
                    self.driver.events().publish(SessionEvent::Disconnected);
                } else {
                    tracing::warn!("Acquisition stopped: {}", e);
                }
                Err(e)
            }
        }
    }

    fn execute(
        &self,
        connection: &mut Connection,
        plan: &AcquisitionPlan,
        cancel: &CancelToken,
    ) -> Result<AcquisitionReport> {
        let total = plan.len();
        let mut status_polls = 0usize;

        for (index, command) in plan.commands().iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(AcquisitionError::Cancelled {
                    completed_steps: index,
                }
                .into());
            }

            self.driver.events().publish(SessionEvent::StepStarted {
                index: index + 1,
                total,
                command: command.to_string(),
            });
            self.driver.send_command(connection, command)?;

            match self.poller.wait_until_idle(&self.driver, connection, cancel)? {
                WaitOutcome::Idle { polls } => status_polls += polls,
                WaitOutcome::Cancelled => {
                    return Err(AcquisitionError::Cancelled {
                        completed_steps: index + 1,
                    }
                    .into())
                }
            }
        }

        Ok(AcquisitionReport {
            steps: total,
            status_polls,
        })
    }
}
