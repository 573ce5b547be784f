//! Background acquisition
//!
//! The busy wait blocks its thread for as long as the stage is moving, so
//! interactive callers run the sequencer on tokio's blocking pool. The
//! connection is moved into the worker for the whole run and handed back in
//! the [`AcquisitionOutcome`].

use super::{AcquisitionReport, Sequencer};
use crate::cancel::CancelToken;
use crate::communication::Connection;
use stagekit_core::{ObjectiveEntry, Result, ScanRequest};
use tokio::task::JoinHandle;

/// Result of a background run plus the connection it used
#[derive(Debug)]
pub struct AcquisitionOutcome {
    /// The connection, closed if the run hit a protocol error
    pub connection: Connection,
    /// Run result
    pub result: Result<AcquisitionReport>,
}

/// Run `sequencer` on the blocking pool
pub fn spawn_acquisition(
    sequencer: Sequencer,
    mut connection: Connection,
    request: ScanRequest,
    objective: Option<ObjectiveEntry>,
    cancel: CancelToken,
) -> JoinHandle<AcquisitionOutcome> {
    tokio::task::spawn_blocking(move || {
        let result =
            sequencer.run_acquisition(&mut connection, &request, objective.as_ref(), &cancel);
        AcquisitionOutcome { connection, result }
    })
}
