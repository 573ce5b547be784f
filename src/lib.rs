//! # StageKit
//!
//! Serial control of ASI-style motorized microscope stages with support for:
//! - Port discovery and 8N1 serial connections at the controller's baud rates
//! - A typed command/acknowledge protocol with busy-state polling
//! - A ten-step raster-scan acquisition sequence
//! - Objective offset tables loaded from JSON or TOML
//!
//! ## Architecture
//!
//! StageKit is organized as a workspace with multiple crates:
//!
//! 1. **stagekit-core** - Errors, events, session state, objective and scan data
//! 2. **stagekit-communication** - Serial links, protocol driver, sequencer
//! 3. **stagekit-settings** - Configuration and objective table files
//! 4. **stagekit** - Session state machine and the command line binary

pub mod cli;
pub mod session;

pub use session::Session;

pub use stagekit_core::{
    AcquisitionError, Capability, ConnectionError, Error, ErrorKind, EventDispatcher,
    ObjectiveEntry, ObjectiveError, ObjectiveTable, ProtocolError, Result, ScanForm, ScanRequest,
    SessionError, SessionEvent, SessionState,
};

pub use stagekit_communication::{
    list_ports, spawn_acquisition, AcquisitionOutcome, AcquisitionPlan, AcquisitionReport,
    Backlash, BusyPoller, CancelToken, Command, Connection, ConnectionParams, ProtocolDriver,
    Sequencer, SerialLink, SerialPortInfo, SimulatedLink, Transcript, SUPPORTED_BAUD_RATES,
};

pub use stagekit_settings::{load_objectives, Config, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Output on stderr, leaving stdout to the session log
/// - RUST_LOG environment variable support, `info` when unset
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
