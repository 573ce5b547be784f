//! # StageKit Communication
//!
//! Serial transport, command/response protocol and acquisition sequencer
//! for ASI-style motorized microscope stages.
//!
//! Layering, leaves first:
//! - [`communication`]: byte links, line framing, port enumeration
//! - [`protocol`]: typed commands, acknowledgement checking, busy polling
//! - [`sequencer`]: the raster-scan acquisition sequence

pub mod cancel;
pub mod communication;
pub mod protocol;
pub mod sequencer;

pub use cancel::CancelToken;

pub use communication::{
    serial::{list_ports, RealSerialPort, SerialPortInfo},
    simulated::{SimulatedLink, Transcript},
    Connection, ConnectionParams, SerialLink, DEFAULT_READ_TIMEOUT_MS, SUPPORTED_BAUD_RATES,
};

pub use protocol::{
    is_busy, ArgValue, Backlash, BusyPoller, Command, ProtocolDriver, ScanPattern, StageAxis,
    TtlMode, WaitOutcome, ACK, STATUS_QUERY,
};

pub use sequencer::{
    spawn_acquisition, AcquisitionOutcome, AcquisitionPlan, AcquisitionReport, Sequencer,
};
