//! Session events and state machine

pub mod event;
pub mod state;

pub use event::{EventDispatcher, SessionEvent};
pub use state::{Capability, SessionState};
