//! Session state machine
//!
//! Replaces widget enable/disable bookkeeping with an explicit set of states,
//! each of which enables a known set of [`Capability`] values. Rendering
//! layers query [`SessionState::allows`] instead of toggling widgets by hand.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An action the user collaborator may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Enumerate serial ports
    ScanPorts,
    /// Choose one of the scanned ports
    SelectPort,
    /// Choose a baud rate
    SelectBaudRate,
    /// Open the selected port
    Connect,
    /// Close the open port
    Disconnect,
    /// Load (or reload) the objective table
    LoadObjectives,
    /// Choose an objective
    SelectObjective,
    /// Edit exposure, grid and step size
    EditScanParameters,
    /// Run the acquisition sequence
    Launch,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScanPorts => write!(f, "Scan ports"),
            Self::SelectPort => write!(f, "Select port"),
            Self::SelectBaudRate => write!(f, "Select baud rate"),
            Self::Connect => write!(f, "Connect"),
            Self::Disconnect => write!(f, "Disconnect"),
            Self::LoadObjectives => write!(f, "Load objectives"),
            Self::SelectObjective => write!(f, "Select objective"),
            Self::EditScanParameters => write!(f, "Edit scan parameters"),
            Self::Launch => write!(f, "Launch"),
        }
    }
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Nothing scanned, nothing open
    Disconnected,
    /// At least one port found, no connection
    PortsScanned,
    /// Port open, no objective table
    Connected,
    /// Port open and objective table loaded, nothing selected
    ObjectiveLoaded,
    /// Port open and objective selected; acquisition may be launched
    Ready,
}

impl SessionState {
    /// Capabilities enabled in this state
    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            SessionState::Disconnected => &[ScanPorts],
            SessionState::PortsScanned => &[ScanPorts, SelectPort, SelectBaudRate, Connect],
            SessionState::Connected => &[ScanPorts, Disconnect, LoadObjectives],
            SessionState::ObjectiveLoaded => &[
                ScanPorts,
                Disconnect,
                LoadObjectives,
                SelectObjective,
                EditScanParameters,
            ],
            SessionState::Ready => &[
                ScanPorts,
                Disconnect,
                LoadObjectives,
                SelectObjective,
                EditScanParameters,
                Launch,
            ],
        }
    }

    /// Whether `capability` is enabled in this state
    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Whether a port is open in this state
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            SessionState::Connected | SessionState::ObjectiveLoaded | SessionState::Ready
        )
    }

    /// Check if a transition from this state to `target` is valid.
    ///
    /// - Disconnected → PortsScanned once a scan finds ports
    /// - PortsScanned → Connected, or back to Disconnected when a rescan finds nothing
    /// - Connected → ObjectiveLoaded
    /// - ObjectiveLoaded ⇄ Ready as the selection is made or the table reloaded
    /// - Any connected state → PortsScanned on disconnect or protocol error
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        if *self == target {
            return true;
        }
        match (self, target) {
            (Disconnected, PortsScanned) => true,
            (PortsScanned, Connected | Disconnected) => true,
            (Connected, ObjectiveLoaded) => true,
            (ObjectiveLoaded, Ready) => true,
            (Ready, ObjectiveLoaded) => true,
            (Connected | ObjectiveLoaded | Ready, PortsScanned) => true,
            _ => false,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Disconnected
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::PortsScanned => write!(f, "Ports Scanned"),
            Self::Connected => write!(f, "Connected"),
            Self::ObjectiveLoaded => write!(f, "Objective Loaded"),
            Self::Ready => write!(f, "Ready"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_only_when_ready() {
        for state in [
            SessionState::Disconnected,
            SessionState::PortsScanned,
            SessionState::Connected,
            SessionState::ObjectiveLoaded,
        ] {
            assert!(!state.allows(Capability::Launch), "{state}");
        }
        assert!(SessionState::Ready.allows(Capability::Launch));
    }

    #[test]
    fn test_connect_disconnect_exclusive() {
        assert!(SessionState::PortsScanned.allows(Capability::Connect));
        assert!(!SessionState::PortsScanned.allows(Capability::Disconnect));
        assert!(SessionState::Connected.allows(Capability::Disconnect));
        assert!(!SessionState::Connected.allows(Capability::Connect));
    }

    #[test]
    fn test_forward_path() {
        use SessionState::*;
        let path = [Disconnected, PortsScanned, Connected, ObjectiveLoaded, Ready];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]));
        }
    }

    #[test]
    fn test_invalid_transitions() {
        use SessionState::*;
        assert!(!Disconnected.can_transition_to(Connected));
        assert!(!PortsScanned.can_transition_to(Ready));
        assert!(!Connected.can_transition_to(Ready));
        assert!(!Ready.can_transition_to(Disconnected));
    }

    #[test]
    fn test_disconnect_returns_to_ports_scanned() {
        use SessionState::*;
        for state in [Connected, ObjectiveLoaded, Ready] {
            assert!(state.is_connected());
            assert!(state.can_transition_to(PortsScanned));
        }
    }
}
