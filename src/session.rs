//! Interactive session
//!
//! [`Session`] owns the connection, the objective table and the current
//! [`SessionState`], and gates every user operation on the capabilities of
//! that state. Every transition and every surfaced error is published on
//! the session's event stream.
//!
//! After an acquisition whose failure closed the port, the session drops
//! back to `PortsScanned` and discards the objective table, so a stale
//! connection is never reused. While a background acquisition holds the
//! connection, every gated operation is refused until
//! [`Session::complete_launch`] hands it back.

use stagekit_communication::{
    list_ports, spawn_acquisition, AcquisitionOutcome, AcquisitionReport, Backlash, BusyPoller,
    CancelToken, Connection, ConnectionParams, SerialLink, SerialPortInfo, Sequencer,
};
use stagekit_core::{
    AcquisitionError, Capability, EventDispatcher, ObjectiveEntry, ObjectiveError, ObjectiveTable,
    Result, ScanForm, ScanRequest, SessionError, SessionEvent, SessionState,
};
use tokio::task::JoinHandle;

/// A single user's control session over one stage controller
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    events: EventDispatcher,
    sequencer: Sequencer,
    params: ConnectionParams,
    ports: Vec<SerialPortInfo>,
    connection: Option<Connection>,
    objectives: Option<ObjectiveTable>,
    selected: Option<usize>,
    acquiring: bool,
}

impl Session {
    /// Create a disconnected session publishing to `events`
    pub fn new(events: EventDispatcher) -> Self {
        Self {
            state: SessionState::Disconnected,
            sequencer: Sequencer::new(events.clone()),
            events,
            params: ConnectionParams::default(),
            ports: Vec::new(),
            connection: None,
            objectives: None,
            selected: None,
            acquiring: false,
        }
    }

    /// Use a configured busy poller for acquisitions
    pub fn with_poller(mut self, poller: BusyPoller) -> Self {
        self.sequencer = self.sequencer.with_poller(poller);
        self
    }

    /// Use non-default backlash compensation for acquisitions
    pub fn with_backlash(mut self, backlash: Backlash) -> Self {
        self.sequencer = self.sequencer.with_backlash(backlash);
        self
    }

    /// Set the reply timeout used by the next connection
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.params.timeout_ms = timeout_ms;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Event stream shared with the sequencer
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// Ports found by the last scan
    pub fn ports(&self) -> &[SerialPortInfo] {
        &self.ports
    }

    /// Port and baud rate the next `connect` will use
    pub fn connection_params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Loaded objective table, if any
    pub fn objectives(&self) -> Option<&ObjectiveTable> {
        self.objectives.as_ref()
    }

    /// Currently selected objective entry
    pub fn selected_objective(&self) -> Option<&ObjectiveEntry> {
        self.objectives.as_ref()?.get(self.selected?)
    }

    /// Whether the session holds an open connection
    pub fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(Connection::is_open)
    }

    /// Enumerate serial ports
    pub fn scan_ports(&mut self) -> Result<&[SerialPortInfo]> {
        let result = self.require(Capability::ScanPorts).and_then(|_| list_ports());
        let ports = self.report(result)?;
        self.register_ports(ports);
        Ok(&self.ports)
    }

    /// Whether a background acquisition currently holds the connection
    pub fn is_acquiring(&self) -> bool {
        self.acquiring
    }

    /// Accept ports found by an enumerator other than the OS, such as the
    /// in-process simulated controller
    pub fn scan_ports_from(&mut self, ports: Vec<SerialPortInfo>) -> Result<&[SerialPortInfo]> {
        let result = self.require(Capability::ScanPorts);
        self.report(result)?;
        self.register_ports(ports);
        Ok(&self.ports)
    }

    /// While connected the list is refreshed without a state change.
    /// Otherwise the session moves to `PortsScanned`, or back to
    /// `Disconnected` when nothing was found.
    fn register_ports(&mut self, ports: Vec<SerialPortInfo>) {
        tracing::info!("Found {} serial ports", ports.len());
        self.ports = ports;
        if !self.state.is_connected() {
            if self.ports.is_empty() {
                self.transition(SessionState::Disconnected);
            } else {
                self.transition(SessionState::PortsScanned);
            }
        }
    }

    /// Choose the port to connect to; it must be in the last scan
    pub fn select_port(&mut self, port: &str) -> Result<()> {
        let result = self.require(Capability::SelectPort).and_then(|_| {
            if self.ports.iter().any(|p| p.port_name == port) {
                Ok(())
            } else {
                Err(SessionError::PortNotScanned {
                    port: port.to_string(),
                }
                .into())
            }
        });
        self.report(result)?;
        self.params.port = port.to_string();
        Ok(())
    }

    /// Choose the baud rate for the next connection
    pub fn select_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        let candidate = ConnectionParams {
            baud_rate,
            ..self.params.clone()
        };
        let result = self
            .require(Capability::SelectBaudRate)
            .and_then(|_| Ok(candidate.validate()?));
        self.report(result)?;
        self.params = candidate;
        Ok(())
    }

    /// Open the selected port
    pub fn connect(&mut self) -> Result<()> {
        let result = self
            .require(Capability::Connect)
            .and_then(|_| Connection::open(&self.params));
        let connection = self.report(result)?;
        self.attach(connection);
        Ok(())
    }

    /// Connect over an already-open link instead of the OS port
    pub fn connect_with_link(&mut self, link: Box<dyn SerialLink>) -> Result<()> {
        let result = self
            .require(Capability::Connect)
            .and_then(|_| Ok(self.params.validate()?));
        self.report(result)?;
        let connection = Connection::with_link(&self.params, link);
        self.attach(connection);
        Ok(())
    }

    /// Close the port and discard the objective table
    pub fn disconnect(&mut self) -> Result<()> {
        let result = self.require(Capability::Disconnect);
        self.report(result)?;
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
        self.events.publish(SessionEvent::Disconnected);
        self.reset_to_scanned();
        Ok(())
    }

    /// Replace the objective table; clears the selection
    pub fn load_objectives(&mut self, table: ObjectiveTable) -> Result<()> {
        let result = self.require(Capability::LoadObjectives).and_then(|_| {
            if table.is_empty() {
                Err(ObjectiveError::EmptyTable.into())
            } else {
                Ok(())
            }
        });
        self.report(result)?;
        tracing::info!("Objective table loaded: {}", table.labels().join(", "));
        self.objectives = Some(table);
        self.selected = None;
        self.transition(SessionState::ObjectiveLoaded);
        Ok(())
    }

    /// Select an objective by index
    pub fn select_objective(&mut self, index: usize) -> Result<()> {
        let result = self
            .require(Capability::SelectObjective)
            .and_then(|_| self.objective_at(index).map(|_| ()));
        self.report(result)?;
        self.selected = Some(index);
        self.transition(SessionState::Ready);
        Ok(())
    }

    /// Run an acquisition on the calling thread
    ///
    /// Not gated on [`Capability::Launch`]: a launch attempt in the wrong
    /// state reports `NotConnected` or `NoObjectiveSelected` instead.
    pub fn launch(&mut self, form: &ScanForm, cancel: &CancelToken) -> Result<AcquisitionReport> {
        let prepared = self.prepare_launch(form);
        let (request, objective) = self.report(prepared)?;

        let result = match self.connection.as_mut() {
            Some(connection) => {
                self.sequencer
                    .run_acquisition(connection, &request, Some(&objective), cancel)
            }
            None => Err(AcquisitionError::NotConnected.into()),
        };
        self.settle_after_run();
        self.report(result)
    }

    /// Run an acquisition on the blocking pool
    ///
    /// The connection moves into the worker; hand the outcome back with
    /// [`Session::complete_launch`].
    pub fn spawn_launch(
        &mut self,
        form: &ScanForm,
        cancel: CancelToken,
    ) -> Result<JoinHandle<AcquisitionOutcome>> {
        let prepared = self.prepare_launch(form);
        let (request, objective) = self.report(prepared)?;
        let connection = self
            .connection
            .take()
            .ok_or(AcquisitionError::NotConnected)?;
        self.acquiring = true;

        Ok(spawn_acquisition(
            self.sequencer.clone(),
            connection,
            request,
            Some(objective),
            cancel,
        ))
    }

    /// Take back the connection from a background run
    ///
    /// A connection returned to a session that is no longer connected is
    /// closed rather than kept.
    pub fn complete_launch(&mut self, outcome: AcquisitionOutcome) -> Result<AcquisitionReport> {
        self.acquiring = false;
        let mut connection = outcome.connection;
        if self.state.is_connected() {
            self.connection = Some(connection);
        } else {
            tracing::warn!("Closing connection returned to a disconnected session");
            connection.close();
        }
        self.settle_after_run();
        self.report(outcome.result)
    }

    fn prepare_launch(&self, form: &ScanForm) -> Result<(ScanRequest, ObjectiveEntry)> {
        if !self.is_connected() {
            return Err(AcquisitionError::NotConnected.into());
        }
        let index = form
            .objective
            .or(self.selected)
            .ok_or(AcquisitionError::NoObjectiveSelected)?;
        let objective = self.objective_at(index)?.clone();
        let request = form.validate()?;
        Ok((request, objective))
    }

    fn objective_at(&self, index: usize) -> Result<&ObjectiveEntry> {
        let table = self
            .objectives
            .as_ref()
            .ok_or(AcquisitionError::NoObjectiveSelected)?;
        table.get(index).ok_or_else(|| {
            AcquisitionError::ObjectiveOutOfRange {
                index,
                len: table.len(),
            }
            .into()
        })
    }

    fn attach(&mut self, connection: Connection) {
        self.events.publish(SessionEvent::Connected {
            port: connection.port().to_string(),
            baud_rate: connection.baud_rate(),
        });
        self.connection = Some(connection);
        self.transition(SessionState::Connected);
    }

    /// Drop back to `PortsScanned` if the run closed the port
    fn settle_after_run(&mut self) {
        if !self.is_connected() && self.state.is_connected() {
            tracing::warn!("Connection lost during acquisition");
            self.connection = None;
            self.reset_to_scanned();
        }
    }

    fn reset_to_scanned(&mut self) {
        self.objectives = None;
        self.selected = None;
        self.transition(SessionState::PortsScanned);
    }

    fn require(&self, capability: Capability) -> Result<()> {
        if self.acquiring {
            return Err(SessionError::CapabilityUnavailable {
                capability: capability.to_string(),
                state: format!("{} (acquisition running)", self.state),
            }
            .into());
        }
        if self.state.allows(capability) {
            Ok(())
        } else {
            Err(SessionError::CapabilityUnavailable {
                capability: capability.to_string(),
                state: self.state.to_string(),
            }
            .into())
        }
    }

    fn transition(&mut self, target: SessionState) {
        if self.state == target {
            return;
        }
        if !self.state.can_transition_to(target) {
            tracing::warn!("Ignoring invalid transition {} -> {}", self.state, target);
            return;
        }
        tracing::debug!("Session {} -> {}", self.state, target);
        self.state = target;
        self.events.publish(SessionEvent::StateChanged(target));
    }

    /// Publish an error event for a failed operation
    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.events.publish(SessionEvent::Error {
                kind: e.kind(),
                message: e.to_string(),
            });
        }
        result
    }
}
