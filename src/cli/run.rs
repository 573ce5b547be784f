//! `stagekit run`

use super::RunArgs;
use crate::session::Session;
use anyhow::Context;
use stagekit_communication::{
    AcquisitionPlan, Backlash, BusyPoller, CancelToken, SerialPortInfo, SimulatedLink,
};
use stagekit_core::{AcquisitionError, EventDispatcher, ObjectiveTable, SessionEvent};
use stagekit_settings::{load_objectives, Config};
use std::path::Path;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Port name the simulated controller is registered under
pub const SIMULATED_PORT: &str = "simulated";

/// Status polls the simulated controller reports busy after each command
const SIMULATED_BUSY_POLLS: usize = 2;

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = args.apply(load_config(args.config.as_deref())?);
    config.validate()?;

    let objectives_file = config
        .objectives_file
        .clone()
        .context("no objective table given (use --objectives or set objectives_file)")?;
    let table = load_objectives(&objectives_file)?;

    if args.dry_run {
        return print_plan(&config, &table, &args);
    }

    let events = EventDispatcher::default();
    let printer = spawn_printer(events.subscribe());
    let result = acquire(&config, table, &args, events).await;

    // The printer ends once every sender is gone
    if let Err(e) = printer.await {
        tracing::warn!("Log printer stopped abnormally: {}", e);
    }
    result
}

async fn acquire(
    config: &Config,
    table: ObjectiveTable,
    args: &RunArgs,
    events: EventDispatcher,
) -> anyhow::Result<()> {
    let mut session = Session::new(events)
        .with_poller(poller(config))
        .with_backlash(backlash(config))
        .with_timeout_ms(config.connection.timeout_ms);

    if args.simulate {
        session.scan_ports_from(vec![SerialPortInfo::new(
            SIMULATED_PORT,
            "Simulated stage controller",
        )])?;
        session.select_port(SIMULATED_PORT)?;
        session.select_baud_rate(config.connection.baud_rate)?;
        session.connect_with_link(Box::new(SimulatedLink::controller(SIMULATED_BUSY_POLLS)))?;
    } else {
        if config.connection.port.is_empty() {
            anyhow::bail!("no serial port given (use --port or set connection.port)");
        }
        session.scan_ports()?;
        session.select_port(&config.connection.port)?;
        session.select_baud_rate(config.connection.baud_rate)?;
        session.connect()?;
    }

    session.load_objectives(table)?;
    session.select_objective(args.objective)?;

    let cancel = CancelToken::new();
    let interrupt = cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current step");
            interrupt.cancel();
        }
    });

    let handle = session.spawn_launch(&args.scan_form(), cancel)?;
    let outcome = handle.await.context("acquisition worker failed")?;
    ctrl_c.abort();

    let result = session.complete_launch(outcome);
    if session.is_connected() {
        session.disconnect()?;
    }

    let report = result?;
    tracing::info!(
        "Acquisition complete: {} steps, {} status polls",
        report.steps,
        report.status_polls
    );
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => match Config::default_path() {
            Ok(path) => Config::load_or_default(&path)?,
            Err(e) => {
                tracing::debug!("{}; using default config", e);
                Config::default()
            }
        },
    };
    Ok(config)
}

fn poller(config: &Config) -> BusyPoller {
    BusyPoller::new()
        .with_poll_interval(Duration::from_millis(config.polling.poll_interval_ms))
        .with_max_wait(config.polling.max_wait_ms.map(Duration::from_millis))
}

fn backlash(config: &Config) -> Backlash {
    Backlash {
        x: config.acquisition.backlash_x,
        y: config.acquisition.backlash_y,
    }
}

fn print_plan(config: &Config, table: &ObjectiveTable, args: &RunArgs) -> anyhow::Result<()> {
    let request = args.scan_form().validate()?;
    let objective = table
        .get(args.objective)
        .ok_or(AcquisitionError::ObjectiveOutOfRange {
            index: args.objective,
            len: table.len(),
        })?;

    for line in AcquisitionPlan::build(&request, objective, backlash(config)).lines() {
        println!("{}", line);
    }
    Ok(())
}

fn spawn_printer(mut rx: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(SessionEvent::Error { kind, message }) => eprintln!("[{}] {}", kind, message),
                Ok(event) => println!("{}", event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Log stream dropped {} events", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
