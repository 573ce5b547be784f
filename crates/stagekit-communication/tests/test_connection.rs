mod common;

use stagekit_communication::{Connection, ConnectionParams, SimulatedLink};
use stagekit_core::{ConnectionError, Error};
use std::time::{Duration, Instant};

#[test]
fn test_write_line_appends_terminator() {
    let (mut conn, transcript) = common::connect(SimulatedLink::scripted([":A"]));
    conn.write_line("Z").unwrap();
    assert_eq!(transcript.lines(), vec!["Z".to_string()]);
    assert_eq!(conn.read_line().unwrap(), ":A");
}

#[test]
fn test_read_line_strips_terminator_and_keeps_remainder() {
    let mut link = SimulatedLink::scripted(Vec::<String>::new());
    link.inject(b":A\r\nN\r\npartial");
    let (mut conn, _) = common::connect(link);

    assert_eq!(conn.read_line().unwrap(), ":A");
    assert_eq!(conn.read_line().unwrap(), "N");
    assert!(conn.read_line().unwrap_err().is_timeout());
}

#[test]
fn test_read_line_times_out() {
    let (mut conn, _) = common::connect(SimulatedLink::scripted(Vec::<String>::new()));
    let started = Instant::now();
    let err = conn.read_line().unwrap_err();

    assert!(matches!(
        err,
        Error::Connection(ConnectionError::Timeout { timeout_ms: 50 })
    ));
    assert!(started.elapsed() >= Duration::from_millis(common::TEST_TIMEOUT_MS));
}

#[test]
fn test_close_is_idempotent() {
    let (mut conn, _) = common::connect(SimulatedLink::controller(0));
    assert!(conn.is_open());
    conn.close();
    assert!(!conn.is_open());
    conn.close();
    assert!(!conn.is_open());
}

#[test]
fn test_closed_connection_rejects_io() {
    let mut conn = Connection::closed(&common::params());
    assert!(matches!(
        conn.write_line("Z"),
        Err(Error::Connection(ConnectionError::NotOpen))
    ));
    assert!(matches!(
        conn.read_line(),
        Err(Error::Connection(ConnectionError::NotOpen))
    ));
}

#[test]
fn test_unsupported_baud_rate_rejected_before_open() {
    let params = ConnectionParams::new("/dev/does-not-exist", 57600);
    let err = Connection::open(&params).unwrap_err();
    assert!(matches!(
        err,
        Error::Connection(ConnectionError::UnsupportedBaudRate { baud: 57600 })
    ));
}

#[test]
fn test_missing_port_is_unavailable() {
    let params = ConnectionParams::new("/dev/stagekit-no-such-port", 9600);
    let err = Connection::open(&params).unwrap_err();
    assert!(matches!(
        err,
        Error::Connection(ConnectionError::PortUnavailable { .. })
    ));
}
