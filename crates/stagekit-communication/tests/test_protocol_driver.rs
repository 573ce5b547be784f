mod common;

use stagekit_communication::{Command, ProtocolDriver, SimulatedLink};
use stagekit_core::{Error, EventDispatcher, ProtocolError, SessionEvent};

#[test]
fn test_ack_accepted() {
    let (mut conn, transcript) = common::connect(SimulatedLink::scripted([":A"]));
    let driver = ProtocolDriver::default();

    driver.send_command(&mut conn, &Command::zero()).unwrap();
    assert_eq!(transcript.lines(), vec!["Z".to_string()]);
}

#[test]
fn test_error_reply_is_unexpected() {
    let (mut conn, _) = common::connect(SimulatedLink::scripted([":N-1"]));
    let driver = ProtocolDriver::default();

    let err = driver
        .send_command(&mut conn, &Command::scan_time(0.5))
        .unwrap_err();
    match err {
        Error::Protocol(ProtocolError::UnexpectedReply { command, reply }) => {
            assert_eq!(command, "RT Z=0.5000");
            assert_eq!(reply, ":N-1");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_ack_compared_verbatim() {
    let (mut conn, _) = common::connect(SimulatedLink::scripted([":A extra"]));
    let driver = ProtocolDriver::default();
    assert!(driver.send_command(&mut conn, &Command::zero()).is_err());
}

#[test]
fn test_timeout_is_empty_unexpected_reply() {
    let (mut conn, _) = common::connect(SimulatedLink::scripted(Vec::<String>::new()));
    let driver = ProtocolDriver::default();

    let err = driver.send_command(&mut conn, &Command::zero()).unwrap_err();
    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::UnexpectedReply { ref reply, .. }) if reply.is_empty()
    ));
}

#[test]
fn test_exchange_is_logged() {
    let events = EventDispatcher::default();
    let mut rx = events.subscribe();
    let (mut conn, _) = common::connect(SimulatedLink::scripted([":A"]));

    ProtocolDriver::new(events)
        .send_command(&mut conn, &Command::ttl(stagekit_communication::TtlMode::Disabled))
        .unwrap();

    let sent = rx.try_recv().unwrap();
    let received = rx.try_recv().unwrap();
    assert_eq!(sent.to_string(), "> TTL Y=0");
    assert_eq!(received, SessionEvent::ReplyReceived(":A".to_string()));
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_query_returns_raw_reply() {
    let (mut conn, _) = common::connect(SimulatedLink::scripted(["B"]));
    let reply = ProtocolDriver::default().query(&mut conn, "/").unwrap();
    assert_eq!(reply, "B");
}
