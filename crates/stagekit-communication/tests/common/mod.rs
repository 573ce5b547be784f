#![allow(dead_code)]

use stagekit_communication::{Connection, ConnectionParams, SimulatedLink, Transcript};
use stagekit_core::{ObjectiveEntry, ScanRequest};

/// Reply timeout used by the tests; short so silent-device cases finish fast
pub const TEST_TIMEOUT_MS: u64 = 50;

pub fn params() -> ConnectionParams {
    ConnectionParams::new("/dev/ttySIM0", 115200).with_timeout_ms(TEST_TIMEOUT_MS)
}

pub fn connect(link: SimulatedLink) -> (Connection, Transcript) {
    let transcript = link.transcript();
    (Connection::with_link(&params(), Box::new(link)), transcript)
}

pub fn reference_request() -> ScanRequest {
    ScanRequest::new(0.5, 3, 2, 0.1, 0.2, Some(0)).unwrap()
}

pub fn reference_objective() -> ObjectiveEntry {
    ObjectiveEntry::new("10x", 1.0, 2.0)
}

pub const REFERENCE_SEQUENCE: [&str; 10] = [
    "TTL Y=0",
    "SN X=2 Y=1 F=0",
    "RT Z=0.5000",
    "B X=0.05 Y=0.05",
    "R X=1.0000 Y=2.0000",
    "Z",
    "AR X=3 Y=2 Z=0.1000 F=0.2000",
    "AH X=-0.1500 Y=-0.2000",
    "TTL Y=2",
    "AR",
];

/// Controller that acknowledges everything except the `fail_at`-th command
/// (1-based), which gets `reply` instead. Status queries report idle.
pub fn failing_controller(fail_at: usize, reply: Option<&'static str>) -> SimulatedLink {
    let mut seen = 0usize;
    SimulatedLink::new(move |line| {
        if line == "/" {
            return Some("N".to_string());
        }
        seen += 1;
        if seen == fail_at {
            reply.map(str::to_string)
        } else {
            Some(":A".to_string())
        }
    })
}
