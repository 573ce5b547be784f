//! Port enumeration against whatever the host exposes

use stagekit_communication::{list_ports, SerialPortInfo};
use stagekit_core::{ConnectionError, Error};

#[test]
fn test_listing_is_sorted_and_named() {
    match list_ports() {
        Ok(ports) => {
            assert!(ports.iter().all(|p| !p.port_name.is_empty()));
            let names: Vec<&str> = ports.iter().map(|p| p.port_name.as_str()).collect();
            let mut sorted = names.clone();
            sorted.sort();
            assert_eq!(names, sorted);
        }
        // Hosts without a device database report enumeration failure
        Err(e) => assert!(matches!(
            e,
            Error::Connection(ConnectionError::EnumerationFailed { .. })
        )),
    }
}

#[test]
fn test_port_info_display() {
    let info = SerialPortInfo::new("/dev/ttyUSB0", "MS-2000 Controller")
        .with_usb_ids(0x10c4, 0xea60)
        .with_manufacturer("Silicon Labs");
    let shown = info.to_string();
    assert!(shown.contains("/dev/ttyUSB0"));
    assert_eq!(shown, "/dev/ttyUSB0 (MS-2000 Controller) [10c4:ea60]");
}
