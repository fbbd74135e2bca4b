mod common;
use std::{sync::Arc, thread};

use common::*;
use dl_scan::{
    config::{CommandFormat, LineProfile},
    scanner::{LineSettings, NoScanReason, Platform},
    ScanError, ScanOutcome, Scanner, ScannerConfig, NAK,
};

fn scanner(config: ScannerConfig, backend: MockSerial) -> Scanner<MockSerial> {
    Scanner::with_backend(config, backend)
        .with_platform(Platform::Linux)
        .with_context(CONTEXT)
}

#[test]
fn scan_aamva_payload() {
    let payload = load_payload("tests/payloads/aamva_full.txt");
    let backend = MockSerial::new(&[]).reply(Reply::Payload(payload));
    let scanner = scanner(fast_config(), backend.clone());

    let outcome = scanner.scan();
    assert_eq!(outcome.http_status(), 200);

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["licenseData"]["lastName"], "SMITH");
    assert_eq!(json["licenseData"]["dob"], "1988-04-19");

    assert_eq!(backend.sent(), vec![b"\x01<TXPING>\x04".to_vec()]);
    assert_eq!(backend.active(), 0);
}

#[test]
fn scan_provincial_payload_with_raw() {
    let payload = load_payload("tests/payloads/provincial_bc.txt");
    let backend = MockSerial::new(&[]).reply(Reply::Payload(payload.clone()));
    let config = ScannerConfig {
        include_raw: true,
        ..fast_config()
    };

    let record = match scanner(config, backend).scan() {
        ScanOutcome::Success(record) => record,
        other => panic!("unexpected outcome: {other:?}"),
    };

    assert_eq!(record.city, "VICTORIA");
    assert_eq!(record.raw_data_hex, Some(hex::encode(&payload)));
}

#[test]
fn nak_is_no_scan() {
    let backend = MockSerial::new(&[]).reply(Reply::Payload(vec![NAK]));
    let outcome = scanner(fast_config(), backend).scan();

    assert!(matches!(outcome, ScanOutcome::NoScan(NoScanReason::Nak)));
    assert_eq!(outcome.http_status(), 404);
}

#[test]
fn silent_scanner_is_no_scan() {
    let backend = MockSerial::new(&[]).reply(Reply::Silent);
    let outcome = scanner(fast_config(), backend).scan();

    assert!(matches!(outcome, ScanOutcome::NoScan(NoScanReason::Empty)));
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], "empty response from scanner");
}

#[test]
fn unparseable_payload_is_a_warning() {
    let backend = MockSerial::new(&[]).reply(Reply::Payload(b"HELLO".to_vec()));
    let outcome = scanner(fast_config(), backend).scan();

    assert_eq!(outcome.http_status(), 200);
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "warning");
    assert_eq!(
        json["message"],
        "Received data but no license fields were populated"
    );
    assert_eq!(json["rawResponse"], "HELLO");
    assert_eq!(json["rawResponseHex"], "48454c4c4f");
}

#[test]
fn open_failure_is_transport_error() {
    let backend = MockSerial::new(&[]).reply(Reply::OpenFails);
    let outcome = scanner(fast_config(), backend).scan();

    assert_eq!(outcome.http_status(), 500);
    match outcome {
        ScanOutcome::TransportError(ScanError::PortOpenFailed { port, .. }) => {
            assert_eq!(port, "/dev/ttyMOCK0");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn read_failure_is_transport_error() {
    let backend = MockSerial::new(&[]).reply(Reply::ReadFails);
    let outcome = scanner(fast_config(), backend.clone()).scan();

    assert!(matches!(
        outcome,
        ScanOutcome::TransportError(ScanError::Transport(_))
    ));
    assert_eq!(backend.active(), 0);
}

#[test]
fn no_ports_is_transport_error() {
    let config = ScannerConfig {
        port: None,
        ..fast_config()
    };
    let outcome = scanner(config, MockSerial::new(&[])).scan();

    assert!(matches!(
        outcome,
        ScanOutcome::TransportError(ScanError::NoPortFound)
    ));
    assert_eq!(outcome.http_status(), 500);
}

#[test]
fn discovery_uses_platform_convention() {
    let backend = MockSerial::new(&["/dev/ttyS0", "/dev/ttyUSB0"])
        .reply(Reply::Payload(vec![NAK]));
    let config = ScannerConfig {
        port: None,
        ..fast_config()
    };
    scanner(config, backend.clone()).scan();

    assert_eq!(backend.opened()[0].0, "/dev/ttyUSB0");
}

#[test]
fn windows_discovery_prefers_configured_port() {
    let backend = MockSerial::new(&["COM1", "COM4"]).reply(Reply::Payload(vec![NAK]));
    let config = ScannerConfig {
        port: None,
        ..fast_config()
    };
    Scanner::with_backend(config, backend.clone())
        .with_platform(Platform::Windows)
        .scan();

    assert_eq!(backend.opened()[0].0, "COM4");
}

#[test]
fn port_specific_command_and_legacy_line() {
    let backend = MockSerial::new(&[]).reply(Reply::Payload(vec![NAK]));
    let config = ScannerConfig {
        command_format: CommandFormat::PortSpecific,
        scanner_id: "CON7".to_owned(),
        line_profile: LineProfile::Legacy,
        ..fast_config()
    };
    scanner(config, backend.clone()).scan();

    assert_eq!(backend.sent(), vec![b"\x01<TXPING,CON7>\x04".to_vec()]);
    assert_eq!(backend.opened()[0].1, LineSettings::LEGACY);
}

#[test]
fn concurrent_scans_are_serialized() {
    let mut backend = MockSerial::new(&[]);
    for _ in 0..4 {
        backend = backend.reply(Reply::Payload(b"DCSSMITH\n".to_vec()));
    }

    let scanner = Arc::new(scanner(fast_config(), backend.clone()));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let scanner = scanner.clone();
            thread::spawn(move || scanner.scan().http_status())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 200);
    }

    assert_eq!(backend.opened().len(), 4);
    assert_eq!(backend.max_active(), 1);
}
