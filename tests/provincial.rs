mod common;
use common::*;
use dl_scan::{license, provincial, JurisdictionFormat, ParseContext};

#[test]
fn provincial_bc_payload() {
    let payload = load_text("tests/payloads/provincial_bc.txt");
    let parsed = license::parse(&payload, &CONTEXT);
    assert_eq!(parsed.detected, JurisdictionFormat::ProvincialMagstripe);

    let record = parsed.record;
    assert_eq!(record.city, "VICTORIA");
    assert_eq!(record.last_name, "SMITH");
    assert_eq!(record.first_name, "JOHN");
    assert_eq!(record.middle_name, "A");
    assert_eq!(record.address, "123 MAIN ST");
    assert_eq!(record.state, "BC");
    assert_eq!(record.postal, "V8W 1A1");
    assert_eq!(record.license_number, "7890123");
    assert_eq!(record.expiry_date, "2020-12-27");
    assert_eq!(record.dob, "2005-12-12");
    assert_eq!(record.license_class, "NA");
}

#[test]
fn track_number_keeps_last_seven_digits() {
    let payload = "%BCVICTORIA^SMITH,$JOHN A^123 MAIN ST$BC V8W 1A1^;1234567890123=271220051212=";
    let record = license::parse(payload, &CONTEXT).record;
    assert_eq!(record.license_number, "7890123");

    // Runs longer than sixteen digits are not track numbers.
    let payload = "%BCVICTORIA^SMITH,$JOHN^;6360281234567890123=271220051212=";
    let record = license::parse(payload, &CONTEXT).record;
    assert_eq!(record.license_number, "");
    assert_eq!(record.dob, "2005-12-12");
}

#[test]
fn birth_year_follows_reference_year() {
    let payload = "%ABCALGARY^DOE,$JANE^1 ELM RD$AB T2P 1J9^;1234567890123=010130300101=";

    let record = provincial::parse(payload, &ParseContext::new(2025));
    assert_eq!(record.dob, "1930-01-01");
    assert_eq!(record.expiry_date, "2030-01-01");

    let record = provincial::parse(payload, &ParseContext::new(2031));
    assert_eq!(record.dob, "2030-01-01");
}

#[test]
fn sex_and_height() {
    let payload = "%ONTORONTO^DOE,$JANE^1 KING ST$ON M5H 2N2^F165";
    let record = license::parse(payload, &CONTEXT).record;
    assert_eq!(record.sex, "F");
    assert_eq!(record.height, "165cm");
    assert_eq!(record.state, "ON");
    assert_eq!(record.postal, "M5H 2N2");
}

#[test]
fn missing_segments_stay_empty() {
    let record = license::parse("%QCMONTREAL", &CONTEXT).record;
    assert_eq!(record.city, "MONTREAL");
    assert!(record.last_name.is_empty());
    assert!(record.license_number.is_empty());
    assert!(record.dob.is_empty());
}

#[test]
fn unknown_payload_falls_back_to_aamva() {
    let parsed = license::parse("HEADER\nDAQ123456789\nDAGPO BOX 9\n", &CONTEXT);
    assert_eq!(parsed.detected, JurisdictionFormat::Aamva);

    let parsed = license::parse("HEADER\nDACJOHN\nDAGPO BOX 9\n", &CONTEXT);
    assert_eq!(parsed.detected, JurisdictionFormat::Unknown);
    assert_eq!(parsed.parsed_as, JurisdictionFormat::Aamva);
    assert_eq!(parsed.record.first_name, "JOHN");
    assert_eq!(parsed.record.address, "PO BOX 9");
    assert!(!parsed.record.is_unpopulated());
}
