//! Parser for the caret/dollar delimited magstripe format used by some
//! Canadian provinces.
//!
//! ```text
//! %BCVICTORIA^SMITH,$JOHN A^123 MAIN ST$BC V8W 1A1^?;6360281234567=271220051212=?
//! ^^^^^^^^^^^ ^^^^^^^^^^^^^ ^^^^^^^^^^^^^^^^^^^^^^^^  ^^^^^^^^^^^^^ ^^^^^^^^^^^^
//! marker+city last,$first   address$province postal   number        expiry+birth
//! ```
use chrono::Datelike;
use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    detect::strip_nak,
    normalize::format_date,
    record::LicenseRecord,
    types::{F12N, F2A},
};

/// Province and territory codes recognized after a `%` marker.
pub const PROVINCE_CODES: [&str; 13] = [
    "BC", "AB", "SK", "MB", "ON", "QC", "NB", "NS", "PE", "NL", "YT", "NT", "NU",
];

/// Segment separator.
pub const SEGMENT_SEPARATOR: char = '^';

/// Sub-field separator inside a segment.
pub const FIELD_SEPARATOR: char = '$';

/// Number of trailing digits of the track number printed on the card.
pub const LICENSE_NUMBER_DIGITS: usize = 7;

lazy_static! {
    static ref POSTAL_CODE: Regex = Regex::new(r"[A-Z][0-9][A-Z]\s?[0-9][A-Z][0-9]").unwrap();
    static ref LICENSE_NUMBER: Regex = Regex::new(r";([0-9]{13,16})=").unwrap();
    static ref DATE_BLOCK: Regex = Regex::new(r"=([0-9]{12})=").unwrap();
    static ref SEX_HEIGHT: Regex = Regex::new(r"([MF])([0-9]{3})").unwrap();
}

/// Settings for two-digit year expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseContext {
    /// Calendar year the scan is interpreted in.
    pub reference_year: i32,
}

impl ParseContext {
    pub fn new(reference_year: i32) -> Self {
        Self { reference_year }
    }

    /// Context for the current local year.
    pub fn now() -> Self {
        Self::new(chrono::Local::now().year())
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::now()
    }
}

/// Expands a two-digit birth year.
///
/// Years above the reference year's last two digits belong to the 1900s,
/// all others to the 2000s.
pub fn birth_century(short_year: u32, reference_year: i32) -> u32 {
    let current = reference_year.rem_euclid(100) as u32;
    if short_year > current {
        1900 + short_year
    } else {
        2000 + short_year
    }
}

/// Parses a provincial magstripe payload. Never fails: fields that cannot be
/// located stay empty.
pub fn parse(payload: &str, context: &ParseContext) -> LicenseRecord {
    let cleaned: String = strip_nak(payload)
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n'))
        .collect();

    let mut record = LicenseRecord::new();
    let mut segments = cleaned.split(SEGMENT_SEPARATOR);

    if let Some(segment) = segments.next() {
        if let Some((_, city)) = split_marker(segment) {
            record.city = city.trim().to_owned();
        }
    }

    if let Some(segment) = segments.next() {
        parse_name(segment, &mut record);
    }

    if let Some(segment) = segments.next() {
        parse_address(segment, &mut record);
    }

    if let Some(number) = license_number(&cleaned) {
        record.license_number = number.to_owned();
    }

    if let Some(block) = date_block(&cleaned) {
        record.expiry_date = expiry_date(&block);
        record.dob = birth_date(&block, context.reference_year);
    }

    if let Some(captures) = SEX_HEIGHT.captures(&cleaned) {
        record.sex = captures[1].to_owned();
        record.height = captures[2].to_owned();
    }

    record
}

/// Splits `%XX` from the start of the first segment.
pub fn split_marker(segment: &str) -> Option<(F2A, &str)> {
    let rest = segment.strip_prefix('%')?;
    let code = F2A::new(rest.get(..2)?).ok()?;
    if !PROVINCE_CODES.contains(&code.as_str()) {
        return None;
    }

    Some((code, &rest[2..]))
}

fn parse_name(segment: &str, record: &mut LicenseRecord) {
    let Some((last, given)) = segment.split_once(',') else {
        return;
    };

    record.last_name = strip_field_prefix(last).to_owned();

    let given = strip_field_prefix(given);
    match given.split_once(' ') {
        Some((first, middle)) => {
            record.first_name = first.to_owned();
            record.middle_name = middle.trim().to_owned();
        }
        None => record.first_name = given.to_owned(),
    }
}

fn parse_address(segment: &str, record: &mut LicenseRecord) {
    let Some((address, rest)) = segment.split_once(FIELD_SEPARATOR) else {
        record.address = segment.trim().to_owned();
        return;
    };

    record.address = address.trim().to_owned();

    let region = rest
        .split(FIELD_SEPARATOR)
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ");

    if let Some(code) = find_province(&region) {
        record.state = code.to_owned();
    }

    if let Some(postal) = POSTAL_CODE.find(&region) {
        record.postal = postal.as_str().to_owned();
    }
}

/// Finds a province code in the combined province/postal text, preferring a
/// whole word over a substring.
pub fn find_province(region: &str) -> Option<&'static str> {
    let words: Vec<&str> = region.split_whitespace().collect();
    PROVINCE_CODES
        .iter()
        .copied()
        .find(|code| words.contains(code))
        .or_else(|| PROVINCE_CODES.iter().copied().find(|code| region.contains(code)))
}

fn strip_field_prefix(value: &str) -> &str {
    let value = value.trim();
    value.strip_prefix(FIELD_SEPARATOR).unwrap_or(value).trim()
}

/// Last digits of the `;digits=` track number.
pub fn license_number(payload: &str) -> Option<&str> {
    let digits = LICENSE_NUMBER.captures(payload)?.get(1)?.as_str();
    Some(&digits[digits.len() - LICENSE_NUMBER_DIGITS..])
}

/// The `=DDMMYYYYMMDD=` expiry/birth block.
pub fn date_block(payload: &str) -> Option<F12N> {
    let digits = DATE_BLOCK.captures(payload)?.get(1)?.as_str();
    F12N::new(digits).ok()
}

/// Expiry from the leading `DDMMYY`, always in the 2000s.
pub fn expiry_date(block: &F12N) -> String {
    format_date(&format!("20{}", &block[4..6]), &block[2..4], &block[0..2])
}

/// Birth date from the trailing `YYMMDD`.
pub fn birth_date(block: &F12N, reference_year: i32) -> String {
    // The block is all ASCII digits, so the parse cannot fail.
    let short_year = block[6..8].parse().unwrap_or_default();
    let year = birth_century(short_year, reference_year);
    format_date(&year.to_string(), &block[8..10], &block[10..12])
}
