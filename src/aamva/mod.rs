//! Parser for AAMVA DL/ID payloads: newline separated elements, each line
//! opening with a three-letter element id.
use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    detect::strip_nak,
    normalize::format_date,
    record::LicenseRecord,
    types::F8N,
};

mod elements;
pub mod header;

pub use elements::{DataElement, ElementSetter};
pub use header::{strip_file_header, FileHeader};

lazy_static! {
    static ref LICENSE_CLASS: Regex = Regex::new(r"DCAG(\w+)").unwrap();
}

/// Marker preceding the license class.
pub const LICENSE_CLASS_MARKER: &str = "DCAG";

/// Length of identifiers printed as three hyphenated groups of five.
pub const GROUPED_ID_LEN: usize = 15;

/// Element values collected from one payload.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AamvaFields {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub expiry_date: Option<String>,
    pub issue_date: Option<String>,
    pub dob: Option<String>,
    pub sex: Option<String>,
    pub height: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal: Option<String>,
    pub id_number: Option<String>,
    pub document_discriminator: Option<String>,
    pub license_class: Option<String>,
}

impl AamvaFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, element: DataElement, value: &str) {
        (element.setter())(self, value)
    }

    fn set_last_name(&mut self, value: &str) {
        self.last_name = Some(value.to_owned())
    }

    fn set_first_name(&mut self, value: &str) {
        self.first_name = Some(value.to_owned())
    }

    fn set_middle_name(&mut self, value: &str) {
        self.middle_name = Some(value.to_owned())
    }

    fn set_expiry_date(&mut self, value: &str) {
        self.expiry_date = reformat_date(value)
    }

    fn set_issue_date(&mut self, value: &str) {
        self.issue_date = reformat_date(value)
    }

    fn set_dob(&mut self, value: &str) {
        self.dob = reformat_date(value)
    }

    fn set_sex(&mut self, value: &str) {
        self.sex = Some(decode_sex(value).to_owned())
    }

    fn set_height(&mut self, value: &str) {
        self.height = Some(value.replace(' ', ""))
    }

    fn set_address(&mut self, value: &str) {
        self.address = Some(value.to_owned())
    }

    fn set_city(&mut self, value: &str) {
        self.city = Some(value.to_owned())
    }

    fn set_state(&mut self, value: &str) {
        self.state = Some(value.to_owned())
    }

    fn set_postal(&mut self, value: &str) {
        self.postal = Some(value.to_owned())
    }

    fn set_id_number(&mut self, value: &str) {
        self.id_number = Some(group_id_number(value))
    }

    fn set_document_discriminator(&mut self, value: &str) {
        self.document_discriminator = Some(group_id_number(value))
    }

    /// License number, preferring the document discriminator.
    pub fn license_number(&self) -> Option<&str> {
        self.document_discriminator
            .as_deref()
            .or(self.id_number.as_deref())
    }

    pub fn build(self) -> LicenseRecord {
        let license_number = self.license_number().unwrap_or_default().to_owned();

        LicenseRecord {
            first_name: self.first_name.unwrap_or_default(),
            middle_name: self.middle_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
            postal: self.postal.unwrap_or_default(),
            license_number,
            issue_date: self.issue_date.unwrap_or_default(),
            expiry_date: self.expiry_date.unwrap_or_default(),
            height: self.height.unwrap_or_default(),
            sex: self.sex.unwrap_or_default(),
            license_class: self.license_class.unwrap_or_default(),
            dob: self.dob.unwrap_or_default(),
            raw_data: None,
            raw_data_hex: None,
        }
    }
}

/// Splits a payload into trimmed, non-empty lines.
///
/// Both the element separator (`\n`) and the segment terminator (`\r`) end a
/// line.
pub fn lines(payload: &str) -> impl Iterator<Item = &str> {
    payload
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

/// Collects the known elements of an AAMVA payload.
///
/// Unknown element ids are skipped; the last occurrence of an element wins.
pub fn collect_fields(payload: &str) -> AamvaFields {
    let payload = strip_file_header(strip_nak(payload));
    let mut fields = AamvaFields::new();

    for line in lines(&payload) {
        if let Some((element, value)) = DataElement::split_line(line) {
            tracing::trace!(element = element.string_id(), value, "aamva element");
            fields.set(element, value);
        }

        if line.contains(LICENSE_CLASS_MARKER) {
            if let Some(class) = LICENSE_CLASS.captures(line).and_then(|c| c.get(1)) {
                fields.license_class = Some(class.as_str().to_owned());
            }
        }
    }

    fields
}

/// Parses an AAMVA payload. Never fails: missing elements stay empty.
pub fn parse(payload: &str) -> LicenseRecord {
    collect_fields(payload).build()
}

/// Re-delimits the leading `YYYYMMDD` digits of a value as `YYYY-MM-DD`.
pub fn reformat_date(value: &str) -> Option<String> {
    let digits = F8N::from_prefix(value).ok()?;
    Some(format_date(&digits[0..4], &digits[4..6], &digits[6..8]))
}

/// Maps the numeric sex codes, passing any other value through.
pub fn decode_sex(value: &str) -> &str {
    match value {
        "1" => "M",
        "2" => "F",
        other => other,
    }
}

/// Hyphenates 15 character identifiers as `5-5-5`; other lengths are kept.
pub fn group_id_number(value: &str) -> String {
    let value = value.trim();
    if value.len() == GROUPED_ID_LEN && value.is_ascii() {
        format!("{}-{}-{}", &value[..5], &value[5..10], &value[10..])
    } else {
        value.to_owned()
    }
}
