use serde::{Deserialize, Serialize};

/// License class used when the payload carries none.
pub const UNKNOWN_LICENSE_CLASS: &str = "NA";

/// Normalized identity record extracted from one scan.
///
/// Every field is either a normalized value or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal: String,
    pub license_number: String,
    pub issue_date: String,
    pub expiry_date: String,
    pub height: String,
    pub sex: String,
    pub license_class: String,
    pub dob: String,

    /// Raw scanner payload, attached for diagnostics only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<String>,

    /// Lowercase hex of the raw payload bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data_hex: Option<String>,
}

impl LicenseRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether neither a name, an address nor a license number was found.
    ///
    /// This decides whether an unclassified payload is re-parsed as AAMVA.
    pub fn lacks_identity(&self) -> bool {
        self.first_name.is_empty()
            && self.last_name.is_empty()
            && self.address.is_empty()
            && self.license_number.is_empty()
    }

    /// Whether every field a caller relies on to identify the holder is empty.
    pub fn is_unpopulated(&self) -> bool {
        self.lacks_identity() && self.city.is_empty()
    }

    pub fn with_raw(mut self, raw: &[u8]) -> Self {
        self.raw_data = Some(String::from_utf8_lossy(raw).into_owned());
        self.raw_data_hex = Some(hex::encode(raw));
        self
    }

    pub(crate) fn fields_mut(&mut self) -> [&mut String; 14] {
        [
            &mut self.first_name,
            &mut self.middle_name,
            &mut self.last_name,
            &mut self.address,
            &mut self.city,
            &mut self.state,
            &mut self.postal,
            &mut self.license_number,
            &mut self.issue_date,
            &mut self.expiry_date,
            &mut self.height,
            &mut self.sex,
            &mut self.license_class,
            &mut self.dob,
        ]
    }
}
