//! Post-processing applied to every parsed record.
use crate::record::{LicenseRecord, UNKNOWN_LICENSE_CLASS};

/// Unit appended to bare height values.
pub const HEIGHT_UNIT: &str = "cm";

/// Brings a record into its canonical form.
///
/// Idempotent: `normalize(normalize(r)) == normalize(r)`.
pub fn normalize(mut record: LicenseRecord) -> LicenseRecord {
    for field in record.fields_mut() {
        let trimmed = field.trim();
        if trimmed.len() != field.len() {
            *field = trimmed.to_owned();
        }
    }

    if record.height.ends_with(|c: char| c.is_ascii_digit()) {
        record.height.push_str(HEIGHT_UNIT);
    }

    if record.license_class.is_empty() {
        record.license_class = UNKNOWN_LICENSE_CLASS.to_owned();
    }

    record
}

/// Re-delimits `YYYY`, `MM` and `DD` components as `YYYY-MM-DD`.
pub(crate) fn format_date(year: &str, month: &str, day: &str) -> String {
    format!("{year}-{month}-{day}")
}
