//! Format detection, parser dispatch and normalization of one payload.
use crate::{
    aamva,
    detect::{detect, JurisdictionFormat},
    normalize::normalize,
    provincial::{self, ParseContext},
    record::LicenseRecord,
};

/// Result of parsing one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLicense {
    /// Format the payload was classified as.
    pub detected: JurisdictionFormat,

    /// Parser whose output was kept.
    pub parsed_as: JurisdictionFormat,

    pub record: LicenseRecord,
}

/// Classifies `payload`, runs the matching parser and normalizes the result.
///
/// Unclassified payloads are parsed as provincial first and re-parsed as
/// AAMVA when that yields no name, address or license number.
pub fn parse(payload: &str, context: &ParseContext) -> ParsedLicense {
    let detected = detect(payload);

    let (parsed_as, record) = match detected {
        JurisdictionFormat::Aamva => (JurisdictionFormat::Aamva, aamva::parse(payload)),
        JurisdictionFormat::ProvincialMagstripe => (
            JurisdictionFormat::ProvincialMagstripe,
            provincial::parse(payload, context),
        ),
        JurisdictionFormat::Unknown => {
            let record = provincial::parse(payload, context);
            if record.lacks_identity() {
                tracing::debug!("provincial parse found nothing, falling back to AAMVA");
                (JurisdictionFormat::Aamva, aamva::parse(payload))
            } else {
                (JurisdictionFormat::ProvincialMagstripe, record)
            }
        }
    };

    ParsedLicense {
        detected,
        parsed_as,
        record: normalize(record),
    }
}
