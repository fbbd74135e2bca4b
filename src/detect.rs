//! Classification of raw payloads into the known encoding families.
use serde::{Deserialize, Serialize};

use crate::{provincial::PROVINCE_CODES, NAK};

/// Encoding family of a scanned payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JurisdictionFormat {
    /// Line-oriented, three-letter tagged PDF417 fields.
    Aamva,

    /// Caret/dollar delimited provincial magstripe track.
    ProvincialMagstripe,

    /// No marker matched.
    Unknown,
}

/// A predicate over the payload tagging it with a format.
pub struct DetectionRule {
    pub name: &'static str,
    pub format: JurisdictionFormat,
    pub matches: fn(&str) -> bool,
}

/// Literal markers identifying AAMVA payloads.
pub const AAMVA_MARKERS: [&str; 3] = ["ANSI ", "DCS", "DAQ"];

/// Detection rules, highest priority first.
pub const RULES: [DetectionRule; 2] = [
    DetectionRule {
        name: "provincial marker",
        format: JurisdictionFormat::ProvincialMagstripe,
        matches: has_provincial_marker,
    },
    DetectionRule {
        name: "aamva marker",
        format: JurisdictionFormat::Aamva,
        matches: has_aamva_marker,
    },
];

/// Whether the payload contains `%XX` for a known province or territory.
pub fn has_provincial_marker(payload: &str) -> bool {
    payload
        .match_indices('%')
        .any(|(i, _)| match payload.get(i + 1..i + 3) {
            Some(code) => PROVINCE_CODES.contains(&code),
            None => false,
        })
}

pub fn has_aamva_marker(payload: &str) -> bool {
    AAMVA_MARKERS.iter().any(|marker| payload.contains(marker))
}

/// Strips a single leading NAK byte for inspection.
pub fn strip_nak(payload: &str) -> &str {
    payload.strip_prefix(NAK as char).unwrap_or(payload)
}

/// Returns the first rule matching `payload`, if any.
pub fn matching_rule(payload: &str) -> Option<&'static DetectionRule> {
    let payload = strip_nak(payload);
    RULES.iter().find(|rule| (rule.matches)(payload))
}

/// Classifies a payload.
pub fn detect(payload: &str) -> JurisdictionFormat {
    match matching_rule(payload) {
        Some(rule) => {
            tracing::debug!(rule = rule.name, format = ?rule.format, "payload classified");
            rule.format
        }
        None => {
            tracing::debug!("payload matched no format marker");
            JurisdictionFormat::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provincial_markers_win() {
        assert_eq!(
            detect("%BCVICTORIA^SMITH,$JOHN^DAQ"),
            JurisdictionFormat::ProvincialMagstripe
        );
        assert_eq!(detect("%ABCALGARY^"), JurisdictionFormat::ProvincialMagstripe);
        assert_eq!(detect("%NTYELLOWKNIFE^"), JurisdictionFormat::ProvincialMagstripe);
    }

    #[test]
    fn aamva_markers() {
        assert_eq!(detect("@\n\x1e\rANSI 636014"), JurisdictionFormat::Aamva);
        assert_eq!(detect("DCSSMITH\n"), JurisdictionFormat::Aamva);
        assert_eq!(detect("xxDAQ123"), JurisdictionFormat::Aamva);
    }

    #[test]
    fn unknown_markers() {
        assert_eq!(detect("%ZZNOWHERE^"), JurisdictionFormat::Unknown);
        assert_eq!(detect("DACJOHN\n"), JurisdictionFormat::Unknown);
        assert_eq!(detect(""), JurisdictionFormat::Unknown);
        assert_eq!(detect("%"), JurisdictionFormat::Unknown);
    }

    #[test]
    fn leading_nak_is_ignored() {
        assert_eq!(detect("\u{15}%BCVICTORIA"), JurisdictionFormat::ProvincialMagstripe);
        assert_eq!(strip_nak("\u{15}\u{15}x"), "\u{15}x");
    }

    #[test]
    fn marker_near_end_of_payload() {
        assert!(!has_provincial_marker("abc%B"));
        assert!(has_provincial_marker("abc%BC"));
    }
}
