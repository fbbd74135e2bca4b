//! Driver's license acquisition from serial PDF417/magstripe scanners.
//!
//! The [`scanner`] module frames the scanner's reply into a
//! [`RawScanResponse`](scanner::RawScanResponse); [`license::parse`] detects
//! which encoding family the payload uses and extracts a normalized
//! [`LicenseRecord`].
//!
//! Two families are understood: AAMVA tagged elements (most US and Canadian
//! jurisdictions) and the caret/dollar delimited provincial magstripe track.
pub mod aamva;
pub mod config;
pub mod detect;
pub mod license;
pub mod normalize;
pub mod provincial;
pub mod record;
pub mod scanner;
pub mod types;

pub use config::ScannerConfig;
pub use detect::{detect, JurisdictionFormat};
pub use license::{parse, ParsedLicense};
pub use provincial::ParseContext;
pub use record::LicenseRecord;
pub use scanner::{RawScanResponse, ScanError, ScanOutcome, Scanner};

/// Start of heading, opens a command.
pub const SOH: u8 = 0x01;

/// End of transmission, closes a command.
pub const EOT: u8 = 0x04;

/// Negative acknowledgement, sent by the scanner when no card was read.
pub const NAK: u8 = 0x15;
