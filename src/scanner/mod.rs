//! Scan acquisition: port resolution, the framed exchange with the scanner,
//! and classification of the reply into a [`ScanOutcome`].
use std::{borrow::Cow, io, sync::Mutex, time::Duration};

use serde::{Serialize, Serializer};

use crate::{
    config::ScannerConfig, license, provincial::ParseContext, record::LicenseRecord, NAK,
};

pub mod port;
pub mod settings;
pub mod transport;

pub use port::{resolve_port, select_port, Platform};
pub use settings::{LineSettings, Parity};
pub use transport::{
    exchange, frame_command, read_response, ScannerLink, SerialBackend, SystemSerial,
};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("no serial ports found")]
    NoPortFound,

    #[error("cannot enumerate serial ports: {0}")]
    PortEnumeration(#[source] io::Error),

    #[error("open port {port} failed: {source}")]
    PortOpenFailed {
        port: String,
        #[source]
        source: io::Error,
    },

    #[error("write to scanner failed: {0}")]
    WriteFailed(#[source] io::Error),

    #[error("scanner read failed: {0}")]
    Transport(#[source] io::Error),
}

/// Reply of one scan attempt, after framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawScanResponse {
    pub payload: Vec<u8>,
    pub received_any_data: bool,
    pub elapsed: Duration,
}

impl RawScanResponse {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        let payload = payload.into();
        Self {
            received_any_data: !payload.is_empty(),
            payload,
            elapsed: Duration::ZERO,
        }
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// Why this reply carries no scan, if it does not.
    pub fn no_scan_reason(&self) -> Option<NoScanReason> {
        let trimmed = self.payload.trim_ascii();
        if trimmed.is_empty() {
            Some(NoScanReason::Empty)
        } else if trimmed[0] == NAK && trimmed.len() <= 2 {
            Some(NoScanReason::Nak)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoScanReason {
    /// Nothing but whitespace arrived.
    Empty,

    /// The scanner answered with NAK.
    Nak,
}

impl NoScanReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "empty response from scanner",
            Self::Nak => "no license scanned (NAK received)",
        }
    }
}

/// Result of one scan request.
#[derive(Debug)]
pub enum ScanOutcome {
    Success(LicenseRecord),

    /// Bytes arrived but no identity field could be extracted.
    PartialWarning {
        record: LicenseRecord,
        raw_response: Vec<u8>,
    },

    /// The scanner was not triggered.
    NoScan(NoScanReason),

    TransportError(ScanError),
}

pub const PARTIAL_WARNING_MESSAGE: &str = "Received data but no license fields were populated";

impl ScanOutcome {
    /// Classifies a framed reply.
    pub fn from_response(
        response: &RawScanResponse,
        context: &ParseContext,
        include_raw: bool,
    ) -> Self {
        if let Some(reason) = response.no_scan_reason() {
            tracing::info!(reason = reason.message(), "no scan");
            return Self::NoScan(reason);
        }

        let parsed = license::parse(&response.text(), context);
        tracing::info!(
            detected = ?parsed.detected,
            parsed_as = ?parsed.parsed_as,
            "license payload parsed"
        );

        if parsed.record.is_unpopulated() {
            tracing::warn!(len = response.payload.len(), "no license fields extracted");
            return Self::PartialWarning {
                record: parsed.record,
                raw_response: response.payload.clone(),
            };
        }

        let record = if include_raw {
            parsed.record.with_raw(&response.payload)
        } else {
            parsed.record
        };

        Self::Success(record)
    }

    /// HTTP status the outcome maps to.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Success(_) | Self::PartialWarning { .. } => 200,
            Self::NoScan(_) => 404,
            Self::TransportError(_) => 500,
        }
    }

    pub fn record(&self) -> Option<&LicenseRecord> {
        match self {
            Self::Success(record) | Self::PartialWarning { record, .. } => Some(record),
            _ => None,
        }
    }

    /// JSON body of the outcome.
    pub fn response(&self) -> ScanResponse<'_> {
        match self {
            Self::Success(record) => ScanResponse::Success {
                license_data: record,
            },
            Self::PartialWarning {
                record,
                raw_response,
            } => ScanResponse::Warning {
                message: PARTIAL_WARNING_MESSAGE,
                license_data: record,
                raw_response: String::from_utf8_lossy(raw_response),
                raw_response_hex: hex::encode(raw_response),
            },
            Self::NoScan(reason) => ScanResponse::Error {
                message: reason.message().to_owned(),
            },
            Self::TransportError(e) => ScanResponse::Error {
                message: e.to_string(),
            },
        }
    }
}

impl Serialize for ScanOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.response().serialize(serializer)
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScanResponse<'a> {
    #[serde(rename_all = "camelCase")]
    Success { license_data: &'a LicenseRecord },

    #[serde(rename_all = "camelCase")]
    Warning {
        message: &'static str,
        license_data: &'a LicenseRecord,
        raw_response: Cow<'a, str>,
        raw_response_hex: String,
    },

    Error { message: String },
}

/// Front door of the scanner.
///
/// Scans through one `Scanner` are serialized: the serial port is a single
/// device and concurrent opens would race.
pub struct Scanner<B = SystemSerial> {
    config: ScannerConfig,
    backend: B,
    platform: Platform,
    context: Option<ParseContext>,
    lock: Mutex<()>,
}

impl Scanner<SystemSerial> {
    pub fn new(config: ScannerConfig) -> Self {
        Self::with_backend(config, SystemSerial)
    }
}

impl<B: SerialBackend> Scanner<B> {
    pub fn with_backend(config: ScannerConfig, backend: B) -> Self {
        Self {
            config,
            backend,
            platform: Platform::current(),
            context: None,
            lock: Mutex::new(()),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Fixes the year used to expand two-digit birth years.
    pub fn with_context(mut self, context: ParseContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn list_ports(&self) -> Result<Vec<String>, ScanError> {
        self.backend
            .available_ports()
            .map_err(ScanError::PortEnumeration)
    }

    /// Opens the port, sends the command and frames the reply.
    ///
    /// The port is closed before returning, whatever the result.
    pub fn acquire(&self) -> Result<RawScanResponse, ScanError> {
        let config = &self.config;
        let port = resolve_port(
            &self.backend,
            config.port_override(),
            self.platform,
            &config.preferred_port,
        )?;

        let settings = config.line_settings();
        tracing::info!(%port, %settings, "opening scanner port");
        let mut link = self
            .backend
            .open(&port, &settings)
            .map_err(|source| ScanError::PortOpenFailed {
                port: port.clone(),
                source,
            })?;

        exchange(&mut link, &config.command(), &config.framing)
    }

    /// Runs one complete scan.
    pub fn scan(&self) -> ScanOutcome {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match self.acquire() {
            Ok(response) => {
                let context = self.context.unwrap_or_else(ParseContext::now);
                ScanOutcome::from_response(&response, &context, self.config.include_raw)
            }
            Err(e) => {
                tracing::error!(error = %e, "scan failed");
                ScanOutcome::TransportError(e)
            }
        }
    }
}
