//! Scanner configuration, built once at startup and passed by reference.
use std::{fs, io, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::scanner::settings::LineSettings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration syntax: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Shape of the command sent to the scanner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandFormat {
    /// `<TXPING>`
    #[default]
    Simple,

    /// `<TXPING,{scanner_id}>`
    PortSpecific,
}

/// Named serial line settings observed on deployed scanners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineProfile {
    /// 9600-8-N-1.
    #[default]
    Standard,

    /// 1200-7-N-1.
    Legacy,
}

impl LineProfile {
    pub fn settings(&self) -> LineSettings {
        match self {
            Self::Standard => LineSettings::STANDARD,
            Self::Legacy => LineSettings::LEGACY,
        }
    }
}

/// Upper bound accepted for any framing timer: one hour.
pub const MAX_FRAMING_MS: u64 = 3_600_000;

/// Timers bounding one read of the scanner's reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingConfig {
    /// Maximum total wait for a reply.
    pub overall_deadline_ms: u64,

    /// Silence after a fragment that ends the message.
    pub idle_timeout_ms: u64,

    /// Maximum time spent reading once the first byte has arrived.
    pub max_since_first_byte_ms: u64,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            overall_deadline_ms: 10_000,
            idle_timeout_ms: 1_000,
            max_since_first_byte_ms: 3_000,
        }
    }
}

impl FramingConfig {
    pub fn overall_deadline(&self) -> Duration {
        Duration::from_millis(self.overall_deadline_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn max_since_first_byte(&self) -> Duration {
        Duration::from_millis(self.max_since_first_byte_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerConfig {
    /// Explicit serial device; skips port discovery when set.
    pub port: Option<String>,

    /// Device preferred on Windows when present.
    pub preferred_port: String,

    /// Scanner identifier used by [`CommandFormat::PortSpecific`].
    pub scanner_id: String,

    pub command_format: CommandFormat,

    pub line_profile: LineProfile,

    /// Overrides `line_profile` when set.
    pub line_settings: Option<LineSettings>,

    pub framing: FramingConfig,

    /// Attach the raw payload and its hex encoding to successful records.
    pub include_raw: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            port: None,
            preferred_port: "COM4".to_owned(),
            scanner_id: "CON3".to_owned(),
            command_format: CommandFormat::default(),
            line_profile: LineProfile::default(),
            line_settings: None,
            framing: FramingConfig::default(),
            include_raw: false,
        }
    }
}

impl ScannerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let framing = &self.framing;
        let timers = [
            framing.overall_deadline_ms,
            framing.idle_timeout_ms,
            framing.max_since_first_byte_ms,
        ];

        if timers.contains(&0) {
            return Err(ConfigError::Invalid(
                "framing durations must be non-zero".to_owned(),
            ));
        }

        if timers.iter().any(|&ms| ms > MAX_FRAMING_MS) {
            return Err(ConfigError::Invalid(format!(
                "framing durations must not exceed {MAX_FRAMING_MS} ms"
            )));
        }

        let settings = self.line_settings();
        if settings.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud rate must be non-zero".to_owned()));
        }

        if !(5..=8).contains(&settings.data_bits) {
            return Err(ConfigError::Invalid(format!(
                "unsupported data bits: {}",
                settings.data_bits
            )));
        }

        if !(1..=2).contains(&settings.stop_bits) {
            return Err(ConfigError::Invalid(format!(
                "unsupported stop bits: {}",
                settings.stop_bits
            )));
        }

        if self.command_format == CommandFormat::PortSpecific && self.scanner_id.is_empty() {
            return Err(ConfigError::Invalid(
                "port specific commands need a scanner id".to_owned(),
            ));
        }

        Ok(())
    }

    /// Effective line settings.
    pub fn line_settings(&self) -> LineSettings {
        self.line_settings
            .unwrap_or_else(|| self.line_profile.settings())
    }

    /// Explicit port override, ignoring blank values.
    pub fn port_override(&self) -> Option<&str> {
        self.port.as_deref().filter(|port| !port.trim().is_empty())
    }

    /// Command text sent inside the SOH/EOT envelope.
    pub fn command(&self) -> String {
        match self.command_format {
            CommandFormat::Simple => "<TXPING>".to_owned(),
            CommandFormat::PortSpecific => format!("<TXPING,{}>", self.scanner_id),
        }
    }
}
