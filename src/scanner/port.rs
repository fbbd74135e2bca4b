//! Selection of the serial device the scanner is attached to.
use super::{ScanError, SerialBackend};

/// Port naming family of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// `COMn` devices.
    Windows,

    /// `/dev/cu.usbserial-*` style USB adapters.
    MacOs,

    /// `/dev/ttyUSBn` style USB adapters.
    Linux,

    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }

    /// Whether `name` follows the platform's naming for scanner adapters.
    pub fn matches_convention(&self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        match self {
            Self::Windows => lower.starts_with("com"),
            Self::MacOs => lower.contains("usbserial"),
            Self::Linux => lower.contains("usb"),
            Self::Other => false,
        }
    }
}

/// Picks a port among `ports`, in enumeration order.
///
/// On Windows `preferred` wins when present; otherwise the first port
/// following the platform convention, and finally the first port at all.
pub fn select_port<'a>(
    ports: &'a [String],
    platform: Platform,
    preferred: &str,
) -> Option<&'a str> {
    let preferred_match = match platform {
        Platform::Windows if !preferred.is_empty() => ports
            .iter()
            .find(|port| port.eq_ignore_ascii_case(preferred)),
        _ => None,
    };

    preferred_match
        .or_else(|| ports.iter().find(|port| platform.matches_convention(port)))
        .or_else(|| ports.first())
        .map(String::as_str)
}

/// Resolves the port to open.
///
/// A non-empty `port_override` is returned as is, without enumeration.
pub fn resolve_port(
    backend: &impl SerialBackend,
    port_override: Option<&str>,
    platform: Platform,
    preferred: &str,
) -> Result<String, ScanError> {
    if let Some(port) = port_override.filter(|port| !port.is_empty()) {
        tracing::debug!(port, "using port override");
        return Ok(port.to_owned());
    }

    let ports = backend.available_ports().map_err(ScanError::PortEnumeration)?;
    tracing::debug!(?ports, ?platform, "enumerated serial ports");

    let port = select_port(&ports, platform, preferred).ok_or(ScanError::NoPortFound)?;
    tracing::debug!(port, "selected serial port");
    Ok(port.to_owned())
}
