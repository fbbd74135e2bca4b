//! Command envelope and idle-timeout framing of the scanner's reply.
//!
//! The reply carries no length and no terminator. It is read fragment by
//! fragment; the message is complete when the line stays idle for
//! `idle_timeout` after data has arrived, when `max_since_first_byte` has
//! passed since the first byte, or when the overall deadline expires.
use std::{
    io::{self, Read, Write},
    time::{Duration, Instant},
};

use crate::{config::FramingConfig, EOT, SOH};

use super::{settings::LineSettings, RawScanResponse, ScanError};

/// Bytes requested per read.
pub const FRAGMENT_SIZE: usize = 128;

/// An open connection to the scanner.
pub trait ScannerLink {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Reads whatever arrives within `timeout`.
    ///
    /// Returns `Ok(None)` when the timeout elapses with no data. The read
    /// must not outlive the call.
    fn read_fragment(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>>;
}

impl<L: ScannerLink + ?Sized> ScannerLink for Box<L> {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).send(bytes)
    }

    fn read_fragment(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        (**self).read_fragment(buf, timeout)
    }
}

/// Source of scanner connections.
pub trait SerialBackend {
    /// Names of the serial devices present, in enumeration order.
    fn available_ports(&self) -> io::Result<Vec<String>>;

    fn open(&self, port: &str, settings: &LineSettings) -> io::Result<Box<dyn ScannerLink>>;
}

/// Serial devices of the host, through the `serialport` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSerial;

impl SerialBackend for SystemSerial {
    fn available_ports(&self) -> io::Result<Vec<String>> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(|info| info.port_name).collect())
    }

    fn open(&self, port: &str, settings: &LineSettings) -> io::Result<Box<dyn ScannerLink>> {
        let port = serialport::new(port, settings.baud_rate)
            .data_bits(settings.serialport_data_bits())
            .stop_bits(settings.serialport_stop_bits())
            .parity(settings.serialport_parity())
            .timeout(Duration::from_millis(100))
            .open()?;

        Ok(Box::new(SerialLink { port }))
    }
}

/// Scanner connection over a `serialport` handle. Closed on drop.
pub struct SerialLink {
    port: Box<dyn serialport::SerialPort>,
}

impl ScannerLink for SerialLink {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    fn read_fragment(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        self.port.set_timeout(timeout)?;
        match self.port.read(buf) {
            Ok(0) => Ok(None),
            Ok(n) => Ok(Some(n)),
            Err(e) if is_idle(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn is_idle(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Wraps a command as `SOH command EOT`.
pub fn frame_command(command: &str) -> Vec<u8> {
    let mut framed = Vec::with_capacity(command.len() + 2);
    framed.push(SOH);
    framed.extend_from_slice(command.as_bytes());
    framed.push(EOT);
    framed
}

/// Sends `command` and reads the reply.
pub fn exchange(
    link: &mut impl ScannerLink,
    command: &str,
    framing: &FramingConfig,
) -> Result<RawScanResponse, ScanError> {
    let framed = frame_command(command);
    tracing::trace!(bytes = %hex::encode(&framed), "sending command");
    link.send(&framed).map_err(ScanError::WriteFailed)?;
    read_response(link, framing)
}

/// Accumulates reply fragments until the message is considered complete.
///
/// Idle timeouts before the first byte are not an error: reading goes on
/// until the overall deadline.
pub fn read_response(
    link: &mut impl ScannerLink,
    framing: &FramingConfig,
) -> Result<RawScanResponse, ScanError> {
    let started = Instant::now();
    // `None` when the deadline lies beyond what `Instant` can represent.
    let deadline = started.checked_add(framing.overall_deadline());
    let mut first_byte_at: Option<Instant> = None;
    let mut payload = Vec::new();
    let mut buf = [0u8; FRAGMENT_SIZE];

    loop {
        let cap = first_byte_at
            .and_then(|first| first.checked_add(framing.max_since_first_byte()));
        let limit = match (deadline, cap) {
            (Some(deadline), Some(cap)) => Some(deadline.min(cap)),
            (limit, None) | (None, limit) => limit,
        };

        let now = Instant::now();
        let wait = match limit {
            Some(limit) if now >= limit => {
                tracing::debug!(received = first_byte_at.is_some(), "read window elapsed");
                break;
            }
            Some(limit) => framing.idle_timeout().min(limit - now),
            None => framing.idle_timeout(),
        };

        match link.read_fragment(&mut buf, wait) {
            Ok(Some(n)) => {
                first_byte_at.get_or_insert_with(Instant::now);
                payload.extend_from_slice(&buf[..n]);
                tracing::trace!(len = n, bytes = %hex::encode(&buf[..n]), "fragment received");
            }
            Ok(None) if first_byte_at.is_some() => {
                tracing::debug!("line idle after data, message complete");
                break;
            }
            Ok(None) => {
                tracing::trace!("no data yet, still waiting");
            }
            Err(e) => {
                tracing::warn!(error = %e, "scanner read failed");
                return Err(ScanError::Transport(e));
            }
        }
    }

    let response = RawScanResponse {
        received_any_data: first_byte_at.is_some(),
        payload,
        elapsed: started.elapsed(),
    };

    tracing::debug!(
        len = response.payload.len(),
        elapsed_ms = response.elapsed.as_millis() as u64,
        "scanner response framed"
    );

    Ok(response)
}
