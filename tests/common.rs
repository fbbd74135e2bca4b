#![allow(dead_code)]
use std::{
    collections::VecDeque,
    fs, io,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

use dl_scan::{
    config::FramingConfig,
    scanner::{LineSettings, ScannerLink, SerialBackend},
    ParseContext, ScannerConfig,
};

pub const CONTEXT: ParseContext = ParseContext {
    reference_year: 2025,
};

pub fn load_payload(path: impl AsRef<Path>) -> Vec<u8> {
    fs::read(path).unwrap()
}

pub fn load_text(path: impl AsRef<Path>) -> String {
    String::from_utf8(load_payload(path)).unwrap()
}

/// Configuration with timers short enough for tests.
pub fn fast_config() -> ScannerConfig {
    ScannerConfig {
        port: Some("/dev/ttyMOCK0".to_owned()),
        framing: FramingConfig {
            overall_deadline_ms: 200,
            idle_timeout_ms: 20,
            max_since_first_byte_ms: 200,
        },
        ..Default::default()
    }
}

/// What the mocked scanner does when a port is opened.
#[derive(Debug, Clone)]
pub enum Reply {
    Payload(Vec<u8>),
    Silent,
    OpenFails,
    ReadFails,
}

#[derive(Default)]
struct Shared {
    replies: Mutex<VecDeque<Reply>>,
    opened: Mutex<Vec<(String, LineSettings)>>,
    sent: Mutex<Vec<Vec<u8>>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

/// In-memory serial backend replaying one [`Reply`] per opened port.
#[derive(Clone, Default)]
pub struct MockSerial {
    ports: Vec<String>,
    shared: Arc<Shared>,
}

impl MockSerial {
    pub fn new(ports: &[&str]) -> Self {
        Self {
            ports: ports.iter().map(|p| p.to_string()).collect(),
            shared: Arc::default(),
        }
    }

    pub fn reply(self, reply: Reply) -> Self {
        self.shared.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn opened(&self) -> Vec<(String, LineSettings)> {
        self.shared.opened.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.shared.sent.lock().unwrap().clone()
    }

    /// Highest number of links open at the same time.
    pub fn max_active(&self) -> usize {
        self.shared.max_active.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.shared.active.load(Ordering::SeqCst)
    }
}

impl SerialBackend for MockSerial {
    fn available_ports(&self) -> io::Result<Vec<String>> {
        Ok(self.ports.clone())
    }

    fn open(&self, port: &str, settings: &LineSettings) -> io::Result<Box<dyn ScannerLink>> {
        let reply = self
            .shared
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Silent);

        if let Reply::OpenFails = reply {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "port busy"));
        }

        self.shared
            .opened
            .lock()
            .unwrap()
            .push((port.to_owned(), *settings));

        let active = self.shared.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.max_active.fetch_max(active, Ordering::SeqCst);

        Ok(Box::new(MockLink {
            reply,
            delivered: false,
            shared: self.shared.clone(),
        }))
    }
}

struct MockLink {
    reply: Reply,
    delivered: bool,
    shared: Arc<Shared>,
}

impl ScannerLink for MockLink {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.shared.sent.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }

    fn read_fragment(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        match &self.reply {
            Reply::ReadFails => Err(io::ErrorKind::BrokenPipe.into()),
            Reply::Payload(payload) if !self.delivered => {
                self.delivered = true;
                thread::sleep(Duration::from_millis(5));
                let n = payload.len().min(buf.len());
                buf[..n].copy_from_slice(&payload[..n]);
                if n < payload.len() {
                    self.reply = Reply::Payload(payload[n..].to_vec());
                    self.delivered = false;
                }
                Ok(Some(n))
            }
            _ => {
                thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}

impl Drop for MockLink {
    fn drop(&mut self) {
        self.shared.active.fetch_sub(1, Ordering::SeqCst);
    }
}
