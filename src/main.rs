use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use dl_scan::{
    config::{CommandFormat, ConfigError, LineProfile},
    ParseContext, RawScanResponse, ScanOutcome, Scanner, ScannerConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dlscan", version, about = "Driver's license scanner client")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Serial device to open, skipping discovery.
    #[arg(long, global = true)]
    port: Option<String>,

    /// Scanner identifier for port specific commands.
    #[arg(long, global = true)]
    scanner_id: Option<String>,

    /// Send `<TXPING,{scanner_id}>` instead of `<TXPING>`.
    #[arg(long, global = true)]
    port_specific: bool,

    /// Use the 1200-7-N-1 line profile.
    #[arg(long, global = true)]
    legacy_line: bool,

    /// Overall reply deadline, in milliseconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Attach the raw payload to successful records.
    #[arg(long, global = true)]
    include_raw: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Trigger the scanner and print the parsed license.
    Scan,

    /// Parse a captured payload.
    Parse {
        file: PathBuf,

        /// The file holds the payload as hex text.
        #[arg(long)]
        hex: bool,

        /// Year used to expand two-digit birth years.
        #[arg(long)]
        reference_year: Option<i32>,
    },

    /// List serial devices.
    Ports,
}

impl Cli {
    fn scanner_config(&self) -> Result<ScannerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ScannerConfig::load(path)?,
            None => ScannerConfig::default(),
        };

        if let Some(port) = &self.port {
            config.port = Some(port.clone());
        }

        if let Some(id) = &self.scanner_id {
            config.scanner_id = id.clone();
        }

        if self.port_specific {
            config.command_format = CommandFormat::PortSpecific;
        }

        if self.legacy_line {
            config.line_profile = LineProfile::Legacy;
            config.line_settings = None;
        }

        if let Some(timeout) = self.timeout {
            config.framing.overall_deadline_ms = timeout;
        }

        config.include_raw |= self.include_raw;
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.scanner_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuration rejected");
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Command::Scan => {
            let outcome = Scanner::new(config).scan();
            print_outcome(&outcome)
        }
        Command::Parse {
            file,
            hex,
            reference_year,
        } => {
            let payload = match read_payload(&file, hex) {
                Ok(payload) => payload,
                Err(message) => {
                    tracing::error!(file = %file.display(), "{message}");
                    return ExitCode::FAILURE;
                }
            };

            let context = reference_year.map(ParseContext::new).unwrap_or_default();
            let outcome = ScanOutcome::from_response(
                &RawScanResponse::new(payload),
                &context,
                config.include_raw,
            );
            print_outcome(&outcome)
        }
        Command::Ports => match Scanner::new(config).list_ports() {
            Ok(ports) => {
                for port in ports {
                    println!("{port}");
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot list ports");
                ExitCode::FAILURE
            }
        },
    }
}

fn read_payload(file: &Path, is_hex: bool) -> Result<Vec<u8>, String> {
    let bytes = fs::read(file).map_err(|e| format!("cannot read payload: {e}"))?;
    if !is_hex {
        return Ok(bytes);
    }

    let text = String::from_utf8_lossy(&bytes);
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(digits).map_err(|e| format!("invalid hex payload: {e}"))
}

fn print_outcome(outcome: &ScanOutcome) -> ExitCode {
    match serde_json::to_string_pretty(outcome) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!(error = %e, "cannot serialize outcome");
            return ExitCode::FAILURE;
        }
    }

    match outcome {
        ScanOutcome::Success(_) | ScanOutcome::PartialWarning { .. } => ExitCode::SUCCESS,
        ScanOutcome::NoScan(_) => ExitCode::from(3),
        ScanOutcome::TransportError(_) => ExitCode::FAILURE,
    }
}
