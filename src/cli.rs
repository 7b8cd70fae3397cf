//! Command-line interface definitions for aztarna.
//!
//! Uses `clap` derive macros for declarative argument parsing.

use crate::config::ScanSettings;
use crate::error::{CliError, CliResult};
use crate::output;
use crate::scanner::{CancelPolicy, CancelToken, ScanReport, Scanner, TcpConnectStrategy};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Reconnaissance scanner for robot middleware masters.
///
/// Targets come from a file (one IPv4 address per line), a CIDR range, or
/// standard input when neither is given.
#[derive(Parser, Debug)]
#[command(name = "aztarna")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Footprinting scanner for robot middleware", long_about = None)]
pub struct Cli {
    /// File with one IPv4 address per line
    #[arg(short = 'i', long = "input", value_name = "FILE", conflicts_with = "range")]
    pub input: Option<PathBuf>,

    /// Network range in CIDR notation (e.g., "192.168.1.0/24")
    #[arg(short = 'r', long = "range", value_name = "CIDR")]
    pub range: Option<String>,

    /// Ports to probe on every target, in order (e.g., "11311,11312")
    #[arg(short, long, value_delimiter = ',', value_name = "PORTS")]
    pub ports: Option<Vec<u16>>,

    /// Probe deeper and capture service banners
    #[arg(short, long)]
    pub extended: bool,

    /// Maximum number of probes in flight
    #[arg(short = 'c', long, value_name = "N")]
    pub rate: Option<usize>,

    /// Connection timeout in milliseconds
    #[arg(short = 't', long, default_value = "3000")]
    pub timeout: u64,

    /// Maximum probe launches per second
    #[arg(long, value_name = "N")]
    pub probes_per_second: Option<u32>,

    /// What happens to in-flight probes on Ctrl-C
    #[arg(long, value_enum, value_name = "POLICY")]
    pub on_cancel: Option<CancelPolicy>,

    /// Path to a JSON settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,

    /// Write results to this file instead of stdout
    #[arg(short, long = "out", value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Show a progress bar while scanning
    #[arg(long)]
    pub progress: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON format for programmatic use
    Json,
    /// CSV format for spreadsheet import
    Csv,
}

impl Cli {
    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "aztarna=debug"
        } else {
            "aztarna=warn"
        }
    }

    /// Resolve settings: file first, then command-line overrides.
    pub fn settings(&self) -> CliResult<ScanSettings> {
        let mut settings = match &self.config {
            Some(path) => ScanSettings::load_from(path)?,
            None => ScanSettings::load()?,
        };

        if let Some(ports) = &self.ports {
            settings = settings.with_ports(ports.clone());
        }
        if self.extended {
            settings = settings.with_extended(true);
        }
        if let Some(rate) = self.rate {
            settings = settings.with_rate(rate);
        }
        if let Some(per_second) = self.probes_per_second {
            settings = settings.with_probes_per_second(per_second);
        }
        if let Some(policy) = self.on_cancel {
            settings = settings.with_cancel_policy(policy);
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Load targets into `scanner` from whichever source was given.
    fn load_targets(&self, scanner: &mut Scanner) -> CliResult<usize> {
        if let Some(path) = &self.input {
            return Ok(scanner.load_from_file(path)?);
        }
        if let Some(range) = &self.range {
            return Ok(scanner.load_range(range)?);
        }

        let stdin = io::stdin();
        if stdin.is_terminal() {
            return Err(CliError::Other(
                "no targets: use --input, --range, or pipe addresses on stdin".to_string(),
            ));
        }
        Ok(scanner.load_from_reader(stdin.lock())?)
    }

    /// Run the scan and render the report.
    ///
    /// Ctrl-C cancels the run; the partial report is still rendered.
    pub async fn execute(&self) -> CliResult<ScanReport> {
        let settings = self.settings()?;
        let mut scanner = Scanner::new(settings)?;
        if self.progress {
            scanner = scanner.with_progress();
        }

        let count = self.load_targets(&mut scanner)?;
        if count == 0 {
            output::print_warning("No valid targets to scan.");
        } else if self.format == OutputFormat::Plain && self.out.is_none() {
            output::print_info(&format!(
                "Scanning {} targets on ports {:?}",
                count,
                scanner.settings().ports
            ));
        }

        let strategy = Arc::new(TcpConnectStrategy::new(Duration::from_millis(self.timeout)));
        let cancel = CancelToken::new();
        let interrupt = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupt received, cancelling scan");
                    cancel.cancel();
                }
            })
        };

        let result = scanner.scan(strategy, &cancel).await;
        interrupt.abort();
        let mut report = result?;
        report.sort_hosts();

        match &self.out {
            Some(path) => {
                output::write_to_file(&report, path, self.format)?;
                output::print_success(&format!("Results written to {}", path.display()));
            }
            None => output::print_results(&report, self.format)?,
        }
        output::print_info(&report.summary());

        Ok(report)
    }
}
