//! Output formatting module.
//!
//! Renders a [`ScanReport`] as plain text, JSON, or CSV, either to stdout or
//! to a file.

mod csv_format;
mod json_format;
mod plain;

pub use plain::{print_error, print_info, print_success, print_warning};

use crate::cli::OutputFormat;
use crate::scanner::ScanReport;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Render `report` in `format` to an arbitrary writer.
///
/// `colored` only affects plain text.
pub fn format_results<W: Write>(
    report: &ScanReport,
    format: OutputFormat,
    colored: bool,
    out: &mut W,
) -> io::Result<()> {
    match format {
        OutputFormat::Plain => plain::write_plain(report, colored, out),
        OutputFormat::Json => json_format::write_json(report, out),
        OutputFormat::Csv => csv_format::write_csv(report, out),
    }
}

/// Format and print scan results to stdout.
pub fn print_results(report: &ScanReport, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    format_results(report, format, true, &mut out)?;
    out.flush()
}

/// Write scan results to `path`, replacing any existing file.
pub fn write_to_file(report: &ScanReport, path: &Path, format: OutputFormat) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    format_results(report, format, false, &mut out)?;
    out.flush()
}
