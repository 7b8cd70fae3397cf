//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::model::{Host, Node};
use crate::scanner::ScanReport;
use console::{style, Style};
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────";

/// Styles for one render. Uncolored output never emits escape codes.
struct Palette {
    colored: bool,
}

impl Palette {
    fn get(&self, style: Style) -> Style {
        if self.colored {
            style
        } else {
            style.force_styling(false)
        }
    }

    fn frame(&self) -> Style {
        self.get(Style::new().cyan())
    }

    fn label(&self) -> Style {
        self.get(Style::new().bold())
    }

    fn dim(&self) -> Style {
        self.get(Style::new().dim())
    }

    fn found(&self) -> Style {
        self.get(Style::new().green().bold())
    }

    fn failed(&self) -> Style {
        self.get(Style::new().red())
    }

    fn warn(&self) -> Style {
        self.get(Style::new().yellow())
    }
}

/// Write results in human-readable plain text format.
pub fn write_plain<W: Write>(report: &ScanReport, colored: bool, out: &mut W) -> io::Result<()> {
    let p = Palette { colored };

    writeln!(out)?;
    writeln!(out, "{}", p.frame().apply_to(RULE))?;
    writeln!(
        out,
        "                    {} Scan Results",
        p.frame().bold().apply_to("aztarna")
    )?;
    writeln!(out, "{}", p.frame().apply_to(RULE))?;
    writeln!(out)?;

    writeln!(out, "  {} {}", p.label().apply_to("Scan ID:"), p.dim().apply_to(report.id.short()))?;
    writeln!(out, "  {} {}", p.label().apply_to("Strategy:"), report.strategy)?;
    writeln!(
        out,
        "  {} {} targets scanned in {:.2}s",
        p.label().apply_to("Statistics:"),
        report.targets,
        report.duration_ms as f64 / 1000.0
    )?;
    writeln!(
        out,
        "              {} found, {} absent, {} errored",
        p.found().apply_to(report.hosts.len()),
        report.absent,
        p.failed().apply_to(report.errored())
    )?;
    if report.duplicates > 0 {
        writeln!(
            out,
            "              {} duplicate targets skipped",
            p.warn().apply_to(report.duplicates)
        )?;
    }
    if report.cancelled {
        writeln!(
            out,
            "  {} {} probes abandoned, {} targets never started",
            p.warn().bold().apply_to("Cancelled:"),
            report.abandoned,
            report.not_started
        )?;
    }
    writeln!(out)?;

    if report.hosts.is_empty() {
        writeln!(out, "  {}", p.dim().apply_to("No hosts found."))?;
    }
    for host in &report.hosts {
        write_host(host, &p, out)?;
    }

    if !report.failures.is_empty() {
        writeln!(out, "  {}", p.dim().apply_to(THIN_RULE))?;
        writeln!(out, "  {}", p.label().apply_to("Errors:"))?;
        for failure in &report.failures {
            writeln!(
                out,
                "    {}:{}  {}",
                failure.address,
                failure.port,
                p.failed().apply_to(&failure.error)
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", p.frame().apply_to(RULE))?;
    writeln!(out)?;

    Ok(())
}

fn write_host<W: Write>(host: &Host, p: &Palette, out: &mut W) -> io::Result<()> {
    writeln!(out, "  {}", p.dim().apply_to(THIN_RULE))?;
    writeln!(out, "  {} {}", p.found().apply_to("[+]"), p.label().apply_to(host))?;
    if let Some(banner) = host.banner() {
        writeln!(out, "      {} {}", p.label().apply_to("Banner:"), p.dim().apply_to(truncate_string(banner, 60)))?;
    }

    if !host.nodes().is_empty() {
        writeln!(out, "      {}", p.label().apply_to("Nodes:"))?;
        for node in host.nodes() {
            write_node(node, p, out)?;
        }
    }

    if !host.communications().is_empty() {
        writeln!(out, "      {}", p.label().apply_to("Communications:"))?;
        for comm in host.communications() {
            writeln!(out, "        {}", comm.topic)?;
            let publishers: Vec<&str> = comm.publisher_nodes(host).map(|n| n.name.as_str()).collect();
            let subscribers: Vec<&str> = comm.subscriber_nodes(host).map(|n| n.name.as_str()).collect();
            writeln!(
                out,
                "          {} -> {}",
                join_or_dash(&publishers),
                join_or_dash(&subscribers)
            )?;
        }
    }

    writeln!(out)?;
    Ok(())
}

fn write_node<W: Write>(node: &Node, p: &Palette, out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "        {}  {}",
        node.name,
        p.dim().apply_to(format!("({}:{})", node.address, node.port))
    )?;

    if !node.published_topics.is_empty() {
        writeln!(out, "          Published topics:")?;
        for topic in &node.published_topics {
            writeln!(out, "            * {}", topic)?;
        }
    }
    if !node.subscribed_topics.is_empty() {
        writeln!(out, "          Subscribed topics:")?;
        for topic in &node.subscribed_topics {
            writeln!(out, "            * {}", topic)?;
        }
    }
    if !node.services.is_empty() {
        writeln!(out, "          Services:")?;
        for service in &node.services {
            writeln!(out, "            * {}", service.name)?;
        }
    }
    if !node.parameters.is_empty() {
        writeln!(out, "          Parameters:")?;
        for param in &node.parameters {
            writeln!(
                out,
                "            * {} ({}) = {}",
                param.name,
                param.type_name,
                truncate_string(&param.value, 40)
            )?;
        }
    }

    Ok(())
}

fn join_or_dash(names: &[&str]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    eprintln!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    eprintln!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Truncate a string to a maximum number of characters, adding ellipsis if truncated.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
