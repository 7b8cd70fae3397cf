//! CSV output formatting.
//!
//! One row per discovered node. Hosts without nodes get a single row with
//! empty node columns, and failed targets get a row carrying the error.

use crate::scanner::ScanReport;
use std::io::{self, Write};

const HEADER: [&str; 9] = [
    "address",
    "port",
    "status",
    "node",
    "node_uri",
    "published",
    "subscribed",
    "services",
    "detail",
];

/// Write results in CSV format.
pub fn write_csv<W: Write>(report: &ScanReport, out: &mut W) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(HEADER)?;

    for host in &report.hosts {
        let address = host.address().to_string();
        let port = host.port().to_string();
        let banner = host.banner().unwrap_or("");

        if host.nodes().is_empty() {
            wtr.write_record([address.as_str(), port.as_str(), "found", "", "", "", "", "", banner])?;
            continue;
        }

        for node in host.nodes() {
            let published = join(node.published_topics.iter().map(|t| t.name.as_str()));
            let subscribed = join(node.subscribed_topics.iter().map(|t| t.name.as_str()));
            let services = join(node.services.iter().map(|s| s.name.as_str()));
            let uri = format!("{}:{}", node.address, node.port);
            wtr.write_record([
                address.as_str(),
                port.as_str(),
                "found",
                node.name.as_str(),
                uri.as_str(),
                published.as_str(),
                subscribed.as_str(),
                services.as_str(),
                banner,
            ])?;
        }
    }

    for failure in &report.failures {
        let address = failure.address.to_string();
        let port = failure.port.to_string();
        wtr.write_record([
            address.as_str(),
            port.as_str(),
            "error",
            "",
            "",
            "",
            "",
            "",
            failure.error.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn join<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(";")
}
