//! Target population.
//!
//! Turns user input into the ordered list of IPv4 addresses to probe:
//! - Files or piped streams with one address per line
//! - CIDR ranges (192.168.1.0/24), a /32 collapsing to a single host
//!
//! Bad lines are reported to the [`ScanObserver`] and skipped. Range errors
//! are configuration errors and fail before anything is probed.

use crate::error::{TargetError, TargetResult};
use crate::observer::ScanObserver;
use ipnetwork::Ipv4Network;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::Ipv4Addr;
use std::path::Path;

/// Widest range that will be expanded (a /8).
pub const MAX_RANGE_HOSTS: u64 = 1 << 24;

/// Read targets from any line-oriented source.
///
/// Each line is parsed on its own. Surrounding whitespace is trimmed and blank
/// lines are ignored. Lines that are not IPv4 addresses are reported through
/// `observer` and skipped. Duplicates are kept in input order.
pub fn load_from_reader<R: BufRead>(
    reader: R,
    observer: &dyn ScanObserver,
) -> TargetResult<Vec<Ipv4Addr>> {
    let mut targets = Vec::new();

    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        let line = String::from_utf8_lossy(&line);
        let candidate = line.trim();
        if candidate.is_empty() {
            continue;
        }

        match candidate.parse::<Ipv4Addr>() {
            Ok(address) => targets.push(address),
            Err(_) => observer.invalid_target(index + 1, candidate),
        }
    }

    Ok(targets)
}

/// Read targets from a file, one address per line.
pub fn load_from_file(
    path: impl AsRef<Path>,
    observer: &dyn ScanObserver,
) -> TargetResult<Vec<Ipv4Addr>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TargetError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    load_from_reader(BufReader::new(file), observer)
}

/// Expand a CIDR specification into usable host addresses.
///
/// A bare address is treated as a /32. Host bits in the address part are
/// ignored, so `10.0.0.7/24` expands the same as `10.0.0.0/24`. Network and
/// broadcast addresses are excluded for prefixes up to /30; a /31 yields both
/// of its addresses as a point-to-point link.
pub fn load_range(spec: &str) -> TargetResult<Vec<Ipv4Addr>> {
    let spec = spec.trim();
    let network: Ipv4Network = spec
        .parse()
        .map_err(|_| TargetError::InvalidRange(spec.to_string()))?;

    let prefix = network.prefix();
    let size = 1u64 << (32 - u32::from(prefix));
    if size > MAX_RANGE_HOSTS {
        return Err(TargetError::RangeTooLarge(size, MAX_RANGE_HOSTS));
    }

    let first = u32::from(network.network());
    let last = u32::from(network.broadcast());

    let targets = match prefix {
        32 => vec![network.ip()],
        31 => vec![Ipv4Addr::from(first), Ipv4Addr::from(last)],
        _ => (first + 1..last).map(Ipv4Addr::from).collect(),
    };

    Ok(targets)
}
