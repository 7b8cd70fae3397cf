//! Scan run results.

use crate::model::Host;
use crate::scanner::traits::ProbeOutcome;
use crate::types::ScanId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// A target whose probes failed without finding the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeFailure {
    pub address: Ipv4Addr,
    /// Port of the first failed probe.
    pub port: u16,
    pub error: String,
}

/// Outcome of one scan run.
///
/// Host order follows probe completion, not input order. Call
/// [`ScanReport::sort_hosts`] for a deterministic listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Unique identifier for this run.
    pub id: ScanId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Name of the strategy that ran the probes.
    pub strategy: String,
    /// Number of targets handed to the run, duplicates included.
    pub targets: usize,
    /// Probes actually started.
    pub launched: usize,
    /// Hosts where the service was found.
    pub hosts: Vec<Host>,
    /// Targets that answered without the service.
    pub absent: usize,
    /// Targets whose probes failed.
    pub failures: Vec<ProbeFailure>,
    /// Repeated addresses that were skipped.
    pub duplicates: usize,
    /// In-flight probes aborted by cancellation.
    pub abandoned: usize,
    /// Targets never started because the run was cancelled.
    pub not_started: usize,
    pub cancelled: bool,
    pub duration_ms: u64,
}

impl ScanReport {
    /// Start a report for a run.
    pub fn new(strategy: impl Into<String>, targets: usize) -> Self {
        let now = Utc::now();
        Self {
            id: ScanId::new(),
            started_at: now,
            completed_at: now,
            strategy: strategy.into(),
            targets,
            launched: 0,
            hosts: Vec::new(),
            absent: 0,
            failures: Vec::new(),
            duplicates: 0,
            abandoned: 0,
            not_started: 0,
            cancelled: false,
            duration_ms: 0,
        }
    }

    /// Record the final outcome for one address.
    pub fn record(&mut self, address: Ipv4Addr, outcome: ProbeOutcome) {
        match outcome {
            ProbeOutcome::Found(host) => self.hosts.push(host),
            ProbeOutcome::Absent => self.absent += 1,
            ProbeOutcome::Failed { port, error } => self.failures.push(ProbeFailure {
                address,
                port,
                error: error.to_string(),
            }),
        }
    }

    /// Stamp the completion time.
    pub fn finalize(mut self) -> Self {
        self.completed_at = Utc::now();
        self.duration_ms = (self.completed_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;
        self
    }

    /// Number of targets that errored.
    pub fn errored(&self) -> usize {
        self.failures.len()
    }

    /// Order hosts by address.
    pub fn sort_hosts(&mut self) {
        self.hosts.sort_by_key(|h| h.address());
    }

    pub fn host(&self, address: Ipv4Addr) -> Option<&Host> {
        self.hosts.iter().find(|h| h.address() == address)
    }

    /// Get a short summary of the run.
    pub fn summary(&self) -> String {
        format!(
            "{} targets - {} found, {} absent, {} errored{} [{:.2}s]",
            self.targets,
            self.hosts.len(),
            self.absent,
            self.errored(),
            if self.cancelled { ", cancelled" } else { "" },
            self.duration_ms as f64 / 1000.0
        )
    }
}
