//! Scan telemetry.
//!
//! The scanner reports what happens during a run to a [`ScanObserver`]
//! handed to it at construction instead of logging through shared global
//! state. [`TracingObserver`] is the default and forwards every event to
//! `tracing`.

use crate::error::ProbeError;
use crate::model::Host;
use crate::scanner::ScanReport;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Receives events from address population and scan runs.
///
/// All methods default to doing nothing so implementors only override what
/// they care about.
pub trait ScanObserver: Send + Sync {
    /// A line of target input could not be parsed and was skipped.
    fn invalid_target(&self, _line_number: usize, _line: &str) {}

    /// An address already scanned in this run was skipped.
    fn duplicate_target(&self, _address: Ipv4Addr) {}

    /// A probe acquired a concurrency slot and started.
    fn probe_started(&self, _address: Ipv4Addr) {}

    /// A probe found the service.
    fn host_found(&self, _host: &Host) {}

    /// A probe completed without finding the service.
    fn host_absent(&self, _address: Ipv4Addr) {}

    /// A probe failed on one port of an address.
    fn probe_failed(&self, _address: Ipv4Addr, _port: u16, _error: &ProbeError) {}

    /// The concurrency ceiling was changed.
    fn rate_changed(&self, _old: usize, _new: usize) {}

    /// Cancellation was observed by the scheduler.
    fn scan_cancelled(&self, _pending: usize) {}

    /// A run finished, possibly partially.
    fn scan_finished(&self, _report: &ScanReport) {}
}

/// A shared observer handle.
pub type SharedObserver = Arc<dyn ScanObserver>;

/// Logs scan events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ScanObserver for TracingObserver {
    fn invalid_target(&self, line_number: usize, line: &str) {
        tracing::warn!(line = line_number, input = %line, "Invalid IP address in target input");
    }

    fn duplicate_target(&self, address: Ipv4Addr) {
        tracing::warn!(address = %address, "Duplicate target skipped");
    }

    fn probe_started(&self, address: Ipv4Addr) {
        tracing::trace!(address = %address, "Probe started");
    }

    fn host_found(&self, host: &Host) {
        tracing::info!(
            address = %host.address(),
            port = host.port(),
            nodes = host.nodes().len(),
            "Service discovered"
        );
    }

    fn host_absent(&self, address: Ipv4Addr) {
        tracing::debug!(address = %address, "No service found");
    }

    fn probe_failed(&self, address: Ipv4Addr, port: u16, error: &ProbeError) {
        tracing::debug!(address = %address, port, error = %error, "Probe failed");
    }

    fn rate_changed(&self, old: usize, new: usize) {
        tracing::info!(old, new, "Concurrency ceiling changed");
    }

    fn scan_cancelled(&self, pending: usize) {
        tracing::warn!(pending, "Scan cancelled, no further probes will start");
    }

    fn scan_finished(&self, report: &ScanReport) {
        tracing::info!(
            scan_id = %report.id,
            targets = report.targets,
            found = report.hosts.len(),
            absent = report.absent,
            errored = report.failures.len(),
            cancelled = report.cancelled,
            duration_ms = report.duration_ms,
            "Scan complete"
        );
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records events for assertions.
    #[derive(Default)]
    pub struct RecordingObserver {
        pub invalid: Mutex<Vec<(usize, String)>>,
        pub failures: Mutex<Vec<(Ipv4Addr, u16)>>,
        pub rates: Mutex<Vec<(usize, usize)>>,
        pub finished: Mutex<usize>,
    }

    impl ScanObserver for RecordingObserver {
        fn invalid_target(&self, line_number: usize, line: &str) {
            self.invalid.lock().unwrap().push((line_number, line.to_string()));
        }

        fn probe_failed(&self, address: Ipv4Addr, port: u16, _error: &ProbeError) {
            self.failures.lock().unwrap().push((address, port));
        }

        fn rate_changed(&self, old: usize, new: usize) {
            self.rates.lock().unwrap().push((old, new));
        }

        fn scan_finished(&self, _report: &ScanReport) {
            *self.finished.lock().unwrap() += 1;
        }
    }
}
