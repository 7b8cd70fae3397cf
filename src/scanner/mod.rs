//! Scanner module - drives probe strategies across a target population.
//!
//! The [`Scanner`] owns the target list and the concurrency ceiling. A run
//! takes one slot per address, hands the address to a [`ScanStrategy`] on a
//! tokio task, and collects finished tasks back on the scheduling loop, which
//! is the only place the [`ScanReport`] is mutated.

pub mod cancel;
pub mod limiter;
pub mod pacer;
pub mod report;
pub mod tcp;
pub mod traits;

use crate::config::ScanSettings;
use crate::error::{ConfigResult, ProbeError, ProbeResult, ScanError, ScanResult, TargetResult};
use crate::model::Host;
use crate::observer::{SharedObserver, TracingObserver};
use crate::targets;
use futures::FutureExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::any::Any;
use std::collections::HashSet;
use std::io::BufRead;
use std::net::Ipv4Addr;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedSemaphorePermit;
use tokio::task::{JoinError, JoinSet};

pub use cancel::{CancelPolicy, CancelToken};
pub use limiter::ConcurrencyLimiter;
pub use pacer::LaunchPacer;
pub use report::{ProbeFailure, ScanReport};
pub use tcp::TcpConnectStrategy;
pub use traits::{ProbeOutcome, ProbeRequest, ScanStrategy, SharedStrategy};

/// Rate-bounded scan engine.
///
/// The target list is replaced, never extended, by each `load_*` call.
pub struct Scanner {
    settings: ScanSettings,
    targets: Vec<Ipv4Addr>,
    limiter: ConcurrencyLimiter,
    pacer: Option<LaunchPacer>,
    observer: SharedObserver,
    show_progress: bool,
}

impl Scanner {
    /// Create a scanner, failing fast on invalid settings.
    pub fn new(settings: ScanSettings) -> ConfigResult<Self> {
        settings.validate()?;
        let limiter = ConcurrencyLimiter::new(settings.rate)?;
        let pacer = settings.probes_per_second.map(LaunchPacer::new).transpose()?;

        Ok(Self {
            settings,
            targets: Vec::new(),
            limiter,
            pacer,
            observer: Arc::new(TracingObserver),
            show_progress: false,
        })
    }

    /// Route scan events to `observer` instead of `tracing`.
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Show a progress bar while running.
    pub fn with_progress(mut self) -> Self {
        self.show_progress = true;
        self
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Current target list.
    pub fn targets(&self) -> &[Ipv4Addr] {
        &self.targets
    }

    /// Replace the target list.
    pub fn set_targets(&mut self, targets: Vec<Ipv4Addr>) {
        self.targets = targets;
    }

    /// Replace the target list with the addresses in a file.
    ///
    /// Returns the number of targets loaded. The previous list is kept if the
    /// file cannot be read.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> TargetResult<usize> {
        let targets = targets::load_from_file(path, self.observer.as_ref())?;
        Ok(self.replace_targets(targets))
    }

    /// Replace the target list with the addresses read from `reader`.
    pub fn load_from_reader<R: BufRead>(&mut self, reader: R) -> TargetResult<usize> {
        let targets = targets::load_from_reader(reader, self.observer.as_ref())?;
        Ok(self.replace_targets(targets))
    }

    /// Replace the target list with the usable hosts of a CIDR range.
    pub fn load_range(&mut self, spec: &str) -> TargetResult<usize> {
        let targets = targets::load_range(spec)?;
        Ok(self.replace_targets(targets))
    }

    fn replace_targets(&mut self, targets: Vec<Ipv4Addr>) -> usize {
        self.targets = targets;
        self.targets.len()
    }

    /// Current concurrency ceiling.
    pub fn rate(&self) -> usize {
        self.limiter.capacity()
    }

    /// Change the concurrency ceiling, also while a run is in progress.
    ///
    /// Probes already holding a slot finish under the old ceiling; probes
    /// that start waiting for a slot afterwards use the new one.
    pub fn set_rate(&self, rate: usize) -> ConfigResult<()> {
        let previous = self.limiter.set_capacity(rate)?;
        self.observer.rate_changed(previous, rate);
        Ok(())
    }

    /// Scan the loaded target list.
    pub async fn scan(
        &self,
        strategy: SharedStrategy,
        cancel: &CancelToken,
    ) -> ScanResult<ScanReport> {
        self.run(&self.targets, strategy, cancel).await
    }

    /// Probe every address in `targets` with `strategy`.
    ///
    /// Per-target failures never abort the batch. The only errors returned
    /// are engine-fatal ones. Repeated addresses are probed once.
    pub async fn run(
        &self,
        targets: &[Ipv4Addr],
        strategy: SharedStrategy,
        cancel: &CancelToken,
    ) -> ScanResult<ScanReport> {
        let mut report = ScanReport::new(strategy.name(), targets.len());
        let progress = self.progress_bar(targets.len());
        let job = ProbeJob {
            strategy,
            observer: Arc::clone(&self.observer),
            ports: self.settings.ports.clone().into(),
            extended: self.settings.extended,
            timeout: self.settings.probe_timeout(),
        };

        let mut seen = HashSet::with_capacity(targets.len());
        let mut tasks = JoinSet::new();
        let mut interrupted = false;

        for (position, &address) in targets.iter().enumerate() {
            if !seen.insert(address) {
                self.observer.duplicate_target(address);
                report.duplicates += 1;
                if let Some(ref pb) = progress {
                    pb.inc(1);
                }
                continue;
            }

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = self.acquire_slot() => Some(permit?),
            };
            let Some(permit) = permit else {
                seen.remove(&address);
                report.not_started = unstarted(&targets[position..], &seen);
                interrupted = true;
                break;
            };

            self.observer.probe_started(address);
            let job = job.clone();
            tasks.spawn(async move {
                let outcome = job.probe_address(address).await;
                drop(permit);
                (address, outcome)
            });
            report.launched += 1;

            while let Some(joined) = tasks.try_join_next() {
                self.collect(&mut report, joined, progress.as_ref());
            }
        }

        if interrupted {
            self.cancel_in_flight(&mut report, &mut tasks);
        }

        // Cancellation still has to reach probes that are already running.
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled(), if !report.cancelled => None,
                joined = tasks.join_next() => Some(joined),
            };
            match next {
                None => self.cancel_in_flight(&mut report, &mut tasks),
                Some(Some(joined)) => self.collect(&mut report, joined, progress.as_ref()),
                Some(None) => break,
            }
        }

        if let Some(pb) = progress {
            finish_progress(&pb, &report);
        }

        let report = report.finalize();
        self.observer.scan_finished(&report);
        Ok(report)
    }

    /// Stop waiting on in-flight probes according to the cancel policy.
    fn cancel_in_flight(
        &self,
        report: &mut ScanReport,
        tasks: &mut JoinSet<(Ipv4Addr, ProbeOutcome)>,
    ) {
        report.cancelled = true;
        self.observer.scan_cancelled(tasks.len());
        if self.settings.cancel_policy == CancelPolicy::Abort {
            tasks.abort_all();
        }
    }

    async fn acquire_slot(&self) -> ScanResult<OwnedSemaphorePermit> {
        if let Some(ref pacer) = self.pacer {
            pacer.wait().await;
        }
        self.limiter
            .acquire()
            .await
            .map_err(|e| ScanError::Scheduler(e.to_string()))
    }

    fn collect(
        &self,
        report: &mut ScanReport,
        joined: Result<(Ipv4Addr, ProbeOutcome), JoinError>,
        progress: Option<&ProgressBar>,
    ) {
        match joined {
            Ok((address, outcome)) => {
                match &outcome {
                    ProbeOutcome::Found(host) => {
                        self.observer.host_found(host);
                        if let Some(pb) = progress {
                            pb.set_message(format!("Found {}", host));
                        }
                    }
                    ProbeOutcome::Absent => self.observer.host_absent(address),
                    ProbeOutcome::Failed { .. } => {}
                }
                report.record(address, outcome);
            }
            Err(e) if e.is_cancelled() => report.abandoned += 1,
            Err(e) => {
                tracing::error!(error = %e, "Probe task failed");
                report.abandoned += 1;
            }
        }

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(pb)
    }
}

/// Everything a probe task needs, cloned once per task.
#[derive(Clone)]
struct ProbeJob {
    strategy: SharedStrategy,
    observer: SharedObserver,
    ports: Arc<[u16]>,
    extended: bool,
    timeout: Option<Duration>,
}

impl ProbeJob {
    /// Try each configured port in order until one yields a host.
    async fn probe_address(&self, address: Ipv4Addr) -> ProbeOutcome {
        let mut first_failure = None;

        for &port in self.ports.iter() {
            let request = ProbeRequest::new(address, port).with_extended(self.extended);

            match self.probe_once(request).await {
                Ok(Some(host)) => return ProbeOutcome::Found(host),
                Ok(None) => {}
                Err(error) => {
                    self.observer.probe_failed(address, port, &error);
                    if first_failure.is_none() {
                        first_failure = Some((port, error));
                    }
                }
            }
        }

        match first_failure {
            Some((port, error)) => ProbeOutcome::Failed { port, error },
            None => ProbeOutcome::Absent,
        }
    }

    /// One strategy call, bounded by the probe deadline. Panics in the
    /// strategy are contained to the target that caused them.
    async fn probe_once(&self, request: ProbeRequest) -> ProbeResult<Option<Host>> {
        let attempt = AssertUnwindSafe(self.strategy.probe(request)).catch_unwind();

        let caught = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, attempt).await {
                Ok(caught) => caught,
                Err(_) => return Err(ProbeError::Timeout),
            },
            None => attempt.await,
        };

        caught.unwrap_or_else(|panic| Err(ProbeError::Panicked(panic_message(panic.as_ref()))))
    }
}

/// Close out the bar. Targets that never started still count as handled.
fn finish_progress(pb: &ProgressBar, report: &ScanReport) {
    if report.cancelled {
        pb.inc(report.not_started as u64);
        pb.abandon_with_message("Scan cancelled");
    } else {
        pb.finish_with_message("Scan complete");
    }
}

/// Distinct addresses in `rest` that were never handed to a probe.
fn unstarted(rest: &[Ipv4Addr], seen: &HashSet<Ipv4Addr>) -> usize {
    rest.iter()
        .filter(|a| !seen.contains(*a))
        .collect::<HashSet<_>>()
        .len()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::model::{Node, Topic};
    use crate::observer::testing::RecordingObserver;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn addr(last: u8) -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, last)
    }

    fn addrs(count: u8) -> Vec<Ipv4Addr> {
        (1..=count).map(addr).collect()
    }

    fn scanner(settings: ScanSettings) -> Scanner {
        Scanner::new(settings).unwrap()
    }

    /// Records how many probes are inside `probe` at the same time.
    struct Instrumented {
        active: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl Instrumented {
        fn with_delay(delay: Duration) -> Self {
            Self {
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
                delay,
            }
        }
    }

    impl Default for Instrumented {
        fn default() -> Self {
            Self::with_delay(Duration::from_millis(5))
        }
    }

    #[async_trait]
    impl ScanStrategy for Instrumented {
        fn name(&self) -> &str {
            "instrumented"
        }

        async fn probe(&self, request: ProbeRequest) -> ProbeResult<Option<Host>> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(Some(Host::new(request.address, request.port)))
        }
    }

    struct AlwaysAbsent;

    #[async_trait]
    impl ScanStrategy for AlwaysAbsent {
        fn name(&self) -> &str {
            "absent"
        }

        async fn probe(&self, _request: ProbeRequest) -> ProbeResult<Option<Host>> {
            Ok(None)
        }
    }

    /// Fails on one address, finds a host with a small graph everywhere else.
    struct FailsOn(Ipv4Addr);

    #[async_trait]
    impl ScanStrategy for FailsOn {
        fn name(&self) -> &str {
            "fails-on"
        }

        async fn probe(&self, request: ProbeRequest) -> ProbeResult<Option<Host>> {
            if request.address == self.0 {
                return Err(ProbeError::ConnectionRefused);
            }
            let mut host = Host::new(request.address, request.port);
            let mut talker = Node::new("/talker", request.address.to_string(), 40000);
            talker.publishes(Topic::new("/chatter", "std_msgs/String"));
            let mut listener = Node::new("/listener", request.address.to_string(), 40001);
            listener.subscribes(Topic::new("/chatter", "std_msgs/String"));
            host.add_node(talker).map_err(|e| ProbeError::Protocol(e.to_string()))?;
            host.add_node(listener).map_err(|e| ProbeError::Protocol(e.to_string()))?;
            host.synthesize_communications();
            Ok(Some(host))
        }
    }

    /// Never returns.
    struct Stalled;

    #[async_trait]
    impl ScanStrategy for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn probe(&self, _request: ProbeRequest) -> ProbeResult<Option<Host>> {
            std::future::pending().await
        }
    }

    /// Sleeps, then finds a host.
    struct Slow(Duration);

    #[async_trait]
    impl ScanStrategy for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        async fn probe(&self, request: ProbeRequest) -> ProbeResult<Option<Host>> {
            tokio::time::sleep(self.0).await;
            Ok(Some(Host::new(request.address, request.port)))
        }
    }

    /// Only answers on one port.
    struct OnlyPort(u16);

    #[async_trait]
    impl ScanStrategy for OnlyPort {
        fn name(&self) -> &str {
            "only-port"
        }

        async fn probe(&self, request: ProbeRequest) -> ProbeResult<Option<Host>> {
            match request.port {
                p if p == self.0 => Ok(Some(Host::new(request.address, p))),
                1 => Err(ProbeError::Timeout),
                _ => Ok(None),
            }
        }
    }

    struct Panics;

    #[async_trait]
    impl ScanStrategy for Panics {
        fn name(&self) -> &str {
            "panics"
        }

        async fn probe(&self, request: ProbeRequest) -> ProbeResult<Option<Host>> {
            if request.address == addr(1) {
                panic!("malformed reply");
            }
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_rate() {
        let scanner = scanner(ScanSettings::default().with_rate(3));
        let strategy = Arc::new(Instrumented::default());

        let report = scanner
            .run(&addrs(25), strategy.clone(), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(report.hosts.len(), 25);
        assert_eq!(strategy.calls.load(Ordering::SeqCst), 25);
        let peak = strategy.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency {} exceeded rate", peak);
        assert!(peak >= 1);
    }

    #[tokio::test]
    async fn test_lowered_rate_bounds_new_run() {
        let scanner = scanner(ScanSettings::default().with_rate(50));
        scanner.set_rate(2).unwrap();
        assert_eq!(scanner.rate(), 2);

        let strategy = Arc::new(Instrumented::default());
        scanner
            .run(&addrs(12), strategy.clone(), &CancelToken::new())
            .await
            .unwrap();
        assert!(strategy.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_rate_lowered_during_run() {
        let scanner = Arc::new(scanner(ScanSettings::default().with_rate(4)));
        let strategy = Arc::new(Instrumented::with_delay(Duration::from_millis(40)));

        let run = {
            let scanner = Arc::clone(&scanner);
            let strategy = Arc::clone(&strategy);
            tokio::spawn(async move {
                scanner
                    .run(&addrs(16), strategy, &CancelToken::new())
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(strategy.peak.load(Ordering::SeqCst), 4);
        scanner.set_rate(1).unwrap();

        // The old slots, including the one whose wait began before the
        // change, are all released by now.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let transition_peak = strategy.peak.swap(0, Ordering::SeqCst);
        assert!(
            transition_peak <= 5,
            "old slots plus one new slot allowed, saw {}",
            transition_peak
        );

        let report = run.await.unwrap().unwrap();
        assert_eq!(report.hosts.len(), 16);
        assert_eq!(strategy.calls.load(Ordering::SeqCst), 16);
        assert!(!report.cancelled);
        assert_eq!(strategy.peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_rate_is_config_error() {
        let scanner = scanner(ScanSettings::default());
        assert!(matches!(scanner.set_rate(0), Err(ConfigError::InvalidRate(0))));
        assert_eq!(scanner.rate(), 1000);
        assert!(Scanner::new(ScanSettings::default().with_rate(0)).is_err());
    }

    #[test]
    fn test_rate_change_is_observed() {
        let observer = Arc::new(RecordingObserver::default());
        let scanner = scanner(ScanSettings::default()).with_observer(observer.clone());
        scanner.set_rate(10).unwrap();
        assert_eq!(*observer.rates.lock().unwrap(), vec![(1000, 10)]);
    }

    #[tokio::test]
    async fn test_always_absent_completes_empty() {
        let scanner = scanner(ScanSettings::default());
        let report = scanner
            .run(&addrs(10), Arc::new(AlwaysAbsent), &CancelToken::new())
            .await
            .unwrap();

        assert!(report.hosts.is_empty());
        assert_eq!(report.absent, 10);
        assert_eq!(report.errored(), 0);
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_failure_stays_local_to_target() {
        let observer = Arc::new(RecordingObserver::default());
        let scanner = scanner(ScanSettings::default()).with_observer(observer.clone());

        let report = scanner
            .run(&[addr(1), addr(2)], Arc::new(FailsOn(addr(1))), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(report.hosts.len(), 1);
        let host = &report.hosts[0];
        assert_eq!(host.address(), addr(2));
        assert_eq!(host.communications().len(), 1);
        assert_eq!(host.communications()[0].publishers.len(), 1);
        assert_eq!(host.communications()[0].subscribers.len(), 1);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].address, addr(1));
        assert_eq!(report.failures[0].port, 11311);
        assert_eq!(*observer.failures.lock().unwrap(), vec![(addr(1), 11311)]);
        assert_eq!(*observer.finished.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_probe_timeout_frees_slot() {
        let settings = ScanSettings::default()
            .with_rate(2)
            .with_probe_timeout(Duration::from_millis(20));
        let report = scanner(settings)
            .run(&addrs(6), Arc::new(Stalled), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(report.failures.len(), 6);
        assert!(report
            .failures
            .iter()
            .all(|f| f.error == ProbeError::Timeout.to_string()));
    }

    #[tokio::test]
    async fn test_cancel_abort_abandons_in_flight() {
        let settings = ScanSettings::default()
            .with_rate(2)
            .with_cancel_policy(CancelPolicy::Abort);
        let scanner = scanner(settings);
        let cancel = CancelToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            scanner.run(&addrs(10), Arc::new(Stalled), &cancel),
        )
        .await
        .expect("cancelled run must terminate")
        .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.launched, 2);
        assert_eq!(report.abandoned, 2);
        assert_eq!(report.not_started, 8);
        assert!(report.hosts.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_after_last_launch_aborts_stalled() {
        let settings = ScanSettings::default().with_cancel_policy(CancelPolicy::Abort);
        let observer = Arc::new(RecordingObserver::default());
        let scanner = scanner(settings).with_observer(observer.clone());
        let cancel = CancelToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        let report = tokio::time::timeout(
            Duration::from_secs(2),
            scanner.run(&addrs(3), Arc::new(Stalled), &cancel),
        )
        .await
        .expect("cancel must reach probes launched before it")
        .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.launched, 3);
        assert_eq!(report.abandoned, 3);
        assert_eq!(report.not_started, 0);
        assert_eq!(*observer.finished.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cancel_after_last_launch_drains() {
        let scanner = scanner(ScanSettings::default());
        let cancel = CancelToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let report = scanner
            .run(&addrs(3), Arc::new(Slow(Duration::from_millis(100))), &cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.hosts.len(), 3);
        assert_eq!(report.abandoned, 0);
        assert_eq!(report.not_started, 0);
    }

    #[tokio::test]
    async fn test_cancel_drain_keeps_in_flight_results() {
        let scanner = scanner(ScanSettings::default().with_rate(2));
        let cancel = CancelToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let report = scanner
            .run(&addrs(10), Arc::new(Slow(Duration::from_millis(200))), &cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.hosts.len(), 2);
        assert_eq!(report.abandoned, 0);
        assert_eq!(report.not_started, 8);
    }

    #[tokio::test]
    async fn test_cancel_before_start_launches_nothing() {
        let scanner = scanner(ScanSettings::default());
        let cancel = CancelToken::new();
        cancel.cancel();

        let report = scanner
            .run(&addrs(4), Arc::new(AlwaysAbsent), &cancel)
            .await
            .unwrap();
        assert_eq!(report.launched, 0);
        assert_eq!(report.not_started, 4);
    }

    #[tokio::test]
    async fn test_not_started_ignores_repeats() {
        let scanner = scanner(ScanSettings::default());
        let cancel = CancelToken::new();
        cancel.cancel();

        let targets = vec![addr(1), addr(2), addr(1), addr(3), addr(2)];
        let report = scanner
            .run(&targets, Arc::new(AlwaysAbsent), &cancel)
            .await
            .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.not_started, 3);
    }

    #[test]
    fn test_cancelled_progress_reaches_end() {
        let pb = ProgressBar::hidden();
        pb.set_length(10);
        pb.inc(4);

        let mut report = ScanReport::new("test", 10);
        report.cancelled = true;
        report.not_started = 6;
        finish_progress(&pb, &report);

        assert_eq!(pb.position(), 10);
        assert!(pb.is_finished());
    }

    #[tokio::test]
    async fn test_cancelled_run_with_progress() {
        let scanner = scanner(ScanSettings::default()).with_progress();
        let cancel = CancelToken::new();
        cancel.cancel();

        let report = scanner
            .run(&addrs(4), Arc::new(AlwaysAbsent), &cancel)
            .await
            .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.not_started, 4);
    }

    #[test]
    fn test_unstarted_skips_seen_addresses() {
        let seen: HashSet<_> = [addr(1), addr(2)].into_iter().collect();
        let rest = [addr(3), addr(1), addr(3), addr(4), addr(2)];
        assert_eq!(unstarted(&rest, &seen), 2);
    }

    #[tokio::test]
    async fn test_duplicates_probed_once() {
        let scanner = scanner(ScanSettings::default());
        let strategy = Arc::new(Instrumented::default());
        let targets = vec![addr(1), addr(2), addr(1), addr(1)];

        let report = scanner
            .run(&targets, strategy.clone(), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(report.hosts.len(), 2);
        assert_eq!(report.duplicates, 2);
        assert_eq!(strategy.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ports_tried_in_order_until_found() {
        let settings = ScanSettings::default().with_ports(vec![1, 11311, 11312]);
        let report = scanner(settings)
            .run(&[addr(1)], Arc::new(OnlyPort(11312)), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(report.hosts.len(), 1);
        assert_eq!(report.hosts[0].port(), 11312);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_port_failure_without_host_is_error() {
        let settings = ScanSettings::default().with_ports(vec![1, 11311]);
        let report = scanner(settings)
            .run(&[addr(1)], Arc::new(OnlyPort(9)), &CancelToken::new())
            .await
            .unwrap();

        assert!(report.hosts.is_empty());
        assert_eq!(report.absent, 0);
        assert_eq!(report.failures[0].port, 1);
    }

    #[tokio::test]
    async fn test_panicking_probe_is_contained() {
        let report = scanner(ScanSettings::default())
            .run(&addrs(3), Arc::new(Panics), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].error.contains("malformed reply"));
        assert_eq!(report.absent, 2);
    }

    #[tokio::test]
    async fn test_paced_run_completes() {
        let settings = ScanSettings::default().with_probes_per_second(1000);
        let report = scanner(settings)
            .run(&addrs(5), Arc::new(AlwaysAbsent), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(report.absent, 5);
    }

    #[tokio::test]
    async fn test_scan_uses_loaded_targets() {
        let mut scanner = scanner(ScanSettings::default());
        assert_eq!(scanner.load_range("10.0.0.0/29").unwrap(), 6);
        assert_eq!(scanner.load_range("10.0.0.5/32").unwrap(), 1);
        assert_eq!(scanner.targets(), &[addr(5)]);

        let report = scanner
            .scan(Arc::new(Instrumented::default()), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(report.targets, 1);
        assert_eq!(report.hosts[0].address(), addr(5));
    }

    #[test]
    fn test_failed_load_keeps_previous_targets() {
        let mut scanner = scanner(ScanSettings::default());
        scanner.set_targets(vec![addr(7)]);
        assert!(scanner.load_range("not-a-range").is_err());
        assert!(scanner.load_from_file("/nonexistent/aztarna/hosts").is_err());
        assert_eq!(scanner.targets(), &[addr(7)]);
    }

    #[test]
    fn test_reader_replaces_targets() {
        let observer = Arc::new(RecordingObserver::default());
        let mut scanner = scanner(ScanSettings::default()).with_observer(observer.clone());
        scanner.set_targets(addrs(3));

        let loaded = scanner
            .load_from_reader(std::io::Cursor::new("10.0.0.9\nbogus\n"))
            .unwrap();
        assert_eq!(loaded, 1);
        assert_eq!(scanner.targets(), &[addr(9)]);
        assert_eq!(observer.invalid.lock().unwrap().len(), 1);
    }
}
