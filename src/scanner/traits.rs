//! Scan strategy abstraction.
//!
//! A strategy speaks one middleware protocol. The engine only owns
//! concurrency and batching and never looks inside a probe, so supporting a
//! new protocol means implementing [`ScanStrategy`] and nothing else.

use crate::error::{ProbeError, ProbeResult};
use crate::model::Host;
use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// A single probe invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeRequest {
    pub address: Ipv4Addr,
    pub port: u16,
    /// Deeper, slower probing. Interpretation is up to the strategy.
    pub extended: bool,
}

impl ProbeRequest {
    pub fn new(address: Ipv4Addr, port: u16) -> Self {
        Self {
            address,
            port,
            extended: false,
        }
    }

    /// Enable extended probing.
    pub fn with_extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }
}

/// Trait for protocol-specific probe implementations.
///
/// `Ok(Some(host))` means the service was found and its topology populated,
/// `Ok(None)` means nothing matching listens there, and `Err` is a transport
/// failure. Framing, timeouts and retries inside a probe belong to the
/// strategy.
///
/// # Example
///
/// ```ignore
/// use aztarna::scanner::{ProbeRequest, ScanStrategy};
///
/// async fn is_present<S: ScanStrategy>(strategy: &S, request: ProbeRequest) -> bool {
///     matches!(strategy.probe(request).await, Ok(Some(_)))
/// }
/// ```
#[async_trait]
pub trait ScanStrategy: Send + Sync {
    /// Short identifier used in reports and logs.
    fn name(&self) -> &str;

    /// Probe one address on one port.
    async fn probe(&self, request: ProbeRequest) -> ProbeResult<Option<Host>>;
}

/// A shared strategy for dynamic dispatch across probe tasks.
pub type SharedStrategy = Arc<dyn ScanStrategy>;

/// Final result for one address after every configured port was tried.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// A port yielded a host.
    Found(Host),
    /// Every port answered "no service".
    Absent,
    /// No port yielded a host and at least one failed; holds the first failure.
    Failed { port: u16, error: ProbeError },
}

impl ProbeOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}
