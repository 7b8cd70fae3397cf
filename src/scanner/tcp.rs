//! TCP reachability strategy.
//!
//! Reports a middleware endpoint as present when a TCP connection to the
//! configured port succeeds. It does not speak any middleware protocol, so
//! the hosts it returns carry no nodes. With extended probing enabled it also
//! captures the service banner.

use crate::banner::grab_banner_from_stream;
use crate::error::{ProbeError, ProbeResult};
use crate::model::Host;
use crate::scanner::traits::{ProbeRequest, ScanStrategy};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Connect-only strategy.
///
/// A refused connection means nothing listens there and maps to absence.
/// Timeouts and routing failures are transport errors.
#[derive(Debug, Clone)]
pub struct TcpConnectStrategy {
    timeout: Duration,
    banner_wait: Duration,
}

impl TcpConnectStrategy {
    /// Create a strategy with the given connect timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            banner_wait: timeout,
        }
    }

    /// Set how long extended probes wait for banner data.
    pub fn with_banner_wait(mut self, wait: Duration) -> Self {
        self.banner_wait = wait;
        self
    }

    /// Attempt to connect to the target address.
    async fn attempt_connect(&self, addr: SocketAddr) -> ProbeResult<TcpStream> {
        match timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => {
                Err(ProbeError::ConnectionRefused)
            }
            Ok(Err(e)) => {
                let error_str = e.to_string().to_lowercase();
                if error_str.contains("unreachable") {
                    if error_str.contains("host") {
                        Err(ProbeError::HostUnreachable)
                    } else {
                        Err(ProbeError::NetworkUnreachable(e.to_string()))
                    }
                } else {
                    Err(ProbeError::Io(e))
                }
            }
            Err(_) => Err(ProbeError::Timeout),
        }
    }
}

#[async_trait]
impl ScanStrategy for TcpConnectStrategy {
    fn name(&self) -> &str {
        "tcp-connect"
    }

    async fn probe(&self, request: ProbeRequest) -> ProbeResult<Option<Host>> {
        let addr = SocketAddr::from((request.address, request.port));

        let stream = match self.attempt_connect(addr).await {
            Ok(stream) => stream,
            Err(ProbeError::ConnectionRefused) => return Ok(None),
            Err(e) => return Err(e),
        };

        let host = Host::new(request.address, request.port);
        if request.extended {
            let banner = grab_banner_from_stream(stream, self.banner_wait).await;
            Ok(Some(host.with_banner(banner)))
        } else {
            Ok(Some(host))
        }
    }
}
