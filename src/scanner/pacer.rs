//! Launch pacing for scans.
//!
//! Provides token bucket rate limiting on how fast new probes start, on top
//! of the concurrency ceiling. Useful against targets or networks that react
//! badly to bursts of connections.

use crate::error::{ConfigError, ConfigResult};
use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectLimiter = GovLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Caps the number of probes started per second.
#[derive(Clone)]
pub struct LaunchPacer {
    limiter: Arc<DirectLimiter>,
    per_second: u32,
}

impl LaunchPacer {
    /// Create a pacer allowing `per_second` probe launches each second.
    pub fn new(per_second: u32) -> ConfigResult<Self> {
        let rate = NonZeroU32::new(per_second).ok_or(ConfigError::InvalidPacing)?;
        Ok(Self {
            limiter: Arc::new(GovLimiter::direct(Quota::per_second(rate))),
            per_second,
        })
    }

    /// Wait until another launch is allowed.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for LaunchPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchPacer")
            .field("per_second", &self.per_second)
            .finish()
    }
}
