//! Concurrency ceiling for in-flight probes.
//!
//! Wraps a tokio [`Semaphore`] that is swapped out whole when the ceiling
//! changes. Permits taken from the previous semaphore keep counting against
//! it until they are released; only acquisitions that start after the swap
//! see the new capacity.

use crate::error::{ConfigError, ConfigResult};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

struct Slots {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A reconfigurable bound on simultaneously active probes.
///
/// Clones share the same state, so a clone can resize the ceiling while a
/// scan is running.
#[derive(Clone)]
pub struct ConcurrencyLimiter {
    slots: Arc<RwLock<Slots>>,
}

impl ConcurrencyLimiter {
    /// Create a limiter allowing `capacity` concurrent probes.
    pub fn new(capacity: usize) -> ConfigResult<Self> {
        validate(capacity)?;
        Ok(Self {
            slots: Arc::new(RwLock::new(Slots {
                semaphore: Arc::new(Semaphore::new(capacity)),
                capacity,
            })),
        })
    }

    /// Current ceiling.
    pub fn capacity(&self) -> usize {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).capacity
    }

    /// Replace the ceiling, returning the previous one.
    pub fn set_capacity(&self, capacity: usize) -> ConfigResult<usize> {
        validate(capacity)?;
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let previous = slots.capacity;
        slots.semaphore = Arc::new(Semaphore::new(capacity));
        slots.capacity = capacity;
        Ok(previous)
    }

    /// Wait for a slot. The slot is released when the permit is dropped.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        self.current().acquire_owned().await
    }

    fn current(&self) -> Arc<Semaphore> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&slots.semaphore)
    }
}

impl std::fmt::Debug for ConcurrencyLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrencyLimiter")
            .field("capacity", &self.capacity())
            .finish()
    }
}

fn validate(capacity: usize) -> ConfigResult<()> {
    if capacity == 0 || capacity > Semaphore::MAX_PERMITS {
        return Err(ConfigError::InvalidRate(capacity));
    }
    Ok(())
}
