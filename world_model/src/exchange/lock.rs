//! Exclusive lock for export/import with an expiring token.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::warn;
use uuid::Uuid;

use crate::error::ExchangeError;

/// Proof of holding the lock at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockToken {
    pub id: Uuid,
    pub acquired_at: Instant,
}

/// Serializes export/import runs. A holder older than `stale_after` is
/// presumed dead and may be displaced.
#[derive(Debug)]
pub struct ExchangeLock {
    holder: Mutex<Option<LockToken>>,
    stale_after: Duration,
}

impl ExchangeLock {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            holder: Mutex::new(None),
            stale_after,
        }
    }

    /// Take the lock, or report how long the current holder has had it.
    pub fn try_acquire(&self) -> Result<LockGuard<'_>, ExchangeError> {
        let mut holder = self.slot();
        if let Some(current) = *holder {
            let held_for = current.acquired_at.elapsed();
            if held_for < self.stale_after {
                return Err(ExchangeError::Busy {
                    held_for_ms: held_for.as_millis(),
                });
            }
            warn!(token = %current.id, held_ms = held_for.as_millis(), "overriding stale exchange lock");
        }

        let token = LockToken {
            id: Uuid::new_v4(),
            acquired_at: Instant::now(),
        };
        *holder = Some(token);
        Ok(LockGuard { lock: self, token })
    }

    pub fn is_held(&self) -> bool {
        self.slot().is_some()
    }

    /// Release only if `token` is still the holder; a displaced guard must not
    /// free its successor's lock.
    fn release(&self, token: LockToken) {
        let mut holder = self.slot();
        if holder.map(|t| t.id) == Some(token.id) {
            *holder = None;
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<LockToken>> {
        self.holder.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Holds the exchange lock until dropped.
#[derive(Debug)]
pub struct LockGuard<'a> {
    lock: &'a ExchangeLock,
    token: LockToken,
}

impl LockGuard<'_> {
    pub fn token(&self) -> LockToken {
        self.token
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release(self.token);
    }
}
