//! In-memory flood guard for inbound websocket events.
//!
//! DESIGN
//! ======
//! Sliding-window counters backed by `HashMap<ClientId, VecDeque<Instant>>`.
//! One limit is enforced: at most `limit` inbound events per connection per
//! `window`. A limit of zero disables the guard.
//!
//! The limiter is owned by the hub task, which already serializes every
//! inbound event, so it needs no lock.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::protocol::ClientId;

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitError {
    #[error("per-connection rate limit exceeded (max {limit} events/{window_secs}s)")]
    Exceeded { limit: usize, window_secs: u64 },
}

// =============================================================================
// RATE LIMITER
// =============================================================================

#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    /// Per-connection event timestamps, oldest first.
    events: HashMap<ClientId, VecDeque<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(limit: usize, window: Duration) -> Self {
        Self { limit, window, events: HashMap::new() }
    }

    /// A limiter that admits everything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.limit > 0
    }

    /// Check the connection's window, then record the event.
    ///
    /// # Errors
    ///
    /// Returns `Exceeded` when the connection already used its window.
    pub fn check_and_record(&mut self, client_id: ClientId) -> Result<(), RateLimitError> {
        self.check_and_record_at(client_id, Instant::now())
    }

    /// Check + record with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Returns `Exceeded` when the connection already used its window.
    pub fn check_and_record_at(&mut self, client_id: ClientId, now: Instant) -> Result<(), RateLimitError> {
        if !self.is_enabled() {
            return Ok(());
        }

        let deque = self.events.entry(client_id).or_default();
        prune_window(deque, now, self.window);
        if deque.len() >= self.limit {
            return Err(RateLimitError::Exceeded { limit: self.limit, window_secs: self.window.as_secs() });
        }

        deque.push_back(now);
        Ok(())
    }

    /// Drop a connection's history once it disconnects.
    pub fn forget(&mut self, client_id: ClientId) {
        self.events.remove(&client_id);
    }

    /// Number of connections currently tracked.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.events.len()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn prune_window(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = deque.front() {
        if now.duration_since(front) > window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
