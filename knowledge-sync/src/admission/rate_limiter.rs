//! Sliding-window rate limiter for index operations.
//!
//! Only operations that start indexing work are admitted through the limiter. Removals
//! relieve load on the index and bypass it.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Default number of admissions allowed per window.
pub const DEFAULT_MAX_PER_WINDOW: usize = 30;

/// Default trailing window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Configuration for the rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum admissions within the trailing window.
    pub max_per_window: usize,
    /// Length of the trailing window.
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_per_window: DEFAULT_MAX_PER_WINDOW,
            window: DEFAULT_WINDOW,
        }
    }
}

/// Bounds how many operations may start within a trailing window.
///
/// Admitted operations are kept as a FIFO of timestamps; entries that have left the window
/// are evicted lazily on each check. A denied caller is never blocked.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    admitted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            admitted: Mutex::new(VecDeque::with_capacity(config.max_per_window)),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        self.admitted.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn evict_expired(&self, admitted: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = admitted.front() {
            if now.duration_since(*oldest) > self.config.window {
                admitted.pop_front();
            } else {
                break;
            }
        }
    }

    /// Admit one operation if the window has room, recording it.
    pub fn can_proceed(&self) -> bool {
        let now = Instant::now();
        let mut admitted = self.lock();
        self.evict_expired(&mut admitted, now);

        if admitted.len() >= self.config.max_per_window {
            debug!(
                current_rate = admitted.len(),
                max_rate = self.config.max_per_window,
                "Rate limit reached"
            );
            return false;
        }

        admitted.push_back(now);
        true
    }

    /// Number of admissions in the current window.
    pub fn current_rate(&self) -> usize {
        let now = Instant::now();
        let mut admitted = self.lock();
        self.evict_expired(&mut admitted, now);
        admitted.len()
    }

    /// Configured admissions per window.
    pub fn max_rate(&self) -> usize {
        self.config.max_per_window
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimiterConfig::default())
    }
}
