//! Sliding-window admission control for outbound LLM calls.
//!
//! Admission is decided under a short, synchronous lock so the
//! prune-check-append sequence is atomic across concurrent callers. The
//! lock is never held across an `.await`, which keeps [`RateLimiter::acquire`]
//! cancel-safe: dropping the future mid-wait leaves the window untouched.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

/// Admissions per window when nothing else is configured.
pub const DEFAULT_MAX_REQUESTS: usize = 40;
/// Window length when nothing else is configured.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(60_000);

/// Point-in-time limiter utilization.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimiterStats {
    /// Admissions inside the current trailing window.
    pub in_window: usize,
    /// Window capacity.
    pub max_requests: usize,
    /// Window length in milliseconds.
    pub window_ms: u64,
    /// `in_window / max_requests`, 0.0 to 1.0.
    pub utilization: f64,
}

/// Sliding-window rate limiter.
///
/// Invariant: at the moment any `acquire` returns, at most `max_requests`
/// timestamps lie within the trailing `window`.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

impl RateLimiter {
    /// Creates a limiter admitting `max_requests` per `window`.
    ///
    /// A zero `max_requests` is raised to 1 so `acquire` can always make
    /// progress.
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    fn prune(&self, timestamps: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = timestamps.front() {
            if now.duration_since(oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Tries to admit one request without waiting.
    ///
    /// Returns `Ok(())` when admitted, or the time until the oldest entry
    /// leaves the window.
    fn try_admit(&self) -> Result<(), Duration> {
        let mut timestamps = self
            .timestamps
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        self.prune(&mut timestamps, now);

        if timestamps.len() < self.max_requests {
            timestamps.push_back(now);
            return Ok(());
        }

        let wait = timestamps.front().map_or(Duration::ZERO, |&oldest| {
            self.window.saturating_sub(now.duration_since(oldest))
        });
        Err(wait)
    }

    /// Waits until one more request fits in the window, then records it.
    ///
    /// Waiters that wake together re-check under the lock one at a time, so
    /// a burst drains in order instead of over-admitting.
    pub async fn acquire(&self) {
        loop {
            match self.try_admit() {
                Ok(()) => return,
                Err(wait) => {
                    debug!(wait_ms = wait.as_millis(), "rate limit reached, waiting");
                    tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
                }
            }
        }
    }

    /// Returns true if a request would be admitted right now.
    ///
    /// Does not record anything.
    #[must_use]
    pub fn can_acquire(&self) -> bool {
        let mut timestamps = self
            .timestamps
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.prune(&mut timestamps, Instant::now());
        timestamps.len() < self.max_requests
    }

    /// Returns the current utilization.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> RateLimiterStats {
        let mut timestamps = self
            .timestamps
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.prune(&mut timestamps, Instant::now());
        let in_window = timestamps.len();
        RateLimiterStats {
            in_window,
            max_requests: self.max_requests,
            window_ms: u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX),
            utilization: in_window as f64 / self.max_requests as f64,
        }
    }

    /// Number of admissions inside the trailing window.
    #[must_use]
    pub fn in_window(&self) -> usize {
        self.stats().in_window
    }
}
