//! Reactive rate limiting for the upstream API
//!
//! The limiter stays dormant until the upstream answers 429 once; from then
//! on every request of the process waits for a permit.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;

/// Default rate once throttling kicks in (requests per second)
pub const DEFAULT_RATE_PER_SECOND: u32 = 6;

/// Rate limiter that only activates after a 429.
pub struct ReactiveRateLimiter {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    active: AtomicBool,
    rate_per_second: u32,
}

impl Default for ReactiveRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_PER_SECOND)
    }
}

impl ReactiveRateLimiter {
    /// Create a dormant limiter allowing `rate_per_second` once active.
    pub fn new(rate_per_second: u32) -> Self {
        let rate = NonZeroU32::new(rate_per_second).unwrap_or(NonZeroU32::MIN);

        Self {
            limiter: RateLimiter::direct(Quota::per_second(rate)),
            active: AtomicBool::new(false),
            rate_per_second: rate.get(),
        }
    }

    /// Activate rate limiting (called on 429).
    pub fn activate(&self) {
        let was_active = self.active.swap(true, Ordering::SeqCst);
        if !was_active {
            debug!(
                "Upstream rate limiting activated at {} req/s",
                self.rate_per_second
            );
        }
    }

    /// Check if rate limiting is active.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait for permission if rate limiting is active.
    pub async fn wait_if_active(&self) {
        if self.is_active() {
            self.limiter.until_ready().await;
        }
    }

    #[cfg(test)]
    pub fn rate_per_second(&self) -> u32 {
        self.rate_per_second
    }
}
