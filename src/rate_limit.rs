use std::{collections::VecDeque, sync::Mutex};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::clock::SharedClock;

pub const DEFAULT_MAX_ATTEMPTS: usize = 5;
pub const DEFAULT_WINDOW_SECS: i64 = 15 * 60;

/// Sliding-window attempt counter. At most `max_attempts` attempts are allowed
/// inside any `window`-long span; the oldest attempt leaving the window frees
/// a slot.
pub struct RateLimiter {
    attempts: VecDeque<DateTime<Utc>>,
    max_attempts: usize,
    window: Duration,
    clock: SharedClock,
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window: Duration, clock: SharedClock) -> Self {
        Self {
            attempts: VecDeque::with_capacity(max_attempts),
            max_attempts,
            window,
            clock,
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        while let Some(&oldest) = self.attempts.front() {
            if now - oldest >= self.window {
                self.attempts.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record an attempt if the window has room for it.
    pub fn can_attempt(&mut self) -> bool {
        let now = self.clock.now();
        self.prune(now);

        if self.attempts.len() >= self.max_attempts {
            return false;
        }

        self.attempts.push_back(now);
        true
    }

    /// Time until the next attempt would be allowed. Zero when not blocked.
    pub fn remaining_time(&mut self) -> Duration {
        let now = self.clock.now();
        self.prune(now);

        if self.attempts.len() < self.max_attempts {
            return Duration::zero();
        }

        match self.attempts.front() {
            Some(&oldest) => (oldest + self.window - now).max(Duration::zero()),
            None => Duration::zero(),
        }
    }

    pub fn reset(&mut self) {
        self.attempts.clear();
    }

    /// True when no attempt is left inside the window.
    fn is_idle(&mut self) -> bool {
        self.prune(self.clock.now());
        self.attempts.is_empty()
    }
}

/// One [`RateLimiter`] per client key. Keys with no attempt left in the window
/// are swept at most once per window.
pub struct KeyedRateLimiter {
    limiters: DashMap<String, RateLimiter>,
    max_attempts: usize,
    window: Duration,
    clock: SharedClock,
    last_sweep: Mutex<DateTime<Utc>>,
}

/// Outcome of a keyed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttle {
    Allowed,
    Blocked { retry_after_secs: u64 },
}

impl KeyedRateLimiter {
    pub fn new(max_attempts: usize, window: Duration, clock: SharedClock) -> Self {
        Self {
            limiters: DashMap::new(),
            max_attempts,
            window,
            last_sweep: Mutex::new(clock.now()),
            clock,
        }
    }

    pub fn check(&self, key: &str) -> Throttle {
        self.maybe_cleanup();

        let mut limiter = self.limiters.entry(key.to_string()).or_insert_with(|| {
            RateLimiter::new(self.max_attempts, self.window, self.clock.clone())
        });

        if limiter.can_attempt() {
            return Throttle::Allowed;
        }

        // round up so clients never retry a second too early
        let remaining = limiter.remaining_time();
        let secs = remaining.num_seconds() + i64::from(remaining.subsec_nanos() > 0);
        Throttle::Blocked {
            retry_after_secs: secs.max(1) as u64,
        }
    }

    pub fn reset(&self, key: &str) {
        self.limiters.remove(key);
    }

    /// Drop every key whose attempts have all left the window.
    pub fn cleanup(&self) {
        let before = self.limiters.len();
        self.limiters.retain(|_, limiter| !limiter.is_idle());
        let dropped = before.saturating_sub(self.limiters.len());
        if dropped > 0 {
            tracing::debug!(dropped, "idle rate limiters removed");
        }
    }

    fn maybe_cleanup(&self) {
        let now = self.clock.now();
        {
            let mut last = self
                .last_sweep
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if now - *last < self.window {
                return;
            }
            *last = now;
        }
        self.cleanup();
    }

    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }
}
