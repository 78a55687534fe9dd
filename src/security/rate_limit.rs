//! Per-route rate limiting.
//!
//! # Responsibilities
//! - Enforce the RateLimitSpec propagated through the config tree
//! - Track one token bucket per client + route
//!
//! # Design Decisions
//! - Token bucket: capacity = spec.max, refill = max / window
//! - Keyed by client address and route URL, so limits are route-scoped
//! - Over-limit requests are rejected before any middleware runs

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use crate::config::schema::RateLimitSpec;

/// A simple token bucket.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Shared limiter consulted by the pipeline for routes that carry a spec.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if the request identified by `key` is within limits.
    pub fn check(&self, key: &str, spec: &RateLimitSpec) -> bool {
        let capacity = f64::from(spec.max);
        let refill_rate = capacity / spec.window_secs.max(1) as f64;

        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(capacity));

        bucket.try_acquire(capacity, refill_rate)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
