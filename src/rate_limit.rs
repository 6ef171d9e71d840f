//! # Rate Limiting
//!
//! Small in-memory sliding-window limiter used by the contact form:
//! at most N attempts per key (client IP) per window. State lives in
//! process memory, which is fine for a single instance; a shared store
//! would be needed to enforce the limit across replicas.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Prune the key map once it grows past this many entries.
const PRUNE_THRESHOLD: usize = 100;

pub struct RateLimiter {
    max_attempts: usize,
    window: Duration,
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Record an attempt for `key`. Returns `false` when the key has
    /// exhausted its budget for the current window.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        // A poisoned lock only means another check panicked mid-update;
        // the timestamp data is still usable.
        let mut attempts = self
            .attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let recent = attempts.entry(key.to_string()).or_default();
        recent.retain(|t| now.duration_since(*t) < self.window);

        if recent.len() >= self.max_attempts {
            return false;
        }
        recent.push(now);

        // Keep the map from growing without bound under many distinct keys.
        if attempts.len() > PRUNE_THRESHOLD {
            let window = self.window;
            attempts.retain(|_, times| {
                times.iter().any(|t| now.duration_since(*t) < window)
            });
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_denies() {
        let limiter = RateLimiter::new(3, Duration::from_secs(3600));

        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(3600));

        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
        assert!(limiter.check("5.6.7.8"));
    }

    #[test]
    fn window_expiry_frees_budget() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));

        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.check("1.2.3.4"));
    }
}
