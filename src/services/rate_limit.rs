//! Process-local sliding-window counter guarding the login endpoint.
//!
//! Keyed by client IP; non-durable by design (a restart clears it). Entries
//! are evicted by the background sweep, and a full window reset happens
//! lazily on the next attempt after the window has passed.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    first_attempt: Instant,
}

pub struct RateLimiter {
    entries: Mutex<HashMap<String, Window>>,
    max_attempts: u32,
    window: Duration,
}

impl RateLimiter {
    #[must_use]
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_attempts,
            window,
        }
    }

    /// True when another attempt from this key is allowed right now.
    /// Does not record anything; call `record` separately so that the
    /// blocked attempt itself is not counted as a strike.
    pub fn check(&self, key: &str) -> bool {
        let entries = self.entries.lock().expect("rate limiter lock poisoned");

        match entries.get(key) {
            Some(window) if window.first_attempt.elapsed() <= self.window => {
                window.count < self.max_attempts
            }
            _ => true,
        }
    }

    /// Count an attempt, starting a fresh window if the previous one has
    /// expired. Attempts are counted regardless of credential outcome.
    pub fn record(&self, key: &str) {
        let mut entries = self.entries.lock().expect("rate limiter lock poisoned");

        let now = Instant::now();
        entries
            .entry(key.to_string())
            .and_modify(|window| {
                if window.first_attempt.elapsed() > self.window {
                    window.count = 1;
                    window.first_attempt = now;
                } else {
                    window.count += 1;
                }
            })
            .or_insert(Window {
                count: 1,
                first_attempt: now,
            });
    }

    /// Evict entries whose window has passed. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut entries = self.entries.lock().expect("rate limiter lock poisoned");

        let before = entries.len();
        entries.retain(|_, window| window.first_attempt.elapsed() <= self.window);
        before - entries.len()
    }

    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.entries.lock().expect("rate limiter lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_max_attempts() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1"));
            limiter.record("10.0.0.1");
        }

        assert!(!limiter.check("10.0.0.1"));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        limiter.record("10.0.0.1");
        assert!(!limiter.check("10.0.0.1"));
        assert!(limiter.check("10.0.0.2"));
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));

        limiter.record("10.0.0.1");
        assert!(!limiter.check("10.0.0.1"));

        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.check("10.0.0.1"));

        // A new attempt starts a fresh window rather than extending the old one.
        limiter.record("10.0.0.1");
        assert!(!limiter.check("10.0.0.1"));
    }

    #[test]
    fn sweep_removes_stale_entries_only() {
        let limiter = RateLimiter::new(5, Duration::from_millis(10));

        limiter.record("stale");
        std::thread::sleep(Duration::from_millis(20));
        limiter.record("fresh");

        let removed = limiter.sweep();
        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked_keys(), 1);
        assert!(limiter.check("fresh"));
    }
}
