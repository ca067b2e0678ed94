use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use dashmap::DashMap;

use crate::errors::{ServerError, ServerResult};

/// How many stale entries a limiter tolerates before sweeping them out
const SWEEP_THRESHOLD: usize = 1024;

/// A fixed window rate limiter, keyed by client
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    slots: DashMap<String, WindowSlot>,
}

struct WindowSlot {
    count: u32,
    window_start: Instant,
}

impl RateLimiter {
    pub fn new(limit: u32) -> Self {
        Self::with_window(limit, Duration::from_secs(60))
    }

    pub fn with_window(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            slots: Default::default(),
        }
    }

    /// Returns true if the request fits in the client's current window
    pub fn allow(&self, key: &str) -> bool {
        let now = Instant::now();

        let allowed = {
            let mut slot = self
                .slots
                .entry(key.to_string())
                .or_insert_with(|| WindowSlot {
                    count: 0,
                    window_start: now,
                });

            if now.duration_since(slot.window_start) >= self.window {
                slot.count = 0;
                slot.window_start = now;
            }

            if slot.count < self.limit {
                slot.count += 1;
                true
            } else {
                false
            }
        };

        self.sweep(now);
        allowed
    }

    /// Like [Self::allow], but as a guard clause for handlers
    pub fn ensure(&self, key: &str) -> ServerResult<()> {
        if self.allow(key) {
            Ok(())
        } else {
            Err(ServerError::RateLimited)
        }
    }

    /// Drops expired windows so one-off clients don't accumulate forever
    fn sweep(&self, now: Instant) {
        if self.slots.len() < SWEEP_THRESHOLD {
            return;
        }

        self.slots
            .retain(|_, slot| now.duration_since(slot.window_start) < self.window);
    }
}

/// One limiter per endpoint group, so a chat flood can't starve the feed
pub struct RateLimits {
    pub auth: RateLimiter,
    pub qr: RateLimiter,
    pub posts: RateLimiter,
    pub likes: RateLimiter,
    pub comments: RateLimiter,
    pub chat: RateLimiter,
    pub analytics: RateLimiter,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            auth: RateLimiter::new(60),
            qr: RateLimiter::new(120),
            posts: RateLimiter::new(120),
            likes: RateLimiter::new(240),
            comments: RateLimiter::new(120),
            chat: RateLimiter::new(60),
            analytics: RateLimiter::new(600),
        }
    }
}

/// Identifies the client behind a request, preferring the address the
/// proxy in front of us recorded
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn requests_over_the_limit_are_denied() {
        let limiter = RateLimiter::new(3);

        for _ in 0..3 {
            assert!(limiter.allow("client-a"));
        }

        assert!(!limiter.allow("client-a"));
        // A different client is unaffected
        assert!(limiter.allow("client-b"));
    }

    #[test]
    fn windows_reset_after_they_elapse() {
        let limiter = RateLimiter::with_window(1, Duration::from_millis(20));

        assert!(limiter.allow("client-a"));
        assert!(!limiter.allow("client-a"));

        sleep(Duration::from_millis(30));
        assert!(limiter.allow("client-a"));
    }

    #[test]
    fn limiters_are_independent() {
        let first = RateLimiter::new(1);
        let second = RateLimiter::new(1);

        assert!(first.allow("client-a"));
        assert!(!first.allow("client-a"));
        assert!(second.allow("client-a"));
    }

    #[test]
    fn post_writes_go_through_their_own_limiter() {
        let limits = RateLimits::default();

        for _ in 0..120 {
            assert!(limits.posts.ensure("client-a").is_ok());
        }

        assert!(matches!(
            limits.posts.ensure("client-a"),
            Err(ServerError::RateLimited)
        ));
    }

    #[test]
    fn client_keys_prefer_the_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());

        assert_eq!(client_key(&headers), "203.0.113.7");
        assert_eq!(client_key(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn blank_client_headers_fall_back_to_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "".parse().unwrap());
        headers.insert("x-real-ip", "".parse().unwrap());

        assert_eq!(client_key(&headers), "unknown");

        headers.insert("x-real-ip", "198.51.100.4".parse().unwrap());
        assert_eq!(client_key(&headers), "198.51.100.4");
    }
}
