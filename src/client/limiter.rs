//! Token-bucket rate limiter for venue request/response calls.
//!
//! Venues meter REST traffic aggressively; snapshot refetch storms during a
//! resynchronization burst must not trip the venue's ban thresholds. Each
//! [`VenueSession`](crate::session::VenueSession) owns one limiter and every
//! request/response path on that session draws from the same bucket — the
//! budget is per (venue, credentials), never global.
//!
//! Uses `tokio::time::Instant` so tests can drive the clock with a paused
//! runtime.

use parking_lot::Mutex;
use tokio::time::{sleep, Duration, Instant};

use crate::config::RateLimit;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket: `burst` capacity refilled at `per_second` tokens per second
#[derive(Debug)]
pub struct RateLimiter {
    burst: f64,
    per_second: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Create a full bucket from a venue's rate-limit budget
    #[must_use]
    pub fn new(limit: RateLimit) -> Self {
        Self {
            burst: f64::from(limit.burst),
            per_second: limit.per_second,
            bucket: Mutex::new(Bucket {
                tokens: f64::from(limit.burst),
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(&self, bucket: &mut Bucket, now: Instant) {
        let elapsed = now.saturating_duration_since(bucket.last_refill);
        bucket.tokens = (bucket.tokens + elapsed.as_secs_f64() * self.per_second).min(self.burst);
        bucket.last_refill = now;
    }

    /// Take `n` tokens if available, without waiting
    pub fn try_acquire(&self, n: u32) -> bool {
        let n = f64::from(n);
        debug_assert!(n <= self.burst);

        let mut bucket = self.bucket.lock();
        self.refill(&mut bucket, Instant::now());
        if bucket.tokens >= n {
            bucket.tokens -= n;
            true
        } else {
            false
        }
    }

    /// Take `n` tokens, sleeping until the bucket refills far enough.
    ///
    /// The lock is only held to inspect and update the bucket, never across
    /// the sleep.
    pub async fn acquire(&self, n: u32) {
        let need = f64::from(n);
        debug_assert!(need <= self.burst);

        loop {
            let shortfall = {
                let mut bucket = self.bucket.lock();
                self.refill(&mut bucket, Instant::now());
                if bucket.tokens >= need {
                    bucket.tokens -= need;
                    return;
                }
                need - bucket.tokens
            };
            sleep(Duration::from_secs_f64(shortfall / self.per_second)).await;
        }
    }
}
