// Per-user token bucket for mutating routes

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::ApiConfig;

/// How often idle buckets are swept out of the map
const PRUNE_EVERY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Debug)]
struct Buckets {
    by_user: HashMap<Uuid, Bucket>,
    last_prune: Instant,
}

#[derive(Debug)]
pub struct RateLimiter {
    buckets: Mutex<Buckets>,
    capacity: f64,
    refill_per_sec: f64,
}

impl RateLimiter {
    pub fn new(burst: u32, per_minute: u32) -> Self {
        Self {
            buckets: Mutex::new(Buckets {
                by_user: HashMap::new(),
                last_prune: Instant::now(),
            }),
            capacity: f64::from(burst.max(1)),
            refill_per_sec: f64::from(per_minute) / 60.0,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.rate_limit_burst, config.rate_limit_per_minute)
    }

    pub async fn allow(&self, user_id: Uuid) -> bool {
        self.allow_at(user_id, Instant::now()).await
    }

    fn refilled(&self, bucket: &Bucket, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity)
    }

    /// Take one token for `user_id` as of `now`
    pub async fn allow_at(&self, user_id: Uuid, now: Instant) -> bool {
        let mut buckets = self.buckets.lock().await;

        // A full bucket is indistinguishable from a fresh one, so it can go
        if now.saturating_duration_since(buckets.last_prune) >= PRUNE_EVERY {
            let before = buckets.by_user.len();
            buckets
                .by_user
                .retain(|_, bucket| self.refilled(bucket, now) < self.capacity);
            buckets.last_prune = now;
            tracing::trace!(
                "Rate limiter pruned {} idle bucket(s)",
                before - buckets.by_user.len()
            );
        }

        let capacity = self.capacity;
        let bucket = buckets.by_user.entry(user_id).or_insert(Bucket {
            tokens: capacity,
            last_refill: now,
        });
        let tokens = self.refilled(bucket, now);
        bucket.last_refill = now;
        bucket.tokens = tokens;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            tracing::debug!("Rate limit hit for user {}", user_id);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn tracked_users(limiter: &RateLimiter) -> usize {
        limiter.buckets.lock().await.by_user.len()
    }

    #[tokio::test]
    async fn test_burst_then_refill() {
        let limiter = RateLimiter::new(3, 60);
        let user = Uuid::new_v4();
        let start = Instant::now();

        for _ in 0..3 {
            assert!(limiter.allow_at(user, start).await);
        }
        assert!(!limiter.allow_at(user, start).await);

        // 60 per minute refills one token per second
        assert!(limiter.allow_at(user, start + Duration::from_secs(1)).await);
        assert!(!limiter.allow_at(user, start + Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_buckets_are_per_user() {
        let limiter = RateLimiter::new(1, 1);
        let start = Instant::now();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert!(limiter.allow_at(a, start).await);
        assert!(!limiter.allow_at(a, start).await);
        assert!(limiter.allow_at(b, start).await);
    }

    #[tokio::test]
    async fn test_refill_never_exceeds_burst() {
        let limiter = RateLimiter::new(2, 600);
        let user = Uuid::new_v4();
        let start = Instant::now();

        assert!(limiter.allow_at(user, start).await);
        let later = start + Duration::from_secs(3600);
        assert!(limiter.allow_at(user, later).await);
        assert!(limiter.allow_at(user, later).await);
        assert!(!limiter.allow_at(user, later).await);
    }

    #[tokio::test]
    async fn test_idle_full_buckets_are_evicted() {
        let limiter = RateLimiter::new(2, 60);
        let start = Instant::now();
        let idle = Uuid::new_v4();
        let active = Uuid::new_v4();

        assert!(limiter.allow_at(idle, start).await);
        assert_eq!(tracked_users(&limiter).await, 1);

        // A minute later the idle bucket has refilled completely
        assert!(limiter.allow_at(active, start + Duration::from_secs(61)).await);
        assert_eq!(tracked_users(&limiter).await, 1);
    }

    #[tokio::test]
    async fn test_drained_buckets_survive_pruning() {
        let limiter = RateLimiter::new(2, 1);
        let start = Instant::now();
        let drained = Uuid::new_v4();

        assert!(limiter.allow_at(drained, start).await);
        assert!(limiter.allow_at(drained, start).await);

        let later = start + Duration::from_secs(61);
        assert!(limiter.allow_at(Uuid::new_v4(), later).await);
        assert_eq!(tracked_users(&limiter).await, 2);
        // One token came back in that minute, not two
        assert!(limiter.allow_at(drained, later).await);
        assert!(!limiter.allow_at(drained, later).await);
    }
}
