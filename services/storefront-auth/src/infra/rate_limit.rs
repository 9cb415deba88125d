//! Rate limiter backends.
//!
//! `InMemoryRateLimiter` keeps per-key state in the process: it is exact for a single instance
//! and invisible to every other replica. `RedisRateLimiter` keeps the same counters in Redis so
//! all replicas share them. `AppRateLimiter` picks one at startup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use deadpool_redis::Pool;
use deadpool_redis::redis::{self, AsyncCommands};

use rentdesk_core::clock::Clock;

use crate::domain::repository::RateLimiter;
use crate::domain::types::{RateLimitDecision, RateLimitPolicy};

/// Default interval between opportunistic sweeps of the in-memory table.
pub const DEFAULT_CLEANUP_INTERVAL_SECS: i64 = 300;

// ── In-memory ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    attempts: u32,
    first_attempt: DateTime<Utc>,
    blocked_until: Option<DateTime<Utc>>,
}

impl Entry {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            attempts: 1,
            first_attempt: now,
            blocked_until: None,
        }
    }

    fn is_blocked_at(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until.is_some_and(|until| now < until)
    }

    fn window_elapsed_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.first_attempt > window
    }
}

struct Table {
    entries: HashMap<String, Entry>,
    last_cleanup: DateTime<Utc>,
}

/// Process-local fixed-window limiter with progressive blocking.
///
/// Expired entries are swept on `check` at most once per `cleanup_interval`, so memory stays
/// bounded without a background task.
pub struct InMemoryRateLimiter {
    policy: RateLimitPolicy,
    cleanup_interval: Duration,
    clock: Arc<dyn Clock>,
    table: Mutex<Table>,
}

impl InMemoryRateLimiter {
    pub fn new(policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        Self::with_cleanup_interval(
            policy,
            Duration::seconds(DEFAULT_CLEANUP_INTERVAL_SECS),
            clock,
        )
    }

    pub fn with_cleanup_interval(
        policy: RateLimitPolicy,
        cleanup_interval: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let last_cleanup = clock.now();
        Self {
            policy,
            cleanup_interval,
            clock,
            table: Mutex::new(Table {
                entries: HashMap::new(),
                last_cleanup,
            }),
        }
    }

    /// Record an attempt for `key`.
    pub fn record_attempt(&self, key: &str) -> RateLimitDecision {
        let now = self.clock.now();
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        self.maybe_cleanup(&mut table, now);

        let Some(entry) = table.entries.get_mut(key) else {
            table.entries.insert(key.to_owned(), Entry::fresh(now));
            return RateLimitDecision::Allowed;
        };

        if let Some(until) = entry.blocked_until.filter(|until| now < *until) {
            return RateLimitDecision::Limited {
                retry_after_secs: ceil_secs(until - now),
            };
        }

        if entry.window_elapsed_at(now, self.policy.window) {
            *entry = Entry::fresh(now);
            return RateLimitDecision::Allowed;
        }

        entry.attempts += 1;
        if entry.attempts > self.policy.max_attempts {
            entry.blocked_until = Some(now + self.policy.block);
            tracing::warn!(
                key,
                attempts = entry.attempts,
                block_secs = self.policy.block.num_seconds(),
                "rate limit exceeded; key blocked"
            );
            return RateLimitDecision::Limited {
                retry_after_secs: ceil_secs(self.policy.block),
            };
        }
        RateLimitDecision::Allowed
    }

    /// Drop all state for `key`.
    pub fn reset_key(&self, key: &str) {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .remove(key);
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn maybe_cleanup(&self, table: &mut Table, now: DateTime<Utc>) {
        if now - table.last_cleanup <= self.cleanup_interval {
            return;
        }
        let before = table.entries.len();
        let window = self.policy.window;
        table
            .entries
            .retain(|_, entry| entry.is_blocked_at(now) || !entry.window_elapsed_at(now, window));
        table.last_cleanup = now;
        tracing::debug!(
            removed = before - table.entries.len(),
            remaining = table.entries.len(),
            "rate limiter sweep"
        );
    }
}

impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &str) -> anyhow::Result<RateLimitDecision> {
        Ok(self.record_attempt(key))
    }

    async fn reset(&self, key: &str) -> anyhow::Result<()> {
        self.reset_key(key);
        Ok(())
    }
}

/// Whole seconds, rounded up, never below 1 for a positive duration.
fn ceil_secs(d: Duration) -> u64 {
    let ms = d.num_milliseconds().max(0);
    u64::try_from((ms + 999) / 1000).unwrap_or(0)
}

// ── Redis ────────────────────────────────────────────────────────────────────

/// Shared-store limiter: one attempts counter and one block marker per key, both with TTLs.
///
/// The counter's TTL is the window (set on the first hit), the marker's TTL is the block.
/// Redis expiry replaces the in-memory sweep.
#[derive(Clone)]
pub struct RedisRateLimiter {
    pool: Pool,
    policy: RateLimitPolicy,
    /// Keyspace prefix, e.g. `"ratelimit:send"`.
    prefix: String,
}

impl RedisRateLimiter {
    pub fn new(pool: Pool, policy: RateLimitPolicy, scope: &str) -> Self {
        Self {
            pool,
            policy,
            prefix: format!("ratelimit:{scope}"),
        }
    }

    fn attempts_key(&self, key: &str) -> String {
        format!("{}:{}:attempts", self.prefix, key)
    }

    fn blocked_key(&self, key: &str) -> String {
        format!("{}:{}:blocked", self.prefix, key)
    }
}

impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: &str) -> anyhow::Result<RateLimitDecision> {
        let mut conn = self.pool.get().await.context("redis pool")?;
        let blocked_key = self.blocked_key(key);
        let attempts_key = self.attempts_key(key);

        // -2: no key, -1: no expiry; both mean "not blocked".
        let blocked_ttl: i64 = conn.ttl(&blocked_key).await.context("ttl block marker")?;
        if blocked_ttl > 0 {
            return Ok(RateLimitDecision::Limited {
                retry_after_secs: blocked_ttl as u64,
            });
        }

        // The counter is created with its window TTL in the same transaction as the increment,
        // so it can never outlive the window.
        let (attempts,): (u64,) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&attempts_key)
            .arg(0)
            .arg("EX")
            .arg(ceil_secs(self.policy.window))
            .arg("NX")
            .ignore()
            .incr(&attempts_key, 1)
            .query_async(&mut conn)
            .await
            .context("incr attempts")?;

        if attempts > u64::from(self.policy.max_attempts) {
            let block_secs = ceil_secs(self.policy.block);
            let (): () = conn
                .set_ex(&blocked_key, 1, block_secs)
                .await
                .context("set block marker")?;
            tracing::warn!(key, attempts, block_secs, "rate limit exceeded; key blocked");
            return Ok(RateLimitDecision::Limited {
                retry_after_secs: block_secs,
            });
        }
        Ok(RateLimitDecision::Allowed)
    }

    async fn reset(&self, key: &str) -> anyhow::Result<()> {
        let mut conn = self.pool.get().await.context("redis pool")?;
        let (): () = conn
            .del(vec![self.attempts_key(key), self.blocked_key(key)])
            .await
            .context("delete rate limit keys")?;
        Ok(())
    }
}

// ── Runtime selection ────────────────────────────────────────────────────────

/// The configured limiter backend for one keyspace.
#[derive(Clone)]
pub enum AppRateLimiter {
    Memory(Arc<InMemoryRateLimiter>),
    Redis(RedisRateLimiter),
}

impl RateLimiter for AppRateLimiter {
    async fn check(&self, key: &str) -> anyhow::Result<RateLimitDecision> {
        match self {
            Self::Memory(limiter) => limiter.check(key).await,
            Self::Redis(limiter) => limiter.check(key).await,
        }
    }

    async fn reset(&self, key: &str) -> anyhow::Result<()> {
        match self {
            Self::Memory(limiter) => limiter.reset(key).await,
            Self::Redis(limiter) => limiter.reset(key).await,
        }
    }
}
