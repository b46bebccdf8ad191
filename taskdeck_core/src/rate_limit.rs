//! Time-windowed attempt limiting.
//!
//! A bounded counter store behind a trait, so multi-instance deployments
//! can back it with shared storage instead of a per-process map. The core
//! only provides the mechanism; which operations get throttled is decided
//! by the embedding layer.

use crate::error::RateLimitError;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Counter store seam for rate limiting.
pub trait RateLimitStore: Send + Sync {
    /// Record an attempt for `key` and check it against the limit.
    ///
    /// Returns `Err(RateLimitError::Limited)` when `key` has already made
    /// `max` attempts within the trailing `window`.
    fn check_and_record(
        &self,
        key: &str,
        max: u32,
        window: Duration,
    ) -> Result<(), RateLimitError>;

    /// Forget all attempts for `key`.
    fn reset(&self, key: &str);
}

/// In-memory windowed counter.
///
/// Attempt timestamps outside the window are pruned on every check, so the
/// per-key memory is bounded by `max` live timestamps.
#[derive(Clone, Default)]
pub struct MemoryRateLimitStore {
    attempts: Arc<DashMap<String, Vec<DateTime<Utc>>>>,
}

impl MemoryRateLimitStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
        }
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    fn check_and_record(
        &self,
        key: &str,
        max: u32,
        window: Duration,
    ) -> Result<(), RateLimitError> {
        let now = Utc::now();
        let cutoff = now - window;

        let mut entry = self.attempts.entry(key.to_string()).or_default();
        entry.retain(|t| *t > cutoff);

        if entry.len() >= max as usize {
            tracing::debug!(key, attempts = entry.len(), max, "rate limit hit");
            return Err(RateLimitError::Limited {
                attempts: entry.len() as u32,
                max,
            });
        }

        entry.push(now);
        Ok(())
    }

    fn reset(&self, key: &str) {
        self.attempts.remove(key);
    }
}
