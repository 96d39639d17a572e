//! Running counters for checks, cache use and source failures.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated by every check
#[derive(Debug, Default)]
pub struct CheckerStats {
    checks: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    invalid_urls: AtomicU64,
    source_failures: AtomicU64,
    source_timeouts: AtomicU64,
    degraded_checks: AtomicU64,
}

/// Point-in-time copy of [`CheckerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Checks of valid URLs, cached or not
    pub checks: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Inputs rejected during normalization
    pub invalid_urls: u64,
    /// Source queries that failed before the deadline
    pub source_failures: u64,
    /// Source queries cut off by the deadline
    pub source_timeouts: u64,
    /// Fan-outs in which no source answered
    pub degraded_checks: u64,
}

impl CheckerStats {
    pub(crate) fn record_check(&self) {
        self.checks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invalid_url(&self) {
        self.invalid_urls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_source_failure(&self) {
        self.source_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_source_timeout(&self) {
        self.source_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_degraded(&self) {
        self.degraded_checks.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            checks: self.checks.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            invalid_urls: self.invalid_urls.load(Ordering::Relaxed),
            source_failures: self.source_failures.load(Ordering::Relaxed),
            source_timeouts: self.source_timeouts.load(Ordering::Relaxed),
            degraded_checks: self.degraded_checks.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Fraction of checks answered from the cache
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cache_hit_rate(&self) -> f64 {
        if self.checks == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.checks as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_hit_rate() {
        let stats = CheckerStats::default();
        assert_eq!(stats.snapshot().cache_hit_rate(), 0.0);

        for _ in 0..4 {
            stats.record_check();
        }
        stats.record_cache_hit();
        stats.record_cache_miss();
        stats.record_source_timeout();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.checks, 4);
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.source_timeouts, 1);
        assert!((snapshot.cache_hit_rate() - 0.25).abs() < f64::EPSILON);
    }
}
