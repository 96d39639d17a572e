//! Bounded, TTL-based verdict cache.
//!
//! Entries live in a map keyed by normalized URL, with a second index ordered
//! by expiry time. Eviction always removes the entry closest to expiry, so a
//! full cache sheds the stalest answers first.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use urlinfo_core::{NormalizedUrl, Verdict};

/// Default time-to-live for cached verdicts
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Default maximum number of cached verdicts
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Longest lifetime a verdict is kept; longer TTLs are clamped to this
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Thread-safe verdict cache shared by concurrent checks
#[derive(Debug)]
pub struct VerdictCache {
    enabled: bool,
    max_entries: usize,
    inner: RwLock<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<NormalizedUrl, Slot>,
    /// (expires_at, insertion sequence) -> key; the sequence breaks ties
    expiry: BTreeMap<(Instant, u64), NormalizedUrl>,
    next_seq: u64,
}

#[derive(Debug)]
struct Slot {
    verdict: Verdict,
    expires_at: Instant,
    seq: u64,
}

impl VerdictCache {
    /// Create an enabled cache holding at most `max_entries` verdicts
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            enabled: true,
            max_entries,
            inner: RwLock::new(CacheInner::default()),
        }
    }

    /// A cache that never stores anything
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(0)
        }
    }

    /// Whether lookups can ever hit
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Maximum number of entries
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Return the cached verdict for `key` if it has not expired.
    ///
    /// Expired entries are treated as absent; they are physically removed on
    /// the next eviction pass or [`purge_expired`](Self::purge_expired).
    pub fn get(&self, key: &NormalizedUrl) -> Option<Verdict> {
        if !self.enabled {
            return None;
        }
        let now = Instant::now();
        let inner = self.inner.read();
        inner
            .entries
            .get(key)
            .filter(|slot| slot.expires_at > now)
            .map(|slot| slot.verdict.clone())
    }

    /// Store `verdict` under `key` for `ttl`, clamped to [`MAX_CACHE_TTL`].
    ///
    /// Overwriting an existing key never evicts. Inserting a new key into a
    /// full cache first drops every expired entry, then the entries nearest to
    /// expiry until there is room.
    pub fn set(&self, key: NormalizedUrl, verdict: Verdict, ttl: Duration) {
        if !self.enabled || self.max_entries == 0 {
            return;
        }
        let now = Instant::now();
        let expires_at = now + ttl.min(MAX_CACHE_TTL);

        let mut inner = self.inner.write();
        if let Some(previous) = inner.entries.remove(&key) {
            inner.expiry.remove(&(previous.expires_at, previous.seq));
        } else if inner.entries.len() >= self.max_entries {
            let purged = inner.purge_expired(now);
            let mut evicted = 0;
            while inner.entries.len() >= self.max_entries && inner.evict_earliest() {
                evicted += 1;
            }
            debug!(purged, evicted, "cache eviction pass");
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.expiry.insert((expires_at, seq), key.clone());
        inner.entries.insert(
            key,
            Slot {
                verdict,
                expires_at,
                seq,
            },
        );
    }

    /// Number of stored entries, including expired ones not yet removed
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.expiry.clear();
    }

    /// Remove expired entries, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        self.inner.write().purge_expired(now)
    }
}

impl Default for VerdictCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl CacheInner {
    fn purge_expired(&mut self, now: Instant) -> usize {
        let mut purged = 0;
        while let Some((&(expires_at, _), _)) = self.expiry.first_key_value() {
            if expires_at > now {
                break;
            }
            self.evict_earliest();
            purged += 1;
        }
        purged
    }

    fn evict_earliest(&mut self) -> bool {
        match self.expiry.pop_first() {
            Some((_, key)) => {
                self.entries.remove(&key);
                true
            }
            None => false,
        }
    }
}
