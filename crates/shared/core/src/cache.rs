//! Time-bounded cache for exchange metadata
//!
//! Used for data that changes rarely but has to be fetched before a stream
//! can be decoded, like the futures symbol → contract-type mapping. The
//! cache only stores; callers whose fetch is async serialize their refresh
//! themselves and re-check [`MetadataCache::get`] once they hold that lock.

use chrono::Duration;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::values::Timestamp;

struct Entry<T> {
    value: Arc<T>,
    fetched_at: Timestamp,
}

pub struct MetadataCache<T> {
    entry: RwLock<Option<Entry<T>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T> MetadataCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached value, only while it is younger than the TTL
    pub fn get(&self) -> Option<Arc<T>> {
        let now = self.clock.now();
        self.entry
            .read()
            .as_ref()
            .filter(|e| self.is_fresh(e, now))
            .map(|e| Arc::clone(&e.value))
    }

    pub fn store(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        *self.entry.write() = Some(Entry {
            value: Arc::clone(&value),
            fetched_at: self.clock.now(),
        });
        value
    }

    pub fn invalidate(&self) {
        *self.entry.write() = None;
    }

    fn is_fresh(&self, entry: &Entry<T>, now: Timestamp) -> bool {
        now - entry.fetched_at < self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::collections::HashMap;

    fn cache_with_clock(ttl_secs: i64) -> (MetadataCache<HashMap<String, String>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = MetadataCache::with_clock(Duration::seconds(ttl_secs), clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_empty_cache_misses() {
        let (cache, _) = cache_with_clock(60);
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_store_then_expire() {
        let (cache, clock) = cache_with_clock(60);
        cache.store(HashMap::from([("BTCUSDT".into(), "swap-usdt".into())]));
        assert!(cache.get().is_some());

        clock.advance(Duration::seconds(59));
        assert!(cache.get().is_some());

        clock.advance(Duration::seconds(1));
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_store_replaces_and_restarts_ttl() {
        let (cache, clock) = cache_with_clock(60);
        cache.store(HashMap::from([("ETHUSD_PERP".into(), "swap".into())]));

        clock.advance(Duration::seconds(50));
        cache.store(HashMap::from([("ETHUSD_PERP".into(), "swap-usdt".into())]));
        clock.advance(Duration::seconds(50));

        let value = cache.get().unwrap();
        assert_eq!(value["ETHUSD_PERP"], "swap-usdt");
    }

    #[test]
    fn test_invalidate() {
        let (cache, _) = cache_with_clock(60);
        cache.store(HashMap::new());
        cache.invalidate();
        assert!(cache.get().is_none());
    }
}
