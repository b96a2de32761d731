/// In-memory TTL cache for outdoor snapshots.
///
/// Each entry carries its own expiry, computed from the injected clock at
/// insert time. Reads never return an expired entry, so a cached value is
/// at most `ttl` old. Writes to the same key are last-writer-wins.
///
/// The cache is owned by the application state and passed explicitly; the
/// clock is a trait object so tests can step time by hand.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: std::sync::Mutex::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

pub type SharedClock = Arc<dyn Clock>;

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    ttl: Duration,
    capacity: usize,
    clock: SharedClock,
}

impl<V: Clone> TtlCache<V> {
    /// A zero capacity disables caching.
    pub fn new(ttl: Duration, capacity: usize, clock: SharedClock) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity,
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live value for `key`. Expired entries are dropped on the way.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now();
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        if self.capacity == 0 {
            return;
        }

        let key = key.into();
        let now = self.clock.now();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.entries.retain(|_, entry| entry.expires_at > now);
            if self.entries.len() >= self.capacity {
                self.evict_soonest_expiring();
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    fn evict_soonest_expiring(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.expires_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = victim {
            self.entries.remove(&key);
        }
    }
}

/// Cache key for a coordinate, rounded so that requests for practically
/// the same place share an entry.
pub fn coordinate_key(latitude: f64, longitude: f64) -> String {
    format!("{:.4},{:.4}", latitude, longitude)
}
