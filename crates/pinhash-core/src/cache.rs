//! Bounded in-memory TTL cache for resolved checksums.
//!
//! Entries expire `ttl` after insertion. When full, the oldest inserted key
//! still present is evicted. Eviction ignores access patterns: the cache is
//! advisory, so O(1) bookkeeping matters more than hit rate.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};

use pinhash_schema::Sha256Digest;

/// Lowest accepted TTL.
pub const MIN_TTL: Duration = Duration::from_secs(60);
/// Lowest accepted capacity.
pub const MIN_CAPACITY: usize = 100;

#[derive(Debug)]
struct Slot<V> {
    value: V,
    expires_at: Instant,
    seq: u64,
}

/// Insertion-ordered cache with per-entry expiry.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    capacity: usize,
    entries: HashMap<K, Slot<V>>,
    // Insertion log. Stale records (key removed or re-inserted) are skipped
    // by comparing sequence numbers.
    order: VecDeque<(K, u64)>,
    next_seq: u64,
}

impl<K: Eq + Hash + Clone, V> TtlCache<K, V> {
    /// Create a cache, raising `ttl` and `capacity` to their floors.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        Self {
            ttl: ttl.max(MIN_TTL),
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            next_seq: 0,
        }
    }

    /// Effective TTL after clamping.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Effective capacity after clamping.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `key`, evicting it if expired.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.get_at(key, Instant::now())
    }

    /// Insert `value`, replacing any previous entry for `key`.
    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub(crate) fn get_at(&mut self, key: &K, now: Instant) -> Option<&V> {
        let expired = self.entries.get(key)?.expires_at <= now;
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|slot| &slot.value)
    }

    pub(crate) fn insert_at(&mut self, key: K, value: V, now: Instant) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.push_back((key.clone(), seq));
        self.entries.insert(
            key,
            Slot {
                value,
                expires_at: now + self.ttl,
                seq,
            },
        );

        if self.order.len() > self.capacity * 2 {
            self.compact();
        }
    }

    fn evict_oldest(&mut self) {
        while let Some((key, seq)) = self.order.pop_front() {
            if self.entries.get(&key).is_some_and(|slot| slot.seq == seq) {
                self.entries.remove(&key);
                return;
            }
        }
    }

    fn compact(&mut self) {
        let entries = &self.entries;
        self.order
            .retain(|(key, seq)| entries.get(key).is_some_and(|slot| slot.seq == *seq));
    }
}

/// Cache key: tool namespace, target OS, manager, and normalized command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Opaque tool identifier supplied by the caller.
    pub tool: String,
    /// Instruction OS.
    pub os: String,
    /// Instruction package manager.
    pub manager: String,
    /// Whitespace-normalized command.
    pub command: String,
}

impl CacheKey {
    /// Build a key, normalizing the command's whitespace.
    pub fn new(tool: &str, os: &str, manager: &str, command: &str) -> Self {
        Self {
            tool: tool.to_string(),
            os: os.to_ascii_lowercase(),
            manager: manager.to_ascii_lowercase(),
            command: crate::command::normalize_command(command),
        }
    }
}

/// Positive and negative checksum results.
pub type ChecksumCache = TtlCache<CacheKey, Option<Sha256Digest>>;
