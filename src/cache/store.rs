//! Bounded snapshot storage.
//!
//! The proxy only depends on the [`Store`] trait. [`LruStore`] is the default
//! backend: the `lru` crate's map behind a `parking_lot` mutex.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use super::{CacheKey, Snapshot, StoreError};

/// A capacity-bounded mapping from [`CacheKey`] to [`Snapshot`].
///
/// Both methods may be called concurrently. `put` may evict another entry;
/// callers never learn which.
pub trait Store: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<Arc<Snapshot>>;

    /// Inserts or replaces the entry for `key`.
    ///
    /// # Errors
    ///
    /// A backend that cannot accept the entry returns an error; the proxy
    /// reports it to the caller as a failed response.
    fn put(&self, key: CacheKey, snapshot: Arc<Snapshot>) -> Result<(), StoreError>;
}

/// In-memory store with least-recently-used eviction.
///
/// Both [`get`](Store::get) and [`put`](Store::put) count as a use.
pub struct LruStore {
    entries: Mutex<LruCache<CacheKey, Arc<Snapshot>>>,
}

impl LruStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Membership check that does not refresh recency.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.lock().contains(key)
    }
}

impl Store for LruStore {
    fn get(&self, key: &CacheKey) -> Option<Arc<Snapshot>> {
        self.entries.lock().get(key).cloned()
    }

    fn put(&self, key: CacheKey, snapshot: Arc<Snapshot>) -> Result<(), StoreError> {
        let evicted = self.entries.lock().push(key.clone(), snapshot);
        if let Some((old, _)) = evicted.filter(|(old, _)| *old != key) {
            debug!(evicted = %old, inserted = %key, "cache entry evicted");
        }
        Ok(())
    }
}
