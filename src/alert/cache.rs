//! The in-memory condition cache: per-subsystem indexes behind an
//! atomically swappable snapshot.
//!
//! Each subsystem keeps its own bucket map so that dispatching a datum
//! touches exactly one bucket. Incremental maintenance (insert/remove)
//! takes a short per-subsystem write lock; a full reload builds a fresh
//! snapshot off to the side and publishes it with one atomic pointer swap,
//! so an in-flight reader sees the old snapshot or the new one entirely,
//! never a mix.

use crate::alert::{BucketKey, CacheResult, CacheSubsystem, ConditionEntry, Datum};
use crate::types::ConditionId;
use arc_swap::ArcSwap;
use parking_lot::RwLock;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// Entries of one bucket; most buckets hold a handful of conditions.
pub(crate) type Bucket = SmallVec<[Arc<ConditionEntry>; 4]>;

/// The index for one subsystem.
#[derive(Debug, Default)]
pub(crate) struct SubsystemIndex {
    buckets: HashMap<BucketKey, Bucket>,
    len: usize,
}

impl SubsystemIndex {
    pub(crate) fn insert(&mut self, entry: Arc<ConditionEntry>) {
        self.buckets.entry(entry.bucket_key()).or_default().push(entry);
        self.len += 1;
    }

    pub(crate) fn remove(&mut self, condition_id: ConditionId) -> bool {
        let mut removed = false;
        self.buckets.retain(|_, bucket| {
            let before = bucket.len();
            bucket.retain(|entry| entry.condition_id != condition_id);
            let dropped = before - bucket.len();
            if dropped > 0 {
                self.len -= dropped;
                removed = true;
            }
            !bucket.is_empty()
        });
        removed
    }

    pub(crate) fn candidates(&self, key: &BucketKey) -> Bucket {
        self.buckets.get(key).cloned().unwrap_or_default()
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }
}

/// One published generation of all subsystem indexes.
#[derive(Debug, Default)]
pub(crate) struct CacheSnapshot {
    indexes: [RwLock<SubsystemIndex>; 7],
}

impl CacheSnapshot {
    pub(crate) fn insert(&self, entry: Arc<ConditionEntry>) {
        self.indexes[entry.subsystem.index()].write().insert(entry);
    }
}

/// Process-wide condition cache with an explicit reload lifecycle.
#[derive(Debug)]
pub struct ConditionCache {
    snapshot: ArcSwap<CacheSnapshot>,
}

impl ConditionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self { snapshot: ArcSwap::from_pointee(CacheSnapshot::default()) }
    }

    /// Validate and index one condition entry.
    ///
    /// O(1) amortized: only the entry's bucket is touched, under the
    /// subsystem's write lock. Concurrent readers of other buckets and
    /// other subsystems are unaffected.
    ///
    /// # Errors
    /// [`CacheError::InvalidCacheElement`](crate::alert::CacheError) for an
    /// unindexable definition.
    pub fn insert(&self, entry: ConditionEntry) -> CacheResult<()> {
        entry.validate()?;
        self.snapshot.load().insert(Arc::new(entry));
        Ok(())
    }

    /// Drop a condition from a subsystem's index. Idempotent.
    ///
    /// Returns whether an entry was removed.
    pub fn remove(&self, subsystem: CacheSubsystem, condition_id: ConditionId) -> bool {
        self.snapshot.load().indexes[subsystem.index()].write().remove(condition_id)
    }

    /// The candidate entries for a datum: exactly its bucket, cloned out
    /// so evaluation runs without holding the index lock.
    #[must_use]
    pub(crate) fn candidates(&self, datum: &Datum) -> Bucket {
        let snapshot = self.snapshot.load();
        let index = snapshot.indexes[datum.subsystem().index()].read();
        index.candidates(&datum.bucket_key())
    }

    /// Number of entries indexed for one subsystem.
    #[must_use]
    pub fn element_count(&self, subsystem: CacheSubsystem) -> usize {
        self.snapshot.load().indexes[subsystem.index()].read().len()
    }

    /// Total entries across all subsystems, computed from one snapshot.
    #[must_use]
    pub fn total_element_count(&self) -> usize {
        let snapshot = self.snapshot.load();
        CacheSubsystem::ALL.iter().map(|s| snapshot.indexes[s.index()].read().len()).sum()
    }

    /// Atomically publish a freshly built snapshot.
    pub(crate) fn swap(&self, snapshot: CacheSnapshot) {
        self.snapshot.store(Arc::new(snapshot));
    }
}

impl Default for ConditionCache {
    fn default() -> Self {
        Self::new()
    }
}
