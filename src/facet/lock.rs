//! Per-resource facet locking.
//!
//! Every resource container carries one [`FacetLock`]. Facet calls acquire
//! it in the mode their facet class requires: availability and measurement
//! reads share the lock, operation and configuration writes hold it
//! exclusively.
//!
//! Fairness policy: acquisition is FIFO. The underlying
//! [`tokio::sync::RwLock`] queues waiting readers and writers in arrival
//! order, so a waiting writer blocks readers that arrive after it (no
//! writer starvation by a read stream) and contiguous readers are admitted
//! together. Acquisition never blocks indefinitely; every acquire carries a
//! caller-supplied timeout and a timed-out acquire is a definitive failure,
//! not a queued request.

use crate::facet::FacetError;
use crate::types::ResourceId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tokio::time::timeout;

/// Lock mode a facet call requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacetLockType {
    /// No lock: the call cannot disturb the managed endpoint.
    None,
    /// Shared lock: concurrent with other readers, excluded by a writer.
    Read,
    /// Exclusive lock: excludes readers and other writers.
    Write,
}

/// The lock for one resource.
#[derive(Debug, Clone)]
pub struct FacetLock {
    resource_id: ResourceId,
    inner: Arc<RwLock<()>>,
}

/// Held lock state for the duration of one facet invocation.
///
/// Releases the lock when dropped, on every exit path.
#[derive(Debug)]
pub enum FacetLockGuard {
    /// No lock was requested or the caller opted out under contention.
    Unlocked,
    /// Shared acquisition.
    Read(OwnedRwLockReadGuard<()>),
    /// Exclusive acquisition.
    Write(OwnedRwLockWriteGuard<()>),
}

impl FacetLockGuard {
    /// Whether a lock is actually held.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        !matches!(self, Self::Unlocked)
    }
}

impl FacetLock {
    /// Create the lock for a resource.
    #[must_use]
    pub fn new(resource_id: ResourceId) -> Self {
        Self { resource_id, inner: Arc::new(RwLock::new(())) }
    }

    /// Acquire the lock in the given mode, waiting at most `wait`.
    ///
    /// # Errors
    /// [`FacetError::LockTimeout`] if the lock was not acquired in time.
    /// The guard was never granted, so the caller must not touch the
    /// component.
    pub async fn acquire(
        &self,
        lock_type: FacetLockType,
        wait: Duration,
    ) -> Result<FacetLockGuard, FacetError> {
        match lock_type {
            FacetLockType::None => Ok(FacetLockGuard::Unlocked),
            FacetLockType::Read => match timeout(wait, self.inner.clone().read_owned()).await {
                Ok(guard) => Ok(FacetLockGuard::Read(guard)),
                Err(_) => Err(self.timeout_error(lock_type, wait)),
            },
            FacetLockType::Write => match timeout(wait, self.inner.clone().write_owned()).await {
                Ok(guard) => Ok(FacetLockGuard::Write(guard)),
                Err(_) => Err(self.timeout_error(lock_type, wait)),
            },
        }
    }

    /// Acquire like [`acquire`](Self::acquire), but fall back to running
    /// unlocked when the lock cannot be obtained in time.
    ///
    /// Used for nested facet calls where the outer call already holds the
    /// resource's lock: async tasks carry no thread identity for reentrancy
    /// detection, so the inner call opts out of acquisition instead of
    /// deadlocking against itself.
    pub async fn acquire_optional(
        &self,
        lock_type: FacetLockType,
        wait: Duration,
    ) -> FacetLockGuard {
        match self.acquire(lock_type, wait).await {
            Ok(guard) => guard,
            Err(_) => {
                tracing::debug!(
                    resource_id = %self.resource_id,
                    lock_type = ?lock_type,
                    "proceeding without facet lock (optional acquisition timed out)"
                );
                FacetLockGuard::Unlocked
            },
        }
    }

    /// The resource this lock belongs to.
    #[must_use]
    pub const fn resource_id(&self) -> ResourceId {
        self.resource_id
    }

    fn timeout_error(&self, lock_type: FacetLockType, wait: Duration) -> FacetError {
        FacetError::LockTimeout {
            resource_id: self.resource_id,
            lock_type,
            timeout_ms: wait.as_millis() as u64,
        }
    }
}
