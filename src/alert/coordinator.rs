//! The condition cache coordinator.
//!
//! One explicitly constructed, dependency-injected instance per process:
//! it owns the cache, records counters into the injected monitor, and
//! notifies the alert-notification collaborator when conditions fire.

use crate::alert::cache::{CacheSnapshot, ConditionCache};
use crate::alert::{
    AlertDefinition, CacheMonitor, CacheResult, CacheSubsystem, ConditionEntry, Datum,
};
use crate::types::{AlertDefinitionId, ConditionId, ResourceId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Downstream collaborator notified when a condition fires.
#[async_trait]
pub trait ConditionSink: Send + Sync {
    /// A condition of `alert_definition_id` fired for `resource_id` on
    /// `datum`.
    async fn condition_fired(
        &self,
        alert_definition_id: AlertDefinitionId,
        resource_id: ResourceId,
        datum: &Datum,
    );
}

/// Sink that drops every notification; for bootstraps without alerting.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConditionSink;

#[async_trait]
impl ConditionSink for NullConditionSink {
    async fn condition_fired(
        &self,
        _alert_definition_id: AlertDefinitionId,
        _resource_id: ResourceId,
        _datum: &Datum,
    ) {
    }
}

/// Outcome of one full cache reload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadSummary {
    /// Entries indexed into the fresh snapshot.
    pub loaded: usize,
    /// Malformed entries skipped with a warning.
    pub skipped: usize,
}

/// Coordinates cache maintenance, datum dispatch, and fire notification.
pub struct ConditionCacheCoordinator {
    cache: ConditionCache,
    monitor: Arc<CacheMonitor>,
    sink: Arc<dyn ConditionSink>,
}

impl ConditionCacheCoordinator {
    /// Create a coordinator with an empty cache.
    #[must_use]
    pub fn new(monitor: Arc<CacheMonitor>, sink: Arc<dyn ConditionSink>) -> Self {
        Self { cache: ConditionCache::new(), monitor, sink }
    }

    /// Index one condition entry.
    ///
    /// # Errors
    /// [`CacheError::InvalidCacheElement`](crate::alert::CacheError) for an
    /// unindexable definition; nothing is inserted.
    pub fn insert_condition(&self, entry: ConditionEntry) -> CacheResult<()> {
        let (condition_id, subsystem, resource_id) =
            (entry.condition_id, entry.subsystem, entry.resource_id);
        self.cache.insert(entry)?;
        tracing::debug!(
            condition_id = %condition_id,
            subsystem = %subsystem,
            resource_id = %resource_id,
            "condition inserted"
        );
        Ok(())
    }

    /// Drop a condition from its subsystem index. Idempotent.
    pub fn remove_condition(&self, subsystem: CacheSubsystem, condition_id: ConditionId) -> bool {
        let removed = self.cache.remove(subsystem, condition_id);
        if removed {
            tracing::debug!(
                condition_id = %condition_id,
                subsystem = %subsystem,
                "condition removed"
            );
        }
        removed
    }

    /// Match an incoming datum against its bucket's conditions.
    ///
    /// Scans only the bucket the datum routes to, fires the sink once per
    /// matching condition, and returns the match count. A predicate that
    /// fails to evaluate is logged and skipped; its siblings still
    /// evaluate.
    pub async fn process_data(&self, datum: Datum) -> usize {
        let started = Instant::now();
        let subsystem = datum.subsystem();
        let candidates = self.cache.candidates(&datum);

        let mut matched = 0;
        for entry in &candidates {
            match entry.try_matches(&datum) {
                Ok(true) => {
                    matched += 1;
                    self.sink
                        .condition_fired(entry.alert_definition_id, entry.resource_id, &datum)
                        .await;
                },
                Ok(false) => {},
                Err(error) => {
                    tracing::warn!(
                        condition_id = %entry.condition_id,
                        subsystem = %subsystem,
                        error = %error,
                        "condition predicate failed; skipping entry"
                    );
                },
            }
        }

        self.monitor.record_processing(subsystem, matched, started.elapsed());
        tracing::trace!(
            subsystem = %subsystem,
            candidates = candidates.len(),
            matched = matched,
            "datum processed"
        );
        matched
    }

    /// Rebuild every subsystem index from persisted alert definitions and
    /// publish the result atomically.
    ///
    /// Only enabled definitions contribute. A malformed condition is
    /// skipped with a warning and never aborts the reload; in-flight
    /// `process_data` calls see the old snapshot or the new one entirely.
    pub fn reload_all_caches(&self, definitions: &[AlertDefinition]) -> ReloadSummary {
        let fresh = CacheSnapshot::default();
        let mut summary = ReloadSummary::default();

        for definition in definitions.iter().filter(|d| d.enabled) {
            for condition in &definition.conditions {
                match condition.validate() {
                    Ok(()) => {
                        fresh.insert(Arc::new(condition.clone()));
                        summary.loaded += 1;
                    },
                    Err(error) => {
                        summary.skipped += 1;
                        tracing::warn!(
                            alert_definition_id = %definition.id,
                            condition_id = %condition.condition_id,
                            error = %error,
                            "malformed condition skipped during reload"
                        );
                    },
                }
            }
        }

        self.cache.swap(fresh);
        tracing::info!(
            loaded = summary.loaded,
            skipped = summary.skipped,
            "condition caches reloaded"
        );
        summary
    }

    /// Entries indexed for one subsystem.
    #[must_use]
    pub fn cache_element_count(&self, subsystem: CacheSubsystem) -> usize {
        self.cache.element_count(subsystem)
    }

    /// Entries indexed across all subsystems.
    ///
    /// Always equals the sum of the per-subsystem counts.
    #[must_use]
    pub fn total_cache_element_count(&self) -> usize {
        self.cache.total_element_count()
    }

    /// The injected monitor.
    #[must_use]
    pub fn monitor(&self) -> Arc<CacheMonitor> {
        Arc::clone(&self.monitor)
    }

    /// Full pull-based metrics report: counters plus current cache sizes.
    #[must_use]
    pub fn metrics_report(&self) -> CacheMetricsReport {
        CacheMetricsReport {
            counters: self.monitor.snapshot(),
            sizes: CacheSubsystem::ALL
                .iter()
                .map(|subsystem| SubsystemSize {
                    subsystem: subsystem.to_string(),
                    elements: self.cache_element_count(*subsystem),
                })
                .collect(),
            total_elements: self.total_cache_element_count(),
        }
    }
}

/// Current size of one subsystem's index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsystemSize {
    /// Subsystem label.
    pub subsystem: String,
    /// Indexed entries.
    pub elements: usize,
}

/// Combined observability report for the cache engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetricsReport {
    /// Match and processing-time counters.
    pub counters: crate::alert::CacheMonitorSnapshot,
    /// Per-subsystem index sizes.
    pub sizes: Vec<SubsystemSize>,
    /// Entries across all subsystems.
    pub total_elements: usize,
}
