//! Concurrent registry of resource containers.
//!
//! Owns the map from resource identity to its live [`ResourceContainer`].
//! Lookups are lock-free; register/unregister and discovery merges use the
//! concurrent map's per-entry locking so concurrent merges cannot lose
//! updates. Containers are fully constructed before publication, so a
//! lookup never observes a partially-initialized container.

use crate::resource::{
    DiscoveryReport, InventoryError, InventoryResult, InventoryStatus, Resource, ResourceContainer,
};
use crate::types::{PluginKey, ResourceId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome of merging one discovery report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Resources newly added to inventory.
    pub added: usize,
    /// Resources already present whose details were refreshed.
    pub updated: usize,
}

/// Concurrent resource container registry.
pub struct ResourceRegistry {
    containers: DashMap<ResourceId, Arc<ResourceContainer>>,
    /// (parent, sibling key) to resource ID, mirroring discovery identity.
    key_index: DashMap<(Option<ResourceId>, String), ResourceId>,
    stats: RegistryStats,
}

impl ResourceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { containers: DashMap::new(), key_index: DashMap::new(), stats: RegistryStats::new() }
    }

    /// Register a container for a resource.
    ///
    /// # Errors
    /// [`InventoryError::AlreadyRegistered`] if a container already exists
    /// for the resource identity.
    pub fn register(
        &self,
        resource_id: ResourceId,
        container: Arc<ResourceContainer>,
    ) -> InventoryResult<()> {
        let resource = container.resource();
        // Publish the container first and release its entry before touching
        // the key index; holding both would invert merge's lock order.
        match self.containers.entry(resource_id) {
            Entry::Occupied(_) => return Err(InventoryError::AlreadyRegistered { resource_id }),
            Entry::Vacant(slot) => {
                slot.insert(container);
            },
        }
        self.key_index.insert((resource.parent_id, resource.resource_key), resource_id);
        self.stats.registrations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(resource_id = %resource_id, "resource container registered");
        Ok(())
    }

    /// Look up a resource's container. Lock-free.
    #[must_use]
    pub fn lookup(&self, resource_id: ResourceId) -> Option<Arc<ResourceContainer>> {
        self.containers.get(&resource_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Look up a resource's container, erroring when absent.
    ///
    /// # Errors
    /// [`InventoryError::NotFound`] if no container is registered.
    pub fn get(&self, resource_id: ResourceId) -> InventoryResult<Arc<ResourceContainer>> {
        self.lookup(resource_id).ok_or(InventoryError::NotFound { resource_id })
    }

    /// Look up a resource by its discovery identity.
    #[must_use]
    pub fn lookup_by_key(
        &self,
        parent_id: Option<ResourceId>,
        resource_key: &str,
    ) -> Option<Arc<ResourceContainer>> {
        let id = *self.key_index.get(&(parent_id, resource_key.to_string()))?;
        self.lookup(id)
    }

    /// Remove a resource's container. Idempotent.
    ///
    /// Returns whether an entry existed.
    pub fn unregister(&self, resource_id: ResourceId) -> bool {
        let Some((_, container)) = self.containers.remove(&resource_id) else {
            return false;
        };
        let resource = container.resource();
        self.key_index.remove(&(resource.parent_id, resource.resource_key));
        self.stats.unregistrations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(resource_id = %resource_id, "resource container unregistered");
        true
    }

    /// Merge a discovery report: add unknown resources, refresh known ones.
    ///
    /// Repeated merges of the same report are idempotent. Each resource is
    /// merged under its map entry's lock, so concurrent merges of
    /// overlapping reports cannot lose updates.
    pub fn merge_discovery_report(&self, report: &DiscoveryReport) -> MergeSummary {
        let mut summary = MergeSummary::default();

        for discovered in &report.resources {
            let identity = (discovered.parent_id, discovered.resource_key.clone());
            match self.key_index.entry(identity) {
                Entry::Occupied(existing) => {
                    if let Some(container) = self.lookup(*existing.get()) {
                        container.update_resource(|resource| {
                            resource.name = discovered.name.clone();
                            resource.version = discovered.version.clone();
                        });
                        summary.updated += 1;
                    }
                },
                Entry::Vacant(slot) => {
                    let mut resource = Resource::new(
                        discovered.resource_key.clone(),
                        discovered.name.clone(),
                        Arc::clone(&discovered.resource_type),
                        discovered.parent_id,
                        report.agent.clone(),
                    );
                    resource.version = discovered.version.clone();
                    let resource_id = resource.id;
                    let container = Arc::new(ResourceContainer::new(resource));
                    // Container first: a key-index hit must always resolve.
                    self.containers.insert(resource_id, container);
                    slot.insert(resource_id);
                    self.stats.registrations.fetch_add(1, Ordering::Relaxed);
                    summary.added += 1;
                },
            }
        }

        self.stats.merges.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            agent = %report.agent,
            added = summary.added,
            updated = summary.updated,
            "discovery report merged"
        );
        summary
    }

    /// Commit a newly discovered resource to inventory.
    ///
    /// # Errors
    /// - [`InventoryError::NotFound`] if the resource is unknown.
    /// - [`InventoryError::InvalidStatusChange`] unless the resource is
    ///   currently [`InventoryStatus::New`].
    pub fn commit(&self, resource_id: ResourceId) -> InventoryResult<()> {
        let container = self.get(resource_id)?;
        let status = container.inventory_status();
        if status != InventoryStatus::New {
            return Err(InventoryError::InvalidStatusChange {
                resource_id,
                reason: format!("cannot commit from {status:?}"),
            });
        }
        container.update_resource(|r| r.inventory_status = InventoryStatus::Committed);
        tracing::info!(resource_id = %resource_id, "resource committed to inventory");
        Ok(())
    }

    /// Soft-delete a resource and its descendants.
    ///
    /// Marks the subtree [`InventoryStatus::Uninventoried`] and stops each
    /// live component. Containers stay registered so history references
    /// remain resolvable; see [`purge_uninventoried`](Self::purge_uninventoried).
    ///
    /// # Errors
    /// [`InventoryError::NotFound`] if the resource is unknown.
    pub async fn uninventory(&self, resource_id: ResourceId) -> InventoryResult<()> {
        let container = self.get(resource_id)?;

        for child in self.child_resources(resource_id) {
            Box::pin(self.uninventory(child.resource_id())).await?;
        }

        container.stop_component().await;
        container.update_resource(|r| r.inventory_status = InventoryStatus::Uninventoried);
        tracing::info!(resource_id = %resource_id, "resource uninventoried");
        Ok(())
    }

    /// Physically remove containers of uninventoried resources.
    ///
    /// Returns how many entries were purged.
    pub fn purge_uninventoried(&self) -> usize {
        let doomed: Vec<ResourceId> = self
            .containers
            .iter()
            .filter(|entry| entry.value().inventory_status() == InventoryStatus::Uninventoried)
            .map(|entry| *entry.key())
            .collect();
        let purged = doomed.len();
        for resource_id in doomed {
            self.unregister(resource_id);
        }
        purged
    }

    /// Containers of the direct children of a resource.
    #[must_use]
    pub fn child_resources(&self, parent_id: ResourceId) -> Vec<Arc<ResourceContainer>> {
        self.containers
            .iter()
            .filter(|entry| entry.value().resource().parent_id == Some(parent_id))
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Containers of committed resources whose type belongs to a plugin.
    #[must_use]
    pub fn committed_resources_for_plugin(&self, plugin: &PluginKey) -> Vec<Arc<ResourceContainer>> {
        self.containers
            .iter()
            .filter(|entry| {
                let resource = entry.value().resource();
                resource.inventory_status == InventoryStatus::Committed
                    && resource.resource_type.plugin == *plugin
            })
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Number of registered containers.
    #[must_use]
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    /// Snapshot of registry counters.
    #[must_use]
    pub fn stats(&self) -> RegistryStatsSnapshot {
        RegistryStatsSnapshot {
            registrations: self.stats.registrations.load(Ordering::Relaxed),
            unregistrations: self.stats.unregistrations.load(Ordering::Relaxed),
            merges: self.stats.merges.load(Ordering::Relaxed),
            containers: self.container_count(),
        }
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct RegistryStats {
    registrations: AtomicU64,
    unregistrations: AtomicU64,
    merges: AtomicU64,
}

impl RegistryStats {
    fn new() -> Self {
        Self {
            registrations: AtomicU64::new(0),
            unregistrations: AtomicU64::new(0),
            merges: AtomicU64::new(0),
        }
    }
}

/// Immutable snapshot of registry counters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegistryStatsSnapshot {
    /// Total container registrations.
    pub registrations: u64,
    /// Total container unregistrations.
    pub unregistrations: u64,
    /// Total discovery report merges.
    pub merges: u64,
    /// Currently registered containers.
    pub containers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{DiscoveredResource, ResourceCategory, ResourceType};

    fn server_type(plugin: &str) -> Arc<ResourceType> {
        Arc::new(ResourceType::new("App Server", PluginKey::new(plugin), ResourceCategory::Server))
    }

    fn report_with(agent: &str, keys: &[&str], rt: &Arc<ResourceType>) -> DiscoveryReport {
        let mut report = DiscoveryReport::new(agent);
        for key in keys {
            report.add(DiscoveredResource {
                resource_key: (*key).to_string(),
                name: format!("Server {key}"),
                version: Some("7.0".to_string()),
                resource_type: Arc::clone(rt),
                parent_id: None,
            });
        }
        report
    }

    #[test]
    fn test_merge_adds_then_updates() {
        let registry = ResourceRegistry::new();
        let rt = server_type("appserver");

        let first = registry.merge_discovery_report(&report_with("agent-a", &["as-1", "as-2"], &rt));
        assert_eq!(first, MergeSummary { added: 2, updated: 0 });
        assert_eq!(registry.container_count(), 2);

        let second = registry.merge_discovery_report(&report_with("agent-a", &["as-1", "as-2"], &rt));
        assert_eq!(second, MergeSummary { added: 0, updated: 2 });
        assert_eq!(registry.container_count(), 2);
    }

    #[test]
    fn test_register_rejects_duplicate_identity() {
        let registry = ResourceRegistry::new();
        let rt = server_type("appserver");
        let resource = Resource::new("as-1", "Server", rt, None, "agent-a");
        let id = resource.id;

        registry.register(id, Arc::new(ResourceContainer::new(resource.clone()))).unwrap();
        let dup = registry.register(id, Arc::new(ResourceContainer::new(resource)));
        assert!(matches!(dup, Err(InventoryError::AlreadyRegistered { .. })));
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = ResourceRegistry::new();
        let rt = server_type("appserver");
        registry.merge_discovery_report(&report_with("agent-a", &["as-1"], &rt));
        let id = registry.lookup_by_key(None, "as-1").unwrap().resource_id();

        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(registry.lookup(id).is_none());
    }

    #[test]
    fn test_commit_requires_new_status() {
        let registry = ResourceRegistry::new();
        let rt = server_type("appserver");
        registry.merge_discovery_report(&report_with("agent-a", &["as-1"], &rt));
        let id = registry.lookup_by_key(None, "as-1").unwrap().resource_id();

        registry.commit(id).unwrap();
        assert_eq!(registry.lookup(id).unwrap().inventory_status(), InventoryStatus::Committed);

        let again = registry.commit(id);
        assert!(matches!(again, Err(InventoryError::InvalidStatusChange { .. })));
    }

    #[tokio::test]
    async fn test_uninventory_cascades_and_is_soft() {
        let registry = ResourceRegistry::new();
        let rt = server_type("appserver");
        registry.merge_discovery_report(&report_with("agent-a", &["as-1"], &rt));
        let parent = registry.lookup_by_key(None, "as-1").unwrap();
        let parent_id = parent.resource_id();

        let mut child_report = DiscoveryReport::new("agent-a");
        child_report.add(DiscoveredResource {
            resource_key: "pool-1".to_string(),
            name: "Pool".to_string(),
            version: None,
            resource_type: Arc::clone(&rt),
            parent_id: Some(parent_id),
        });
        registry.merge_discovery_report(&child_report);
        let child_id = registry.lookup_by_key(Some(parent_id), "pool-1").unwrap().resource_id();

        registry.uninventory(parent_id).await.unwrap();

        // Soft delete: entries survive with Uninventoried status.
        assert_eq!(registry.container_count(), 2);
        assert_eq!(
            registry.lookup(parent_id).unwrap().inventory_status(),
            InventoryStatus::Uninventoried
        );
        assert_eq!(
            registry.lookup(child_id).unwrap().inventory_status(),
            InventoryStatus::Uninventoried
        );

        assert_eq!(registry.purge_uninventoried(), 2);
        assert_eq!(registry.container_count(), 0);
    }

    #[test]
    fn test_committed_resources_for_plugin_filters() {
        let registry = ResourceRegistry::new();
        let rt_a = server_type("plugin-a");
        let rt_b = server_type("plugin-b");
        registry.merge_discovery_report(&report_with("agent-a", &["a-1"], &rt_a));
        registry.merge_discovery_report(&report_with("agent-a", &["b-1"], &rt_b));

        let a_id = registry.lookup_by_key(None, "a-1").unwrap().resource_id();
        registry.commit(a_id).unwrap();

        let for_a = registry.committed_resources_for_plugin(&PluginKey::new("plugin-a"));
        assert_eq!(for_a.len(), 1);
        let for_b = registry.committed_resources_for_plugin(&PluginKey::new("plugin-b"));
        assert!(for_b.is_empty());
    }

    #[test]
    fn test_stats_snapshot_counts() {
        let registry = ResourceRegistry::new();
        let rt = server_type("appserver");
        registry.merge_discovery_report(&report_with("agent-a", &["as-1", "as-2"], &rt));

        let stats = registry.stats();
        assert_eq!(stats.registrations, 2);
        assert_eq!(stats.merges, 1);
        assert_eq!(stats.containers, 2);
    }
}
