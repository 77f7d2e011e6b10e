//! Inventory data model: resource types, resources, and discovery reports.

use crate::types::{PluginKey, ResourceId, ScheduleId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Broad classification of a manageable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceCategory {
    /// A whole machine or virtual host.
    Platform,
    /// A top-level managed product (application server, database, ...).
    Server,
    /// A subsystem of a server (connection pool, queue, table, ...).
    Service,
}

/// Definition of one metric a resource type can report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricDefinition {
    /// Metric name unique within the type.
    pub name: String,
    /// Default collection schedule.
    pub schedule_id: ScheduleId,
    /// Measurement units, free-form.
    pub units: String,
}

/// Definition of one operation a resource type supports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationDefinition {
    /// Operation name unique within the type.
    pub name: String,
    /// Human-readable description.
    pub description: String,
}

/// Definition of one configuration property a resource type exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationDefinition {
    /// Property name.
    pub name: String,
    /// Whether the property must be present.
    pub required: bool,
}

/// The schema for a class of manageable resource.
///
/// Immutable once loaded from a plugin descriptor; shared by reference
/// between every [`Resource`] of the type and never owned by any of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceType {
    /// Type name, unique within the owning plugin.
    pub name: String,
    /// Key of the plugin that defines this type.
    pub plugin: PluginKey,
    /// Category of resources of this type.
    pub category: ResourceCategory,
    /// Metrics resources of this type can report.
    pub metrics: Vec<MetricDefinition>,
    /// Operations resources of this type support.
    pub operations: Vec<OperationDefinition>,
    /// Configuration properties resources of this type expose.
    pub configuration: Vec<ConfigurationDefinition>,
}

impl ResourceType {
    /// Create a bare resource type with no definitions.
    pub fn new(name: impl Into<String>, plugin: PluginKey, category: ResourceCategory) -> Self {
        Self {
            name: name.into(),
            plugin,
            category,
            metrics: Vec::new(),
            operations: Vec::new(),
            configuration: Vec::new(),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.plugin, self.name)
    }
}

/// Where a resource stands in the inventory lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InventoryStatus {
    /// Discovered but not yet committed to inventory.
    #[default]
    New,
    /// Committed to inventory and eligible for management.
    Committed,
    /// Explicitly ignored by an administrator.
    Ignored,
    /// Marked deleted, pending purge.
    Deleted,
    /// Removed from inventory; kept only for history references.
    Uninventoried,
}

/// One managed unit: a concrete server, service, or platform instance.
///
/// Resources form a forest: each has at most one parent. A resource is
/// never physically removed while history may reference it; uninventory
/// flips the status to [`InventoryStatus::Uninventoried`] instead.
#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    /// Stable identifier.
    pub id: ResourceId,
    /// Opaque key unique among siblings, supplied by discovery.
    pub resource_key: String,
    /// Display name.
    pub name: String,
    /// Reported product version, if any.
    pub version: Option<String>,
    /// The schema this resource conforms to.
    #[serde(skip)]
    pub resource_type: Arc<ResourceType>,
    /// Parent resource, if not a root.
    pub parent_id: Option<ResourceId>,
    /// Inventory lifecycle status.
    pub inventory_status: InventoryStatus,
    /// Name of the agent responsible for this resource.
    pub agent: String,
    /// Last modification time.
    pub mtime: Timestamp,
}

impl Resource {
    /// Create a newly discovered resource in [`InventoryStatus::New`].
    pub fn new(
        resource_key: impl Into<String>,
        name: impl Into<String>,
        resource_type: Arc<ResourceType>,
        parent_id: Option<ResourceId>,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            id: ResourceId::new(),
            resource_key: resource_key.into(),
            name: name.into(),
            version: None,
            resource_type,
            parent_id,
            inventory_status: InventoryStatus::New,
            agent: agent.into(),
            mtime: Utc::now(),
        }
    }
}

/// One resource found by a discovery scan.
#[derive(Debug, Clone)]
pub struct DiscoveredResource {
    /// Key unique among siblings under the same parent.
    pub resource_key: String,
    /// Display name.
    pub name: String,
    /// Reported version, if detected.
    pub version: Option<String>,
    /// Type of the discovered resource.
    pub resource_type: Arc<ResourceType>,
    /// Parent under which it was found, if any.
    pub parent_id: Option<ResourceId>,
}

/// A batch of discovery results merged into the registry as one unit.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Name of the reporting agent.
    pub agent: String,
    /// Discovered resources, parents before children.
    pub resources: Vec<DiscoveredResource>,
}

impl DiscoveryReport {
    /// Create an empty report for the given agent.
    pub fn new(agent: impl Into<String>) -> Self {
        Self { agent: agent.into(), resources: Vec::new() }
    }

    /// Append one discovered resource.
    pub fn add(&mut self, resource: DiscoveredResource) -> &mut Self {
        self.resources.push(resource);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_type() -> Arc<ResourceType> {
        Arc::new(ResourceType::new("Session Pool", PluginKey::new("appserver"), ResourceCategory::Service))
    }

    #[test]
    fn test_new_resource_defaults() {
        let resource = Resource::new("pool-1", "Session Pool One", service_type(), None, "agent-a");
        assert_eq!(resource.inventory_status, InventoryStatus::New);
        assert!(resource.parent_id.is_none());
        assert!(resource.version.is_none());
    }

    #[test]
    fn test_type_display_includes_plugin() {
        let rt = service_type();
        assert_eq!(rt.to_string(), "appserver:Session Pool");
    }

    #[test]
    fn test_report_accumulates() {
        let mut report = DiscoveryReport::new("agent-a");
        report.add(DiscoveredResource {
            resource_key: "pool-1".into(),
            name: "Pool".into(),
            version: Some("1.2".into()),
            resource_type: service_type(),
            parent_id: None,
        });
        assert_eq!(report.resources.len(), 1);
        assert_eq!(report.agent, "agent-a");
    }
}
