//! Plugin descriptors and deployment environments.

use crate::resource::ResourceType;
use crate::types::{PluginKey, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Static metadata describing an installed plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Key identifying the plugin.
    pub key: PluginKey,
    /// Display name.
    pub name: String,
    /// Plugin version string.
    pub version: String,
    /// Plugins that must be started before this one.
    pub required_plugins: Vec<PluginKey>,
    /// Resource types this plugin defines and manages.
    #[serde(skip)]
    pub resource_types: Vec<Arc<ResourceType>>,
}

impl PluginDescriptor {
    /// Create a descriptor with no dependencies or types.
    pub fn new(key: PluginKey, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            version: version.into(),
            required_plugins: Vec::new(),
            resource_types: Vec::new(),
        }
    }

    /// Declare a required plugin.
    #[must_use]
    pub fn requires(mut self, dependency: PluginKey) -> Self {
        self.required_plugins.push(dependency);
        self
    }

    /// Declare a managed resource type.
    #[must_use]
    pub fn with_resource_type(mut self, resource_type: Arc<ResourceType>) -> Self {
        self.resource_types.push(resource_type);
        self
    }
}

/// Per-deployment metadata for one installed plugin.
///
/// One environment exists per installed plugin and is destroyed on
/// undeploy. Re-deploying the same plugin yields a new environment with a
/// fresh registration ID, so no identifier state bleeds across
/// undeploy/redeploy cycles.
#[derive(Debug, Clone)]
pub struct PluginEnvironment {
    /// The plugin's descriptor.
    pub descriptor: PluginDescriptor,
    /// Identity of this deployment; fresh on every registration.
    pub registration_id: Uuid,
    /// When the plugin was registered.
    pub deployed_at: Timestamp,
    /// Disabled plugins are registered but never initialized or started.
    pub enabled: bool,
}

impl PluginEnvironment {
    /// Create the environment for a new deployment.
    #[must_use]
    pub fn new(descriptor: PluginDescriptor, enabled: bool) -> Self {
        Self { descriptor, registration_id: Uuid::new_v4(), deployed_at: Utc::now(), enabled }
    }

    /// The plugin's key.
    #[must_use]
    pub const fn key(&self) -> &PluginKey {
        &self.descriptor.key
    }
}
