//! The master plugin manager.
//!
//! Owns every deployed plugin's container, resolves required-plugin
//! dependencies into a deterministic start order, and drives lifecycle
//! operations across the fleet: containers are initialized and started in
//! dependency order and stopped and shut down in reverse. The manager also
//! instantiates resource components for started plugins and places them in
//! the resource registry.

use crate::config::SentraConfig;
use crate::facet::context_for;
use crate::plugin::{
    ContainerState, PluginComponentFactory, PluginContainer, PluginDescriptor, PluginEnvironment,
    PluginError, PluginResult,
};
use crate::resource::ResourceRegistry;
use crate::types::PluginKey;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Master manager for all deployed plugins.
pub struct PluginManager {
    containers: RwLock<HashMap<PluginKey, PluginContainer>>,
    registry: Arc<ResourceRegistry>,
    component_start_timeout: Duration,
}

impl PluginManager {
    /// Create a manager over the given resource registry.
    #[must_use]
    pub fn new(registry: Arc<ResourceRegistry>, config: &SentraConfig) -> Self {
        Self {
            containers: RwLock::new(HashMap::new()),
            registry,
            component_start_timeout: config.component_start_timeout(),
        }
    }

    /// Deploy a plugin: create its environment and a dormant container.
    ///
    /// Disabled plugins are registered but skipped by every lifecycle
    /// sweep; enabling one requires undeploy and redeploy.
    ///
    /// # Errors
    /// [`PluginError::AlreadyRegistered`] if the key is taken.
    pub async fn register_plugin(
        &self,
        descriptor: PluginDescriptor,
        factory: Arc<dyn PluginComponentFactory>,
        enabled: bool,
    ) -> PluginResult<()> {
        let key = descriptor.key.clone();
        let mut containers = self.containers.write().await;
        if containers.contains_key(&key) {
            return Err(PluginError::AlreadyRegistered { plugin: key });
        }
        let environment = PluginEnvironment::new(descriptor, enabled);
        tracing::info!(
            plugin = %key,
            registration_id = %environment.registration_id,
            enabled = enabled,
            "plugin registered"
        );
        containers.insert(key, PluginContainer::new(environment, factory));
        Ok(())
    }

    /// Undeploy a plugin, destroying its environment.
    ///
    /// The container must be fully shut down (`Uninitialized`); driving it
    /// there first is the caller's responsibility.
    ///
    /// # Errors
    /// - [`PluginError::NotFound`] for an unknown key.
    /// - [`PluginError::InvalidState`] if the container is mid-cycle.
    pub async fn unregister_plugin(&self, key: &PluginKey) -> PluginResult<PluginEnvironment> {
        let mut containers = self.containers.write().await;
        let container =
            containers.get(key).ok_or_else(|| PluginError::NotFound { plugin: key.clone() })?;
        if container.state() != ContainerState::Uninitialized {
            return Err(PluginError::InvalidState {
                plugin: key.clone(),
                state: container.state().to_string(),
                reason: "undeploy requires a fully shut down plugin".to_string(),
            });
        }
        let container =
            containers.remove(key).ok_or_else(|| PluginError::NotFound { plugin: key.clone() })?;
        let environment = container.environment().clone();
        tracing::info!(plugin = %key, "plugin unregistered");
        Ok(environment)
    }

    /// Keys of all registered plugins.
    pub async fn plugin_keys(&self) -> Vec<PluginKey> {
        self.containers.read().await.keys().cloned().collect()
    }

    /// Number of registered plugins.
    pub async fn plugin_count(&self) -> usize {
        self.containers.read().await.len()
    }

    /// Current container state of a plugin.
    ///
    /// # Errors
    /// [`PluginError::NotFound`] for an unknown key.
    pub async fn container_state(&self, key: &PluginKey) -> PluginResult<ContainerState> {
        let containers = self.containers.read().await;
        containers
            .get(key)
            .map(PluginContainer::state)
            .ok_or_else(|| PluginError::NotFound { plugin: key.clone() })
    }

    /// Current listener state of a plugin, mirroring its container.
    ///
    /// # Errors
    /// [`PluginError::NotFound`] for an unknown key.
    pub async fn listener_state(&self, key: &PluginKey) -> PluginResult<ContainerState> {
        let containers = self.containers.read().await;
        containers
            .get(key)
            .map(PluginContainer::listener_state)
            .ok_or_else(|| PluginError::NotFound { plugin: key.clone() })
    }

    /// The plugin's deployment environment.
    ///
    /// # Errors
    /// [`PluginError::NotFound`] for an unknown key.
    pub async fn environment(&self, key: &PluginKey) -> PluginResult<PluginEnvironment> {
        let containers = self.containers.read().await;
        containers
            .get(key)
            .map(|c| c.environment().clone())
            .ok_or_else(|| PluginError::NotFound { plugin: key.clone() })
    }

    /// Initialize one plugin's container.
    ///
    /// # Errors
    /// Propagates container transition and listener errors.
    pub async fn initialize_plugin(&self, key: &PluginKey) -> PluginResult<()> {
        let mut containers = self.containers.write().await;
        let container =
            containers.get_mut(key).ok_or_else(|| PluginError::NotFound { plugin: key.clone() })?;
        container.initialize().await
    }

    /// Start one plugin's container.
    ///
    /// # Errors
    /// Propagates container transition and listener errors.
    pub async fn start_plugin(&self, key: &PluginKey) -> PluginResult<()> {
        let mut containers = self.containers.write().await;
        let container =
            containers.get_mut(key).ok_or_else(|| PluginError::NotFound { plugin: key.clone() })?;
        container.start().await
    }

    /// Stop one plugin's container, stopping its resource components first.
    ///
    /// # Errors
    /// Propagates container transition and listener errors.
    pub async fn stop_plugin(&self, key: &PluginKey) -> PluginResult<()> {
        self.stop_components_for_plugin(key).await?;
        let mut containers = self.containers.write().await;
        let container =
            containers.get_mut(key).ok_or_else(|| PluginError::NotFound { plugin: key.clone() })?;
        container.stop().await
    }

    /// Shut one plugin's container down.
    ///
    /// # Errors
    /// Propagates container transition and listener errors.
    pub async fn shutdown_plugin(&self, key: &PluginKey) -> PluginResult<()> {
        let mut containers = self.containers.write().await;
        let container =
            containers.get_mut(key).ok_or_else(|| PluginError::NotFound { plugin: key.clone() })?;
        container.shutdown().await
    }

    /// Initialize every enabled plugin in dependency order.
    ///
    /// A failure is fatal and aborts the sweep; lifecycle errors are never
    /// swallowed.
    ///
    /// # Errors
    /// Dependency resolution and container errors.
    pub async fn initialize_all(&self) -> PluginResult<()> {
        for key in self.start_order().await? {
            self.initialize_plugin(&key).await?;
        }
        Ok(())
    }

    /// Start every enabled plugin in dependency order.
    ///
    /// # Errors
    /// Dependency resolution and container errors.
    pub async fn start_all(&self) -> PluginResult<()> {
        for key in self.start_order().await? {
            self.start_plugin(&key).await?;
        }
        Ok(())
    }

    /// Stop every started plugin in reverse dependency order.
    ///
    /// # Errors
    /// Dependency resolution and container errors.
    pub async fn stop_all(&self) -> PluginResult<()> {
        let mut order = self.start_order().await?;
        order.reverse();
        for key in order {
            if self.container_state(&key).await? == ContainerState::Started {
                self.stop_plugin(&key).await?;
            }
        }
        Ok(())
    }

    /// Shut every stopped plugin down in reverse dependency order.
    ///
    /// # Errors
    /// Dependency resolution and container errors.
    pub async fn shutdown_all(&self) -> PluginResult<()> {
        let mut order = self.start_order().await?;
        order.reverse();
        for key in order {
            if self.container_state(&key).await? == ContainerState::Stopped {
                self.shutdown_plugin(&key).await?;
            }
        }
        Ok(())
    }

    /// Create and start components for a started plugin's committed
    /// resources.
    ///
    /// Component creation or start failures are logged and skipped; one
    /// unreachable endpoint must not block the rest of the plugin's
    /// inventory. Returns how many components started.
    ///
    /// # Errors
    /// - [`PluginError::NotFound`] for an unknown key.
    /// - [`PluginError::InvalidState`] if the plugin is not started.
    pub async fn start_components_for_plugin(&self, key: &PluginKey) -> PluginResult<usize> {
        let factory = {
            let containers = self.containers.read().await;
            let container =
                containers.get(key).ok_or_else(|| PluginError::NotFound { plugin: key.clone() })?;
            if !container.state().is_started() {
                return Err(PluginError::InvalidState {
                    plugin: key.clone(),
                    state: container.state().to_string(),
                    reason: "components can only start under a started plugin".to_string(),
                });
            }
            container.factory()
        };

        let mut started = 0;
        for container in self.registry.committed_resources_for_plugin(key) {
            let resource = container.resource();
            let component = match factory.create_resource_component(&resource).await {
                Ok(component) => component,
                Err(error) => {
                    tracing::warn!(
                        plugin = %key,
                        resource_id = %resource.id,
                        error = %error,
                        "component creation failed; resource skipped"
                    );
                    continue;
                },
            };
            let context = context_for(&container);
            match container.start_component(component, context, self.component_start_timeout).await {
                Ok(()) => started += 1,
                Err(error) => {
                    tracing::warn!(
                        plugin = %key,
                        resource_id = %resource.id,
                        error = %error,
                        "component start failed; resource stays down"
                    );
                },
            }
        }
        tracing::info!(plugin = %key, started = started, "resource components started");
        Ok(started)
    }

    /// Stop every live component belonging to a plugin's resources.
    ///
    /// # Errors
    /// [`PluginError::NotFound`] for an unknown key.
    pub async fn stop_components_for_plugin(&self, key: &PluginKey) -> PluginResult<usize> {
        {
            let containers = self.containers.read().await;
            if !containers.contains_key(key) {
                return Err(PluginError::NotFound { plugin: key.clone() });
            }
        }
        let mut stopped = 0;
        for container in self.registry.committed_resources_for_plugin(key) {
            if container.component().is_some() {
                container.stop_component().await;
                stopped += 1;
            }
        }
        Ok(stopped)
    }

    /// Compute the dependency-ordered start sequence of enabled plugins.
    ///
    /// # Errors
    /// - [`PluginError::MissingDependency`] when a required plugin is not
    ///   registered and enabled.
    /// - [`PluginError::DependencyCycle`] when requirements are circular.
    pub async fn start_order(&self) -> PluginResult<Vec<PluginKey>> {
        let containers = self.containers.read().await;
        let enabled: HashMap<PluginKey, Vec<PluginKey>> = containers
            .iter()
            .filter(|(_, container)| container.environment().enabled)
            .map(|(key, container)| {
                (key.clone(), container.environment().descriptor.required_plugins.clone())
            })
            .collect();

        for (key, requirements) in &enabled {
            for dependency in requirements {
                if !enabled.contains_key(dependency) {
                    return Err(PluginError::MissingDependency {
                        plugin: key.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        // Kahn's algorithm; ties broken by key for a deterministic order.
        let mut indegree: HashMap<&PluginKey, usize> =
            enabled.keys().map(|key| (key, 0)).collect();
        let mut dependents: HashMap<&PluginKey, Vec<&PluginKey>> = HashMap::new();
        for (key, requirements) in &enabled {
            for dependency in requirements {
                if let Some(degree) = indegree.get_mut(key) {
                    *degree += 1;
                }
                dependents.entry(dependency).or_default().push(key);
            }
        }

        let mut ready: Vec<&PluginKey> =
            indegree.iter().filter(|(_, d)| **d == 0).map(|(k, _)| *k).collect();
        ready.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        let mut queue: VecDeque<&PluginKey> = ready.into();

        let mut order = Vec::with_capacity(enabled.len());
        while let Some(key) = queue.pop_front() {
            order.push(key.clone());
            let mut unblocked = Vec::new();
            for dependent in dependents.get(key).map(Vec::as_slice).unwrap_or_default() {
                if let Some(degree) = indegree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        unblocked.push(*dependent);
                    }
                }
            }
            unblocked.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            queue.extend(unblocked);
        }

        if order.len() != enabled.len() {
            let stuck: Vec<String> = enabled
                .keys()
                .filter(|key| !order.contains(*key))
                .map(|key| key.as_str().to_string())
                .collect();
            return Err(PluginError::DependencyCycle { plugins: stuck.join(", ") });
        }
        Ok(order)
    }
}
