//! Plugin-supplied lifecycle listeners and component factories.

use crate::facet::ResourceComponent;
use crate::plugin::PluginResult;
use crate::resource::Resource;
use crate::types::PluginKey;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Context handed to a lifecycle listener at `initialize`.
///
/// The registration ID identifies the current deployment only; a listener
/// created after undeploy/redeploy sees a fresh ID and must not assume any
/// state from a previous deployment.
#[derive(Debug, Clone)]
pub struct ListenerContext {
    /// Key of the plugin the listener belongs to.
    pub plugin: PluginKey,
    /// Identity of the current deployment.
    pub registration_id: Uuid,
}

/// Lifecycle callbacks a plugin supplies for its container.
///
/// The container mirrors its own state machine into the listener: each
/// callback fires synchronously inside the corresponding container
/// transition, and only then. A listener never observes another plugin's
/// transitions and never observes its own out of order.
#[async_trait]
pub trait LifecycleListener: Send + Sync {
    /// The container is initializing.
    async fn initialize(&self, context: ListenerContext) -> PluginResult<()>;

    /// The container is starting.
    async fn start(&self) -> PluginResult<()>;

    /// The container is stopping.
    async fn stop(&self) -> PluginResult<()>;

    /// The container is shutting down; the listener is dropped afterwards.
    async fn shutdown(&self) -> PluginResult<()>;
}

/// Factory supplied by a plugin for its runtime artifacts.
///
/// Produces one fresh [`LifecycleListener`] per container cycle and one
/// [`ResourceComponent`] per managed resource.
#[async_trait]
pub trait PluginComponentFactory: Send + Sync {
    /// Create a new lifecycle listener in its pristine state.
    fn create_lifecycle_listener(&self) -> Box<dyn LifecycleListener>;

    /// Create the management component for one resource.
    async fn create_resource_component(
        &self,
        resource: &Resource,
    ) -> PluginResult<Arc<dyn ResourceComponent>>;
}
