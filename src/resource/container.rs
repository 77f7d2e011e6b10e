//! Runtime wrapper around one inventoried resource.

use crate::facet::lock::FacetLock;
use crate::facet::{ComponentContext, FacetError, FacetResult, ResourceComponent};
use crate::resource::{InventoryStatus, Resource};
use crate::types::ResourceId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Lifecycle state of a resource's component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ComponentState {
    /// No live component.
    #[default]
    Stopped,
    /// A component is being started; not yet published.
    Starting,
    /// A component is live and servicing facet calls.
    Started,
}

/// Runtime wrapper owning a resource's live component, its component
/// state, and the per-resource facet lock.
///
/// Exactly one container exists per resource identity at a time. The
/// component reference is published only after its `start` completed, so a
/// registry lookup never observes a partially-initialized component.
pub struct ResourceContainer {
    resource: parking_lot::RwLock<Resource>,
    component: parking_lot::RwLock<Option<Arc<dyn ResourceComponent>>>,
    state: parking_lot::RwLock<ComponentState>,
    lifecycle_gate: tokio::sync::Mutex<()>,
    facet_lock: FacetLock,
    created_at: Instant,
}

impl ResourceContainer {
    /// Create a container for the given resource, with no component.
    #[must_use]
    pub fn new(resource: Resource) -> Self {
        let facet_lock = FacetLock::new(resource.id);
        Self {
            resource: parking_lot::RwLock::new(resource),
            component: parking_lot::RwLock::new(None),
            state: parking_lot::RwLock::new(ComponentState::Stopped),
            lifecycle_gate: tokio::sync::Mutex::new(()),
            facet_lock,
            created_at: Instant::now(),
        }
    }

    /// ID of the wrapped resource.
    #[must_use]
    pub fn resource_id(&self) -> ResourceId {
        self.resource.read().id
    }

    /// Snapshot of the wrapped resource.
    #[must_use]
    pub fn resource(&self) -> Resource {
        self.resource.read().clone()
    }

    /// Apply an in-place update to the wrapped resource.
    pub fn update_resource(&self, update: impl FnOnce(&mut Resource)) {
        let mut resource = self.resource.write();
        update(&mut resource);
        resource.mtime = chrono::Utc::now();
    }

    /// Current inventory status of the wrapped resource.
    #[must_use]
    pub fn inventory_status(&self) -> InventoryStatus {
        self.resource.read().inventory_status
    }

    /// Current component state.
    #[must_use]
    pub fn component_state(&self) -> ComponentState {
        *self.state.read()
    }

    /// The live component, if one is started.
    #[must_use]
    pub fn component(&self) -> Option<Arc<dyn ResourceComponent>> {
        self.component.read().clone()
    }

    /// The per-resource facet lock.
    #[must_use]
    pub const fn facet_lock(&self) -> &FacetLock {
        &self.facet_lock
    }

    /// Age of this container.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Start a component for this resource and publish it.
    ///
    /// The component's `start` must complete within `start_timeout`. On any
    /// failure the container stays in [`ComponentState::Stopped`] with no
    /// component published.
    ///
    /// # Errors
    /// - [`FacetError::ComponentStart`] if a component is already live or
    ///   `start` timed out; the component's own start error otherwise.
    pub async fn start_component(
        &self,
        component: Arc<dyn ResourceComponent>,
        context: ComponentContext,
        start_timeout: Duration,
    ) -> FacetResult<()> {
        let _gate = self.lifecycle_gate.lock().await;
        let resource_id = self.resource_id();

        if self.component_state() != ComponentState::Stopped {
            return Err(FacetError::ComponentStart {
                resource_id,
                reason: "component already started".to_string(),
            });
        }
        *self.state.write() = ComponentState::Starting;

        let started = match timeout(start_timeout, component.start(context)).await {
            Ok(result) => result,
            Err(_) => Err(FacetError::ComponentStart {
                resource_id,
                reason: format!("start timed out after {start_timeout:?}"),
            }),
        };

        match started {
            Ok(()) => {
                *self.component.write() = Some(component);
                *self.state.write() = ComponentState::Started;
                tracing::debug!(resource_id = %resource_id, "resource component started");
                Ok(())
            },
            Err(error) => {
                *self.state.write() = ComponentState::Stopped;
                tracing::warn!(
                    resource_id = %resource_id,
                    error = %error,
                    "resource component failed to start"
                );
                Err(error)
            },
        }
    }

    /// Stop and unpublish the live component.
    ///
    /// A failing `stop` is logged but the container still transitions to
    /// [`ComponentState::Stopped`]; the endpoint may be unreachable and the
    /// container must not wedge on it. Idempotent.
    pub async fn stop_component(&self) {
        let _gate = self.lifecycle_gate.lock().await;
        let component = self.component.write().take();
        let Some(component) = component else {
            *self.state.write() = ComponentState::Stopped;
            return;
        };

        if let Err(error) = component.stop().await {
            tracing::warn!(
                resource_id = %self.resource_id(),
                error = %error,
                "resource component stop failed; container stopped anyway"
            );
        }
        *self.state.write() = ComponentState::Stopped;
        tracing::debug!(resource_id = %self.resource_id(), "resource component stopped");
    }
}

impl std::fmt::Debug for ResourceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceContainer")
            .field("resource_id", &self.resource_id())
            .field("state", &self.component_state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ResourceCategory, ResourceType};
    use crate::types::PluginKey;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct TestComponent {
        fail_start: bool,
        stopped: AtomicBool,
    }

    impl TestComponent {
        fn new(fail_start: bool) -> Arc<Self> {
            Arc::new(Self { fail_start, stopped: AtomicBool::new(false) })
        }
    }

    #[async_trait]
    impl ResourceComponent for TestComponent {
        async fn start(&self, context: ComponentContext) -> FacetResult<()> {
            if self.fail_start {
                return Err(FacetError::Invocation {
                    resource_id: context.resource_id(),
                    facet: crate::facet::FacetKind::Availability,
                    reason: "refused".to_string(),
                });
            }
            Ok(())
        }

        async fn stop(&self) -> FacetResult<()> {
            self.stopped.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn test_resource() -> Resource {
        let rt = Arc::new(ResourceType::new(
            "Test Service",
            PluginKey::new("test-plugin"),
            ResourceCategory::Service,
        ));
        Resource::new("svc-1", "Service One", rt, None, "agent-a")
    }

    #[tokio::test]
    async fn test_start_publishes_component() {
        let container = ResourceContainer::new(test_resource());
        assert_eq!(container.component_state(), ComponentState::Stopped);
        assert!(container.component().is_none());

        let component = TestComponent::new(false);
        let context = ComponentContext::new(container.resource(), PluginKey::new("test-plugin"));
        container.start_component(component, context, Duration::from_secs(1)).await.unwrap();

        assert_eq!(container.component_state(), ComponentState::Started);
        assert!(container.component().is_some());
    }

    #[tokio::test]
    async fn test_failed_start_publishes_nothing() {
        let container = ResourceContainer::new(test_resource());
        let component = TestComponent::new(true);
        let context = ComponentContext::new(container.resource(), PluginKey::new("test-plugin"));

        let result = container.start_component(component, context, Duration::from_secs(1)).await;
        assert!(result.is_err());
        assert_eq!(container.component_state(), ComponentState::Stopped);
        assert!(container.component().is_none());
    }

    #[tokio::test]
    async fn test_double_start_rejected() {
        let container = ResourceContainer::new(test_resource());
        let context = ComponentContext::new(container.resource(), PluginKey::new("test-plugin"));
        container
            .start_component(TestComponent::new(false), context.clone(), Duration::from_secs(1))
            .await
            .unwrap();

        let again = container
            .start_component(TestComponent::new(false), context, Duration::from_secs(1))
            .await;
        assert!(again.is_err());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let container = ResourceContainer::new(test_resource());
        let component = TestComponent::new(false);
        let context = ComponentContext::new(container.resource(), PluginKey::new("test-plugin"));
        container.start_component(component.clone(), context, Duration::from_secs(1)).await.unwrap();

        container.stop_component().await;
        assert!(component.stopped.load(Ordering::SeqCst));
        assert_eq!(container.component_state(), ComponentState::Stopped);

        container.stop_component().await;
        assert_eq!(container.component_state(), ComponentState::Stopped);
    }

    #[tokio::test]
    async fn test_update_resource_bumps_mtime() {
        let container = ResourceContainer::new(test_resource());
        let before = container.resource().mtime;
        container.update_resource(|r| r.name = "Renamed".to_string());
        let after = container.resource();
        assert_eq!(after.name, "Renamed");
        assert!(after.mtime >= before);
    }
}
