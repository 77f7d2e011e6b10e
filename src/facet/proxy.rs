//! Facet proxies: lock-disciplined wrappers around resource components.
//!
//! A [`FacetProxy`] implements every capability facet by delegating to the
//! container's live component, bracketing each call with the resource's
//! lock. The lock's lifetime is exactly the invocation's lifetime: the
//! guard is taken before the component runs and dropped on every exit path
//! (success, component error, or caller cancellation). A call whose lock
//! acquisition times out fails without ever invoking the component.

use crate::facet::lock::{FacetLockGuard, FacetLockType};
use crate::facet::{
    AvailabilityFacet, ComponentContext, ConfigurationFacet, FacetError, FacetKind, FacetResult,
    MeasurementFacet, MeasurementReading, MeasurementRequest, OperationFacet, OperationOutcome,
    ResourceComponent, ResourceConfiguration,
};
use crate::resource::ResourceContainer;
use crate::types::AvailabilityState;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// How a proxy acquires the resource lock around each call.
#[derive(Debug, Clone, Copy)]
pub struct ProxyOptions {
    /// Lock mode required by the facet class being proxied.
    pub lock_type: FacetLockType,
    /// Maximum time to wait for the lock.
    pub timeout: Duration,
    /// Proceed without the lock when it cannot be acquired in time.
    ///
    /// For nested facet calls whose outer call already holds the lock.
    pub lock_optional: bool,
    /// Run the component call on a detached task so it completes (and the
    /// lock is released) even if the caller is cancelled mid-invocation.
    pub detached: bool,
}

impl ProxyOptions {
    /// Shared-lock options for availability/measurement calls.
    #[must_use]
    pub const fn read(timeout: Duration) -> Self {
        Self { lock_type: FacetLockType::Read, timeout, lock_optional: false, detached: false }
    }

    /// Exclusive-lock options for operation/configuration calls.
    #[must_use]
    pub const fn write(timeout: Duration) -> Self {
        Self { lock_type: FacetLockType::Write, timeout, lock_optional: false, detached: false }
    }

    /// Lock-free options for calls that cannot disturb the endpoint.
    #[must_use]
    pub const fn unlocked(timeout: Duration) -> Self {
        Self { lock_type: FacetLockType::None, timeout, lock_optional: false, detached: false }
    }

    /// Mark the lock as optional under contention.
    #[must_use]
    pub const fn lock_optional(mut self) -> Self {
        self.lock_optional = true;
        self
    }

    /// Mark the invocation as detached from caller cancellation.
    #[must_use]
    pub const fn detached(mut self) -> Self {
        self.detached = true;
        self
    }
}

/// Lock-enforcing wrapper implementing all capability facets for one
/// resource.
pub struct FacetProxy {
    container: Arc<ResourceContainer>,
    options: ProxyOptions,
}

impl FacetProxy {
    /// Create a proxy over a resource's container.
    #[must_use]
    pub fn new(container: Arc<ResourceContainer>, options: ProxyOptions) -> Self {
        Self { container, options }
    }

    /// The options this proxy applies to every call.
    #[must_use]
    pub const fn options(&self) -> &ProxyOptions {
        &self.options
    }

    /// Acquire lock, invoke, log failures, release on all paths.
    async fn invoke<T, F, Fut>(&self, facet: FacetKind, call: F) -> FacetResult<T>
    where
        F: FnOnce(Arc<dyn ResourceComponent>) -> Fut,
        Fut: Future<Output = FacetResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let resource_id = self.container.resource_id();
        let component = self
            .container
            .component()
            .ok_or(FacetError::ComponentNotStarted { resource_id })?;

        let supported = match facet {
            FacetKind::Availability => component.availability().is_some(),
            FacetKind::Measurement => component.measurement().is_some(),
            FacetKind::Operation => component.operation().is_some(),
            FacetKind::Configuration => component.configuration().is_some(),
        };
        if !supported {
            return Err(FacetError::UnsupportedFacet { resource_id, facet });
        }

        // Timed-out acquisition returns here; the component is never invoked.
        let guard: FacetLockGuard = if self.options.lock_optional {
            self.container
                .facet_lock()
                .acquire_optional(self.options.lock_type, self.options.timeout)
                .await
        } else {
            self.container.facet_lock().acquire(self.options.lock_type, self.options.timeout).await?
        };

        let future = call(component);
        let result = if self.options.detached {
            let task = tokio::spawn(async move {
                let _guard = guard;
                future.await
            });
            match task.await {
                Ok(result) => result,
                Err(join_error) => {
                    Err(FacetError::TaskFailure { resource_id, reason: join_error.to_string() })
                },
            }
        } else {
            let _guard = guard;
            future.await
        };

        if let Err(error) = &result {
            tracing::warn!(
                resource_id = %resource_id,
                facet = %facet,
                error = %error,
                "facet invocation failed"
            );
        }
        result
    }
}

#[async_trait]
impl AvailabilityFacet for FacetProxy {
    async fn get_availability(&self) -> FacetResult<AvailabilityState> {
        let resource_id = self.container.resource_id();
        self.invoke(FacetKind::Availability, move |component| async move {
            match component.availability() {
                Some(delegate) => delegate.get_availability().await,
                None => {
                    Err(FacetError::UnsupportedFacet { resource_id, facet: FacetKind::Availability })
                },
            }
        })
        .await
    }
}

#[async_trait]
impl MeasurementFacet for FacetProxy {
    async fn get_values(&self, request: MeasurementRequest) -> FacetResult<Vec<MeasurementReading>> {
        let resource_id = self.container.resource_id();
        self.invoke(FacetKind::Measurement, move |component| async move {
            match component.measurement() {
                Some(delegate) => delegate.get_values(request).await,
                None => {
                    Err(FacetError::UnsupportedFacet { resource_id, facet: FacetKind::Measurement })
                },
            }
        })
        .await
    }
}

#[async_trait]
impl OperationFacet for FacetProxy {
    async fn invoke_operation(
        &self,
        name: String,
        arguments: serde_json::Value,
    ) -> FacetResult<OperationOutcome> {
        let resource_id = self.container.resource_id();
        self.invoke(FacetKind::Operation, move |component| async move {
            match component.operation() {
                Some(delegate) => delegate.invoke_operation(name, arguments).await,
                None => {
                    Err(FacetError::UnsupportedFacet { resource_id, facet: FacetKind::Operation })
                },
            }
        })
        .await
    }
}

#[async_trait]
impl ConfigurationFacet for FacetProxy {
    async fn load_configuration(&self) -> FacetResult<ResourceConfiguration> {
        let resource_id = self.container.resource_id();
        self.invoke(FacetKind::Configuration, move |component| async move {
            match component.configuration() {
                Some(delegate) => delegate.load_configuration().await,
                None => {
                    Err(FacetError::UnsupportedFacet { resource_id, facet: FacetKind::Configuration })
                },
            }
        })
        .await
    }

    async fn update_configuration(&self, configuration: ResourceConfiguration) -> FacetResult<()> {
        let resource_id = self.container.resource_id();
        self.invoke(FacetKind::Configuration, move |component| async move {
            match component.configuration() {
                Some(delegate) => delegate.update_configuration(configuration).await,
                None => {
                    Err(FacetError::UnsupportedFacet { resource_id, facet: FacetKind::Configuration })
                },
            }
        })
        .await
    }
}

impl ResourceContainer {
    /// Create a facet proxy over this container.
    #[must_use]
    pub fn create_proxy(self: &Arc<Self>, options: ProxyOptions) -> FacetProxy {
        FacetProxy::new(Arc::clone(self), options)
    }
}

/// Build the [`ComponentContext`] for a container's resource.
#[must_use]
pub fn context_for(container: &ResourceContainer) -> ComponentContext {
    let resource = container.resource();
    let plugin = resource.resource_type.plugin.clone();
    ComponentContext::new(resource, plugin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Resource, ResourceCategory, ResourceType};
    use crate::types::PluginKey;
    use std::sync::atomic::{AtomicU64, Ordering};

    const WAIT: Duration = Duration::from_millis(30);

    struct ProbeComponent {
        invocations: AtomicU64,
        fail: bool,
    }

    impl ProbeComponent {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self { invocations: AtomicU64::new(0), fail })
        }
    }

    #[async_trait]
    impl AvailabilityFacet for ProbeComponent {
        async fn get_availability(&self) -> FacetResult<AvailabilityState> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FacetError::Invocation {
                    resource_id: crate::types::ResourceId::new(),
                    facet: FacetKind::Availability,
                    reason: "endpoint refused connection".to_string(),
                });
            }
            Ok(AvailabilityState::Up)
        }
    }

    #[async_trait]
    impl ResourceComponent for ProbeComponent {
        async fn start(&self, _context: ComponentContext) -> FacetResult<()> {
            Ok(())
        }

        async fn stop(&self) -> FacetResult<()> {
            Ok(())
        }

        fn availability(&self) -> Option<&dyn AvailabilityFacet> {
            Some(self)
        }
    }

    async fn started_container(component: Arc<ProbeComponent>) -> Arc<ResourceContainer> {
        let rt = Arc::new(ResourceType::new(
            "Probe",
            PluginKey::new("probe-plugin"),
            ResourceCategory::Service,
        ));
        let resource = Resource::new("probe-1", "Probe One", rt, None, "agent-a");
        let container = Arc::new(ResourceContainer::new(resource));
        let context = context_for(&container);
        container.start_component(component, context, Duration::from_secs(1)).await.unwrap();
        container
    }

    #[tokio::test]
    async fn test_proxy_delegates_and_releases() {
        let component = ProbeComponent::new(false);
        let container = started_container(Arc::clone(&component)).await;
        let proxy = container.create_proxy(ProxyOptions::read(WAIT));

        assert_eq!(proxy.get_availability().await.unwrap(), AvailabilityState::Up);
        assert_eq!(component.invocations.load(Ordering::SeqCst), 1);

        // Lock released after the call: a writer can acquire immediately.
        let write = container.facet_lock().acquire(FacetLockType::Write, WAIT).await;
        assert!(write.is_ok());
    }

    #[tokio::test]
    async fn test_timed_out_call_never_invokes_component() {
        let component = ProbeComponent::new(false);
        let container = started_container(Arc::clone(&component)).await;
        let proxy = container.create_proxy(ProxyOptions::read(WAIT));

        let _held = container.facet_lock().acquire(FacetLockType::Write, WAIT).await.unwrap();
        let denied = proxy.get_availability().await;

        assert!(matches!(denied, Err(FacetError::LockTimeout { .. })));
        assert_eq!(component.invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_component_error_propagates_verbatim() {
        let component = ProbeComponent::new(true);
        let container = started_container(Arc::clone(&component)).await;
        let proxy = container.create_proxy(ProxyOptions::read(WAIT));

        let err = proxy.get_availability().await.unwrap_err();
        match err {
            FacetError::Invocation { reason, .. } => {
                assert_eq!(reason, "endpoint refused connection");
            },
            other => panic!("expected Invocation error, got {other:?}"),
        }
        assert_eq!(component.invocations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsupported_facet_rejected_without_locking() {
        let component = ProbeComponent::new(false);
        let container = started_container(component).await;
        let proxy = container.create_proxy(ProxyOptions::write(WAIT));

        let result = proxy.invoke_operation("restart".to_string(), serde_json::Value::Null).await;
        assert!(matches!(result, Err(FacetError::UnsupportedFacet { .. })));
    }

    #[tokio::test]
    async fn test_no_component_rejected() {
        let rt = Arc::new(ResourceType::new(
            "Probe",
            PluginKey::new("probe-plugin"),
            ResourceCategory::Service,
        ));
        let resource = Resource::new("probe-2", "Probe Two", rt, None, "agent-a");
        let container = Arc::new(ResourceContainer::new(resource));
        let proxy = container.create_proxy(ProxyOptions::read(WAIT));

        let result = proxy.get_availability().await;
        assert!(matches!(result, Err(FacetError::ComponentNotStarted { .. })));
    }

    #[tokio::test]
    async fn test_lock_optional_proceeds_under_contention() {
        let component = ProbeComponent::new(false);
        let container = started_container(Arc::clone(&component)).await;
        let proxy = container.create_proxy(ProxyOptions::read(WAIT).lock_optional());

        let _held = container.facet_lock().acquire(FacetLockType::Write, WAIT).await.unwrap();
        let result = proxy.get_availability().await;

        assert_eq!(result.unwrap(), AvailabilityState::Up);
        assert_eq!(component.invocations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_detached_invocation_completes() {
        let component = ProbeComponent::new(false);
        let container = started_container(Arc::clone(&component)).await;
        let proxy = container.create_proxy(ProxyOptions::read(WAIT).detached());

        assert_eq!(proxy.get_availability().await.unwrap(), AvailabilityState::Up);
        assert_eq!(component.invocations.load(Ordering::SeqCst), 1);
    }
}
