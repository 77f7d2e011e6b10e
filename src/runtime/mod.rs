//! Process bootstrap: wires the registry, plugin manager, and condition
//! cache coordinator together and bounds inbound work on a fixed-size
//! worker pool.
//!
//! Everything here is explicitly constructed and dependency-injected;
//! there are no ambient singletons. A process builds one
//! [`PlatformRuntime`], drives `start`/`shutdown` around its lifetime, and
//! hands the inner services to collaborators that need them.

use crate::alert::{CacheMonitor, ConditionCacheCoordinator, ConditionSink, Datum};
use crate::config::SentraConfig;
use crate::error::{Error, Result};
use crate::facet::{FacetLockType, FacetProxy, ProxyOptions};
use crate::plugin::PluginManager;
use crate::resource::ResourceRegistry;
use crate::types::ResourceId;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use validator::Validate;

/// Fixed-size worker pool for inbound facet calls and data dispatch.
///
/// Unrelated resources never serialize behind a global lock here; the pool
/// only bounds how many invocations run at once.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    permits: Arc<Semaphore>,
}

impl Dispatcher {
    /// Create a pool admitting `worker_pool_size` concurrent tasks.
    #[must_use]
    pub fn new(worker_pool_size: usize) -> Self {
        Self { permits: Arc::new(Semaphore::new(worker_pool_size)) }
    }

    /// Run a task on the pool, waiting for a free worker slot.
    ///
    /// # Errors
    /// [`Error::Internal`] if the pool is gone or the task panicked.
    pub async fn dispatch<F, T>(&self, task: F) -> Result<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self.permits.clone().acquire_owned().await.map_err(|_| Error::Internal {
            message: "dispatcher pool is closed".to_string(),
        })?;
        let handle = tokio::spawn(async move {
            let _permit = permit;
            task.await
        });
        handle.await.map_err(|join_error| Error::Internal {
            message: format!("dispatched task failed: {join_error}"),
        })
    }

    /// Currently free worker slots.
    #[must_use]
    pub fn available_workers(&self) -> usize {
        self.permits.available_permits()
    }
}

/// The assembled platform core.
pub struct PlatformRuntime {
    config: SentraConfig,
    registry: Arc<ResourceRegistry>,
    plugin_manager: Arc<PluginManager>,
    coordinator: Arc<ConditionCacheCoordinator>,
    dispatcher: Dispatcher,
}

impl PlatformRuntime {
    /// Assemble the core services from a validated configuration.
    ///
    /// # Errors
    /// [`Error::Configuration`] for an invalid configuration.
    pub fn new(config: SentraConfig, sink: Arc<dyn ConditionSink>) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(ResourceRegistry::new());
        let plugin_manager = Arc::new(PluginManager::new(Arc::clone(&registry), &config));
        let monitor = Arc::new(CacheMonitor::new());
        let coordinator = Arc::new(ConditionCacheCoordinator::new(monitor, sink));
        let dispatcher = Dispatcher::new(config.worker_pool_size);
        tracing::info!(workers = config.worker_pool_size, "platform runtime assembled");
        Ok(Self { config, registry, plugin_manager, coordinator, dispatcher })
    }

    /// The runtime's configuration.
    #[must_use]
    pub const fn config(&self) -> &SentraConfig {
        &self.config
    }

    /// The resource registry.
    #[must_use]
    pub fn registry(&self) -> Arc<ResourceRegistry> {
        Arc::clone(&self.registry)
    }

    /// The plugin manager.
    #[must_use]
    pub fn plugin_manager(&self) -> Arc<PluginManager> {
        Arc::clone(&self.plugin_manager)
    }

    /// The condition cache coordinator.
    #[must_use]
    pub fn coordinator(&self) -> Arc<ConditionCacheCoordinator> {
        Arc::clone(&self.coordinator)
    }

    /// The bounded dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Bring every enabled plugin up and start components for committed
    /// resources.
    ///
    /// # Errors
    /// Lifecycle errors are fatal to startup and propagate unswallowed.
    pub async fn start(&self) -> Result<()> {
        self.plugin_manager.initialize_all().await?;
        self.plugin_manager.start_all().await?;
        for key in self.plugin_manager.start_order().await? {
            self.plugin_manager.start_components_for_plugin(&key).await?;
        }
        tracing::info!("platform runtime started");
        Ok(())
    }

    /// Stop and shut down every plugin (components first, reverse
    /// dependency order).
    ///
    /// # Errors
    /// Lifecycle errors propagate unswallowed.
    pub async fn shutdown(&self) -> Result<()> {
        self.plugin_manager.stop_all().await?;
        self.plugin_manager.shutdown_all().await?;
        tracing::info!("platform runtime shut down");
        Ok(())
    }

    /// Dispatch one monitoring datum on the worker pool.
    ///
    /// # Errors
    /// [`Error::Internal`] if the pool rejected the task.
    pub async fn dispatch_datum(&self, datum: Datum) -> Result<usize> {
        let coordinator = Arc::clone(&self.coordinator);
        self.dispatcher.dispatch(async move { coordinator.process_data(datum).await }).await
    }

    /// Create a facet proxy for a resource, using the configured default
    /// lock timeout.
    ///
    /// # Errors
    /// [`Error::Inventory`] if the resource is not registered.
    pub fn create_proxy(
        &self,
        resource_id: ResourceId,
        lock_type: FacetLockType,
    ) -> Result<FacetProxy> {
        let container = self.registry.get(resource_id)?;
        let options = ProxyOptions {
            lock_type,
            timeout: self.config.default_facet_timeout(),
            lock_optional: false,
            detached: false,
        };
        Ok(container.create_proxy(options))
    }
}

/// Install the process-wide tracing subscriber.
///
/// Filter comes from `RUST_LOG`; defaults to `info`. Safe to call more
/// than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::NullConditionSink;
    use crate::types::{AvailabilityState, ResourceId};

    #[tokio::test]
    async fn test_dispatcher_bounds_concurrency() {
        let dispatcher = Dispatcher::new(2);
        assert_eq!(dispatcher.available_workers(), 2);

        let result = dispatcher.dispatch(async { 21 * 2 }).await.unwrap();
        assert_eq!(result, 42);
        assert_eq!(dispatcher.available_workers(), 2);
    }

    #[tokio::test]
    async fn test_runtime_rejects_invalid_config() {
        let mut config = SentraConfig::development();
        config.worker_pool_size = 0;
        let result = PlatformRuntime::new(config, Arc::new(NullConditionSink));
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_runtime_start_shutdown_empty() {
        let runtime =
            PlatformRuntime::new(SentraConfig::development(), Arc::new(NullConditionSink)).unwrap();
        runtime.start().await.unwrap();
        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_datum_reaches_coordinator() {
        let runtime =
            PlatformRuntime::new(SentraConfig::development(), Arc::new(NullConditionSink)).unwrap();
        let matched = runtime
            .dispatch_datum(Datum::Availability {
                resource_id: ResourceId::new(),
                state: AvailabilityState::Down,
            })
            .await
            .unwrap();
        assert_eq!(matched, 0);
        assert_eq!(runtime.coordinator().monitor().data_processed(
            crate::alert::CacheSubsystem::Availability
        ), 1);
    }
}
