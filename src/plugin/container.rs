//! The runtime container hosting one plugin.

use crate::plugin::{
    ContainerState, LifecycleListener, LifecycleStats, ListenerContext, PluginComponentFactory,
    PluginEnvironment, PluginError, PluginResult,
};
use std::sync::Arc;

/// Runtime host for one plugin: its environment, component factory,
/// lifecycle listener, and the strict container state machine.
///
/// The listener's state mirrors the container's at every step: listener
/// callbacks fire synchronously inside container transitions, and a failed
/// callback aborts the transition, leaving both state machines where they
/// were.
pub struct PluginContainer {
    environment: PluginEnvironment,
    factory: Arc<dyn PluginComponentFactory>,
    state: ContainerState,
    listener: Option<Box<dyn LifecycleListener>>,
    listener_state: ContainerState,
    stats: LifecycleStats,
}

impl PluginContainer {
    /// Create a dormant container for a deployed plugin.
    #[must_use]
    pub fn new(environment: PluginEnvironment, factory: Arc<dyn PluginComponentFactory>) -> Self {
        Self {
            environment,
            factory,
            state: ContainerState::Uninitialized,
            listener: None,
            listener_state: ContainerState::Uninitialized,
            stats: LifecycleStats::new(),
        }
    }

    /// The plugin's deployment environment.
    #[must_use]
    pub const fn environment(&self) -> &PluginEnvironment {
        &self.environment
    }

    /// The plugin's component factory.
    #[must_use]
    pub fn factory(&self) -> Arc<dyn PluginComponentFactory> {
        Arc::clone(&self.factory)
    }

    /// Current container state.
    #[must_use]
    pub const fn state(&self) -> ContainerState {
        self.state
    }

    /// Current listener state, mirroring the container's.
    #[must_use]
    pub const fn listener_state(&self) -> ContainerState {
        self.listener_state
    }

    /// Lifecycle transition counters.
    #[must_use]
    pub const fn stats(&self) -> &LifecycleStats {
        &self.stats
    }

    /// Initialize the container. Valid only from `Uninitialized`.
    ///
    /// Creates a fresh lifecycle listener (one per container cycle) and
    /// runs its `initialize` callback. On listener failure the container
    /// stays `Uninitialized` with no listener retained.
    ///
    /// # Errors
    /// - [`PluginError::IllegalTransition`] when called out of order.
    /// - [`PluginError::ListenerFailure`] when the listener rejects.
    pub async fn initialize(&mut self) -> PluginResult<()> {
        self.guard("initialize", ContainerState::Uninitialized)?;

        let listener = self.factory.create_lifecycle_listener();
        let context = ListenerContext {
            plugin: self.environment.key().clone(),
            registration_id: self.environment.registration_id,
        };
        listener.initialize(context).await.map_err(|error| self.listener_failure("initialize", error))?;

        self.listener = Some(listener);
        self.advance(ContainerState::Initialized);
        Ok(())
    }

    /// Start the container. Valid only from `Initialized`.
    ///
    /// # Errors
    /// - [`PluginError::IllegalTransition`] when called out of order.
    /// - [`PluginError::ListenerFailure`] when the listener rejects.
    pub async fn start(&mut self) -> PluginResult<()> {
        self.guard("start", ContainerState::Initialized)?;
        let result = match self.listener.as_ref() {
            Some(listener) => listener.start().await,
            None => return Err(self.missing_listener()),
        };
        result.map_err(|error| self.listener_failure("start", error))?;
        self.advance(ContainerState::Started);
        Ok(())
    }

    /// Stop the container. Valid only from `Started`.
    ///
    /// # Errors
    /// - [`PluginError::IllegalTransition`] when called out of order.
    /// - [`PluginError::ListenerFailure`] when the listener rejects.
    pub async fn stop(&mut self) -> PluginResult<()> {
        self.guard("stop", ContainerState::Started)?;
        let result = match self.listener.as_ref() {
            Some(listener) => listener.stop().await,
            None => return Err(self.missing_listener()),
        };
        result.map_err(|error| self.listener_failure("stop", error))?;
        self.advance(ContainerState::Stopped);
        Ok(())
    }

    /// Shut the container down. Valid only from `Stopped`.
    ///
    /// Drops the listener; the next cycle gets a fresh one.
    ///
    /// # Errors
    /// - [`PluginError::IllegalTransition`] when called out of order.
    /// - [`PluginError::ListenerFailure`] when the listener rejects.
    pub async fn shutdown(&mut self) -> PluginResult<()> {
        self.guard("shutdown", ContainerState::Stopped)?;
        let result = match self.listener.as_ref() {
            Some(listener) => listener.shutdown().await,
            None => return Err(self.missing_listener()),
        };
        result.map_err(|error| self.listener_failure("shutdown", error))?;
        self.listener = None;
        self.advance(ContainerState::Uninitialized);
        Ok(())
    }

    fn guard(&self, operation: &'static str, required: ContainerState) -> PluginResult<()> {
        if self.state == required {
            return Ok(());
        }
        self.stats.record_rejected();
        tracing::error!(
            plugin = %self.environment.key(),
            operation = operation,
            state = %self.state,
            "illegal plugin lifecycle transition"
        );
        Err(PluginError::IllegalTransition {
            plugin: self.environment.key().clone(),
            operation,
            state: self.state.to_string(),
        })
    }

    fn missing_listener(&self) -> PluginError {
        PluginError::InvalidState {
            plugin: self.environment.key().clone(),
            state: self.state.to_string(),
            reason: "no lifecycle listener".to_string(),
        }
    }

    fn listener_failure(&self, phase: &'static str, error: PluginError) -> PluginError {
        tracing::error!(
            plugin = %self.environment.key(),
            phase = phase,
            error = %error,
            "plugin lifecycle listener failed"
        );
        PluginError::ListenerFailure {
            plugin: self.environment.key().clone(),
            phase,
            reason: error.to_string(),
        }
    }

    fn advance(&mut self, target: ContainerState) {
        debug_assert!(self.state.can_transition_to(target));
        self.state = target;
        self.listener_state = target;
        self.stats.record_transition();
        tracing::info!(
            plugin = %self.environment.key(),
            state = %target,
            "plugin container transitioned"
        );
    }
}

impl std::fmt::Debug for PluginContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContainer")
            .field("plugin", self.environment.key())
            .field("state", &self.state)
            .field("listener_state", &self.listener_state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facet::ResourceComponent;
    use crate::plugin::PluginDescriptor;
    use crate::resource::Resource;
    use crate::types::PluginKey;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct RecordingListener {
        phases: Arc<Mutex<Vec<&'static str>>>,
        fail_on_start: bool,
    }

    #[async_trait]
    impl LifecycleListener for RecordingListener {
        async fn initialize(&self, _context: ListenerContext) -> PluginResult<()> {
            self.phases.lock().push("initialize");
            Ok(())
        }

        async fn start(&self) -> PluginResult<()> {
            if self.fail_on_start {
                return Err(PluginError::InvalidState {
                    plugin: PluginKey::new("test"),
                    state: "INITIALIZED".to_string(),
                    reason: "listener refused".to_string(),
                });
            }
            self.phases.lock().push("start");
            Ok(())
        }

        async fn stop(&self) -> PluginResult<()> {
            self.phases.lock().push("stop");
            Ok(())
        }

        async fn shutdown(&self) -> PluginResult<()> {
            self.phases.lock().push("shutdown");
            Ok(())
        }
    }

    struct TestFactory {
        created: AtomicU64,
        phases: Arc<Mutex<Vec<&'static str>>>,
        fail_on_start: bool,
    }

    impl TestFactory {
        fn new(fail_on_start: bool) -> Arc<Self> {
            Arc::new(Self {
                created: AtomicU64::new(0),
                phases: Arc::new(Mutex::new(Vec::new())),
                fail_on_start,
            })
        }
    }

    #[async_trait]
    impl PluginComponentFactory for TestFactory {
        fn create_lifecycle_listener(&self) -> Box<dyn LifecycleListener> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Box::new(RecordingListener {
                phases: Arc::clone(&self.phases),
                fail_on_start: self.fail_on_start,
            })
        }

        async fn create_resource_component(
            &self,
            _resource: &Resource,
        ) -> PluginResult<Arc<dyn ResourceComponent>> {
            Err(PluginError::InvalidState {
                plugin: PluginKey::new("test"),
                state: "UNINITIALIZED".to_string(),
                reason: "no components in this test".to_string(),
            })
        }
    }

    fn container_with(factory: Arc<TestFactory>) -> PluginContainer {
        let descriptor = PluginDescriptor::new(PluginKey::new("test-plugin"), "Test Plugin", "1.0");
        PluginContainer::new(PluginEnvironment::new(descriptor, true), factory)
    }

    #[tokio::test]
    async fn test_full_cycle_mirrors_listener() {
        let factory = TestFactory::new(false);
        let mut container = container_with(Arc::clone(&factory));

        container.initialize().await.unwrap();
        assert_eq!(container.state(), ContainerState::Initialized);
        assert_eq!(container.listener_state(), ContainerState::Initialized);

        container.start().await.unwrap();
        assert_eq!(container.state(), ContainerState::Started);
        assert_eq!(container.listener_state(), ContainerState::Started);

        container.stop().await.unwrap();
        assert_eq!(container.state(), ContainerState::Stopped);
        assert_eq!(container.listener_state(), ContainerState::Stopped);

        container.shutdown().await.unwrap();
        assert_eq!(container.state(), ContainerState::Uninitialized);
        assert_eq!(container.listener_state(), ContainerState::Uninitialized);

        assert_eq!(
            *factory.phases.lock(),
            vec!["initialize", "start", "stop", "shutdown"]
        );
    }

    #[tokio::test]
    async fn test_start_before_initialize_always_fails() {
        for _ in 0..10 {
            let mut container = container_with(TestFactory::new(false));
            let err = container.start().await.unwrap_err();
            assert!(matches!(err, PluginError::IllegalTransition { operation: "start", .. }));
            assert_eq!(container.state(), ContainerState::Uninitialized);
        }
    }

    #[tokio::test]
    async fn test_double_stop_rejected_states_unchanged() {
        let mut container = container_with(TestFactory::new(false));
        container.initialize().await.unwrap();
        container.start().await.unwrap();
        container.stop().await.unwrap();

        let err = container.stop().await.unwrap_err();
        assert!(matches!(err, PluginError::IllegalTransition { operation: "stop", .. }));
        assert_eq!(container.state(), ContainerState::Stopped);
        assert_eq!(container.listener_state(), ContainerState::Stopped);
    }

    #[tokio::test]
    async fn test_listener_failure_aborts_transition() {
        let mut container = container_with(TestFactory::new(true));
        container.initialize().await.unwrap();

        let err = container.start().await.unwrap_err();
        assert!(matches!(err, PluginError::ListenerFailure { phase: "start", .. }));
        assert_eq!(container.state(), ContainerState::Initialized);
        assert_eq!(container.listener_state(), ContainerState::Initialized);
    }

    #[tokio::test]
    async fn test_each_cycle_gets_fresh_listener() {
        let factory = TestFactory::new(false);
        let mut container = container_with(Arc::clone(&factory));

        for _ in 0..2 {
            container.initialize().await.unwrap();
            container.start().await.unwrap();
            container.stop().await.unwrap();
            container.shutdown().await.unwrap();
        }
        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejected_attempts_counted() {
        let mut container = container_with(TestFactory::new(false));
        let _ = container.stop().await;
        let _ = container.shutdown().await;
        assert_eq!(container.stats().rejected(), 2);
        assert_eq!(container.stats().transitions(), 0);
    }
}
