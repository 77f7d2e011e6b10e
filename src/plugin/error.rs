//! Error types for the plugin lifecycle subsystem.

use crate::types::{PluginKey, ResourceId};
use thiserror::Error;

/// Errors raised by plugin containers and the plugin manager.
#[derive(Error, Debug, Clone)]
pub enum PluginError {
    /// A lifecycle operation was called in the wrong phase.
    ///
    /// Fatal programming error: plugin code executing in the wrong phase
    /// can corrupt shared resources, so the responsible container's
    /// startup must crash rather than continue inconsistently.
    #[error("Illegal lifecycle transition for plugin {plugin}: {operation} called in state {state}")]
    IllegalTransition {
        /// Plugin whose container rejected the operation
        plugin: PluginKey,
        /// Operation that was attempted
        operation: &'static str,
        /// State the container was in
        state: String,
    },

    /// A plugin with the same key is already registered.
    #[error("Plugin already registered: {plugin}")]
    AlreadyRegistered {
        /// Offending plugin key
        plugin: PluginKey,
    },

    /// No plugin is registered under the key.
    #[error("Plugin not registered: {plugin}")]
    NotFound {
        /// Unknown plugin key
        plugin: PluginKey,
    },

    /// A required plugin is not registered.
    #[error("Plugin {plugin} requires missing plugin {dependency}")]
    MissingDependency {
        /// Plugin declaring the requirement
        plugin: PluginKey,
        /// Required plugin that is absent
        dependency: PluginKey,
    },

    /// Required-plugin relationships form a cycle.
    #[error("Plugin dependency cycle involving: {plugins}")]
    DependencyCycle {
        /// Comma-separated keys of the plugins still unordered
        plugins: String,
    },

    /// The plugin's lifecycle listener failed a phase callback.
    #[error("Plugin {plugin} lifecycle listener failed during {phase}: {reason}")]
    ListenerFailure {
        /// Plugin whose listener failed
        plugin: PluginKey,
        /// Phase callback that failed
        phase: &'static str,
        /// Failure reason reported by the listener
        reason: String,
    },

    /// A resource component could not be created.
    #[error("Plugin {plugin} failed to create component for resource {resource_id}: {reason}")]
    ComponentCreation {
        /// Plugin owning the component factory
        plugin: PluginKey,
        /// Resource the component was for
        resource_id: ResourceId,
        /// Creation failure reason
        reason: String,
    },

    /// The operation needs the plugin in a different state.
    #[error("Plugin {plugin} is in state {state}: {reason}")]
    InvalidState {
        /// Plugin in the wrong state
        plugin: PluginKey,
        /// Current container state
        state: String,
        /// Why the operation was rejected
        reason: String,
    },
}

/// Type alias for plugin subsystem results.
pub type PluginResult<T> = Result<T, PluginError>;
