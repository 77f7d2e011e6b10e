//! Error types for the facet layer.

use crate::facet::FacetKind;
use crate::facet::lock::FacetLockType;
use crate::types::ResourceId;
use thiserror::Error;

/// Errors raised by facet proxies and resource components.
#[derive(Error, Debug, Clone)]
pub enum FacetError {
    /// The resource's lock could not be acquired within the timeout.
    ///
    /// Recoverable: the component was never invoked and the caller may
    /// retry or surface a "resource busy" message.
    #[error("Lock timeout on resource {resource_id}: {lock_type:?} not acquired within {timeout_ms}ms")]
    LockTimeout {
        /// Resource whose lock was contended
        resource_id: ResourceId,
        /// Requested lock mode
        lock_type: FacetLockType,
        /// Timeout that elapsed, in milliseconds
        timeout_ms: u64,
    },

    /// The component does not implement the requested facet.
    #[error("Resource {resource_id} does not support the {facet} facet")]
    UnsupportedFacet {
        /// Resource whose component was queried
        resource_id: ResourceId,
        /// Facet that is not implemented
        facet: FacetKind,
    },

    /// No component is started for the resource.
    #[error("Resource {resource_id} has no started component")]
    ComponentNotStarted {
        /// Resource without a live component
        resource_id: ResourceId,
    },

    /// The component could not be brought up for the resource.
    #[error("Component start failed for resource {resource_id}: {reason}")]
    ComponentStart {
        /// Resource whose component failed to start
        resource_id: ResourceId,
        /// Start failure reason
        reason: String,
    },

    /// The component itself failed while servicing the call.
    ///
    /// Propagated to the caller unchanged; logged at the proxy boundary.
    #[error("Facet invocation failed on resource {resource_id} ({facet}): {reason}")]
    Invocation {
        /// Resource whose component failed
        resource_id: ResourceId,
        /// Facet being invoked
        facet: FacetKind,
        /// Failure reason reported by the component
        reason: String,
    },

    /// A detached (daemon) invocation task could not be joined.
    #[error("Facet invocation task failed on resource {resource_id}: {reason}")]
    TaskFailure {
        /// Resource whose invocation task died
        resource_id: ResourceId,
        /// Join failure description
        reason: String,
    },
}

impl FacetError {
    /// Whether the error is recoverable by retrying the call.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout { .. })
    }
}

/// Type alias for facet layer results.
pub type FacetResult<T> = Result<T, FacetError>;
