//! Facet layer: capability traits, per-resource locking, and proxies.

pub mod error;
pub mod lock;
pub mod proxy;
pub mod traits;

pub use error::{FacetError, FacetResult};
pub use lock::{FacetLock, FacetLockGuard, FacetLockType};
pub use proxy::{FacetProxy, ProxyOptions, context_for};
pub use traits::{
    AvailabilityFacet, ComponentContext, ConfigurationFacet, FacetKind, MeasurementFacet,
    MeasurementReading, MeasurementRequest, OperationFacet, OperationOutcome, OperationStatus,
    ResourceComponent, ResourceConfiguration, invocation_error,
};
