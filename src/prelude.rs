//! Common imports for working with the Sentra core.

pub use crate::alert::{
    AlertDefinition, CacheMonitor, CacheSubsystem, ConditionCacheCoordinator, ConditionEntry,
    ConditionOperator, ConditionSink, Datum,
};
pub use crate::config::SentraConfig;
pub use crate::error::{Error, Result};
pub use crate::facet::{
    AvailabilityFacet, ConfigurationFacet, FacetKind, FacetLockType, FacetProxy, MeasurementFacet,
    OperationFacet, ProxyOptions, ResourceComponent,
};
pub use crate::plugin::{
    ContainerState, LifecycleListener, PluginComponentFactory, PluginDescriptor, PluginManager,
};
pub use crate::resource::{
    DiscoveryReport, InventoryStatus, Resource, ResourceContainer, ResourceRegistry, ResourceType,
};
pub use crate::runtime::PlatformRuntime;
pub use crate::types::{AvailabilityState, PluginKey, ResourceId, ScheduleId};
