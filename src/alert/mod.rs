//! Alert condition cache engine: model, indexes, coordinator, and
//! counters.

pub mod cache;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod monitor;

pub use cache::ConditionCache;
pub use coordinator::{
    CacheMetricsReport, ConditionCacheCoordinator, ConditionSink, NullConditionSink,
    ReloadSummary, SubsystemSize,
};
pub use error::{CacheError, CacheResult};
pub use model::{
    AlertDefinition, BucketKey, CacheSubsystem, ConditionEntry, ConditionOperator, Datum,
    EventSeverity,
};
pub use monitor::{CacheMonitor, CacheMonitorSnapshot, SubsystemCounters};
