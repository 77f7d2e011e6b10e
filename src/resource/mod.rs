//! Inventory model and the resource component registry.

pub mod container;
pub mod error;
pub mod model;
pub mod registry;

pub use container::{ComponentState, ResourceContainer};
pub use error::{InventoryError, InventoryResult};
pub use model::{
    ConfigurationDefinition, DiscoveredResource, DiscoveryReport, InventoryStatus,
    MetricDefinition, OperationDefinition, Resource, ResourceCategory, ResourceType,
};
pub use registry::{MergeSummary, RegistryStatsSnapshot, ResourceRegistry};
