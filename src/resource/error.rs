//! Error types for the inventory registry.

use crate::types::ResourceId;
use thiserror::Error;

/// Errors raised by the resource component registry.
#[derive(Error, Debug, Clone)]
pub enum InventoryError {
    /// No container is registered for the resource.
    #[error("Resource not found in inventory: {resource_id}")]
    NotFound {
        /// Resource that was looked up
        resource_id: ResourceId,
    },

    /// A container is already registered for the resource.
    #[error("Resource already registered: {resource_id}")]
    AlreadyRegistered {
        /// Resource that was registered twice
        resource_id: ResourceId,
    },

    /// The requested status change is not valid for the resource.
    #[error("Invalid inventory status change for {resource_id}: {reason}")]
    InvalidStatusChange {
        /// Resource whose status change was rejected
        resource_id: ResourceId,
        /// Why the change was rejected
        reason: String,
    },
}

/// Type alias for inventory results.
pub type InventoryResult<T> = Result<T, InventoryError>;
