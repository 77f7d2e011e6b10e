//! Error types for the Sentra core library.

use thiserror::Error;

/// Main error type for Sentra core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Facet proxy or component invocation error
    #[error(transparent)]
    Facet(#[from] crate::facet::FacetError),

    /// Plugin container lifecycle error
    #[error(transparent)]
    Plugin(#[from] crate::plugin::PluginError),

    /// Alert condition cache error
    #[error(transparent)]
    Cache(#[from] crate::alert::CacheError),

    /// Inventory/registry error
    #[error(transparent)]
    Inventory(#[from] crate::resource::InventoryError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the invalid configuration
        message: String,
    },

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal {
        /// Internal error description
        message: String,
    },
}

/// Result type alias for Sentra core operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Error::Configuration { message: err.to_string() }
    }
}
