//! Configuration for the Sentra platform core.
//!
//! Provides a serde-loadable, validated configuration with environment
//! presets for the plugin container runtime: worker pool sizing and facet
//! call timeouts.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Top-level configuration for the platform core.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SentraConfig {
    /// Number of workers executing inbound facet calls and data dispatch.
    #[validate(range(min = 1, max = 1024))]
    pub worker_pool_size: usize,

    /// Default timeout applied to facet lock acquisition, in milliseconds.
    #[validate(range(min = 1))]
    pub default_facet_timeout_ms: u64,

    /// Maximum time a resource component may take to start, in milliseconds.
    #[validate(range(min = 1))]
    pub component_start_timeout_ms: u64,
}

impl SentraConfig {
    /// Default facet timeout as a [`Duration`].
    #[must_use]
    pub const fn default_facet_timeout(&self) -> Duration {
        Duration::from_millis(self.default_facet_timeout_ms)
    }

    /// Component start timeout as a [`Duration`].
    #[must_use]
    pub const fn component_start_timeout(&self) -> Duration {
        Duration::from_millis(self.component_start_timeout_ms)
    }

    /// Configuration for development environments: small pool, generous
    /// timeouts.
    #[must_use]
    pub fn development() -> Self {
        Self {
            worker_pool_size: 4,
            default_facet_timeout_ms: 60_000,
            component_start_timeout_ms: 60_000,
        }
    }

    /// Configuration for production environments.
    #[must_use]
    pub fn production() -> Self {
        Self {
            worker_pool_size: 64,
            default_facet_timeout_ms: 30_000,
            component_start_timeout_ms: 20_000,
        }
    }
}

impl Default for SentraConfig {
    fn default() -> Self {
        Self::development()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(SentraConfig::development().validate().is_ok());
        assert!(SentraConfig::production().validate().is_ok());
    }

    #[test]
    fn test_invalid_pool_size_rejected() {
        let mut config = SentraConfig::development();
        config.worker_pool_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_conversions() {
        let config = SentraConfig::production();
        assert_eq!(config.default_facet_timeout(), Duration::from_millis(30_000));
        assert_eq!(config.component_start_timeout(), Duration::from_millis(20_000));
    }
}
