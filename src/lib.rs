//! # Sentra Core
//!
//! Core library of the Sentra systems-management platform: a concurrent,
//! fault-tolerant lifecycle manager for plugin-supplied resource
//! components, with per-resource facet locking and an in-memory
//! alert-condition cache engine.
//!
//! ## Architecture
//!
//! Sentra Core is organized into several key modules:
//!
//! - [`resource`]: the inventory model and the concurrent registry mapping
//!   each resource to its live [`resource::ResourceContainer`]
//! - [`facet`]: capability interfaces (availability, measurement,
//!   operation, configuration), the per-resource read/write lock, and the
//!   [`facet::FacetProxy`] that brackets every component call with lock
//!   acquire/release
//! - [`plugin`]: plugin descriptors, the strict container state machine
//!   (`Uninitialized -> Initialized -> Started -> Stopped -> Uninitialized`),
//!   and the master [`plugin::PluginManager`]
//! - [`alert`]: per-subsystem condition indexes, the
//!   [`alert::ConditionCacheCoordinator`], and pull-based counters
//! - [`runtime`]: the dependency-injected process bootstrap and the
//!   bounded dispatcher
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use sentra_core::alert::NullConditionSink;
//! use sentra_core::config::SentraConfig;
//! use sentra_core::runtime::PlatformRuntime;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> sentra_core::Result<()> {
//!     sentra_core::runtime::init_tracing();
//!
//!     let runtime =
//!         PlatformRuntime::new(SentraConfig::development(), Arc::new(NullConditionSink))?;
//!     // Register plugins, merge discovery reports...
//!     runtime.start().await?;
//!     runtime.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alert;
pub mod config;
pub mod error;
pub mod facet;
pub mod plugin;
pub mod prelude;
pub mod resource;
pub mod runtime;
pub mod types;

pub use crate::{
    config::SentraConfig,
    error::{Error, Result},
    types::{
        AlertDefinitionId, AvailabilityState, ConditionId, PluginKey, ResourceId, ScheduleId,
        Timestamp,
    },
};
