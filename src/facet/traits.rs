//! Capability facet traits implemented by plugin-supplied resource components.
//!
//! A component implements the subset of facets its resource supports; the
//! proxy layer routes each call through the resource's lock before the
//! component sees it.

use crate::facet::{FacetError, FacetResult};
use crate::resource::Resource;
use crate::types::{AvailabilityState, PluginKey, ResourceId, ScheduleId, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The capability interfaces a component may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacetKind {
    /// Availability checking
    Availability,
    /// Metric collection
    Measurement,
    /// Operation invocation
    Operation,
    /// Configuration read/write
    Configuration,
}

impl fmt::Display for FacetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Availability => write!(f, "availability"),
            Self::Measurement => write!(f, "measurement"),
            Self::Operation => write!(f, "operation"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// A request to collect one or more metrics in a single component call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementRequest {
    /// Schedules to collect, with their metric names.
    pub metrics: Vec<(ScheduleId, String)>,
}

impl MeasurementRequest {
    /// Request collection of a single metric.
    #[must_use]
    pub fn single(schedule_id: ScheduleId, metric_name: impl Into<String>) -> Self {
        Self { metrics: vec![(schedule_id, metric_name.into())] }
    }
}

/// One collected metric value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementReading {
    /// Schedule the value was collected for.
    pub schedule_id: ScheduleId,
    /// Metric name.
    pub metric_name: String,
    /// Collected numeric value.
    pub value: f64,
    /// Collection time.
    pub collected_at: Timestamp,
}

/// Terminal status of an invoked operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationStatus {
    /// Operation completed successfully.
    Success,
    /// Operation ran and reported failure.
    Failure,
    /// Operation was cancelled before completion.
    Canceled,
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Failure => write!(f, "FAILURE"),
            Self::Canceled => write!(f, "CANCELED"),
        }
    }
}

/// Result of an operation invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationOutcome {
    /// Terminal status.
    pub status: OperationStatus,
    /// Optional status message.
    pub message: Option<String>,
    /// Structured operation results.
    pub results: serde_json::Value,
}

impl OperationOutcome {
    /// A successful outcome with no results.
    #[must_use]
    pub fn success() -> Self {
        Self { status: OperationStatus::Success, message: None, results: serde_json::Value::Null }
    }
}

/// A resource's configuration as a flat property bag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfiguration {
    /// Property name to value.
    pub properties: HashMap<String, String>,
}

/// Availability facet: cheap liveness probe of the managed endpoint.
#[async_trait]
pub trait AvailabilityFacet: Send + Sync {
    /// Report the endpoint's current availability.
    async fn get_availability(&self) -> FacetResult<AvailabilityState>;
}

/// Measurement facet: metric collection from the managed endpoint.
#[async_trait]
pub trait MeasurementFacet: Send + Sync {
    /// Collect the requested metrics.
    async fn get_values(&self, request: MeasurementRequest) -> FacetResult<Vec<MeasurementReading>>;
}

/// Operation facet: control actions against the managed endpoint.
#[async_trait]
pub trait OperationFacet: Send + Sync {
    /// Invoke a named operation with structured arguments.
    async fn invoke_operation(
        &self,
        name: String,
        arguments: serde_json::Value,
    ) -> FacetResult<OperationOutcome>;
}

/// Configuration facet: read and push endpoint configuration.
#[async_trait]
pub trait ConfigurationFacet: Send + Sync {
    /// Read the endpoint's live configuration.
    async fn load_configuration(&self) -> FacetResult<ResourceConfiguration>;

    /// Push a configuration update to the endpoint.
    async fn update_configuration(&self, configuration: ResourceConfiguration) -> FacetResult<()>;
}

/// Context handed to a component when it starts.
#[derive(Debug, Clone)]
pub struct ComponentContext {
    /// Snapshot of the resource the component manages.
    pub resource: Resource,
    /// Key of the plugin that supplied the component.
    pub plugin: PluginKey,
}

impl ComponentContext {
    /// Create a context for the given resource and plugin.
    #[must_use]
    pub fn new(resource: Resource, plugin: PluginKey) -> Self {
        Self { resource, plugin }
    }

    /// ID of the managed resource.
    #[must_use]
    pub fn resource_id(&self) -> ResourceId {
        self.resource.id
    }
}

/// A plugin-supplied management adapter for one resource.
///
/// Components implement [`start`](ResourceComponent::start)/
/// [`stop`](ResourceComponent::stop) plus any subset of the capability
/// facets. The accessor methods return the facet views the component
/// supports; the default implementations advertise no facets.
#[async_trait]
pub trait ResourceComponent: Send + Sync {
    /// Start managing the resource described by `context`.
    async fn start(&self, context: ComponentContext) -> FacetResult<()>;

    /// Stop managing the resource and release endpoint connections.
    async fn stop(&self) -> FacetResult<()>;

    /// The availability facet, if implemented.
    fn availability(&self) -> Option<&dyn AvailabilityFacet> {
        None
    }

    /// The measurement facet, if implemented.
    fn measurement(&self) -> Option<&dyn MeasurementFacet> {
        None
    }

    /// The operation facet, if implemented.
    fn operation(&self) -> Option<&dyn OperationFacet> {
        None
    }

    /// The configuration facet, if implemented.
    fn configuration(&self) -> Option<&dyn ConfigurationFacet> {
        None
    }

    /// Which facets this component implements.
    fn supported_facets(&self) -> Vec<FacetKind> {
        let mut facets = Vec::with_capacity(4);
        if self.availability().is_some() {
            facets.push(FacetKind::Availability);
        }
        if self.measurement().is_some() {
            facets.push(FacetKind::Measurement);
        }
        if self.operation().is_some() {
            facets.push(FacetKind::Operation);
        }
        if self.configuration().is_some() {
            facets.push(FacetKind::Configuration);
        }
        facets
    }
}

/// Convenience constructor for a component-side invocation failure.
#[must_use]
pub fn invocation_error(
    resource_id: ResourceId,
    facet: FacetKind,
    reason: impl Into<String>,
) -> FacetError {
    FacetError::Invocation { resource_id, facet, reason: reason.into() }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AvailOnly;

    #[async_trait]
    impl AvailabilityFacet for AvailOnly {
        async fn get_availability(&self) -> FacetResult<AvailabilityState> {
            Ok(AvailabilityState::Up)
        }
    }

    #[async_trait]
    impl ResourceComponent for AvailOnly {
        async fn start(&self, _context: ComponentContext) -> FacetResult<()> {
            Ok(())
        }

        async fn stop(&self) -> FacetResult<()> {
            Ok(())
        }

        fn availability(&self) -> Option<&dyn AvailabilityFacet> {
            Some(self)
        }
    }

    #[test]
    fn test_supported_facets_reflect_accessors() {
        let component = AvailOnly;
        assert_eq!(component.supported_facets(), vec![FacetKind::Availability]);
    }

    #[tokio::test]
    async fn test_facet_call_through_component() {
        let component = AvailOnly;
        let facet = component.availability().unwrap();
        assert_eq!(facet.get_availability().await.unwrap(), AvailabilityState::Up);
    }

    #[test]
    fn test_operation_outcome_success() {
        let outcome = OperationOutcome::success();
        assert_eq!(outcome.status, OperationStatus::Success);
        assert!(outcome.message.is_none());
    }
}
