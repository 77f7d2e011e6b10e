//! Condition cache data model: subsystems, entries, predicates, and the
//! data they match against.

use crate::alert::{CacheError, CacheResult};
use crate::facet::OperationStatus;
use crate::types::{AlertDefinitionId, AvailabilityState, ConditionId, ResourceId, ScheduleId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The monitoring subsystems the cache indexes separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheSubsystem {
    /// Availability changes.
    Availability,
    /// Numeric measurement values.
    Measurement,
    /// Emitted events.
    Event,
    /// Operation results.
    Operation,
    /// Configuration changes.
    Configuration,
    /// Per-destination call-time data.
    CallTime,
    /// Filesystem drift records.
    Drift,
}

impl CacheSubsystem {
    /// Every subsystem, in index order.
    pub const ALL: [Self; 7] = [
        Self::Availability,
        Self::Measurement,
        Self::Event,
        Self::Operation,
        Self::Configuration,
        Self::CallTime,
        Self::Drift,
    ];

    /// Stable index of the subsystem, for counter arrays.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Availability => 0,
            Self::Measurement => 1,
            Self::Event => 2,
            Self::Operation => 3,
            Self::Configuration => 4,
            Self::CallTime => 5,
            Self::Drift => 6,
        }
    }
}

impl fmt::Display for CacheSubsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Availability => write!(f, "availability"),
            Self::Measurement => write!(f, "measurement"),
            Self::Event => write!(f, "event"),
            Self::Operation => write!(f, "operation"),
            Self::Configuration => write!(f, "configuration"),
            Self::CallTime => write!(f, "calltime"),
            Self::Drift => write!(f, "drift"),
        }
    }
}

/// Severity of an emitted event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum EventSeverity {
    /// Diagnostic noise.
    Debug,
    /// Informational.
    #[default]
    Info,
    /// Something looks wrong.
    Warn,
    /// Something is wrong.
    Error,
    /// The resource is in serious trouble.
    Fatal,
}

/// Predicate operator of a cached condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionOperator {
    /// Numeric value strictly below the threshold.
    LessThan,
    /// Numeric value strictly above the threshold.
    GreaterThan,
    /// Value equals the threshold or pattern.
    Equals,
    /// Numeric value differs from the threshold.
    NotEquals,
    /// Any change in the subsystem fires the condition.
    Changes,
    /// Textual payload matches the pattern.
    Matches,
}

/// How a datum is routed to its index bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketKey {
    /// Bucketted by owning resource.
    Resource(ResourceId),
    /// Bucketted by measurement schedule.
    Schedule(ScheduleId),
}

/// One active alert condition, indexed for O(1) dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionEntry {
    /// Identity of the condition.
    pub condition_id: ConditionId,
    /// Alert definition that owns the condition.
    pub alert_definition_id: AlertDefinitionId,
    /// Subsystem whose data the condition watches.
    pub subsystem: CacheSubsystem,
    /// Resource the condition is scoped to.
    pub resource_id: ResourceId,
    /// Schedule scope, for measurement and call-time conditions.
    pub schedule_id: Option<ScheduleId>,
    /// Predicate operator.
    pub operator: ConditionOperator,
    /// Numeric comparison operand, where the operator needs one.
    pub threshold: Option<f64>,
    /// Textual comparison operand, where the operator needs one.
    pub pattern: Option<String>,
    /// Minimum severity filter for event conditions.
    pub min_severity: Option<EventSeverity>,
}

impl ConditionEntry {
    /// The index bucket this entry lives in.
    #[must_use]
    pub fn bucket_key(&self) -> BucketKey {
        match (self.subsystem, self.schedule_id) {
            (CacheSubsystem::Measurement | CacheSubsystem::CallTime, Some(schedule)) => {
                BucketKey::Schedule(schedule)
            },
            _ => BucketKey::Resource(self.resource_id),
        }
    }

    /// Check the definition is indexable.
    ///
    /// # Errors
    /// [`CacheError::InvalidCacheElement`] naming the missing or
    /// inconsistent field.
    pub fn validate(&self) -> CacheResult<()> {
        let fail = |reason: &str| {
            Err(CacheError::InvalidCacheElement {
                condition_id: self.condition_id,
                reason: reason.to_string(),
            })
        };
        match self.subsystem {
            CacheSubsystem::Availability => match self.operator {
                ConditionOperator::Changes => Ok(()),
                ConditionOperator::Equals if self.pattern.is_some() => Ok(()),
                ConditionOperator::Equals => fail("availability equality needs a state pattern"),
                _ => fail("availability supports only Equals or Changes"),
            },
            CacheSubsystem::Measurement | CacheSubsystem::CallTime => {
                if self.schedule_id.is_none() {
                    return fail("numeric conditions need a schedule scope");
                }
                match self.operator {
                    ConditionOperator::LessThan
                    | ConditionOperator::GreaterThan
                    | ConditionOperator::Equals
                    | ConditionOperator::NotEquals => match self.threshold {
                        Some(threshold) if threshold.is_finite() => Ok(()),
                        Some(_) => fail("threshold must be finite"),
                        None => fail("numeric conditions need a threshold"),
                    },
                    _ => fail("numeric conditions need a comparison operator"),
                }
            },
            CacheSubsystem::Event => match self.operator {
                ConditionOperator::Matches
                    if self.pattern.is_some() || self.min_severity.is_some() =>
                {
                    Ok(())
                },
                ConditionOperator::Matches => {
                    fail("event conditions need a pattern or severity filter")
                },
                _ => fail("event conditions support only Matches"),
            },
            CacheSubsystem::Operation => match self.operator {
                ConditionOperator::Equals if self.pattern.is_some() => Ok(()),
                _ => fail("operation conditions need Equals with a status pattern"),
            },
            CacheSubsystem::Configuration => match self.operator {
                ConditionOperator::Changes => Ok(()),
                _ => fail("configuration conditions support only Changes"),
            },
            CacheSubsystem::Drift => match self.operator {
                ConditionOperator::Changes => Ok(()),
                ConditionOperator::Matches if self.pattern.is_some() => Ok(()),
                ConditionOperator::Matches => fail("drift matching needs a path pattern"),
                _ => fail("drift conditions support only Matches or Changes"),
            },
        }
    }

    /// Evaluate the predicate against a datum from the same bucket.
    ///
    /// # Errors
    /// [`CacheError::Evaluation`] when the predicate cannot be computed
    /// (e.g. an unparseable stored pattern). The caller logs and moves on
    /// to sibling entries.
    pub fn try_matches(&self, datum: &Datum) -> CacheResult<bool> {
        match (self.subsystem, datum) {
            (CacheSubsystem::Availability, Datum::Availability { state, .. }) => {
                match self.operator {
                    ConditionOperator::Changes => Ok(true),
                    ConditionOperator::Equals => {
                        let pattern = self.pattern.as_deref().unwrap_or_default();
                        let expected: AvailabilityState =
                            pattern.parse().map_err(|reason: String| CacheError::Evaluation {
                                condition_id: self.condition_id,
                                reason,
                            })?;
                        Ok(*state == expected)
                    },
                    _ => Ok(false),
                }
            },
            (CacheSubsystem::Measurement, Datum::Measurement { value, .. })
            | (CacheSubsystem::CallTime, Datum::CallTime { value, .. }) => {
                let threshold = self.threshold.ok_or_else(|| CacheError::Evaluation {
                    condition_id: self.condition_id,
                    reason: "numeric condition without threshold".to_string(),
                })?;
                Ok(match self.operator {
                    ConditionOperator::LessThan => *value < threshold,
                    ConditionOperator::GreaterThan => *value > threshold,
                    ConditionOperator::Equals => (*value - threshold).abs() < f64::EPSILON,
                    ConditionOperator::NotEquals => (*value - threshold).abs() >= f64::EPSILON,
                    _ => false,
                })
            },
            (CacheSubsystem::Event, Datum::Event { severity, message, .. }) => {
                if let Some(min) = self.min_severity {
                    if *severity < min {
                        return Ok(false);
                    }
                }
                Ok(match &self.pattern {
                    Some(pattern) => message.contains(pattern.as_str()),
                    None => true,
                })
            },
            (CacheSubsystem::Operation, Datum::Operation { status, .. }) => {
                let pattern = self.pattern.as_deref().unwrap_or_default();
                Ok(status.to_string() == pattern.to_ascii_uppercase())
            },
            (CacheSubsystem::Configuration, Datum::Configuration { .. }) => Ok(true),
            (CacheSubsystem::Drift, Datum::Drift { path, .. }) => Ok(match self.operator {
                ConditionOperator::Changes => true,
                ConditionOperator::Matches => {
                    self.pattern.as_deref().is_some_and(|pattern| path.contains(pattern))
                },
                _ => false,
            }),
            _ => Ok(false),
        }
    }
}

/// One incoming monitoring datum, dispatched to its subsystem's index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Datum {
    /// A resource's availability changed.
    Availability {
        /// Affected resource
        resource_id: ResourceId,
        /// New availability
        state: AvailabilityState,
    },
    /// A numeric metric was collected.
    Measurement {
        /// Owning resource
        resource_id: ResourceId,
        /// Collection schedule
        schedule_id: ScheduleId,
        /// Collected value
        value: f64,
    },
    /// A resource emitted an event.
    Event {
        /// Emitting resource
        resource_id: ResourceId,
        /// Event severity
        severity: EventSeverity,
        /// Event payload
        message: String,
    },
    /// An operation finished.
    Operation {
        /// Resource the operation ran against
        resource_id: ResourceId,
        /// Operation name
        operation: String,
        /// Terminal status
        status: OperationStatus,
    },
    /// A resource's configuration changed.
    Configuration {
        /// Affected resource
        resource_id: ResourceId,
    },
    /// A call-time value was recorded.
    CallTime {
        /// Owning resource
        resource_id: ResourceId,
        /// Collection schedule
        schedule_id: ScheduleId,
        /// Call destination
        destination: String,
        /// Recorded duration value
        value: f64,
    },
    /// A drift record was detected.
    Drift {
        /// Affected resource
        resource_id: ResourceId,
        /// Drifted path
        path: String,
    },
}

impl Datum {
    /// Subsystem whose index handles this datum.
    #[must_use]
    pub const fn subsystem(&self) -> CacheSubsystem {
        match self {
            Self::Availability { .. } => CacheSubsystem::Availability,
            Self::Measurement { .. } => CacheSubsystem::Measurement,
            Self::Event { .. } => CacheSubsystem::Event,
            Self::Operation { .. } => CacheSubsystem::Operation,
            Self::Configuration { .. } => CacheSubsystem::Configuration,
            Self::CallTime { .. } => CacheSubsystem::CallTime,
            Self::Drift { .. } => CacheSubsystem::Drift,
        }
    }

    /// Resource the datum belongs to.
    #[must_use]
    pub const fn resource_id(&self) -> ResourceId {
        match self {
            Self::Availability { resource_id, .. }
            | Self::Measurement { resource_id, .. }
            | Self::Event { resource_id, .. }
            | Self::Operation { resource_id, .. }
            | Self::Configuration { resource_id }
            | Self::CallTime { resource_id, .. }
            | Self::Drift { resource_id, .. } => *resource_id,
        }
    }

    /// The index bucket the datum dispatches to.
    #[must_use]
    pub const fn bucket_key(&self) -> BucketKey {
        match self {
            Self::Measurement { schedule_id, .. } | Self::CallTime { schedule_id, .. } => {
                BucketKey::Schedule(*schedule_id)
            },
            _ => BucketKey::Resource(self.resource_id()),
        }
    }
}

/// An alert definition as handed over by the persistence collaborator.
///
/// Only enabled definitions contribute entries to the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertDefinition {
    /// Definition identity.
    pub id: AlertDefinitionId,
    /// Whether the definition is active.
    pub enabled: bool,
    /// The definition's conditions.
    pub conditions: Vec<ConditionEntry>,
}
