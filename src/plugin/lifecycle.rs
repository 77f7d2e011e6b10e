//! Plugin container lifecycle state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle states of a plugin container.
///
/// The machine is cyclic and repeatable:
///
/// ```text
/// Uninitialized -> Initialized -> Started -> Stopped -> Uninitialized
/// ```
///
/// Each transition is driven by exactly one operation (`initialize`,
/// `start`, `stop`, `shutdown`) and is only valid from the state
/// immediately preceding it. Out-of-order operations are programming
/// errors, rejected without changing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ContainerState {
    /// No lifecycle listener exists; the container is dormant.
    #[default]
    Uninitialized,
    /// The listener is created and initialized, not yet running.
    Initialized,
    /// The plugin is running and its components may be started.
    Started,
    /// The plugin is stopped, awaiting shutdown.
    Stopped,
}

impl ContainerState {
    /// The single state a given state may transition to.
    #[must_use]
    pub const fn successor(&self) -> Self {
        match self {
            Self::Uninitialized => Self::Initialized,
            Self::Initialized => Self::Started,
            Self::Started => Self::Stopped,
            Self::Stopped => Self::Uninitialized,
        }
    }

    /// Check whether a transition to `target` is valid.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        self.successor() == target
    }

    /// Whether the container is live (components may run).
    #[must_use]
    pub const fn is_started(&self) -> bool {
        matches!(self, Self::Started)
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "UNINITIALIZED"),
            Self::Initialized => write!(f, "INITIALIZED"),
            Self::Started => write!(f, "STARTED"),
            Self::Stopped => write!(f, "STOPPED"),
        }
    }
}

/// Transition counters for one plugin container.
#[derive(Debug, Default)]
pub struct LifecycleStats {
    transitions: AtomicU64,
    rejected: AtomicU64,
}

impl LifecycleStats {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful transition.
    pub fn record_transition(&self) {
        self.transitions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected (illegal) transition attempt.
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Total successful transitions.
    #[must_use]
    pub fn transitions(&self) -> u64 {
        self.transitions.load(Ordering::Relaxed)
    }

    /// Total rejected transition attempts.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_is_closed() {
        let mut state = ContainerState::Uninitialized;
        for _ in 0..4 {
            state = state.successor();
        }
        assert_eq!(state, ContainerState::Uninitialized);
    }

    #[test]
    fn test_only_successor_is_valid() {
        assert!(ContainerState::Uninitialized.can_transition_to(ContainerState::Initialized));
        assert!(ContainerState::Initialized.can_transition_to(ContainerState::Started));
        assert!(ContainerState::Started.can_transition_to(ContainerState::Stopped));
        assert!(ContainerState::Stopped.can_transition_to(ContainerState::Uninitialized));

        assert!(!ContainerState::Uninitialized.can_transition_to(ContainerState::Started));
        assert!(!ContainerState::Uninitialized.can_transition_to(ContainerState::Stopped));
        assert!(!ContainerState::Started.can_transition_to(ContainerState::Initialized));
        assert!(!ContainerState::Stopped.can_transition_to(ContainerState::Started));
    }

    #[test]
    fn test_stats_counters() {
        let stats = LifecycleStats::new();
        stats.record_transition();
        stats.record_transition();
        stats.record_rejected();
        assert_eq!(stats.transitions(), 2);
        assert_eq!(stats.rejected(), 1);
    }
}
