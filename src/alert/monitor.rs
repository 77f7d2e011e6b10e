//! Pull-based counters for the condition cache engine.
//!
//! An explicitly constructed metrics façade: the coordinator records into
//! it, observability collaborators read snapshots out of it. There is no
//! management-bean runtime and no ambient singleton.

use crate::alert::CacheSubsystem;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Match and processing-time counters, one slot per subsystem.
#[derive(Debug, Default)]
pub struct CacheMonitor {
    data_processed: [AtomicU64; 7],
    matches: [AtomicU64; 7],
    processing_micros: [AtomicU64; 7],
}

impl CacheMonitor {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one `process_data` dispatch.
    pub fn record_processing(
        &self,
        subsystem: CacheSubsystem,
        matched: usize,
        elapsed: Duration,
    ) {
        let slot = subsystem.index();
        self.data_processed[slot].fetch_add(1, Ordering::Relaxed);
        self.matches[slot].fetch_add(matched as u64, Ordering::Relaxed);
        self.processing_micros[slot].fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    /// Data processed for one subsystem.
    #[must_use]
    pub fn data_processed(&self, subsystem: CacheSubsystem) -> u64 {
        self.data_processed[subsystem.index()].load(Ordering::Relaxed)
    }

    /// Conditions fired for one subsystem.
    #[must_use]
    pub fn match_count(&self, subsystem: CacheSubsystem) -> u64 {
        self.matches[subsystem.index()].load(Ordering::Relaxed)
    }

    /// Cumulative processing time for one subsystem, in microseconds.
    #[must_use]
    pub fn processing_micros(&self, subsystem: CacheSubsystem) -> u64 {
        self.processing_micros[subsystem.index()].load(Ordering::Relaxed)
    }

    /// Conditions fired across all subsystems.
    #[must_use]
    pub fn total_match_count(&self) -> u64 {
        CacheSubsystem::ALL.iter().map(|s| self.match_count(*s)).sum()
    }

    /// Cumulative processing time across all subsystems, in microseconds.
    #[must_use]
    pub fn total_processing_micros(&self) -> u64 {
        CacheSubsystem::ALL.iter().map(|s| self.processing_micros(*s)).sum()
    }

    /// Immutable snapshot of every counter, for observability pulls.
    #[must_use]
    pub fn snapshot(&self) -> CacheMonitorSnapshot {
        CacheMonitorSnapshot {
            subsystems: CacheSubsystem::ALL
                .iter()
                .map(|subsystem| SubsystemCounters {
                    subsystem: subsystem.to_string(),
                    data_processed: self.data_processed(*subsystem),
                    matches: self.match_count(*subsystem),
                    processing_micros: self.processing_micros(*subsystem),
                })
                .collect(),
            total_matches: self.total_match_count(),
            total_processing_micros: self.total_processing_micros(),
        }
    }
}

/// Counters of one subsystem at snapshot time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsystemCounters {
    /// Subsystem label.
    pub subsystem: String,
    /// Data processed.
    pub data_processed: u64,
    /// Conditions fired.
    pub matches: u64,
    /// Cumulative processing micros.
    pub processing_micros: u64,
}

/// Full monitor snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMonitorSnapshot {
    /// Per-subsystem counters.
    pub subsystems: Vec<SubsystemCounters>,
    /// Fired conditions across subsystems.
    pub total_matches: u64,
    /// Processing micros across subsystems.
    pub total_processing_micros: u64,
}
