//! Error types for the condition cache engine.

use crate::types::ConditionId;
use thiserror::Error;

/// Errors raised by the condition cache.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// The condition definition cannot be indexed.
    ///
    /// At reload time such definitions are skipped with a warning; at
    /// insert time the error propagates to the caller.
    #[error("Invalid cache element {condition_id}: {reason}")]
    InvalidCacheElement {
        /// Offending condition
        condition_id: ConditionId,
        /// Why it cannot be indexed
        reason: String,
    },

    /// A condition predicate failed to evaluate against a datum.
    ///
    /// Logged and skipped; sibling entries in the same bucket still
    /// evaluate.
    #[error("Condition {condition_id} failed to evaluate: {reason}")]
    Evaluation {
        /// Condition whose predicate failed
        condition_id: ConditionId,
        /// Evaluation failure reason
        reason: String,
    },
}

/// Type alias for condition cache results.
pub type CacheResult<T> = Result<T, CacheError>;
