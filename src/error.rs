//! Error types for region visit analysis.
//!
//! Missing or inconsistent region/track metadata is never an error: the
//! analyzer treats it as "nothing found" and keeps going. Only programmer
//! errors (bad configuration, colliding region ids) surface here, plus the
//! two ways a run can end without producing a result.

/// Errors returned by the analysis entry points.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    /// Two input regions share the same id
    #[error("Duplicate region id: {0}")]
    DuplicateRegionId(String),

    /// Grid cell size must be a positive, finite number of degrees
    #[error("Invalid grid size: {0} (must be positive and finite)")]
    InvalidGridSize(f64),

    /// Per-track sample budget must be at least 1
    #[error("Invalid sample budget: {0} (must be at least 1)")]
    InvalidSampleBudget(u32),

    /// The caller raised the cancellation flag before the run finished
    #[error("Analysis cancelled")]
    Cancelled,

    /// The background worker running the analysis panicked or was aborted
    #[error("Analysis task failed: {0}")]
    TaskFailed(String),
}
