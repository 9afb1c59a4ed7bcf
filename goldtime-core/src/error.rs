//! Error types for the scheduling core.

use thiserror::Error;

/// Errors raised at the scheduling boundary (feedback intake).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("invalid feedback tier {0}: expected -1, 0 or 1")]
    InvalidFeedbackTier(i64),
}

/// Errors raised while fitting, saving or loading a forecaster.
///
/// Any load failure means the forecaster is unavailable; callers fall back to
/// the fixed-offset policy instead of surfacing it.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model artifact is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model artifact version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("not enough samples to fit: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("model produced non-finite coefficients")]
    NonFinite,
}

/// Errors returned by card and progress store collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("card not found: {0}")]
    CardNotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}
