//! Error types for ocp-planner
//!
//! Only configuration problems and a run that created nothing are fatal.
//! Text-generation failures are recovered with fallback content inside the
//! stage that hit them, and per-item persistence failures are logged and
//! skipped by the calendar generator.

use thiserror::Error;

/// Planner error type
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Missing company, zero identities or zero channels
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Every planned post failed to persist (or no slot could be filled)
    #[error("No posts were created ({planned} planned)")]
    NothingCreated { planned: usize },

    /// ocp-common error
    #[error("Common error: {0}")]
    Common(#[from] ocp_common::Error),
}

impl From<sqlx::Error> for PlannerError {
    fn from(err: sqlx::Error) -> Self {
        PlannerError::Common(ocp_common::Error::Database(err))
    }
}

/// Text-generation collaborator errors
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Empty response")]
    EmptyResponse,

    /// No collaborator configured
    #[error("Text generation unavailable")]
    Unavailable,
}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
