//! Typed errors surfaced by the analysis pipeline.

use thiserror::Error;

/// Browser session could not be started within the retry budget.
#[derive(Debug, Error)]
#[error("Failed to initialize browser session after {attempts} attempts: {last_error}")]
pub struct SessionInitError {
    pub attempts: u32,
    pub last_error: String,
}

/// Errors that end an analysis with an `{error}` payload.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error(transparent)]
    SessionInit(#[from] SessionInitError),

    /// Submitted URL was rejected before any browser work
    #[error("{0}")]
    InvalidUrl(String),
}
