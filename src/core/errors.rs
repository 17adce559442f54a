// src/core/errors.rs
use thiserror::Error;

/// Failures surfaced by the explanation pipeline.
///
/// A degenerate surrogate fit is deliberately absent here: it is recovered
/// into [`crate::algorithms::SurrogateFit::Degenerate`] and never reaches the caller.
#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("Empty Input: text contains no tokens")]
    EmptyInput,

    #[error("Oracle Unavailable: no classifier has been attached to the engine")]
    OracleUnavailable,

    #[error("Oracle Fault: {0}")]
    OracleFault(String),

    #[error("Shape Mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Unknown Label: {0}")]
    UnknownLabel(String),

    #[error("Invalid Config: {0}")]
    InvalidConfig(String),

    #[error("Ndarray Error: {0}")]
    Ndarray(#[from] ndarray::ShapeError),
}

/// Errors a [`crate::traits::ProbabilityOracle`] may report for a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("empty text cannot be classified")]
    EmptyText,

    #[error("inference failed: {0}")]
    Inference(String),
}

impl From<OracleError> for ExplainError {
    fn from(err: OracleError) -> Self {
        ExplainError::OracleFault(err.to_string())
    }
}

// Convenience type alias for Result
pub type Result<T> = std::result::Result<T, ExplainError>;
