// src/traits.rs
use crate::core::{OracleError, ProbabilityVector};

/// A classifier that maps texts to class probabilities.
///
/// Implementations must be deterministic for a fixed input, return exactly one
/// vector per text in input order, and reject an empty text with
/// [`OracleError::EmptyText`] instead of panicking. Batch as much work as the
/// backend allows: the explainer sends the whole perturbation population in
/// one call.
pub trait ProbabilityOracle: Send + Sync {
    fn classify(&self, texts: &[String]) -> Result<Vec<ProbabilityVector>, OracleError>;
}

impl<O: ProbabilityOracle + ?Sized> ProbabilityOracle for std::sync::Arc<O> {
    fn classify(&self, texts: &[String]) -> Result<Vec<ProbabilityVector>, OracleError> {
        (**self).classify(texts)
    }
}
