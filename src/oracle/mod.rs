// src/oracle/mod.rs
pub mod lexicon;

pub use lexicon::LexiconOracle;

use crate::core::{ExplainError, ProbabilityVector, Result};
use crate::traits::ProbabilityOracle;

/// Sends `texts` to the oracle in a single batch and validates the answer.
///
/// Blank texts (a perturbation that dropped every token) are never sent; they
/// receive the uniform distribution over `num_labels` classes. Every returned
/// vector must have exactly `num_labels` entries.
pub fn classify_guarded(
    oracle: &dyn ProbabilityOracle,
    texts: &[String],
    num_labels: usize,
) -> Result<Vec<ProbabilityVector>> {
    let to_send: Vec<String> = texts
        .iter()
        .filter(|t| !t.trim().is_empty())
        .cloned()
        .collect();

    let outputs = if to_send.is_empty() {
        Vec::new()
    } else {
        oracle.classify(&to_send)?
    };
    if outputs.len() != to_send.len() {
        return Err(ExplainError::ShapeMismatch {
            context: "oracle batch",
            expected: to_send.len(),
            found: outputs.len(),
        });
    }
    log::debug!(
        "oracle classified {} texts ({} blank filled with uniform)",
        to_send.len(),
        texts.len() - to_send.len()
    );

    let mut answered = outputs.into_iter();
    let mut result = Vec::with_capacity(texts.len());
    for text in texts {
        if text.trim().is_empty() {
            result.push(ProbabilityVector::uniform(num_labels));
            continue;
        }
        // Lengths were checked above, so the iterator cannot run dry.
        let probs = answered.next().ok_or(ExplainError::ShapeMismatch {
            context: "oracle batch",
            expected: to_send.len(),
            found: result.len(),
        })?;
        probs.validate(num_labels)?;
        result.push(probs);
    }
    Ok(result)
}
