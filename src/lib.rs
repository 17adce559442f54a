// src/lib.rs

//! `sentiment_explain` augments the predictions of an opaque text classifier
//! with a rationale: which words drove the decision, found by fitting a
//! weighted linear surrogate on random token-dropout perturbations, and which
//! single-word edit would shift it.
//!
//! ```no_run
//! use sentiment_explain::{ExplanationEngine, LabelRegistry, LexiconOracle};
//!
//! # fn main() -> sentiment_explain::Result<()> {
//! let engine = ExplanationEngine::new(LabelRegistry::sentiment(), None)?
//!     .with_oracle(LexiconOracle::sentiment());
//!
//! let explanation = engine.explain("the food was terrible", None)?;
//! println!("{}", explanation);
//!
//! let counterfactual = engine.counterfactual("the food was terrible")?;
//! println!("{}", counterfactual);
//! # Ok(())
//! # }
//! ```

pub mod algorithms;
pub mod core;
pub mod engine;
pub mod oracle;
pub mod traits;
pub mod utils;

// Re-export key components for easier use by library consumers
pub use crate::algorithms::{AttributionRanker, LocalSurrogate, SurrogateFit};
pub use crate::core::{
    ClassLabel, CounterfactualResult, ExplainError, ExplainerConfig, Explanation,
    FeatureAttribution, LabelRegistry, OracleError, Polarity, Prediction, ProbabilityVector,
    Result, Text,
};
pub use crate::engine::ExplanationEngine;
pub use crate::oracle::LexiconOracle;
pub use crate::traits::ProbabilityOracle;
pub use crate::utils::AntonymTable;
