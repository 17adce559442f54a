// src/core/config.rs
use crate::core::{ExplainError, Result};
use crate::utils::antonyms::DEFAULT_FALLBACK;
use serde::Deserialize;

/// Upper bound on the number of ranked features returned per explanation.
pub const MAX_FEATURES_CAP: usize = 10;

/// Tuning knobs for the explanation pipeline.
///
/// Every field has a default, so a partial JSON document is enough:
/// `{"num_samples": 100}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExplainerConfig {
    /// Perturbations drawn per explanation. Small on purpose: latency over fidelity.
    pub num_samples: usize,
    /// Independent probability of dropping each token from a perturbation.
    pub removal_rate: f64,
    /// Width of the exponential proximity kernel over cosine distance (scaled by 100).
    pub kernel_width: f64,
    /// L2 penalty on the surrogate coefficients; 0 gives plain weighted least squares.
    pub ridge_alpha: f64,
    /// Requested number of ranked features, further capped at 10 and the token count.
    pub max_features: usize,
    /// |weight| above which a feature is said to contribute to (or against) a class.
    pub significance_threshold: f64,
    /// Replacement for words missing from the antonym table.
    pub fallback_replacement: String,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        ExplainerConfig {
            num_samples: 30,
            removal_rate: 0.5,
            kernel_width: 25.0,
            ridge_alpha: 1.0,
            max_features: MAX_FEATURES_CAP,
            significance_threshold: 0.01,
            fallback_replacement: DEFAULT_FALLBACK.to_string(),
        }
    }
}

impl ExplainerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ExplainerConfig = serde_json::from_str(json)
            .map_err(|e| ExplainError::InvalidConfig(format!("malformed config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_samples == 0 {
            return Err(ExplainError::InvalidConfig(
                "num_samples must be at least 1".to_string(),
            ));
        }
        if self.max_features == 0 {
            return Err(ExplainError::InvalidConfig(
                "max_features must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.removal_rate) {
            return Err(ExplainError::InvalidConfig(format!(
                "removal_rate must lie in [0, 1], got {}",
                self.removal_rate
            )));
        }
        if !self.kernel_width.is_finite() || self.kernel_width <= 0.0 {
            return Err(ExplainError::InvalidConfig(format!(
                "kernel_width must be positive, got {}",
                self.kernel_width
            )));
        }
        if !self.ridge_alpha.is_finite() || self.ridge_alpha < 0.0 {
            return Err(ExplainError::InvalidConfig(format!(
                "ridge_alpha must be non-negative, got {}",
                self.ridge_alpha
            )));
        }
        if !self.significance_threshold.is_finite() || self.significance_threshold < 0.0 {
            return Err(ExplainError::InvalidConfig(format!(
                "significance_threshold must be non-negative, got {}",
                self.significance_threshold
            )));
        }
        if self.fallback_replacement.split_whitespace().count() != 1 {
            return Err(ExplainError::InvalidConfig(
                "fallback_replacement must be a single word".to_string(),
            ));
        }
        Ok(())
    }
}
