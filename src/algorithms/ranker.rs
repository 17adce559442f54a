// src/algorithms/ranker.rs

use super::surrogate::SurrogateFit;
use crate::core::{ClassLabel, ExplainerConfig, FeatureAttribution, MAX_FEATURES_CAP};
use std::cmp::Ordering;

/// Turns surrogate coefficients into the ranked, human-facing feature list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributionRanker {
    /// Weights at or below this magnitude are not attributed to any class.
    pub significance_threshold: f64,
}

impl Default for AttributionRanker {
    fn default() -> Self {
        Self::from_config(&ExplainerConfig::default())
    }
}

impl AttributionRanker {
    pub fn from_config(config: &ExplainerConfig) -> Self {
        AttributionRanker {
            significance_threshold: config.significance_threshold,
        }
    }

    /// Number of features actually returned for a text of `token_count` tokens.
    pub fn feature_limit(max_features: usize, token_count: usize) -> usize {
        max_features.min(MAX_FEATURES_CAP).min(token_count)
    }

    /// Features ordered by descending |weight|; equal magnitudes keep token order.
    ///
    /// A degenerate fit still produces a list, with every weight zero.
    pub fn rank(
        &self,
        fit: &SurrogateFit,
        max_features: usize,
        target: &ClassLabel,
    ) -> Vec<FeatureAttribution> {
        let limit = Self::feature_limit(max_features, fit.tokens().len());
        self.rank_top(fit, limit, target)
    }

    /// Every token in ranked order, without the response-size cap.
    pub fn rank_all(&self, fit: &SurrogateFit, target: &ClassLabel) -> Vec<FeatureAttribution> {
        self.rank_top(fit, fit.tokens().len(), target)
    }

    fn rank_top(&self, fit: &SurrogateFit, limit: usize, target: &ClassLabel) -> Vec<FeatureAttribution> {
        let tokens = fit.tokens();
        let coefficients = fit.coefficients();

        let mut order: Vec<usize> = (0..tokens.len()).collect();
        order.sort_by(|&a, &b| {
            coefficients[b]
                .abs()
                .partial_cmp(&coefficients[a].abs())
                .unwrap_or(Ordering::Equal)
        });
        order.truncate(limit);

        order
            .into_iter()
            .map(|i| {
                let weight = coefficients[i];
                FeatureAttribution::new(
                    tokens[i].clone(),
                    weight,
                    self.contributes_to(weight, target),
                )
            })
            .collect()
    }

    /// `"<label>"` for a significant positive weight, `"NOT <label>"` for a significant negative one.
    pub fn contributes_to(&self, weight: f64, target: &ClassLabel) -> Option<String> {
        if weight.abs() <= self.significance_threshold {
            None
        } else if weight > 0.0 {
            Some(target.name.clone())
        } else {
            Some(format!("NOT {}", target.name))
        }
    }
}
