// src/engine.rs

use crate::algorithms::{sample, synthesize, AttributionRanker, LocalSurrogate, SurrogateFit};
use crate::core::{
    ClassLabel, CounterfactualResult, ExplainError, ExplainerConfig, Explanation,
    FeatureAttribution, LabelConfidence, LabelRegistry, Prediction, Result, Text,
};
use crate::oracle::classify_guarded;
use crate::traits::ProbabilityOracle;
use crate::utils::AntonymTable;
use rand::Rng;
use std::sync::Arc;

/// Long-lived, read-only context shared by all requests.
///
/// Built once at startup, then used concurrently: every operation takes `&self`
/// and keeps its intermediate state on the stack.
#[derive(Clone)]
pub struct ExplanationEngine {
    oracle: Option<Arc<dyn ProbabilityOracle>>,
    labels: Arc<LabelRegistry>,
    antonyms: Arc<AntonymTable>,
    config: ExplainerConfig,
    surrogate: LocalSurrogate,
    ranker: AttributionRanker,
}

/// Everything one attribution pass produces.
struct Attribution {
    top: ClassLabel,
    target: ClassLabel,
    fit: SurrogateFit,
    features: Vec<FeatureAttribution>,
}

impl ExplanationEngine {
    pub fn new(labels: LabelRegistry, config: Option<ExplainerConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();
        config.validate()?;
        log::info!(
            "explanation engine: {} labels, {} samples, removal rate {}",
            labels.len(),
            config.num_samples,
            config.removal_rate
        );
        Ok(ExplanationEngine {
            oracle: None,
            labels: Arc::new(labels),
            antonyms: Arc::new(
                AntonymTable::default().with_fallback(config.fallback_replacement.clone()),
            ),
            surrogate: LocalSurrogate::from_config(&config),
            ranker: AttributionRanker::from_config(&config),
            config,
        })
    }

    pub fn with_oracle<O: ProbabilityOracle + 'static>(self, oracle: O) -> Self {
        self.with_shared_oracle(Arc::new(oracle))
    }

    pub fn with_shared_oracle(mut self, oracle: Arc<dyn ProbabilityOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Replaces the antonym table. The configured fallback word is kept.
    pub fn with_antonyms(mut self, table: AntonymTable) -> Self {
        self.antonyms = Arc::new(table.with_fallback(self.config.fallback_replacement.clone()));
        self
    }

    pub fn labels(&self) -> &LabelRegistry {
        &self.labels
    }

    pub fn config(&self) -> &ExplainerConfig {
        &self.config
    }

    pub fn antonyms(&self) -> &AntonymTable {
        &self.antonyms
    }

    /// True once a classifier is attached.
    pub fn is_ready(&self) -> bool {
        self.oracle.is_some()
    }

    /// Entry checks shared by every operation, run before any sampling.
    fn prepare(&self, text: &str) -> Result<(Text, &dyn ProbabilityOracle)> {
        let text = Text::new(text)?;
        let oracle = self.oracle.as_deref().ok_or(ExplainError::OracleUnavailable)?;
        Ok((text, oracle))
    }

    pub fn predict(&self, text: &str) -> Result<Prediction> {
        let (text, oracle) = self.prepare(text)?;
        let outputs = classify_guarded(oracle, &[text.as_str().to_string()], self.labels.len())?;
        let probs = outputs
            .first()
            .ok_or(ExplainError::ShapeMismatch { context: "oracle batch", expected: 1, found: 0 })?;
        let (index, confidence) = probs.top();
        let confidences = self
            .labels
            .iter()
            .zip(probs.as_slice())
            .map(|(label, &p)| LabelConfidence {
                label: label.name.clone(),
                confidence: p,
            })
            .collect();
        Ok(Prediction {
            text: text.as_str().to_string(),
            sentiment: self.labels.label_at(index)?.name.clone(),
            confidence,
            confidences,
        })
    }

    /// Ranks the words of `text` by their local influence on `target_label`
    /// (the classifier's own top class when `None`).
    pub fn explain(&self, text: &str, target_label: Option<&str>) -> Result<Explanation> {
        self.explain_with_rng(text, target_label, &mut rand::thread_rng())
    }

    pub fn explain_with_rng<R: Rng + ?Sized>(
        &self,
        text: &str,
        target_label: Option<&str>,
        rng: &mut R,
    ) -> Result<Explanation> {
        let (text, oracle) = self.prepare(text)?;
        let limit = Some(self.config.max_features);
        let attribution = self.attribute(&text, oracle, target_label, limit, rng)?;
        Ok(Explanation {
            text: text.as_str().to_string(),
            key_features: attribution.features,
            top_class: attribution.top.name,
            target_class: attribution.target.name,
            degenerate: attribution.fit.is_degenerate(),
            surrogate_score: attribution.fit.score(),
        })
    }

    /// Edits the most counter-evidential word of `text` and reports how the
    /// prediction moved.
    pub fn counterfactual(&self, text: &str) -> Result<CounterfactualResult> {
        self.counterfactual_with_rng(text, &mut rand::thread_rng())
    }

    pub fn counterfactual_with_rng<R: Rng + ?Sized>(
        &self,
        text: &str,
        rng: &mut R,
    ) -> Result<CounterfactualResult> {
        let (text, oracle) = self.prepare(text)?;
        // The edit considers every token, not just the reported top features.
        let attribution = self.attribute(&text, oracle, None, None, rng)?;
        let edit = synthesize(&text, &attribution.features, &self.antonyms);

        let pair = [text.as_str().to_string(), edit.edited.clone()];
        let outputs = classify_guarded(oracle, &pair, self.labels.len())?;
        let (original, edited) = match outputs.as_slice() {
            [original, edited] => (original.top(), edited.top()),
            _ => {
                return Err(ExplainError::ShapeMismatch {
                    context: "oracle batch",
                    expected: 2,
                    found: outputs.len(),
                })
            }
        };

        Ok(CounterfactualResult {
            original_sentence: text.as_str().to_string(),
            target_word: edit.target_word,
            counterfactual_sentence: edit.edited,
            original_sentiment: self.labels.label_at(original.0)?.name.clone(),
            original_prob: original.1,
            counterfactual_sentiment: self.labels.label_at(edited.0)?.name.clone(),
            counterfactual_prob: edited.1,
            sentiment_change: edited.1 - original.1,
        })
    }

    /// Sample, query, fit, rank. The original text rides along in the same
    /// oracle batch to obtain the top class.
    fn attribute<R: Rng + ?Sized>(
        &self,
        text: &Text,
        oracle: &dyn ProbabilityOracle,
        target_label: Option<&str>,
        max_features: Option<usize>,
        rng: &mut R,
    ) -> Result<Attribution> {
        let requested = target_label
            .map(|name| self.labels.by_name(name).cloned())
            .transpose()?;

        let population = sample(text, self.config.num_samples, self.config.removal_rate, rng)?;
        let mut batch = Vec::with_capacity(population.len() + 1);
        batch.push(text.as_str().to_string());
        batch.extend(population.texts());
        let outputs = classify_guarded(oracle, &batch, self.labels.len())?;

        let (top_index, _) = outputs[0].top();
        let top = self.labels.label_at(top_index)?.clone();
        let target = requested.unwrap_or_else(|| top.clone());

        let fit = self.surrogate.fit(&population, &outputs[1..], &target)?;
        let features = match max_features {
            Some(max_features) => self.ranker.rank(&fit, max_features, &target),
            None => self.ranker.rank_all(&fit, &target),
        };
        log::debug!(
            "attributed {} of {} tokens for '{}' (top '{}')",
            features.len(),
            text.len(),
            target.name,
            top.name
        );

        Ok(Attribution {
            top,
            target,
            fit,
            features,
        })
    }
}

impl std::fmt::Debug for ExplanationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplanationEngine")
            .field("ready", &self.is_ready())
            .field("labels", &self.labels)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::LexiconOracle;

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ExplanationEngine>();
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = ExplainerConfig {
            removal_rate: 2.0,
            ..ExplainerConfig::default()
        };
        let err = ExplanationEngine::new(LabelRegistry::sentiment(), Some(config)).unwrap_err();
        assert!(matches!(err, ExplainError::InvalidConfig(_)));
    }

    #[test]
    fn predict_reports_distribution() -> Result<()> {
        let engine = ExplanationEngine::new(LabelRegistry::sentiment(), None)?
            .with_oracle(LexiconOracle::sentiment());
        let prediction = engine.predict("I love this place")?;
        assert_eq!(prediction.sentiment, "Very Positive");
        assert_eq!(prediction.confidences.len(), 5);
        assert_eq!(prediction.confidences[4].confidence, prediction.confidence);
        Ok(())
    }

    #[test]
    fn unavailable_oracle_is_reported_before_work() -> Result<()> {
        let engine = ExplanationEngine::new(LabelRegistry::sentiment(), None)?;
        assert!(!engine.is_ready());
        assert!(matches!(engine.predict("fine"), Err(ExplainError::OracleUnavailable)));
        assert!(matches!(engine.explain("fine", None), Err(ExplainError::OracleUnavailable)));
        assert!(matches!(engine.counterfactual("fine"), Err(ExplainError::OracleUnavailable)));
        Ok(())
    }

    #[test]
    fn unknown_target_label_fails() -> Result<()> {
        let engine = ExplanationEngine::new(LabelRegistry::sentiment(), None)?
            .with_oracle(LexiconOracle::sentiment());
        let err = engine.explain("fine", Some("Ecstatic")).unwrap_err();
        assert!(matches!(err, ExplainError::UnknownLabel(name) if name == "Ecstatic"));
        Ok(())
    }
}
