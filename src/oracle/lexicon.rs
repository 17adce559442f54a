// src/oracle/lexicon.rs
use crate::core::{OracleError, ProbabilityVector};
use crate::traits::ProbabilityOracle;
use std::collections::HashMap;

/// Signed valence per lowercase word. Zero-valued words still count towards
/// the average, which pulls mixed sentences towards neutral.
const VALENCES: [(&str, f64); 53] = [
    ("love", 0.9),
    ("great", 0.8),
    ("good", 0.7),
    ("nice", 0.6),
    ("excellent", 0.85),
    ("amazing", 0.82),
    ("happy", 0.8),
    ("wonderful", 0.85),
    ("beautiful", 0.75),
    ("best", 0.9),
    ("pleased", 0.7),
    ("delighted", 0.85),
    ("pleasant", 0.6),
    ("useful", 0.5),
    ("valuable", 0.6),
    ("interesting", 0.5),
    ("easy", 0.4),
    ("clean", 0.4),
    ("calm", 0.3),
    ("like", 0.4),
    ("right", 0.3),
    ("bad", -0.7),
    ("worst", -0.9),
    ("terrible", -0.85),
    ("disappointed", -0.7),
    ("waste", -0.8),
    ("awful", -0.85),
    ("horrible", -0.85),
    ("hate", -0.9),
    ("ugly", -0.6),
    ("boring", -0.5),
    ("useless", -0.7),
    ("worthless", -0.8),
    ("poor", -0.6),
    ("unhappy", -0.7),
    ("sad", -0.6),
    ("angry", -0.6),
    ("furious", -0.8),
    ("dislike", -0.5),
    ("unpleasant", -0.6),
    ("dirty", -0.5),
    ("wrong", -0.4),
    ("difficult", -0.3),
    ("okay", 0.0),
    ("average", 0.0),
    ("expected", 0.0),
    ("but", 0.0),
    ("however", 0.0),
    ("food", 0.0),
    ("too", 0.0),
    ("service", 0.0),
    ("really", 0.0),
    ("was", 0.0),
];

/// Deterministic word-valence classifier.
///
/// The text score is the mean valence of known words (0 when none are known).
/// Each class has a center on the [-1, 1] score axis; probabilities are a
/// softmax over the negative squared distance to each center.
#[derive(Debug, Clone)]
pub struct LexiconOracle {
    valences: HashMap<String, f64>,
    centers: Vec<f64>,
    sharpness: f64,
}

impl LexiconOracle {
    pub fn new(centers: Vec<f64>, sharpness: f64) -> Self {
        LexiconOracle {
            valences: VALENCES
                .iter()
                .map(|&(word, valence)| (word.to_string(), valence))
                .collect(),
            centers,
            sharpness,
        }
    }

    /// Five classes aligned with [`crate::core::LabelRegistry::sentiment`].
    pub fn sentiment() -> Self {
        Self::new(vec![-0.8, -0.4, 0.0, 0.4, 0.8], 20.0)
    }

    pub fn with_valence(mut self, word: &str, valence: f64) -> Self {
        self.valences.insert(word.to_lowercase(), valence);
        self
    }

    pub fn num_labels(&self) -> usize {
        self.centers.len()
    }

    /// Mean valence of the known words in `text`.
    pub fn score(&self, text: &str) -> f64 {
        let mut sum = 0.0;
        let mut matched = 0usize;
        for word in text.split_whitespace() {
            let clean: String = word
                .to_lowercase()
                .chars()
                .filter(|c| c.is_alphabetic())
                .collect();
            if let Some(v) = self.valences.get(&clean) {
                sum += v;
                matched += 1;
            }
        }
        if matched == 0 {
            0.0
        } else {
            sum / matched as f64
        }
    }

    fn distribution(&self, score: f64) -> ProbabilityVector {
        let logits: Vec<f64> = self
            .centers
            .iter()
            .map(|c| -self.sharpness * (score - c).powi(2))
            .collect();
        let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        ProbabilityVector::new(exps.into_iter().map(|e| e / total).collect())
    }
}

impl Default for LexiconOracle {
    fn default() -> Self {
        Self::sentiment()
    }
}

impl ProbabilityOracle for LexiconOracle {
    fn classify(&self, texts: &[String]) -> Result<Vec<ProbabilityVector>, OracleError> {
        if self.centers.is_empty() {
            return Err(OracleError::Inference("lexicon oracle has no classes".to_string()));
        }
        texts
            .iter()
            .map(|text| {
                if text.trim().is_empty() {
                    return Err(OracleError::EmptyText);
                }
                Ok(self.distribution(self.score(text)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn top(oracle: &LexiconOracle, text: &str) -> usize {
        oracle.classify(&[text.to_string()]).unwrap()[0].top().0
    }

    #[test]
    fn scores_follow_valence() {
        let oracle = LexiconOracle::sentiment();
        assert_eq!(top(&oracle, "terrible"), 0);
        assert_eq!(top(&oracle, "the food was terrible"), 1);
        assert_eq!(top(&oracle, "the food was"), 2);
        assert_eq!(top(&oracle, "the food was excellent"), 3);
        assert_eq!(top(&oracle, "I love it, amazing!"), 4);
    }

    #[test]
    fn distributions_sum_to_one_and_repeat() {
        let oracle = LexiconOracle::sentiment();
        let texts = vec!["Bad service".to_string(), "Bad service".to_string()];
        let probs = oracle.classify(&texts).unwrap();
        assert_abs_diff_eq!(probs[0].as_slice().iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_eq!(probs[0], probs[1]);
    }

    #[test]
    fn empty_text_is_rejected() {
        let oracle = LexiconOracle::sentiment();
        let err = oracle.classify(&["ok".to_string(), "  ".to_string()]).unwrap_err();
        assert_eq!(err, OracleError::EmptyText);
    }

    #[test]
    fn custom_valence_overrides() {
        let oracle = LexiconOracle::sentiment().with_valence("Soggy", -0.9);
        assert_abs_diff_eq!(oracle.score("soggy fries"), -0.9);
    }
}
