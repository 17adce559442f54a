// src/core/data.rs
use crate::core::{ExplainError, Result};
use crate::utils::text::tokenize;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Absolute tolerance allowed on the sum of a probability vector.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-3;

/// Input text together with its whitespace tokens.
///
/// A `Text` always holds at least one token; blank input is rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    raw: String,
    tokens: Vec<String>,
}

impl Text {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let tokens = tokenize(&raw);
        if tokens.is_empty() {
            return Err(ExplainError::EmptyInput);
        }
        Ok(Text { raw, tokens })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn first_token(&self) -> &str {
        // Construction guarantees at least one token.
        self.tokens.first().map(String::as_str).unwrap_or_default()
    }

    /// Rebuilds the variant text keeping only the tokens whose mask bit is set.
    pub fn masked(&self, mask: &[bool]) -> String {
        self.tokens
            .iter()
            .zip(mask)
            .filter(|&(_, &keep)| keep)
            .map(|(token, _)| token.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One entry of the label registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassLabel {
    pub index: usize,
    pub name: String,
}

/// Ordered, fixed set of class labels. Probability vectors are aligned with this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRegistry {
    labels: Vec<ClassLabel>,
}

impl LabelRegistry {
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut labels: Vec<ClassLabel> = Vec::new();
        for (index, name) in names.into_iter().enumerate() {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(ExplainError::InvalidConfig(format!(
                    "label at position {} has an empty name",
                    index
                )));
            }
            if labels.iter().any(|l| l.name == name) {
                return Err(ExplainError::InvalidConfig(format!(
                    "duplicate label name '{}'",
                    name
                )));
            }
            labels.push(ClassLabel { index, name });
        }
        if labels.is_empty() {
            return Err(ExplainError::InvalidConfig(
                "label registry needs at least one label".to_string(),
            ));
        }
        Ok(LabelRegistry { labels })
    }

    /// The five-point sentiment scale, most negative first.
    pub fn sentiment() -> Self {
        LabelRegistry {
            labels: ["Very Negative", "Negative", "Neutral", "Positive", "Very Positive"]
                .iter()
                .enumerate()
                .map(|(index, name)| ClassLabel {
                    index,
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ClassLabel> {
        self.labels.get(index)
    }

    pub fn by_name(&self, name: &str) -> Result<&ClassLabel> {
        self.labels
            .iter()
            .find(|l| l.name == name)
            .ok_or_else(|| ExplainError::UnknownLabel(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassLabel> {
        self.labels.iter()
    }

    pub(crate) fn label_at(&self, index: usize) -> Result<&ClassLabel> {
        self.get(index).ok_or(ExplainError::ShapeMismatch {
            context: "label index",
            expected: self.len(),
            found: index + 1,
        })
    }
}

/// Class probabilities for one text, positionally aligned with the [`LabelRegistry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbabilityVector(Vec<f64>);

impl ProbabilityVector {
    pub fn new(values: Vec<f64>) -> Self {
        ProbabilityVector(values)
    }

    /// Equal mass on each of `k` classes.
    pub fn uniform(k: usize) -> Self {
        ProbabilityVector(vec![1.0 / k.max(1) as f64; k])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Index and probability of the most likely class; the first index wins a tie.
    pub fn top(&self) -> (usize, f64) {
        let mut best = (0, f64::NEG_INFINITY);
        for (i, &p) in self.0.iter().enumerate() {
            if p > best.1 {
                best = (i, p);
            }
        }
        best
    }

    /// Checks cardinality against the registry and that the entries form a distribution.
    pub fn validate(&self, expected_len: usize) -> Result<()> {
        if self.0.len() != expected_len {
            return Err(ExplainError::ShapeMismatch {
                context: "probability vector",
                expected: expected_len,
                found: self.0.len(),
            });
        }
        if self.0.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(ExplainError::OracleFault(format!(
                "oracle returned invalid probabilities: {:?}",
                self.0
            )));
        }
        let sum: f64 = self.0.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(ExplainError::OracleFault(format!(
                "oracle probabilities sum to {:.6}, expected 1",
                sum
            )));
        }
        Ok(())
    }
}

impl From<Vec<f64>> for ProbabilityVector {
    fn from(values: Vec<f64>) -> Self {
        ProbabilityVector(values)
    }
}

/// A variant of the original text with some tokens removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Perturbation {
    /// One bit per original token, `true` when the token is retained.
    pub mask: Vec<bool>,
    pub text: String,
}

impl Perturbation {
    pub fn retained(&self) -> usize {
        self.mask.iter().filter(|&&keep| keep).count()
    }

    pub fn is_blank(&self) -> bool {
        self.retained() == 0
    }
}

/// The original text plus the sampled perturbations.
#[derive(Debug, Clone)]
pub struct PerturbationPopulation {
    pub original: Text,
    pub perturbations: Vec<Perturbation>,
}

impl PerturbationPopulation {
    pub fn len(&self) -> usize {
        self.perturbations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perturbations.is_empty()
    }

    pub fn texts(&self) -> Vec<String> {
        self.perturbations.iter().map(|p| p.text.clone()).collect()
    }

    /// N x T design matrix, 1.0 where the token was retained.
    pub fn mask_matrix(&self) -> Result<Array2<f64>> {
        let width = self.original.len();
        let mut values = Vec::with_capacity(self.len() * width);
        for p in &self.perturbations {
            if p.mask.len() != width {
                return Err(ExplainError::ShapeMismatch {
                    context: "perturbation mask",
                    expected: width,
                    found: p.mask.len(),
                });
            }
            values.extend(p.mask.iter().map(|&keep| if keep { 1.0 } else { 0.0 }));
        }
        Ok(Array2::from_shape_vec((self.len(), width), values)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

impl Polarity {
    pub fn from_weight(weight: f64) -> Self {
        if weight > 0.0 {
            Polarity::Positive
        } else if weight < 0.0 {
            Polarity::Negative
        } else {
            Polarity::Neutral
        }
    }
}

/// Signed importance of one word for the explained class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureAttribution {
    pub word: String,
    pub weight: f64,
    /// `|weight|`, kept alongside the signed value for display.
    pub importance: f64,
    #[serde(rename = "sentiment")]
    pub polarity: Polarity,
    pub contributes_to: Option<String>,
}

impl FeatureAttribution {
    pub fn new(word: impl Into<String>, weight: f64, contributes_to: Option<String>) -> Self {
        FeatureAttribution {
            word: word.into(),
            weight,
            importance: weight.abs(),
            polarity: Polarity::from_weight(weight),
            contributes_to,
        }
    }
}

/// Result of `explain`: ranked features for the explained class.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub text: String,
    #[serde(rename = "keyFeatures")]
    pub key_features: Vec<FeatureAttribution>,
    #[serde(rename = "topClass")]
    pub top_class: String,
    /// Label the surrogate was fit for; equals `top_class` unless a target was requested.
    pub target_class: String,
    /// Set when the surrogate fit collapsed and every weight is zero.
    pub degenerate: bool,
    /// Weighted R² of the surrogate on the perturbed population.
    pub surrogate_score: Option<f64>,
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Explanation for \"{}\":", self.text)?;
        writeln!(f, "  Top Class:    {}", self.top_class)?;
        writeln!(f, "  Target Class: {}", self.target_class)?;
        if let Some(score) = self.surrogate_score {
            writeln!(f, "  Surrogate R²: {:.4}", score)?;
        }
        for feature in &self.key_features {
            match &feature.contributes_to {
                Some(label) => writeln!(f, "    {:<16} {:+.4}  -> {}", feature.word, feature.weight, label)?,
                None => writeln!(f, "    {:<16} {:+.4}", feature.word, feature.weight)?,
            }
        }
        Ok(())
    }
}

/// Outcome of substituting one attributed word and re-querying the classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CounterfactualResult {
    pub original_sentence: String,
    pub target_word: String,
    pub counterfactual_sentence: String,
    pub original_sentiment: String,
    pub original_prob: f64,
    pub counterfactual_sentiment: String,
    pub counterfactual_prob: f64,
    /// `counterfactual_prob - original_prob`; each side uses its own top class.
    pub sentiment_change: f64,
}

impl CounterfactualResult {
    pub fn label_changed(&self) -> bool {
        self.original_sentiment != self.counterfactual_sentiment
    }
}

impl fmt::Display for CounterfactualResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Counterfactual:")?;
        writeln!(f, "  Original:  \"{}\" -> {} ({:.4})", self.original_sentence, self.original_sentiment, self.original_prob)?;
        writeln!(f, "  Edited:    \"{}\" -> {} ({:.4})", self.counterfactual_sentence, self.counterfactual_sentiment, self.counterfactual_prob)?;
        writeln!(f, "  Target:    {}", self.target_word)?;
        writeln!(f, "  Change:    {:+.4}", self.sentiment_change)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelConfidence {
    pub label: String,
    pub confidence: f64,
}

/// Plain top-1 prediction with the full distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub text: String,
    pub sentiment: String,
    pub confidence: f64,
    pub confidences: Vec<LabelConfidence>,
}
