// src/algorithms/counterfactual.rs

use crate::core::{FeatureAttribution, Text};
use crate::utils::antonyms::AntonymTable;
use crate::utils::text::replace_word;

/// The word chosen for substitution and the rewritten text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterfactualEdit {
    pub target_word: String,
    pub replacement: String,
    pub edited: String,
}

/// Picks the word whose edit should move the prediction the most.
///
/// In order: the most negative weight; otherwise the smallest signed weight in
/// the whole list; otherwise (empty list) the first token of the text. Ties go
/// to the earlier entry of the ranked list.
pub fn select_target<'a>(text: &'a Text, attributions: &'a [FeatureAttribution]) -> &'a str {
    let mut most_negative: Option<&FeatureAttribution> = None;
    for feature in attributions.iter().filter(|f| f.weight < 0.0) {
        if most_negative.map_or(true, |best| feature.weight < best.weight) {
            most_negative = Some(feature);
        }
    }
    if let Some(feature) = most_negative {
        return &feature.word;
    }

    // Stable ascending sort: the first minimum in ranked order wins.
    let mut ascending: Vec<&FeatureAttribution> = attributions.iter().collect();
    ascending.sort_by(|a, b| {
        a.weight
            .partial_cmp(&b.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    match ascending.first().copied() {
        Some(feature) => &feature.word,
        None => text.first_token(),
    }
}

/// Chooses a target word and replaces every case-insensitive occurrence of it.
pub fn synthesize(
    text: &Text,
    attributions: &[FeatureAttribution],
    antonyms: &AntonymTable,
) -> CounterfactualEdit {
    let target_word = select_target(text, attributions).to_string();
    let replacement = antonyms.replacement_for(&target_word).to_string();
    let edited = replace_word(text.as_str(), &target_word, &replacement);
    log::debug!(
        "counterfactual edit: '{}' -> '{}' ({} attributions considered)",
        target_word,
        replacement,
        attributions.len()
    );
    CounterfactualEdit {
        target_word,
        replacement,
        edited,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(pairs: &[(&str, f64)]) -> Vec<FeatureAttribution> {
        pairs
            .iter()
            .map(|&(word, weight)| FeatureAttribution::new(word, weight, None))
            .collect()
    }

    #[test]
    fn most_negative_word_is_replaced_by_its_antonym() {
        let text = Text::new("the food was terrible").unwrap();
        let ranked = features(&[("terrible", -0.42), ("food", 0.1), ("the", -0.02)]);
        let edit = synthesize(&text, &ranked, &AntonymTable::default());
        assert_eq!(edit.target_word, "terrible");
        assert_eq!(edit.edited, "the food was excellent");
    }

    #[test]
    fn unknown_word_uses_generic_fallback() {
        let text = Text::new("the food was terrible").unwrap();
        let ranked = features(&[("terrible", -0.42)]);
        let edit = synthesize(&text, &ranked, &AntonymTable::empty());
        assert_eq!(edit.edited, "the food was good");
    }

    #[test]
    fn all_positive_weights_pick_the_smallest() {
        let text = Text::new("great food and nice staff").unwrap();
        let ranked = features(&[("great", 0.5), ("nice", 0.3), ("staff", 0.01), ("food", 0.2)]);
        assert_eq!(select_target(&text, &ranked), "staff");
    }

    #[test]
    fn negative_ties_go_to_the_earlier_entry() {
        let text = Text::new("bad and awful").unwrap();
        let ranked = features(&[("awful", -0.3), ("bad", -0.3), ("and", 0.3)]);
        assert_eq!(select_target(&text, &ranked), "awful");
    }

    #[test]
    fn zero_weights_fall_back_to_first_ranked() {
        let text = Text::new("plain words here").unwrap();
        let ranked = features(&[("plain", 0.0), ("words", 0.0), ("here", 0.0)]);
        assert_eq!(select_target(&text, &ranked), "plain");
    }

    #[test]
    fn empty_list_targets_first_token() {
        let text = Text::new("Bland soup").unwrap();
        let edit = synthesize(&text, &[], &AntonymTable::default());
        assert_eq!(edit.target_word, "Bland");
        assert_eq!(edit.edited, "good soup");
    }

    #[test]
    fn every_occurrence_is_replaced_regardless_of_case() {
        let text = Text::new("Bad food, bad service").unwrap();
        let ranked = features(&[("Bad", -0.2)]);
        let edit = synthesize(&text, &ranked, &AntonymTable::default());
        assert_eq!(edit.edited, "good food, good service");
    }
}
