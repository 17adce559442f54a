// src/utils/antonyms.rs
use std::collections::HashMap;

/// Replacement used when a word has no entry in the table.
pub const DEFAULT_FALLBACK: &str = "good";

const DEFAULT_PAIRS: [(&str, &str); 24] = [
    ("bad", "good"),
    ("terrible", "excellent"),
    ("awful", "great"),
    ("poor", "rich"),
    ("horrible", "wonderful"),
    ("ugly", "beautiful"),
    ("dirty", "clean"),
    ("wrong", "right"),
    ("difficult", "easy"),
    ("boring", "interesting"),
    ("unhappy", "happy"),
    ("sad", "happy"),
    ("disappointed", "pleased"),
    ("negative", "positive"),
    ("worst", "best"),
    ("hate", "love"),
    ("dislike", "like"),
    ("angry", "calm"),
    ("furious", "delighted"),
    ("unpleasant", "pleasant"),
    ("extremely", "moderately"),
    ("never", "always"),
    ("worthless", "valuable"),
    ("useless", "useful"),
];

/// Static lowercase word -> replacement lookup used by the counterfactual edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntonymTable {
    entries: HashMap<String, String>,
    fallback: String,
}

impl AntonymTable {
    pub fn empty() -> Self {
        AntonymTable {
            entries: HashMap::new(),
            fallback: DEFAULT_FALLBACK.to_string(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        pairs
            .into_iter()
            .fold(Self::empty(), |table, (k, v)| table.with_entry(k, v))
    }

    pub fn with_entry(mut self, word: impl AsRef<str>, replacement: impl AsRef<str>) -> Self {
        self.entries.insert(
            word.as_ref().to_lowercase(),
            replacement.as_ref().to_lowercase(),
        );
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn get(&self, word: &str) -> Option<&str> {
        self.entries.get(&word.to_lowercase()).map(String::as_str)
    }

    /// Table entry for `word`, or the fallback replacement.
    pub fn replacement_for(&self, word: &str) -> &str {
        self.get(word).unwrap_or(&self.fallback)
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AntonymTable {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_PAIRS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_case_insensitive() {
        let table = AntonymTable::default();
        assert_eq!(table.len(), 24);
        assert_eq!(table.get("Terrible"), Some("excellent"));
        assert_eq!(table.replacement_for("HATE"), "love");
    }

    #[test]
    fn missing_words_use_fallback() {
        let table = AntonymTable::default().with_fallback("fine");
        assert_eq!(table.replacement_for("soggy"), "fine");
        assert_eq!(AntonymTable::empty().replacement_for("terrible"), DEFAULT_FALLBACK);
    }
}
