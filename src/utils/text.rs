// src/utils/text.rs

/// Whitespace-delimited word units. Punctuation stays attached to its word.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Replaces every token equal to `target` (ignoring case) with `replacement`.
///
/// Matching is on whole whitespace tokens only, so `"terrible."` does not match
/// `"terrible"`. The output is re-joined with single spaces.
pub fn replace_word(text: &str, target: &str, replacement: &str) -> String {
    let target = target.to_lowercase();
    text.split_whitespace()
        .map(|word| {
            if word.to_lowercase() == target {
                replacement
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
