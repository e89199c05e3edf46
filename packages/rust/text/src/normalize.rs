//! Tokenization and filtering of raw page text.

use std::sync::LazyLock;

use regex::Regex;

/// Tokens with this many characters or fewer are dropped.
pub const MAX_DROPPED_LEN: usize = 2;

/// Closed list of English function words excluded from analysis.
pub const STOP_WORDS: &[&str] = &[
    "the", "and", "to", "of", "in", "a", "is", "for", "on", "it", "that", "with", "as", "by",
    "at", "this", "an", "be", "from", "are", "was", "or", "not", "but", "can", "has", "have",
    "you", "will", "your", "about", "which", "we", "all", "their", "more", "also", "its", "one",
    "so", "if", "when", "they", "how", "some", "other", "what", "there", "such", "who", "these",
];

/// Ordered content words extracted from one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSequence(Vec<String>);

impl TokenSequence {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl FromIterator<String> for TokenSequence {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Whether `word` (already lowercased) is a stop-word.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Lowercase `text`, split it into word-character runs, and keep only
/// tokens longer than [`MAX_DROPPED_LEN`] that are not stop-words.
pub fn normalize(text: &str) -> TokenSequence {
    static WORD_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));

    let lowered = text.to_lowercase();
    WORD_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|word| word.chars().count() > MAX_DROPPED_LEN && !is_stop_word(word))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        normalize(text).into_inner()
    }

    #[test]
    fn lowercases_and_drops_stop_words() {
        assert_eq!(
            words("Fast shipping and great prices"),
            vec!["fast", "shipping", "great", "prices"]
        );
    }

    #[test]
    fn drops_short_tokens() {
        assert_eq!(words("go to an ox run"), vec!["run"]);
    }

    #[test]
    fn splits_on_punctuation() {
        assert_eq!(
            words("price-match, free_returns! (today)"),
            vec!["price", "match", "free_returns", "today"]
        );
    }

    #[test]
    fn keeps_digits_and_unicode_letters() {
        assert_eq!(words("2024 Café größe"), vec!["2024", "café", "größe"]);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // Two characters, four bytes.
        assert!(words("éé").is_empty());
    }

    #[test]
    fn empty_input_is_empty_sequence() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \n\t ").is_empty());
    }

    #[test]
    fn stop_word_list_is_lowercase_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for word in STOP_WORDS {
            assert_eq!(*word, word.to_lowercase());
            assert!(seen.insert(*word), "duplicate stop-word {word}");
        }
    }

    #[test]
    fn output_never_contains_filtered_tokens() {
        let samples = [
            "The quick brown fox jumps over the lazy dog",
            "What is SEO? It is how you rank, and THAT is all.",
            "a an the of in IN On at AT by",
            "Their other products: some are better, these are not.",
        ];

        for sample in samples {
            for token in normalize(sample).iter() {
                assert!(!is_stop_word(token), "stop-word {token} in {sample:?}");
                assert!(token.chars().count() >= 3, "short token {token} in {sample:?}");
                assert_eq!(token, token.to_lowercase());
            }
        }
    }

    #[test]
    fn deterministic_order() {
        let text = "zebra apple mango apple";
        assert_eq!(normalize(text), normalize(text));
        assert_eq!(words(text), vec!["zebra", "apple", "mango", "apple"]);
    }
}
