//! Tokenization and stemming
//!
//! Words are produced by lowercasing the input, replacing every character
//! that is not an ASCII letter with a space, and splitting on whitespace;
//! each word is then stemmed with the Snowball English algorithm. This
//! module alone fixes the index vocabulary: the crawler, the file builders,
//! and the query processors all tokenize through here.

use rust_stemmers::{Algorithm, Stemmer};
use std::collections::BTreeSet;

/// Split text into lowercase ASCII-letter words.
///
/// Punctuation, digits, and non-ASCII symbols all act as separators. Empty
/// input yields no words.
pub fn parse(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphabetic() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Snowball English stemmer.
///
/// Stemming is pure and deterministic. Callers processing many words create
/// one `WordStemmer` and reuse it rather than constructing per word.
pub struct WordStemmer {
    inner: Stemmer,
}

impl WordStemmer {
    pub fn new() -> Self {
        Self {
            inner: Stemmer::create(Algorithm::English),
        }
    }

    /// Stem a single word.
    pub fn stem(&self, word: &str) -> String {
        self.inner.stem(word).into_owned()
    }
}

impl Default for WordStemmer {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse and stem a line, yielding stems in document order.
pub fn stems(text: &str) -> Vec<String> {
    let stemmer = WordStemmer::new();
    parse(text).iter().map(|w| stemmer.stem(w)).collect()
}

/// Parse and stem a query line into a sorted set of unique stems.
pub fn unique_stems(text: &str) -> BTreeSet<String> {
    let stemmer = WordStemmer::new();
    parse(text).iter().map(|w| stemmer.stem(w)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_non_letters() {
        assert_eq!(
            parse("Hello, hello! Worlds world."),
            vec!["hello", "hello", "worlds", "world"]
        );
    }

    #[test]
    fn test_parse_drops_digits_and_symbols() {
        assert_eq!(parse("abc123def 4:5-6 g_h"), vec!["abc", "def", "g", "h"]);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("123 !?# 456").is_empty());
    }

    #[test]
    fn test_parse_strips_non_ascii() {
        // Accented characters are separators, not letters
        assert_eq!(parse("café naïve"), vec!["caf", "na", "ve"]);
    }

    #[test]
    fn test_stem_english_plurals() {
        let stemmer = WordStemmer::new();
        assert_eq!(stemmer.stem("worlds"), "world");
        assert_eq!(stemmer.stem("hello"), "hello");
        assert_eq!(stemmer.stem("capable"), "capabl");
        assert_eq!(stemmer.stem("running"), "run");
    }

    #[test]
    fn test_stem_is_idempotent_on_parsed_words() {
        let stemmer = WordStemmer::new();
        for word in parse("the quick brown foxes jumped over lazily sleeping dogs capabilities") {
            let once = stemmer.stem(&word);
            assert_eq!(stemmer.stem(&once), once, "stem not stable for {word}");
        }
    }

    #[test]
    fn test_stems_in_document_order() {
        assert_eq!(stems("Worlds world"), vec!["world", "world"]);
    }

    #[test]
    fn test_unique_stems_sorted_and_deduplicated() {
        let set = unique_stems("worlds WORLD apple");
        let words: Vec<_> = set.into_iter().collect();
        assert_eq!(words, vec!["appl", "world"]);
    }
}
