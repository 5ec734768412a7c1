//! Whitespace tokenization into lowercase token sets.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::DEFAULT_MIN_TOKEN_CHARS;

/// An unordered set of normalized tokens.
///
/// Only membership matters; iteration order is never used for scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet(HashSet<String>);

impl TokenSet {
    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no tokens.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if a token is present.
    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    /// Count tokens shared with another set.
    pub fn intersection_len(&self, other: &TokenSet) -> usize {
        // Walk the smaller set.
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.0.iter().filter(|t| large.0.contains(*t)).count()
    }

    /// Iterate the tokens in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromIterator<String> for TokenSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Splits text on whitespace, lowercases, and drops short tokens.
///
/// There is no stemming or punctuation stripping: `"language?"` and
/// `"language"` are different tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokenizer {
    /// Minimum token length in characters.
    min_chars: usize,
}

impl Tokenizer {
    /// Create a tokenizer keeping tokens of at least `min_chars` characters.
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    /// Minimum token length in characters.
    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    /// Tokenize text into a set.
    pub fn tokenize(&self, text: &str) -> TokenSet {
        text.split_whitespace()
            .map(str::to_lowercase)
            .filter(|t| t.chars().count() >= self.min_chars)
            .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_TOKEN_CHARS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokens(text: &str) -> Vec<String> {
        let mut out: Vec<String> = Tokenizer::default()
            .tokenize(text)
            .iter()
            .map(str::to_string)
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_lowercases_and_drops_short_tokens() {
        assert_eq!(
            tokens("How DO I bake Bread"),
            vec!["bake".to_string(), "bread".to_string(), "how".to_string()]
        );
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(Tokenizer::default().tokenize("").is_empty());
        assert!(Tokenizer::default().tokenize(" \t\n ").is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let set = Tokenizer::default().tokenize("rust Rust RUST rusty");
        assert_eq!(set.len(), 2);
        assert!(set.contains("rust"));
        assert!(set.contains("rusty"));
    }

    #[test]
    fn test_punctuation_is_kept() {
        let set = Tokenizer::default().tokenize("What's a language?");
        assert!(set.contains("what's"));
        assert!(set.contains("language?"));
        assert!(!set.contains("language"));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // Two characters, four bytes.
        assert!(Tokenizer::default().tokenize("éé").is_empty());
        assert_eq!(Tokenizer::default().tokenize("ééé").len(), 1);
    }

    #[test]
    fn test_custom_min_chars() {
        let set = Tokenizer::new(1).tokenize("a bc");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_intersection_len() {
        let t = Tokenizer::default();
        let a = t.tokenize("best way learn");
        let b = t.tokenize("the best way to cook");
        assert_eq!(a.intersection_len(&b), 2);
        assert_eq!(b.intersection_len(&a), 2);
    }
}
