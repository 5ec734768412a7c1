//! Overlap scoring and ranking.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::tokenizer::{TokenSet, Tokenizer};

/// Fraction of query tokens that also appear in the candidate.
///
/// Returns a value between 0.0 and 1.0. This is asymmetric: only the query
/// size is in the denominator. An empty query scores 0.0 against everything.
pub fn overlap_score(query: &TokenSet, candidate: &TokenSet) -> f32 {
    if query.is_empty() {
        return 0.0;
    }

    query.intersection_len(candidate) as f32 / query.len() as f32
}

/// Scores candidate text against a query using token overlap.
#[derive(Debug, Clone, Default)]
pub struct LexicalScorer {
    tokenizer: Tokenizer,
}

impl LexicalScorer {
    /// Create a scorer with the given tokenizer.
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// The tokenizer used for queries and candidates.
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Tokenize a query once so it can be scored against many candidates.
    pub fn prepare_query(&self, query: &str) -> TokenSet {
        self.tokenizer.tokenize(query)
    }

    /// Score candidate text against a prepared query.
    pub fn score(&self, query: &TokenSet, candidate_text: &str) -> f32 {
        if query.is_empty() {
            return 0.0;
        }
        overlap_score(query, &self.tokenizer.tokenize(candidate_text))
    }
}

/// An item paired with its relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scored<T> {
    /// The scored item.
    pub item: T,

    /// Relevance score.
    pub score: f32,
}

/// Keep items with a positive score and return the best `k`.
///
/// The sort is stable, so items with equal scores keep their input order.
/// Callers control tie-breaking by the order they feed candidates in.
pub fn rank_top_k<T>(scored: impl IntoIterator<Item = (T, f32)>, k: usize) -> Vec<Scored<T>> {
    let mut ranked: Vec<Scored<T>> = scored
        .into_iter()
        .filter(|(_, score)| *score > 0.0)
        .map(|(item, score)| Scored { item, score })
        .collect();

    ranked.sort_by(|a, b| OrderedFloat(b.score).cmp(&OrderedFloat(a.score)));
    ranked.truncate(k);
    ranked
}
