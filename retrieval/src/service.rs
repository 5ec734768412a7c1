//! Lexical retrieval of examples.
//!
//! The `RetrievalService` scores every example in a database against the
//! query and returns the best matches. Scoring, not recency, decides
//! relevance, so the whole database is scanned.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use exemplar_lexical::{LexicalScorer, Scored, Tokenizer, rank_top_k};
use exemplar_store::{DatabaseId, Example, ExampleStore};

use crate::error::Result;

/// An example with its relevance to a query.
pub type ScoredExample = Scored<Example>;

/// Trait for retrieval backends.
///
/// Callers depend on this rather than on the lexical implementation so a
/// different similarity backend can be substituted.
#[async_trait]
pub trait ExampleRetriever: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Return at most `k` examples from `database_id` relevant to `query`,
    /// best first. Every returned example has a score above zero.
    async fn retrieve(
        &self,
        database_id: &DatabaseId,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredExample>>;
}

/// Token-overlap retrieval over an example store.
pub struct RetrievalService {
    store: Arc<ExampleStore>,
    scorer: LexicalScorer,
}

impl RetrievalService {
    /// Create a service with the default tokenizer.
    pub fn new(store: Arc<ExampleStore>) -> Self {
        Self::with_scorer(store, LexicalScorer::default())
    }

    /// Create a service with a custom scorer.
    pub fn with_scorer(store: Arc<ExampleStore>, scorer: LexicalScorer) -> Self {
        Self { store, scorer }
    }

    /// Create a service keeping tokens of at least `min_chars` characters.
    pub fn with_min_token_chars(store: Arc<ExampleStore>, min_chars: usize) -> Self {
        Self::with_scorer(store, LexicalScorer::new(Tokenizer::new(min_chars)))
    }

    /// Score every example in the database and keep the best `k`.
    ///
    /// Candidates come from the store newest first and the ranking sort is
    /// stable, so equal scores are ordered by recency. An empty result means
    /// nothing relevant was found.
    pub async fn search(
        &self,
        database_id: &DatabaseId,
        query: &str,
        k: usize,
    ) -> Vec<ScoredExample> {
        let query_tokens = self.scorer.prepare_query(query);
        if query_tokens.is_empty() || k == 0 {
            debug!("Query has no usable tokens or k is zero; nothing to retrieve");
            return Vec::new();
        }

        let candidates = self.store.list_by_database(database_id).await;
        let total = candidates.len();

        let scored = candidates.into_iter().map(|example| {
            let score = self.scorer.score(&query_tokens, &example.candidate_text());
            (example, score)
        });
        let ranked = rank_top_k(scored, k);

        debug!(
            "Retrieved {} of {total} examples from {database_id}",
            ranked.len()
        );
        ranked
    }
}

#[async_trait]
impl ExampleRetriever for RetrievalService {
    fn name(&self) -> &str {
        "lexical"
    }

    async fn retrieve(
        &self,
        database_id: &DatabaseId,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredExample>> {
        Ok(self.search(database_id, query, k).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exemplar_store::NewExample;
    use pretty_assertions::assert_eq;

    async fn seeded() -> (Arc<ExampleStore>, RetrievalService) {
        let store = Arc::new(ExampleStore::in_memory());
        store
            .create(NewExample::new(
                "lang",
                "What's the best way to learn a new language?",
                "Speak it every day with native speakers.",
            ))
            .await
            .unwrap();
        store
            .create(NewExample::new("lang", "How do I bake bread?", "Mix flour water and yeast"))
            .await
            .unwrap();
        let service = RetrievalService::new(Arc::clone(&store));
        (store, service)
    }

    #[tokio::test]
    async fn test_relevant_example_ranks_and_unrelated_is_dropped() {
        let (_store, service) = seeded().await;
        let results = service
            .search(&DatabaseId::new("lang"), "best way to learn a new language", 3)
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].item.question,
            "What's the best way to learn a new language?"
        );
        assert!(results[0].score > 0.0);
    }

    #[tokio::test]
    async fn test_other_databases_are_not_searched() {
        let (_store, service) = seeded().await;
        let results = service
            .search(&DatabaseId::new("other"), "best way to learn a new language", 3)
            .await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_returns_nothing() {
        let (_store, service) = seeded().await;
        assert!(service.search(&DatabaseId::new("lang"), "  ", 3).await.is_empty());
        assert!(service.search(&DatabaseId::new("lang"), "a to", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_limit_and_ordering() {
        let store = Arc::new(ExampleStore::in_memory());
        let db = DatabaseId::new("db");
        let half = store
            .create(NewExample::new("db", "rust borrow", "checker rules"))
            .await
            .unwrap();
        let full = store
            .create(NewExample::new("db", "rust borrow checker lifetimes", "explained"))
            .await
            .unwrap();
        let older_tie = store
            .create(NewExample::new("db", "rust traits", "and generics"))
            .await
            .unwrap();
        let newer_tie = store
            .create(NewExample::new("db", "rust macros", "by example"))
            .await
            .unwrap();

        let service = RetrievalService::new(Arc::clone(&store));
        let results = service.search(&db, "rust borrow lifetimes", 10).await;
        let ids: Vec<_> = results.iter().map(|r| r.item.id).collect();

        // 3/3, 2/3, then the 1/3 ties newest first.
        assert_eq!(ids, vec![full, half, newer_tie, older_tie]);

        let limited = service.search(&db, "rust borrow lifetimes", 2).await;
        assert_eq!(limited.len(), 2);
        assert!(limited.iter().all(|r| r.score > 0.0));
    }

    #[tokio::test]
    async fn test_answer_text_is_matched() {
        let (_store, service) = seeded().await;
        let results = service.search(&DatabaseId::new("lang"), "yeast", 3).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item.question, "How do I bake bread?");
    }

    #[tokio::test]
    async fn test_min_token_chars_is_configurable() {
        let store = Arc::new(ExampleStore::in_memory());
        store.create(NewExample::new("db", "go to it", "ok")).await.unwrap();

        let strict = RetrievalService::new(Arc::clone(&store));
        assert!(strict.search(&DatabaseId::new("db"), "go", 3).await.is_empty());

        let loose = RetrievalService::with_min_token_chars(Arc::clone(&store), 2);
        assert_eq!(loose.search(&DatabaseId::new("db"), "go", 3).await.len(), 1);
    }
}
