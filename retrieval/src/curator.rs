//! The curation facade.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info};

use exemplar_store::{
    DatabaseId, Example, ExampleId, ExampleStore, NewExample, StoreEvent, StoreStats,
};

use crate::config::ExemplarConfig;
use crate::cycle::FeedbackCycle;
use crate::error::{CurationError, Result};
use crate::feedback::{Feedback, FeedbackIngestor};
use crate::generator::{AnswerGenerator, GeneratedAnswers, GeneratorError};
use crate::service::{ExampleRetriever, RetrievalService, ScoredExample};
use crate::usage::{UsageReport, UsageTracker};

/// Entry point for retrieving examples and folding feedback back in.
///
/// This is the surface the delivery layer talks to. It coordinates:
/// - Example storage and listing
/// - Relevance retrieval through a pluggable backend
/// - Usage counting for surfaced examples
/// - Feedback ingestion and the generate-then-choose cycle
pub struct Curator {
    /// Configuration.
    config: ExemplarConfig,

    /// Example storage.
    store: Arc<ExampleStore>,

    /// Relevance backend.
    retriever: Arc<dyn ExampleRetriever>,

    /// External answer generator, if one is wired in.
    generator: Option<Arc<dyn AnswerGenerator>>,

    /// Usage counting.
    usage: UsageTracker,

    /// Feedback ingestion.
    feedback: FeedbackIngestor,
}

impl Curator {
    /// Create a new curator builder.
    pub fn builder() -> CuratorBuilder {
        CuratorBuilder::new()
    }

    /// Open the configured store and build a curator around it.
    pub async fn new(config: ExemplarConfig) -> Result<Self> {
        Self::builder().with_config(config).build().await
    }

    /// The active configuration.
    pub fn config(&self) -> &ExemplarConfig {
        &self.config
    }

    /// The underlying example store.
    pub fn store(&self) -> &Arc<ExampleStore> {
        &self.store
    }

    /// All examples in a database, newest first.
    pub async fn list_examples(&self, database_id: &DatabaseId) -> Vec<Example> {
        self.store.list_by_database(database_id).await
    }

    /// Get an example by id.
    pub async fn get_example(&self, id: &ExampleId) -> Option<Example> {
        self.store.get(id).await
    }

    /// Create an example directly.
    pub async fn create_example(&self, new: NewExample) -> Result<ExampleId> {
        Ok(self.store.create(new).await?)
    }

    /// Delete an example. Deleting a missing id succeeds.
    pub async fn delete_example(&self, id: &ExampleId) -> Result<ExampleId> {
        self.store.remove(id).await?;
        Ok(*id)
    }

    /// Count one retrieval for each id; missing ids are ignored.
    pub async fn increment_usage(&self, ids: &[ExampleId]) -> Result<()> {
        self.usage.increment_usage(ids).await.into_result()?;
        Ok(())
    }

    /// Like [`Self::increment_usage`], but returns the per-id breakdown.
    pub async fn increment_usage_report(&self, ids: &[ExampleId]) -> UsageReport {
        self.usage.increment_usage(ids).await
    }

    /// Examples relevant to `query`, best first, with their scores.
    ///
    /// `limit` defaults to the configured `default_k`.
    pub async fn retrieve(
        &self,
        database_id: &DatabaseId,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ScoredExample>> {
        let k = limit.unwrap_or(self.config.retrieval.default_k);
        debug!("Retrieving up to {k} examples via {}", self.retriever.name());
        self.retriever.retrieve(database_id, query, k).await
    }

    /// Examples relevant to `query`, best first.
    ///
    /// An empty result means nothing relevant was found.
    pub async fn search_by_keyword(
        &self,
        database_id: &DatabaseId,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Example>> {
        let scored = self.retrieve(database_id, query, limit).await?;
        Ok(scored.into_iter().map(|s| s.item).collect())
    }

    /// The newest examples in a database.
    ///
    /// `limit` defaults to the configured `recent_limit`.
    pub async fn get_recent(&self, database_id: &DatabaseId, limit: Option<usize>) -> Vec<Example> {
        let limit = limit.unwrap_or(self.config.retrieval.recent_limit);
        self.store.get_recent(database_id, limit).await
    }

    /// Store a human decision as a new example.
    pub async fn record_feedback(&self, feedback: Feedback) -> Result<ExampleId> {
        self.feedback.record(feedback).await
    }

    /// Create a batch of examples ahead of time.
    pub async fn seed(&self, batch: Vec<NewExample>) -> Result<Vec<ExampleId>> {
        Ok(self.store.import(batch).await?)
    }

    /// Start a question-to-feedback cycle.
    pub fn start_cycle(&self) -> FeedbackCycle<'_> {
        FeedbackCycle::new(self)
    }

    /// Receive a notification for every store change made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    /// Get store statistics.
    pub async fn stats(&self) -> StoreStats {
        self.store.stats().await
    }

    /// Ask the generator for candidate answers, honouring the timeout.
    pub(crate) async fn generate(
        &self,
        question: &str,
        examples: &[Example],
    ) -> Result<GeneratedAnswers> {
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| CurationError::Config("no answer generator configured".to_string()))?;

        debug!(
            "Generating answers with {} from {} examples",
            generator.name(),
            examples.len()
        );

        let answers = match self.config.curation.generation_timeout() {
            Some(limit) => tokio::time::timeout(limit, generator.generate(question, examples))
                .await
                .map_err(|_| GeneratorError::TimedOut(limit))??,
            None => generator.generate(question, examples).await?,
        };
        Ok(answers)
    }

    /// Store feedback, then count usage of the examples that were shown.
    pub(crate) async fn record_and_count(
        &self,
        feedback: Feedback,
        shown: &[ExampleId],
    ) -> Result<ExampleId> {
        let id = self.feedback.record(feedback).await?;
        self.usage.increment_usage(shown).await.into_result()?;
        Ok(id)
    }
}

/// Builder for [`Curator`].
pub struct CuratorBuilder {
    config: ExemplarConfig,
    store: Option<Arc<ExampleStore>>,
    retriever: Option<Arc<dyn ExampleRetriever>>,
    generator: Option<Arc<dyn AnswerGenerator>>,
}

impl CuratorBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: ExemplarConfig::default(),
            store: None,
            retriever: None,
            generator: None,
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: ExemplarConfig) -> Self {
        self.config = config;
        self
    }

    /// Store examples under the given directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.store.data_dir = Some(dir.into());
        self
    }

    /// Use an already opened store.
    pub fn with_store(mut self, store: Arc<ExampleStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a different retrieval backend.
    pub fn with_retriever(mut self, retriever: Arc<dyn ExampleRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Wire in the answer generator.
    pub fn with_generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Build the curator.
    pub async fn build(self) -> Result<Curator> {
        let store = match self.store {
            Some(store) => store,
            None => {
                let store = match &self.config.store.data_dir {
                    Some(dir) => ExampleStore::open(dir).await?,
                    None => ExampleStore::in_memory(),
                };
                Arc::new(store.with_event_capacity(self.config.store.event_capacity))
            }
        };

        let retriever = self.retriever.unwrap_or_else(|| {
            Arc::new(RetrievalService::with_min_token_chars(
                Arc::clone(&store),
                self.config.retrieval.min_token_chars,
            ))
        });

        info!(
            "Curator ready ({} store, {} retrieval)",
            if store.is_persistent() { "durable" } else { "in-memory" },
            retriever.name()
        );

        Ok(Curator {
            config: self.config,
            usage: UsageTracker::new(Arc::clone(&store)),
            feedback: FeedbackIngestor::new(Arc::clone(&store)),
            store,
            retriever,
            generator: self.generator,
        })
    }
}

impl Default for CuratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_builder_defaults_to_in_memory() {
        let curator = Curator::builder().build().await.unwrap();
        assert!(!curator.store().is_persistent());
        assert_eq!(curator.config().retrieval.default_k, 3);
    }

    #[tokio::test]
    async fn test_builder_with_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let curator = Curator::builder()
            .with_data_dir(temp_dir.path())
            .build()
            .await
            .unwrap();
        assert_eq!(curator.store().root(), Some(temp_dir.path()));
    }

    #[tokio::test]
    async fn test_generation_without_generator_is_config_error() {
        let curator = Curator::builder().build().await.unwrap();
        let err = curator.generate("q", &[]).await.unwrap_err();
        assert!(matches!(err, CurationError::Config(_)));
    }

    #[tokio::test]
    async fn test_delete_returns_id_even_when_absent() {
        let curator = Curator::builder().build().await.unwrap();
        let id = ExampleId::new();
        assert_eq!(curator.delete_example(&id).await.unwrap(), id);
    }
}
