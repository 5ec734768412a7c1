//! Usage counting for retrieved examples.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use exemplar_store::{ExampleId, ExampleStore};

use crate::error::{CurationError, Result};

/// Outcome of a batch usage increment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    /// Ids whose counter went up.
    pub incremented: Vec<ExampleId>,

    /// Ids that no longer exist.
    pub skipped: Vec<ExampleId>,

    /// Ids whose counter could not be updated.
    pub failed: Vec<ExampleId>,
}

impl UsageReport {
    /// Turn failed increments into an error; missing ids are not failures.
    pub fn into_result(self) -> Result<Self> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(CurationError::Concurrency {
                failed: self.failed,
            })
        }
    }
}

/// Applies retrieval-count increments to batches of examples.
pub struct UsageTracker {
    store: Arc<ExampleStore>,
}

impl UsageTracker {
    /// Create a tracker over the given store.
    pub fn new(store: Arc<ExampleStore>) -> Self {
        Self { store }
    }

    /// Increment the usage counter of every id in the batch.
    ///
    /// Each id is handled on its own: a missing id is skipped and a failed
    /// increment does not stop the rest of the batch. Nothing is rolled back.
    pub async fn increment_usage(&self, ids: &[ExampleId]) -> UsageReport {
        let mut report = UsageReport::default();

        for id in ids {
            match self.store.increment_usage(id).await {
                Ok(Some(_)) => report.incremented.push(*id),
                Ok(None) => report.skipped.push(*id),
                Err(e) => {
                    warn!("Failed to increment usage of {id}: {e}");
                    report.failed.push(*id);
                }
            }
        }

        debug!(
            "Usage batch: {} incremented, {} skipped, {} failed",
            report.incremented.len(),
            report.skipped.len(),
            report.failed.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exemplar_store::NewExample;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_sequential_increments() {
        let store = Arc::new(ExampleStore::in_memory());
        let id = store.create(NewExample::new("db", "q", "a")).await.unwrap();
        let tracker = UsageTracker::new(Arc::clone(&store));

        tracker.increment_usage(&[id]).await;
        tracker.increment_usage(&[id]).await;

        assert_eq!(store.get(&id).await.unwrap().times_retrieved, 2);
    }

    #[tokio::test]
    async fn test_mixed_batch_skips_missing() {
        let store = Arc::new(ExampleStore::in_memory());
        let id = store.create(NewExample::new("db", "q", "a")).await.unwrap();
        let missing = ExampleId::new();
        let tracker = UsageTracker::new(Arc::clone(&store));

        let report = tracker
            .increment_usage(&[missing, id])
            .await
            .into_result()
            .unwrap();

        assert_eq!(report.incremented, vec![id]);
        assert_eq!(report.skipped, vec![missing]);
        assert_eq!(store.get(&id).await.unwrap().times_retrieved, 1);
    }

    #[test]
    fn test_failures_become_concurrency_error() {
        let id = ExampleId::new();
        let report = UsageReport {
            failed: vec![id],
            ..Default::default()
        };
        match report.into_result() {
            Err(CurationError::Concurrency { failed }) => assert_eq!(failed, vec![id]),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
