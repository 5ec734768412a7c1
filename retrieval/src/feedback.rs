//! Turning human feedback into stored examples.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use exemplar_store::{DatabaseId, ExampleId, ExampleStore, NewExample};

use crate::error::{CurationError, Result};

/// A human decision about an answer to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Collection the resulting example goes into.
    pub database_id: DatabaseId,

    /// The question that was asked.
    pub question: String,

    /// The answer the human preferred or wrote.
    pub chosen: String,

    /// The generated answer the human turned down.
    pub rejected: Option<String>,

    /// Whether `chosen` was written by hand.
    pub is_custom: bool,
}

impl Feedback {
    /// The human picked one of two generated answers.
    pub fn preference(
        database_id: impl Into<DatabaseId>,
        question: impl Into<String>,
        chosen: impl Into<String>,
        rejected: impl Into<String>,
    ) -> Self {
        Self {
            database_id: database_id.into(),
            question: question.into(),
            chosen: chosen.into(),
            rejected: Some(rejected.into()),
            is_custom: false,
        }
    }

    /// The human accepted the only generated answer.
    pub fn accepted(
        database_id: impl Into<DatabaseId>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            database_id: database_id.into(),
            question: question.into(),
            chosen: answer.into(),
            rejected: None,
            is_custom: false,
        }
    }

    /// The human wrote their own answer.
    pub fn custom(
        database_id: impl Into<DatabaseId>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            database_id: database_id.into(),
            question: question.into(),
            chosen: answer.into(),
            rejected: None,
            is_custom: true,
        }
    }
}

impl From<Feedback> for NewExample {
    fn from(feedback: Feedback) -> Self {
        Self {
            database_id: feedback.database_id,
            question: feedback.question,
            chosen_answer: feedback.chosen,
            rejected_answer: feedback.rejected,
            is_custom: feedback.is_custom,
        }
    }
}

/// Appends feedback to the example store.
pub struct FeedbackIngestor {
    store: Arc<ExampleStore>,
}

impl FeedbackIngestor {
    /// Create an ingestor over the given store.
    pub fn new(store: Arc<ExampleStore>) -> Self {
        Self { store }
    }

    /// Store feedback as a new example and return its id.
    pub async fn record(&self, feedback: Feedback) -> Result<ExampleId> {
        if feedback.chosen.trim().is_empty() {
            return Err(CurationError::Validation(
                "chosen answer must not be empty".to_string(),
            ));
        }

        let is_custom = feedback.is_custom;
        let id = self.store.create(feedback.into()).await?;

        info!("Recorded feedback as example {id} (custom: {is_custom})");
        Ok(id)
    }
}
