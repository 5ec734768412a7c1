//! Core example types.
//!
//! An example is a question paired with the answer a human preferred, and
//! optionally the answer they turned down.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StoreError};

/// Unique, immutable identifier of an example.
///
/// Identifiers are time-ordered, so comparing two ids created by the same
/// store also compares their creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExampleId(Uuid);

impl ExampleId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ExampleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ExampleId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Logical collection an example belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseId(String);

impl DatabaseId {
    /// Create a database id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DatabaseId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DatabaseId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A stored question/answer preference record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    /// Unique identifier.
    pub id: ExampleId,

    /// Collection this example belongs to.
    pub database_id: DatabaseId,

    /// The question that was asked.
    pub question: String,

    /// The answer judged better, or the one a human wrote.
    pub chosen_answer: String,

    /// The answer judged worse, only for two-option choices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_answer: Option<String>,

    /// Whether `chosen_answer` was written by hand.
    pub is_custom: bool,

    /// When the example was recorded.
    pub created_at: DateTime<Utc>,

    /// How many times this example was shown alongside a question.
    #[serde(default)]
    pub times_retrieved: u64,
}

impl Example {
    /// Text that retrieval matches queries against.
    pub fn candidate_text(&self) -> String {
        format!("{} {}", self.question, self.chosen_answer)
    }
}

/// Input for creating an example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExample {
    /// Collection the example goes into.
    pub database_id: DatabaseId,

    /// The question.
    pub question: String,

    /// The preferred answer.
    pub chosen_answer: String,

    /// The answer that lost, if there was one.
    #[serde(default)]
    pub rejected_answer: Option<String>,

    /// Whether the preferred answer was written by hand.
    #[serde(default)]
    pub is_custom: bool,
}

impl NewExample {
    /// Create input for a generated answer that was accepted as-is.
    pub fn new(
        database_id: impl Into<DatabaseId>,
        question: impl Into<String>,
        chosen_answer: impl Into<String>,
    ) -> Self {
        Self {
            database_id: database_id.into(),
            question: question.into(),
            chosen_answer: chosen_answer.into(),
            rejected_answer: None,
            is_custom: false,
        }
    }

    /// Attach the answer that was not chosen.
    pub fn with_rejected(mut self, rejected: impl Into<String>) -> Self {
        self.rejected_answer = Some(rejected.into());
        self
    }

    /// Mark the chosen answer as hand-written.
    pub fn custom(mut self) -> Self {
        self.is_custom = true;
        self
    }

    /// Check required fields without touching storage.
    pub fn validate(&self) -> Result<()> {
        if self.database_id.as_str().trim().is_empty() {
            return Err(StoreError::Validation("database id must not be empty".to_string()));
        }
        if self.question.trim().is_empty() {
            return Err(StoreError::Validation("question must not be empty".to_string()));
        }
        if self.chosen_answer.trim().is_empty() {
            return Err(StoreError::Validation(
                "chosen answer must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Turn validated input into a record created at `now`.
    pub(crate) fn into_example(self, now: DateTime<Utc>) -> Example {
        Example {
            id: ExampleId::new(),
            database_id: self.database_id,
            question: self.question,
            chosen_answer: self.chosen_answer,
            rejected_answer: self.rejected_answer.filter(|r| !r.trim().is_empty()),
            is_custom: self.is_custom,
            created_at: now,
            times_retrieved: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validate_rejects_blank_fields() {
        assert!(NewExample::new("db", "", "answer").validate().is_err());
        assert!(NewExample::new("db", "question", "   ").validate().is_err());
        assert!(NewExample::new("", "question", "answer").validate().is_err());
        assert!(NewExample::new("db", "question", "answer").validate().is_ok());
    }

    #[test]
    fn test_empty_rejected_answer_is_dropped() {
        let example = NewExample::new("db", "q", "a")
            .with_rejected("")
            .into_example(Utc::now());
        assert_eq!(example.rejected_answer, None);
        assert_eq!(example.times_retrieved, 0);
    }

    #[test]
    fn test_example_id_round_trips_through_string() {
        let id = ExampleId::new();
        let parsed: ExampleId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_candidate_text_joins_question_and_answer() {
        let example = NewExample::new("db", "How to bake?", "Use an oven.").into_example(Utc::now());
        assert_eq!(example.candidate_text(), "How to bake? Use an oven.");
    }
}
