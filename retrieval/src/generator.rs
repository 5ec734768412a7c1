//! Contract for the external answer generator.
//!
//! The generator is typically an LLM call. Only its output shape matters
//! here: either two candidate answers for a human to choose between, or a
//! single answer to accept or replace.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use exemplar_store::Example;

/// Candidate answers produced for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratedAnswers {
    /// Two candidates to choose between.
    Pair { answer_a: String, answer_b: String },

    /// A single candidate.
    Single { answer: String },
}

impl GeneratedAnswers {
    /// Number of candidates offered.
    pub fn len(&self) -> usize {
        match self {
            Self::Pair { .. } => 2,
            Self::Single { .. } => 1,
        }
    }

    /// Always false; there is at least one candidate.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Errors reported by an answer generator.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// The generator returned an error.
    #[error("generator failed: {0}")]
    Failed(String),

    /// The generator did not answer in time.
    #[error("generator timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

/// Trait for answer generators.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Get the name of this generator.
    fn name(&self) -> &str;

    /// Produce candidate answers for `question`, guided by `examples`.
    ///
    /// `examples` may be empty, in which case the generator answers unassisted.
    async fn generate(
        &self,
        question: &str,
        examples: &[Example],
    ) -> std::result::Result<GeneratedAnswers, GeneratorError>;
}
