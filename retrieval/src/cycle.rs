//! A single question-to-feedback cycle.
//!
//! ```text
//! Idle ──► Retrieving ──► Generating ──► AwaitingChoice ──► Recording ──► Idle
//!  ▲            │              │                                  │
//!  └────────────┴──── error ───┴──────────────────────────────────┘
//! ```
//!
//! Retrieval and generation happen in [`FeedbackCycle::ask`]; the human's
//! decision is recorded by [`FeedbackCycle::submit`], which also counts a
//! usage for every example that was shown.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use exemplar_store::{DatabaseId, Example, ExampleId};

use crate::curator::Curator;
use crate::error::{CurationError, Result};
use crate::feedback::Feedback;
use crate::generator::GeneratedAnswers;
use crate::service::ScoredExample;

/// Where a feedback cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    /// Nothing in flight.
    Idle,

    /// Looking up similar examples.
    Retrieving,

    /// Waiting on the answer generator.
    Generating,

    /// Candidates are out; waiting for the human.
    AwaitingChoice,

    /// Storing the decision and counting usage.
    Recording,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Retrieving => write!(f, "retrieving"),
            Self::Generating => write!(f, "generating"),
            Self::AwaitingChoice => write!(f, "awaiting choice"),
            Self::Recording => write!(f, "recording"),
        }
    }
}

/// The human's decision about the generated answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "answer", rename_all = "snake_case")]
pub enum Choice {
    /// The first (or only) generated answer.
    First,

    /// The second generated answer.
    Second,

    /// A hand-written answer.
    Custom(String),
}

/// Generated answers waiting for a human decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingChoice {
    /// Collection the question belongs to.
    pub database_id: DatabaseId,

    /// The question being answered.
    pub question: String,

    /// Examples shown to the generator, best first.
    pub examples: Vec<ScoredExample>,

    /// Candidates to choose from.
    pub answers: GeneratedAnswers,
}

impl PendingChoice {
    /// Ids of the examples that were surfaced for this question.
    pub fn shown_ids(&self) -> Vec<ExampleId> {
        self.examples.iter().map(|s| s.item.id).collect()
    }

    /// Turn a choice into feedback for this question.
    pub fn resolve(&self, choice: &Choice) -> Result<Feedback> {
        let db = self.database_id.clone();
        let question = self.question.clone();

        match (choice, &self.answers) {
            (Choice::Custom(answer), _) => {
                if answer.trim().is_empty() {
                    return Err(CurationError::Validation(
                        "custom answer must not be empty".to_string(),
                    ));
                }
                Ok(Feedback::custom(db, question, answer.clone()))
            }
            (Choice::First, GeneratedAnswers::Pair { answer_a, answer_b }) => Ok(
                Feedback::preference(db, question, answer_a.clone(), answer_b.clone()),
            ),
            (Choice::Second, GeneratedAnswers::Pair { answer_a, answer_b }) => Ok(
                Feedback::preference(db, question, answer_b.clone(), answer_a.clone()),
            ),
            (Choice::First, GeneratedAnswers::Single { answer }) => {
                Ok(Feedback::accepted(db, question, answer.clone()))
            }
            (Choice::Second, GeneratedAnswers::Single { .. }) => Err(CurationError::InvalidChoice(
                "only one answer was generated".to_string(),
            )),
        }
    }
}

/// Drives one question through retrieval, generation and feedback.
///
/// A cycle can be reused: after `submit` or a failure it is idle again.
pub struct FeedbackCycle<'a> {
    curator: &'a Curator,
    phase: CyclePhase,
    pending: Option<PendingChoice>,
}

impl<'a> FeedbackCycle<'a> {
    pub(crate) fn new(curator: &'a Curator) -> Self {
        Self {
            curator,
            phase: CyclePhase::Idle,
            pending: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// The answers awaiting a decision, if any.
    pub fn pending(&self) -> Option<&PendingChoice> {
        self.pending.as_ref()
    }

    fn expect_phase(&self, expected: CyclePhase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(CurationError::InvalidState {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Drop any pending answers and return to idle.
    pub fn abandon(&mut self) {
        self.phase = CyclePhase::Idle;
        self.pending = None;
    }

    /// Retrieve examples for a question and generate candidate answers.
    ///
    /// On failure the cycle returns to idle and nothing is stored.
    pub async fn ask(
        &mut self,
        database_id: impl Into<DatabaseId>,
        question: impl Into<String>,
    ) -> Result<&PendingChoice> {
        self.expect_phase(CyclePhase::Idle)?;

        let database_id = database_id.into();
        let question = question.into();
        if question.trim().is_empty() {
            return Err(CurationError::Validation(
                "question must not be empty".to_string(),
            ));
        }

        match self.prepare(database_id, question).await {
            Ok(pending) => {
                self.phase = CyclePhase::AwaitingChoice;
                Ok(self.pending.insert(pending))
            }
            Err(e) => {
                self.abandon();
                Err(e)
            }
        }
    }

    async fn prepare(&mut self, database_id: DatabaseId, question: String) -> Result<PendingChoice> {
        self.phase = CyclePhase::Retrieving;
        let examples = self.curator.retrieve(&database_id, &question, None).await?;
        debug!("Cycle retrieved {} examples", examples.len());

        self.phase = CyclePhase::Generating;
        let shown: Vec<Example> = examples.iter().map(|s| s.item.clone()).collect();
        let answers = self.curator.generate(&question, &shown).await?;

        Ok(PendingChoice {
            database_id,
            question,
            examples,
            answers,
        })
    }

    /// Record the human's choice and count usage of the shown examples.
    ///
    /// An unusable choice leaves the answers pending so another choice can
    /// be submitted. Any later failure returns the cycle to idle.
    pub async fn submit(&mut self, choice: Choice) -> Result<ExampleId> {
        self.expect_phase(CyclePhase::AwaitingChoice)?;
        let Some(pending) = self.pending.as_ref() else {
            return Err(CurationError::InvalidState {
                expected: CyclePhase::AwaitingChoice,
                actual: CyclePhase::Idle,
            });
        };

        let feedback = pending.resolve(&choice)?;
        let shown = pending.shown_ids();

        self.phase = CyclePhase::Recording;
        let result = self.curator.record_and_count(feedback, &shown).await;
        self.abandon();
        result
    }
}
