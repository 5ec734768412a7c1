//! # Example Curation
//!
//! This crate turns stored question/answer examples into a feedback loop:
//!
//! - **Retrieval**: lexical relevance search over one database
//! - **Usage tracking**: counting how often examples are surfaced
//! - **Feedback**: storing human choices as new examples
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            Curator                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐          │
//! │  │  Retrieval   │  │    Usage     │  │   Feedback   │          │
//! │  │   Service    │  │   Tracker    │  │   Ingestor   │          │
//! │  └──────────────┘  └──────────────┘  └──────────────┘          │
//! │         │                │                  │                   │
//! │         └────────────────┼──────────────────┘                   │
//! │                          ▼                                      │
//! │                  ┌──────────────┐       ┌──────────────┐        │
//! │                  │   Example    │       │    Answer    │        │
//! │                  │    Store     │       │  Generator   │        │
//! │                  └──────────────┘       └──────────────┘        │
//! │                                                ▲                │
//! │                  ┌──────────────┐              │                │
//! │                  │   Feedback   │──────────────┘                │
//! │                  │    Cycle     │                               │
//! │                  └──────────────┘                               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use exemplar_retrieval::{Choice, Curator};
//!
//! let curator = Curator::builder()
//!     .with_data_dir("~/.local/share/exemplar")
//!     .with_generator(generator)
//!     .build()
//!     .await?;
//!
//! let mut cycle = curator.start_cycle();
//! let pending = cycle.ask("lang", "How do I learn a new language?").await?;
//! let id = cycle.submit(Choice::First).await?;
//! ```

pub mod config;
pub mod curator;
pub mod cycle;
pub mod error;
pub mod feedback;
pub mod generator;
pub mod service;
pub mod usage;

pub use config::{CurationConfig, ExemplarConfig, RetrievalConfig, StoreConfig, default_data_dir};
pub use curator::{Curator, CuratorBuilder};
pub use cycle::{Choice, CyclePhase, FeedbackCycle, PendingChoice};
pub use error::{CurationError, Result};
pub use feedback::{Feedback, FeedbackIngestor};
pub use generator::{AnswerGenerator, GeneratedAnswers, GeneratorError};
pub use service::{ExampleRetriever, RetrievalService, ScoredExample};
pub use usage::{UsageReport, UsageTracker};

// Re-export from dependencies for convenience
pub use exemplar_store::{
    DatabaseId, Example, ExampleId, ExampleStore, NewExample, StoreError, StoreEvent,
    StoreEventKind, StoreStats,
};
