//! # Lexical Matching
//!
//! This crate provides the lexical half of example retrieval: turning free
//! text into comparable token sets and scoring how much of a query a stored
//! example covers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Lexical Matching                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  text ──► Tokenizer ──► TokenSet ──► LexicalScorer ──► score    │
//! │                                            │                    │
//! │                                            ▼                    │
//! │                                     rank_top_k ──► Scored<T>    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod scorer;
pub mod tokenizer;

pub use scorer::{LexicalScorer, Scored, overlap_score, rank_top_k};
pub use tokenizer::{TokenSet, Tokenizer};

/// Tokens must have at least this many characters to be kept.
pub const DEFAULT_MIN_TOKEN_CHARS: usize = 3;
