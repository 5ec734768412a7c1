//! # Example Store
//!
//! This crate owns the persisted question/answer preference examples that
//! retrieval draws from and human feedback appends to.
//!
//! - **Scoped**: every example belongs to exactly one database, and every
//!   listing is scoped to one database.
//! - **Append and reinforce**: examples are created, counted when shown, and
//!   deleted; nothing else about them changes.
//! - **Durable or in-memory**: one JSON document per example when opened on a
//!   directory.
//! - **Observable**: changes are published on a broadcast channel.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Example Store                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  NewExample ──► ExampleStore ──► Example                        │
//! │                     │   │                                       │
//! │                     │   └──► StoreEvent (broadcast)             │
//! │                     ▼                                           │
//! │        id index + (database, created_at) index                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod event;
pub mod example;
pub mod storage;

pub use error::{Result, StorageError, StoreError};
pub use event::{StoreEvent, StoreEventKind};
pub use example::{DatabaseId, Example, ExampleId, NewExample};
pub use storage::{DEFAULT_EVENT_CAPACITY, ExampleStore, StoreStats};
