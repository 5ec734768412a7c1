//! Change notifications published by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::example::{DatabaseId, ExampleId};

/// A change to the set of stored examples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEvent {
    /// The kind of change.
    pub kind: StoreEventKind,

    /// The affected example.
    pub id: ExampleId,

    /// Collection of the affected example.
    pub database_id: DatabaseId,

    /// When the change happened.
    pub timestamp: DateTime<Utc>,
}

impl StoreEvent {
    /// Create a new event stamped with the current time.
    pub fn new(kind: StoreEventKind, id: ExampleId, database_id: DatabaseId) -> Self {
        Self {
            kind,
            id,
            database_id,
            timestamp: Utc::now(),
        }
    }
}

/// Kind of store change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreEventKind {
    /// Example was created.
    Created,

    /// Usage counter was incremented; carries the new value.
    UsageIncremented { times_retrieved: u64 },

    /// Example was deleted.
    Removed,
}
