//! Example storage and persistence.
//!
//! The `ExampleStore` keeps every example in memory behind two indexes: one
//! by id, and one per database ordered by creation time. When opened on a
//! directory it also writes each example to its own JSON file and reloads
//! them on the next open.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{debug, info, warn};

use crate::error::{Result, StorageError, StoreError};
use crate::event::{StoreEvent, StoreEventKind};
use crate::example::{DatabaseId, Example, ExampleId, NewExample};

/// Default capacity of the change notification channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Subdirectory holding one JSON document per example.
const EXAMPLES_DIR: &str = "examples";

/// A record plus the state needed to update it in place.
struct StoredExample {
    /// Immutable fields. Its `times_retrieved` is stale; use the counter.
    example: Example,

    /// Live usage counter.
    times_retrieved: AtomicU64,

    /// Held while the record's file is rewritten or deleted.
    write_lock: Mutex<()>,

    /// Set once the record has been deleted.
    removed: AtomicBool,
}

impl StoredExample {
    fn new(example: Example) -> Self {
        let times_retrieved = AtomicU64::new(example.times_retrieved);
        Self {
            example,
            times_retrieved,
            write_lock: Mutex::new(()),
            removed: AtomicBool::new(false),
        }
    }

    fn snapshot(&self) -> Example {
        let mut example = self.example.clone();
        example.times_retrieved = self.times_retrieved.load(Ordering::Acquire);
        example
    }
}

/// Ordering key for the per-database index.
type RecencyKey = (DateTime<Utc>, ExampleId);

#[derive(Default)]
struct Collections {
    /// Primary index.
    records: HashMap<ExampleId, Arc<StoredExample>>,

    /// Secondary index on `(database_id, created_at)`.
    by_database: HashMap<DatabaseId, BTreeSet<RecencyKey>>,
}

impl Collections {
    fn insert(&mut self, record: Arc<StoredExample>) {
        let example = &record.example;
        self.by_database
            .entry(example.database_id.clone())
            .or_default()
            .insert((example.created_at, example.id));
        self.records.insert(example.id, record);
    }

    fn remove(&mut self, id: &ExampleId) -> Option<Arc<StoredExample>> {
        let record = self.records.remove(id)?;
        let example = &record.example;
        if let Some(keys) = self.by_database.get_mut(&example.database_id) {
            keys.remove(&(example.created_at, example.id));
            if keys.is_empty() {
                self.by_database.remove(&example.database_id);
            }
        }
        Some(record)
    }

    /// Newest first, optionally bounded.
    fn scan(&self, database_id: &DatabaseId, limit: Option<usize>) -> Vec<Example> {
        let Some(keys) = self.by_database.get(database_id) else {
            return Vec::new();
        };

        keys.iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
            .filter_map(|(_, id)| self.records.get(id))
            .map(|record| record.snapshot())
            .collect()
    }
}

/// Storage backend for examples.
pub struct ExampleStore {
    /// Root directory, or `None` for a purely in-memory store.
    root: Option<PathBuf>,

    /// Indexed records.
    inner: RwLock<Collections>,

    /// Change notifications.
    events: broadcast::Sender<StoreEvent>,
}

impl ExampleStore {
    /// Create an empty store that keeps nothing on disk.
    pub fn in_memory() -> Self {
        let (events, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Self {
            root: None,
            inner: RwLock::new(Collections::default()),
            events,
        }
    }

    /// Open a durable store at the given root directory.
    ///
    /// This creates the directory if needed and loads any examples already
    /// stored there.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let examples_dir = root.join(EXAMPLES_DIR);

        fs::create_dir_all(&examples_dir).await.map_err(|e| {
            StorageError::CreateDirectory(format!("{}: {e}", examples_dir.display()))
        })?;

        let (events, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        let store = Self {
            root: Some(root),
            inner: RwLock::new(Collections::default()),
            events,
        };

        store.load_all().await?;

        Ok(store)
    }

    /// Resize the change notification channel.
    ///
    /// Existing subscribers are disconnected.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        self.events = events;
        self
    }

    /// Root directory of a durable store.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Whether examples are written to disk.
    pub fn is_persistent(&self) -> bool {
        self.root.is_some()
    }

    /// Receive a notification for every change made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn publish(&self, kind: StoreEventKind, example: &Example) {
        // Nobody listening is fine.
        let _ = self
            .events
            .send(StoreEvent::new(kind, example.id, example.database_id.clone()));
    }

    /// Get the path for an example file.
    fn example_path(&self, id: &ExampleId) -> Option<PathBuf> {
        self.root
            .as_ref()
            .map(|root| root.join(EXAMPLES_DIR).join(format!("{id}.json")))
    }

    /// Load all examples from disk.
    async fn load_all(&self) -> Result<()> {
        let Some(root) = &self.root else {
            return Ok(());
        };
        let dir = root.join(EXAMPLES_DIR);

        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| StorageError::ReadFile(format!("{}: {e}", dir.display())))?;

        let mut inner = self.inner.write().await;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::ReadFile(format!("{e}")))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                match Self::load_file(&path).await {
                    Ok(example) => {
                        debug!("Loaded example: {}", example.id);
                        inner.insert(Arc::new(StoredExample::new(example)));
                    }
                    Err(e) => {
                        warn!("Failed to load example {}: {e}", path.display());
                    }
                }
            }
        }

        info!("Loaded {} examples", inner.records.len());
        Ok(())
    }

    /// Load a single example from disk.
    async fn load_file(path: &Path) -> Result<Example> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| StorageError::ReadFile(format!("{}: {e}", path.display())))?;

        let example: Example = serde_json::from_str(&content)?;
        Ok(example)
    }

    /// Save an example to disk, if this store is durable.
    async fn save_file(&self, example: &Example) -> Result<()> {
        let Some(path) = self.example_path(&example.id) else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(example)?;

        // Write atomically
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content)
            .await
            .map_err(|e| StorageError::WriteFile(format!("{}: {e}", temp_path.display())))?;

        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| StorageError::WriteFile(format!("{}: {e}", path.display())))?;

        Ok(())
    }

    /// Create an example and return its id.
    ///
    /// Blank questions or chosen answers are rejected before anything is
    /// written. An empty rejected answer is stored as absent.
    pub async fn create(&self, new: NewExample) -> Result<ExampleId> {
        new.validate()?;

        if new.is_custom && new.rejected_answer.as_deref().is_some_and(|r| !r.trim().is_empty()) {
            warn!(
                "Custom example in {} carries a rejected answer",
                new.database_id
            );
        }

        let example = new.into_example(Utc::now());
        self.save_file(&example).await?;

        let id = example.id;
        let record = Arc::new(StoredExample::new(example));
        self.inner.write().await.insert(Arc::clone(&record));
        self.publish(StoreEventKind::Created, &record.example);

        debug!("Created example: {id}");
        Ok(id)
    }

    /// Create a batch of examples.
    ///
    /// Every entry is validated before the first one is written, so a bad
    /// entry leaves the store untouched.
    pub async fn import(&self, batch: Vec<NewExample>) -> Result<Vec<ExampleId>> {
        for (index, new) in batch.iter().enumerate() {
            new.validate().map_err(|e| match e {
                StoreError::Validation(msg) => StoreError::Validation(format!("entry {index}: {msg}")),
                other => other,
            })?;
        }

        let mut ids = Vec::with_capacity(batch.len());
        for new in batch {
            ids.push(self.create(new).await?);
        }

        info!("Imported {} examples", ids.len());
        Ok(ids)
    }

    /// Get an example by id.
    pub async fn get(&self, id: &ExampleId) -> Option<Example> {
        let inner = self.inner.read().await;
        inner.records.get(id).map(|record| record.snapshot())
    }

    /// All examples in a database, newest first.
    pub async fn list_by_database(&self, database_id: &DatabaseId) -> Vec<Example> {
        self.inner.read().await.scan(database_id, None)
    }

    /// The `limit` newest examples in a database.
    pub async fn get_recent(&self, database_id: &DatabaseId, limit: usize) -> Vec<Example> {
        self.inner.read().await.scan(database_id, Some(limit))
    }

    /// Delete an example.
    ///
    /// Returns whether an example was removed. A missing id is not an error.
    pub async fn remove(&self, id: &ExampleId) -> Result<bool> {
        let Some(record) = self.inner.read().await.records.get(id).cloned() else {
            debug!("Example already absent: {id}");
            return Ok(false);
        };

        let _guard = record.write_lock.lock().await;
        if record.removed.load(Ordering::Acquire) {
            return Ok(false);
        }

        if let Some(path) = self.example_path(id) {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(
                        StorageError::DeleteFile(format!("{}: {e}", path.display())).into(),
                    );
                }
            }
        }

        record.removed.store(true, Ordering::Release);
        self.inner.write().await.remove(id);
        self.publish(StoreEventKind::Removed, &record.example);

        info!("Deleted example: {id}");
        Ok(true)
    }

    /// Add one to an example's usage counter.
    ///
    /// Returns the new count, or `None` if the example does not exist.
    /// Increments of the same id are serialized so none are lost; different
    /// ids never wait on each other.
    pub async fn increment_usage(&self, id: &ExampleId) -> Result<Option<u64>> {
        let Some(record) = self.inner.read().await.records.get(id).cloned() else {
            debug!("Skipping usage increment for missing example: {id}");
            return Ok(None);
        };

        let _guard = record.write_lock.lock().await;
        if record.removed.load(Ordering::Acquire) {
            return Ok(None);
        }

        let next = record.times_retrieved.load(Ordering::Acquire) + 1;
        if self.is_persistent() {
            let mut document = record.snapshot();
            document.times_retrieved = next;
            self.save_file(&document)
                .await
                .map_err(|e| StoreError::IncrementFailed {
                    id: *id,
                    reason: e.to_string(),
                })?;
        }
        record.times_retrieved.store(next, Ordering::Release);

        self.publish(
            StoreEventKind::UsageIncremented {
                times_retrieved: next,
            },
            &record.example,
        );
        debug!("Example {id} retrieved {next} times");
        Ok(Some(next))
    }

    /// Get statistics about the store.
    pub async fn stats(&self) -> StoreStats {
        let inner = self.inner.read().await;

        StoreStats {
            total_examples: inner.records.len(),
            by_database: inner
                .by_database
                .iter()
                .map(|(db, keys)| (db.clone(), keys.len()))
                .collect(),
            total_retrievals: inner
                .records
                .values()
                .map(|r| r.times_retrieved.load(Ordering::Acquire))
                .sum(),
        }
    }
}

/// Statistics about the example store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    /// Total number of examples.
    pub total_examples: usize,

    /// Examples per database.
    pub by_database: HashMap<DatabaseId, usize>,

    /// Sum of all usage counters.
    pub total_retrievals: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = ExampleStore::in_memory();
        let id = store
            .create(NewExample::new("cooking", "How do I bake bread?", "Knead, proof, bake."))
            .await
            .unwrap();

        let example = store.get(&id).await.unwrap();
        assert_eq!(example.database_id, DatabaseId::new("cooking"));
        assert_eq!(example.question, "How do I bake bread?");
        assert_eq!(example.chosen_answer, "Knead, proof, bake.");
        assert_eq!(example.rejected_answer, None);
        assert_eq!(example.times_retrieved, 0);
    }

    #[tokio::test]
    async fn test_invalid_create_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = ExampleStore::open(temp_dir.path()).await.unwrap();

        let err = store.create(NewExample::new("db", "", "answer")).await;
        assert!(matches!(err, Err(StoreError::Validation(_))));
        let err = store.create(NewExample::new("db", "question", "")).await;
        assert!(matches!(err, Err(StoreError::Validation(_))));

        assert_eq!(store.stats().await.total_examples, 0);
        let mut files = fs::read_dir(temp_dir.path().join(EXAMPLES_DIR)).await.unwrap();
        assert!(files.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_listing_is_newest_first_and_scoped() {
        let store = ExampleStore::in_memory();
        let first = store.create(NewExample::new("a", "q1", "a1")).await.unwrap();
        let second = store.create(NewExample::new("a", "q2", "a2")).await.unwrap();
        let third = store.create(NewExample::new("a", "q3", "a3")).await.unwrap();
        let other = store.create(NewExample::new("b", "q4", "a4")).await.unwrap();

        let ids: Vec<_> = store
            .list_by_database(&DatabaseId::new("a"))
            .await
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![third, second, first]);

        let recent: Vec<_> = store
            .get_recent(&DatabaseId::new("a"), 2)
            .await
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(recent, vec![third, second]);

        let b: Vec<_> = store
            .list_by_database(&DatabaseId::new("b"))
            .await
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(b, vec![other]);
        assert!(store.list_by_database(&DatabaseId::new("c")).await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = ExampleStore::in_memory();
        let id = store.create(NewExample::new("db", "q", "a")).await.unwrap();

        assert!(store.remove(&id).await.unwrap());
        assert!(!store.remove(&id).await.unwrap());
        assert!(store.get(&id).await.is_none());
        assert!(store.list_by_database(&DatabaseId::new("db")).await.is_empty());
        assert!(store.stats().await.by_database.is_empty());
    }

    #[tokio::test]
    async fn test_increment_missing_is_skipped() {
        let store = ExampleStore::in_memory();
        assert_eq!(store.increment_usage(&ExampleId::new()).await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_not_lost() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(ExampleStore::open(temp_dir.path()).await.unwrap());
        let id = store.create(NewExample::new("db", "q", "a")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.increment_usage(&id).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.get(&id).await.unwrap().times_retrieved, 32);

        // The file agrees with memory.
        let reopened = ExampleStore::open(temp_dir.path()).await.unwrap();
        assert_eq!(reopened.get(&id).await.unwrap().times_retrieved, 32);
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let temp_dir = TempDir::new().unwrap();

        let kept;
        let removed;
        {
            let store = ExampleStore::open(temp_dir.path()).await.unwrap();
            kept = store
                .create(NewExample::new("db", "q", "better").with_rejected("worse"))
                .await
                .unwrap();
            removed = store.create(NewExample::new("db", "q2", "a2")).await.unwrap();
            store.increment_usage(&kept).await.unwrap();
            store.remove(&removed).await.unwrap();
        }

        // Reload and verify
        {
            let store = ExampleStore::open(temp_dir.path()).await.unwrap();
            let example = store.get(&kept).await.unwrap();
            assert_eq!(example.rejected_answer.as_deref(), Some("worse"));
            assert_eq!(example.times_retrieved, 1);
            assert!(store.get(&removed).await.is_none());
            assert_eq!(store.list_by_database(&DatabaseId::new("db")).await.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_unreadable_files_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join(EXAMPLES_DIR)).await.unwrap();
        fs::write(temp_dir.path().join(EXAMPLES_DIR).join("junk.json"), "not json")
            .await
            .unwrap();

        let store = ExampleStore::open(temp_dir.path()).await.unwrap();
        assert_eq!(store.stats().await.total_examples, 0);
    }

    #[tokio::test]
    async fn test_import_validates_whole_batch_first() {
        let store = ExampleStore::in_memory();
        let batch = vec![
            NewExample::new("db", "q1", "a1"),
            NewExample::new("db", "q2", ""),
        ];
        assert!(matches!(store.import(batch).await, Err(StoreError::Validation(_))));
        assert_eq!(store.stats().await.total_examples, 0);

        let ids = store
            .import(vec![NewExample::new("db", "q1", "a1"), NewExample::new("db", "q2", "a2")])
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = ExampleStore::in_memory();
        let mut events = store.subscribe();

        let id = store.create(NewExample::new("db", "q", "a")).await.unwrap();
        store.increment_usage(&id).await.unwrap();
        store.remove(&id).await.unwrap();

        let created = events.recv().await.unwrap();
        assert_eq!(created.kind, StoreEventKind::Created);
        assert_eq!(created.id, id);
        assert_eq!(
            events.recv().await.unwrap().kind,
            StoreEventKind::UsageIncremented { times_retrieved: 1 }
        );
        assert_eq!(events.recv().await.unwrap().kind, StoreEventKind::Removed);
    }

    #[tokio::test]
    async fn test_stats() {
        let store = ExampleStore::in_memory();
        let id = store.create(NewExample::new("a", "q", "x")).await.unwrap();
        store.create(NewExample::new("a", "q", "y")).await.unwrap();
        store.create(NewExample::new("b", "q", "z")).await.unwrap();
        store.increment_usage(&id).await.unwrap();
        store.increment_usage(&id).await.unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.total_examples, 3);
        assert_eq!(stats.by_database[&DatabaseId::new("a")], 2);
        assert_eq!(stats.total_retrievals, 2);
    }
}
