use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::clock::{Clock, SystemClock};
use crate::error::{BackendError, StorageError};
use crate::models::{generate_id, Entry, EntryFields};
use crate::remote::{EntryBackend, SnapshotFeed};
use crate::storage::KeyValueStore;

/// In-memory KeyValueStore for testing and ephemeral guest sessions.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().unwrap().contains_key(key)
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.values.lock().unwrap().remove(key);
    }
}

/// In-process EntryBackend for testing and the reference server.
///
/// Every mutation publishes the full list to all subscribers.
#[derive(Clone, Debug)]
pub struct MemoryBackend {
    entries: Arc<Mutex<Vec<Entry>>>,
    feed: Arc<watch::Sender<Vec<Entry>>>,
    offline: Arc<AtomicBool>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self {
            entries: Arc::default(),
            feed: Arc::new(tx),
            offline: Arc::default(),
        }
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every request through [`EntryBackend`] fail with [`BackendError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Vec<Entry> {
        self.entries.lock().unwrap().clone()
    }

    /// Store a new entry with backend-managed id and timestamps.
    pub fn insert(&self, fields: EntryFields) -> Entry {
        self.insert_with_id(generate_id("entry", SystemClock.now()), fields)
    }

    pub fn insert_with_id(&self, id: String, fields: EntryFields) -> Entry {
        let entry = Entry::from_fields(id, fields, Some(SystemClock.now()));
        let mut entries = self.entries.lock().unwrap();
        entries.push(entry.clone());
        self.feed.send_replace(entries.clone());
        entry
    }

    /// Replace the fields of `id`. Unknown ids are ignored.
    pub fn replace(&self, id: &str, fields: EntryFields) -> Option<Entry> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.iter_mut().find(|e| e.id == id)?;
        entry.apply(fields);
        entry.updated_at = Some(SystemClock.now());
        let updated = entry.clone();
        self.feed.send_replace(entries.clone());
        Some(updated)
    }

    /// Remove `id`. Unknown ids are ignored.
    pub fn remove(&self, id: &str) -> Option<Entry> {
        let mut entries = self.entries.lock().unwrap();
        let pos = entries.iter().position(|e| e.id == id)?;
        let removed = entries.remove(pos);
        self.feed.send_replace(entries.clone());
        Some(removed)
    }

    fn check_online(&self) -> Result<(), BackendError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(BackendError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl EntryBackend for MemoryBackend {
    async fn create(&self, fields: EntryFields) -> Result<Entry, BackendError> {
        self.check_online()?;
        Ok(self.insert(fields))
    }

    async fn update(&self, id: &str, fields: EntryFields) -> Result<(), BackendError> {
        self.check_online()?;
        self.replace(id, fields);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), BackendError> {
        self.check_online()?;
        self.remove(id);
        Ok(())
    }

    fn observe(&self) -> SnapshotFeed {
        SnapshotFeed::new(self.feed.subscribe())
    }
}
