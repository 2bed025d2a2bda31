//! # Guest store: entries kept in key-value storage
//!
//! [`GuestStore`] is the guest-mode [`EntryStore`]. The full entry list lives
//! in memory and is re-persisted as one JSON array under
//! [`GUEST_ENTRIES_KEY`] after every mutation. That write is the only
//! durability mechanism: it is not transactional, and two writers (two browser
//! tabs) simply overwrite each other.
//!
//! Mutations require a guest session that is still valid at the time of the
//! call; without one they fail with [`StoreError::NoGuestSession`]. Update and
//! delete of an unknown id are silent no-ops.

use crate::clock::Clock;
use crate::error::StoreError;
use crate::guest::{GuestSession, GuestSessions};
use crate::models::{generate_id, Entry, EntryField, EntryFields};
use crate::sort::SortState;
use crate::storage::{KeyValueStore, GUEST_ENTRIES_KEY};
use crate::EntryStore;

/// Store backed by browser-style key-value storage.
#[derive(Debug)]
pub struct GuestStore<S, C> {
    storage: S,
    clock: C,
    session: Option<GuestSession>,
    entries: Vec<Entry>,
    sort: SortState,
}

impl<S: KeyValueStore + Clone, C: Clock + Clone> GuestStore<S, C> {
    /// Restore the persisted session and entries.
    ///
    /// An expired session is discarded together with its entries and the store
    /// starts empty. Malformed entry data is treated as an empty list.
    pub fn load(sessions: &GuestSessions<S, C>) -> Self {
        let session = sessions.load();
        let entries = match session {
            Some(_) => read_entries(sessions.storage()),
            None => Vec::new(),
        };
        tracing::debug!(count = entries.len(), "guest entries loaded");
        Self {
            storage: sessions.storage().clone(),
            clock: sessions.clock().clone(),
            session,
            entries,
            sort: SortState::default(),
        }
    }
}

impl<S: KeyValueStore, C: Clock> GuestStore<S, C> {
    pub fn session(&self) -> Option<&GuestSession> {
        self.session.as_ref()
    }

    fn require_session(&self) -> Result<(), StoreError> {
        match &self.session {
            Some(session) if session.is_valid_at(self.clock.now()) => Ok(()),
            _ => Err(StoreError::NoGuestSession),
        }
    }

    fn persist(&self) {
        let json = match serde_json::to_string(&self.entries) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("failed to serialize guest entries: {e}");
                return;
            }
        };
        if let Err(e) = self.storage.set(GUEST_ENTRIES_KEY, &json) {
            tracing::warn!("failed to persist guest entries: {e}");
        }
    }
}

fn read_entries<S: KeyValueStore>(storage: &S) -> Vec<Entry> {
    let Some(json) = storage.get(GUEST_ENTRIES_KEY) else {
        return Vec::new();
    };
    serde_json::from_str(&json).unwrap_or_else(|e| {
        tracing::warn!("error parsing guest entries: {e}");
        Vec::new()
    })
}

impl<S: KeyValueStore, C: Clock> EntryStore for GuestStore<S, C> {
    fn list(&self) -> Vec<Entry> {
        self.sort.sorted(&self.entries)
    }

    fn sort_state(&self) -> SortState {
        self.sort
    }

    fn sort(&mut self, field: EntryField) {
        self.sort.toggle(field);
    }

    async fn create(&mut self, fields: EntryFields) -> Result<Entry, StoreError> {
        self.require_session()?;
        let now = self.clock.now();
        let entry = Entry::from_fields(generate_id("todo", now), fields, Some(now));
        self.entries.push(entry.clone());
        self.persist();
        tracing::debug!(id = %entry.id, "guest entry created");
        Ok(entry)
    }

    async fn update(&mut self, id: &str, fields: EntryFields) -> Result<(), StoreError> {
        self.require_session()?;
        let now = self.clock.now();
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.apply(fields);
            entry.updated_at = Some(now);
        }
        self.persist();
        Ok(())
    }

    async fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.require_session()?;
        self.entries.retain(|e| e.id != id);
        self.persist();
        Ok(())
    }
}
