//! # Remote store: entries owned by a backend
//!
//! [`RemoteStore`] is the authenticated-mode store. It never owns the entry
//! list: the list is whatever the backend last pushed through its
//! subscription feed ([`EntryBackend::observe`]), a long-lived channel that
//! carries a full snapshot every time any entry changes, including changes
//! made from other sessions or devices.
//!
//! ## [`EntryBackend`] trait
//!
//! An async interface with three requests (`create`, `update`, `delete`) and
//! the `observe` subscription. Implementations: [`crate::MemoryBackend`]
//! (in-process) and the HTTP client in the `owl-api` crate.
//!
//! ## Visibility
//!
//! `create`/`update`/`delete` go straight to the backend and leave the local
//! snapshot untouched. Their effect becomes visible only once a later snapshot
//! reflecting it arrives, which may race with snapshots caused by other
//! writers. A failed request is returned to the caller as
//! [`StoreError::Backend`]; nothing is retried and nothing local changes.

use std::future::Future;

use tokio::sync::watch;

use crate::error::{BackendError, StoreError};
use crate::models::{Entry, EntryField, EntryFields};
use crate::sort::SortState;
use crate::EntryStore;

/// Async interface of the backend data service.
pub trait EntryBackend {
    fn create(
        &self,
        fields: EntryFields,
    ) -> impl Future<Output = Result<Entry, BackendError>>;
    fn update(
        &self,
        id: &str,
        fields: EntryFields,
    ) -> impl Future<Output = Result<(), BackendError>>;
    fn delete(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<(), BackendError>>;
    /// Subscribe to full-list snapshots.
    fn observe(&self) -> SnapshotFeed;
}

/// Receiving end of a backend subscription.
///
/// Holds an optional keepalive (for example the handle of a polling task) that
/// is released when the feed is dropped.
pub struct SnapshotFeed {
    rx: watch::Receiver<Vec<Entry>>,
    _keepalive: Option<Box<dyn Send + Sync>>,
}

impl SnapshotFeed {
    pub fn new(rx: watch::Receiver<Vec<Entry>>) -> Self {
        Self {
            rx,
            _keepalive: None,
        }
    }

    pub fn with_keepalive(
        rx: watch::Receiver<Vec<Entry>>,
        keepalive: impl Send + Sync + 'static,
    ) -> Self {
        Self {
            rx,
            _keepalive: Some(Box::new(keepalive)),
        }
    }

    /// The most recent snapshot.
    pub fn latest(&self) -> Vec<Entry> {
        self.rx.borrow().clone()
    }

    /// Wait for the next snapshot. Returns `false` once the feed has closed.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

/// Store backed by an [`EntryBackend`].
pub struct RemoteStore<B: EntryBackend> {
    backend: B,
    feed: SnapshotFeed,
    sort: SortState,
}

impl<B: EntryBackend> RemoteStore<B> {
    /// Subscribe to `backend` and start from its current snapshot.
    pub fn new(backend: B) -> Self {
        let feed = backend.observe();
        Self {
            backend,
            feed,
            sort: SortState::default(),
        }
    }

    /// Wait until the backend pushes a new snapshot.
    pub async fn changed(&mut self) -> bool {
        self.feed.changed().await
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: EntryBackend> EntryStore for RemoteStore<B> {
    fn list(&self) -> Vec<Entry> {
        let mut entries = self.feed.latest();
        self.sort.apply(&mut entries);
        entries
    }

    fn sort_state(&self) -> SortState {
        self.sort
    }

    fn sort(&mut self, field: EntryField) {
        self.sort.toggle(field);
    }

    async fn create(&mut self, fields: EntryFields) -> Result<Entry, StoreError> {
        let entry = self.backend.create(fields).await.inspect_err(|e| {
            tracing::warn!("create request failed: {e}");
        })?;
        tracing::debug!(id = %entry.id, "create requested");
        Ok(entry)
    }

    async fn update(&mut self, id: &str, fields: EntryFields) -> Result<(), StoreError> {
        self.backend.update(id, fields).await.inspect_err(|e| {
            tracing::warn!(id, "update request failed: {e}");
        })?;
        Ok(())
    }

    async fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.backend.delete(id).await.inspect_err(|e| {
            tracing::warn!(id, "delete request failed: {e}");
        })?;
        Ok(())
    }
}
