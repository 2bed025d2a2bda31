//! # List controller: one surface over both stores
//!
//! [`EntryStore`] is the capability set both stores implement. [`ActiveStore`]
//! is the tagged union of the two variants that the session selector picks
//! from, and [`ListController`] is what the presentation layer talks to.
//!
//! The controller forwards `list`, `sort`, `create`, `update` and `delete`
//! unchanged and adds a client-side type filter. The filter is applied after
//! sorting, so the visible list is always a subsequence of the sorted list in
//! the same relative order. Filtering never touches the underlying store.
//!
//! Forms go through [`submit_form`](ListController::submit_form) and
//! [`submit_edit`](ListController::submit_edit), which validate the draft first:
//! an invalid draft is rejected before any store call.

use std::future::Future;

use crate::clock::Clock;
use crate::edit::{EntryForm, InlineEdit};
use crate::error::StoreError;
use crate::guest_store::GuestStore;
use crate::models::{Entry, EntryField, EntryFields, EntryType};
use crate::remote::{EntryBackend, RemoteStore};
use crate::session::Mode;
use crate::sort::SortState;
use crate::storage::KeyValueStore;

/// Operations shared by the guest and remote stores.
pub trait EntryStore {
    /// Entries ordered by the current sort state.
    fn list(&self) -> Vec<Entry>;
    fn sort_state(&self) -> SortState;
    /// Apply the sort toggle rule for `field`.
    fn sort(&mut self, field: EntryField);
    fn create(
        &mut self,
        fields: EntryFields,
    ) -> impl Future<Output = Result<Entry, StoreError>>;
    fn update(
        &mut self,
        id: &str,
        fields: EntryFields,
    ) -> impl Future<Output = Result<(), StoreError>>;
    fn delete(
        &mut self,
        id: &str,
    ) -> impl Future<Output = Result<(), StoreError>>;
}

/// The store chosen for the current session.
pub enum ActiveStore<S, C, B: EntryBackend> {
    Guest(GuestStore<S, C>),
    Remote(RemoteStore<B>),
}

impl<S, C, B: EntryBackend> ActiveStore<S, C, B> {
    pub fn mode(&self) -> Mode {
        match self {
            ActiveStore::Guest(_) => Mode::Guest,
            ActiveStore::Remote(_) => Mode::Authenticated,
        }
    }
}

impl<S: KeyValueStore, C: Clock, B: EntryBackend> EntryStore for ActiveStore<S, C, B> {
    fn list(&self) -> Vec<Entry> {
        match self {
            ActiveStore::Guest(store) => store.list(),
            ActiveStore::Remote(store) => store.list(),
        }
    }

    fn sort_state(&self) -> SortState {
        match self {
            ActiveStore::Guest(store) => store.sort_state(),
            ActiveStore::Remote(store) => store.sort_state(),
        }
    }

    fn sort(&mut self, field: EntryField) {
        match self {
            ActiveStore::Guest(store) => store.sort(field),
            ActiveStore::Remote(store) => store.sort(field),
        }
    }

    async fn create(&mut self, fields: EntryFields) -> Result<Entry, StoreError> {
        match self {
            ActiveStore::Guest(store) => store.create(fields).await,
            ActiveStore::Remote(store) => store.create(fields).await,
        }
    }

    async fn update(&mut self, id: &str, fields: EntryFields) -> Result<(), StoreError> {
        match self {
            ActiveStore::Guest(store) => store.update(id, fields).await,
            ActiveStore::Remote(store) => store.update(id, fields).await,
        }
    }

    async fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        match self {
            ActiveStore::Guest(store) => store.delete(id).await,
            ActiveStore::Remote(store) => store.delete(id).await,
        }
    }
}

/// Sorted, filterable view over the active store.
pub struct ListController<S, C, B: EntryBackend> {
    store: ActiveStore<S, C, B>,
    type_filter: Option<EntryType>,
}

impl<S: KeyValueStore, C: Clock, B: EntryBackend> ListController<S, C, B> {
    pub fn new(store: ActiveStore<S, C, B>) -> Self {
        Self {
            store,
            type_filter: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.store.mode()
    }

    pub fn store(&self) -> &ActiveStore<S, C, B> {
        &self.store
    }

    /// Sorted entries, narrowed to the active type filter.
    pub fn list(&self) -> Vec<Entry> {
        let mut entries = self.store.list();
        if let Some(only) = self.type_filter {
            entries.retain(|e| e.r#type == only);
        }
        entries
    }

    /// Sorted entries whose type satisfies `predicate`, ignoring the active filter.
    pub fn list_where(&self, predicate: impl Fn(EntryType) -> bool) -> Vec<Entry> {
        let mut entries = self.store.list();
        entries.retain(|e| predicate(e.r#type));
        entries
    }

    pub fn sort(&mut self, field: EntryField) {
        self.store.sort(field);
    }

    pub fn sort_state(&self) -> SortState {
        self.store.sort_state()
    }

    pub fn sort_indicator(&self, field: EntryField) -> &'static str {
        self.store.sort_state().indicator(field)
    }

    /// Show only entries of `only`, or everything with `None`.
    pub fn filter(&mut self, only: Option<EntryType>) {
        self.type_filter = only;
    }

    pub fn type_filter(&self) -> Option<EntryType> {
        self.type_filter
    }

    pub async fn create(&mut self, fields: EntryFields) -> Result<Entry, StoreError> {
        self.store.create(fields).await
    }

    pub async fn update(&mut self, id: &str, fields: EntryFields) -> Result<(), StoreError> {
        self.store.update(id, fields).await
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.store.delete(id).await
    }

    /// Validate the create form and, if valid, create the entry and reset the form.
    pub async fn submit_form(&mut self, form: &mut EntryForm) -> Result<Entry, StoreError> {
        let fields = form.validate()?;
        let entry = self.store.create(fields).await?;
        form.reset();
        Ok(entry)
    }

    /// Validate the inline edit and, if valid, save it and leave edit mode.
    pub async fn submit_edit(&mut self, edit: &mut InlineEdit) -> Result<(), StoreError> {
        let (id, fields) = edit.validate()?;
        self.store.update(&id, fields).await?;
        edit.cancel();
        Ok(())
    }

    /// Wait for the next backend snapshot. Guest mode has none and returns `false`.
    pub async fn changed(&mut self) -> bool {
        match &mut self.store {
            ActiveStore::Guest(_) => false,
            ActiveStore::Remote(store) => store.changed().await,
        }
    }
}
