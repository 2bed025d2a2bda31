//! # Key-value storage capability
//!
//! Guest mode persists everything through [`KeyValueStore`], a synchronous
//! string-keyed, string-valued store with the same shape as the browser's
//! `localStorage`. Implementations live in sibling modules:
//!
//! | Implementation | Backing | Used for |
//! |----------------|---------|----------|
//! | [`crate::MemoryStorage`] | shared `HashMap` | tests, ephemeral sessions |
//! | [`crate::FileStorage`] | one file per key | desktop persistence |
//! | `WebStorage` | `window.localStorage` | the browser (`web` feature) |
//!
//! Reads never fail: an unreadable value is reported as absent. Writes report
//! their failure so callers can decide whether to log or propagate it.

use crate::error::StorageError;

/// Key of the JSON guest session record.
pub const GUEST_SESSION_KEY: &str = "guestSession";
/// Key of the guest session expiry, epoch milliseconds as a decimal string.
pub const GUEST_SESSION_EXPIRY_KEY: &str = "guestSessionExpiry";
/// Key of the JSON array of guest entries.
pub const GUEST_ENTRIES_KEY: &str = "guestTodos";

/// Synchronous string key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str);
}
