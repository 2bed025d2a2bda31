//! # Browser `localStorage`: web-side persistence
//!
//! [`WebStorage`] is the [`KeyValueStore`] used on the **web platform**. It
//! reads and writes `window.localStorage` through [`web_sys::Storage`], the
//! same place the guest session has always lived in the browser.
//!
//! ## Handle management
//!
//! `WebStorage` is a zero-size struct that looks up `window.localStorage` on
//! every call. `web_sys::Storage` is not `Send`, and the lookup is cheap.
//!
//! ## Error handling
//!
//! Reads swallow errors and report the key as absent, so a disabled or
//! unavailable storage degrades to "no guest data". Writes report
//! [`StorageError::Unavailable`] (quota exceeded, storage disabled) so the
//! caller can log it.

use wasm_bindgen::JsValue;

use crate::error::StorageError;
use crate::storage::KeyValueStore;

/// `window.localStorage`-backed KeyValueStore for the web platform.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebStorage;

impl WebStorage {
    pub fn new() -> Self {
        Self
    }

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }
}

fn describe(err: JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

impl KeyValueStore for WebStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let storage = Self::storage()
            .ok_or_else(|| StorageError::Unavailable("localStorage is not available".to_string()))?;
        storage
            .set_item(key, value)
            .map_err(|e| StorageError::Unavailable(describe(e)))
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(key);
        }
    }
}
