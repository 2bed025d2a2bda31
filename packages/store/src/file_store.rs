//! # Filesystem-backed key-value storage
//!
//! [`FileStorage`] is a [`KeyValueStore`] that keeps each key in its own file
//! under a base directory. It is the desktop counterpart of the browser's
//! `localStorage`, so a guest session survives application restarts.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//! ├── guestSession          # JSON session record
//! ├── guestSessionExpiry    # epoch milliseconds
//! └── guestTodos            # JSON array of entries
//! ```
//!
//! ## Platform data directories
//!
//! Callers usually pass `dirs::data_dir().join("owl")`:
//!
//! | Platform | Path |
//! |----------|------|
//! | macOS | `~/Library/Application Support/owl/` |
//! | Linux | `~/.local/share/owl/` |
//! | Windows | `C:\Users\<user>\AppData\Roaming\owl\` |

use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::storage::KeyValueStore;

/// Filesystem-backed KeyValueStore for desktop persistence.
#[derive(Clone, Debug)]
pub struct FileStorage {
    base: PathBuf,
}

impl FileStorage {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn key_path(&self, key: &str) -> PathBuf {
        // Keys are fixed identifiers; strip separators so a key never escapes the base.
        let file: String = key
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.base.join(file)
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.key_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.base)?;
        std::fs::write(self.key_path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.key_path(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::guest::GuestSessions;
    use crate::guest_store::GuestStore;
    use crate::models::{EntryFields, EntryType};
    use crate::EntryStore;

    #[tokio::test]
    async fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(chrono::Utc::now());

        let sessions = GuestSessions::new(FileStorage::new(dir.path().join("owl")), clock.clone());
        sessions.create().unwrap();
        let mut store = GuestStore::load(&sessions);
        store
            .create(EntryFields::new("Hello", EntryType::Written, "https://h", "Me"))
            .await
            .unwrap();

        // Re-open from same directory
        let sessions2 = GuestSessions::new(FileStorage::new(dir.path().join("owl")), clock);
        let store2 = GuestStore::load(&sessions2);

        let entries = store2.list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Hello");
    }

    #[test]
    fn test_missing_key_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        assert!(storage.get("nothing").is_none());
        storage.set("a/b", "1").unwrap();
        assert_eq!(storage.get("a/b").as_deref(), Some("1"));
        assert!(dir.path().join("a_b").exists());
        storage.remove("a/b");
        assert!(storage.get("a/b").is_none());
        // Removing twice is harmless
        storage.remove("a/b");
    }
}
