pub mod clock;
pub mod config;
pub mod context;
pub mod edit;
pub mod error;
pub mod guest;
pub mod guest_store;
pub mod list;
pub mod models;
pub mod remote;
pub mod session;
pub mod sort;
pub mod storage;

#[cfg(not(target_arch = "wasm32"))]
pub mod timer;

mod memory;
pub use memory::{MemoryBackend, MemoryStorage};

mod file_store;
pub use file_store::FileStorage;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
mod web_storage;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use web_storage::WebStorage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::OwlConfig;
pub use context::AppContext;
pub use edit::{EntryDraft, EntryForm, InlineEdit};
pub use error::{
    BackendError, ConfigError, IdentityError, SessionError, StorageError, StoreError,
    ValidationError,
};
pub use guest::{GuestSession, GuestSessions};
pub use guest_store::GuestStore;
pub use list::{ActiveStore, EntryStore, ListController};
pub use models::{Entry, EntryField, EntryFields, EntryType, UserInfo};
pub use remote::{EntryBackend, RemoteStore, SnapshotFeed};
pub use session::{IdentityProvider, Mode, SessionEvent, SessionSelector, SessionState};
pub use sort::{SortDirection, SortState};
pub use storage::KeyValueStore;

#[cfg(not(target_arch = "wasm32"))]
pub use timer::{ExpiryTimer, TaskHandle};
