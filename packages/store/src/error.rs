//! Error types shared across the stores.

use thiserror::Error;

use crate::models::EntryField;

/// A user-entered field failed validation before reaching any store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(EntryField),

    #[error("unknown entry type: {0:?}")]
    UnknownType(String),

    #[error("no entry is being edited")]
    NotEditing,
}

/// Failure of the key-value storage capability.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A request to the entry backend failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend unavailable")]
    Unavailable,

    #[error("request failed: {0}")]
    Request(String),

    #[error("backend returned status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Decode(String),
}

/// The identity provider could not answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("identity request failed: {0}")]
    Request(String),

    #[error("identity provider returned status {0}")]
    Status(u16),
}

/// Error returned by [`crate::EntryStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("no valid guest session")]
    NoGuestSession,
}

/// Error returned by session transitions.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Error loading an `owl.toml` file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),
}
