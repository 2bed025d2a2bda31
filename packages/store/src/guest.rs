//! # Guest sessions
//!
//! A guest session is a temporary identity with no backend account. It lives
//! in key-value storage under two keys: the JSON session record
//! ([`GUEST_SESSION_KEY`]) and its expiry in epoch milliseconds
//! ([`GUEST_SESSION_EXPIRY_KEY`]). The guest's entries live under a third key
//! ([`GUEST_ENTRIES_KEY`]) and are discarded together with the session.
//!
//! [`GuestSessions`] is the only code that writes the session keys:
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`create`](GuestSessions::create) | Mints a new session expiring after the configured lifetime (24 hours by default). |
//! | [`load`](GuestSessions::load) | Load-time check: returns the persisted session, or cleans up and returns `None` when it is missing, malformed or expired. |
//! | [`is_expired`](GuestSessions::is_expired) | Periodic check: reads only the expiry key. |
//! | [`sweep_expired`](GuestSessions::sweep_expired) | Periodic check plus cleanup. Idempotent. |
//! | [`cleanup`](GuestSessions::cleanup) | Removes all three keys. |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::GuestConfig;
use crate::error::StorageError;
use crate::models::generate_id;
use crate::storage::{
    KeyValueStore, GUEST_ENTRIES_KEY, GUEST_SESSION_EXPIRY_KEY, GUEST_SESSION_KEY,
};

/// A temporary guest identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuestSession {
    /// "guest_1718000000000_k3j9x0a2b"
    pub id: String,
    /// Placeholder address: "guest_<id>@temporary.local"
    pub email: String,
    /// "session_1718000000000"
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}

impl GuestSession {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Persisted shape of the session record.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuestRecord {
    id: String,
    email: String,
    #[serde(default = "default_is_guest")]
    is_guest: bool,
    session_id: String,
}

fn default_is_guest() -> bool {
    true
}

/// Creates, loads and expires the guest session in key-value storage.
#[derive(Clone, Debug)]
pub struct GuestSessions<S, C> {
    storage: S,
    clock: C,
    ttl: chrono::Duration,
}

impl<S: KeyValueStore, C: Clock> GuestSessions<S, C> {
    /// Sessions with the default 24 hour lifetime.
    pub fn new(storage: S, clock: C) -> Self {
        Self::with_config(storage, clock, &GuestConfig::default())
    }

    pub fn with_config(storage: S, clock: C, config: &GuestConfig) -> Self {
        Self {
            storage,
            clock,
            ttl: config.session_ttl(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Start a new guest session and persist it. On a failed write no session
    /// keys are left behind.
    pub fn create(&self) -> Result<GuestSession, StorageError> {
        let now = self.clock.now();
        let id = generate_id("guest", now);
        let session = GuestSession {
            email: format!("guest_{id}@temporary.local"),
            session_id: format!("session_{}", now.timestamp_millis()),
            expires_at: now + self.ttl,
            id,
        };

        let record = GuestRecord {
            id: session.id.clone(),
            email: session.email.clone(),
            is_guest: true,
            session_id: session.session_id.clone(),
        };
        let json = serde_json::to_string(&record)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        self.storage.set(GUEST_SESSION_KEY, &json)?;
        if let Err(e) = self.storage.set(
            GUEST_SESSION_EXPIRY_KEY,
            &session.expires_at.timestamp_millis().to_string(),
        ) {
            tracing::warn!("guest session expiry not persisted: {e}");
            self.storage.remove(GUEST_SESSION_KEY);
            self.storage.remove(GUEST_SESSION_EXPIRY_KEY);
            return Err(e);
        }

        tracing::info!(guest = %session.id, expires_at = %session.expires_at, "guest session started");
        Ok(session)
    }

    /// Restore the persisted session, discarding it if it is unusable.
    pub fn load(&self) -> Option<GuestSession> {
        let record = self.storage.get(GUEST_SESSION_KEY);
        let expiry = self.storage.get(GUEST_SESSION_EXPIRY_KEY);
        let (record, expiry) = match (record, expiry) {
            (Some(record), Some(expiry)) => (record, expiry),
            (None, None) => {
                // Entries without a session are orphans
                self.storage.remove(GUEST_ENTRIES_KEY);
                return None;
            }
            _ => {
                tracing::warn!("incomplete guest session in storage, discarding");
                self.cleanup();
                return None;
            }
        };

        let Some(expires_at) = parse_expiry(&expiry) else {
            tracing::warn!("malformed guest session expiry, discarding");
            self.cleanup();
            return None;
        };
        if self.clock.now() >= expires_at {
            tracing::info!("guest session expired, discarding");
            self.cleanup();
            return None;
        }

        let record: GuestRecord = match serde_json::from_str(&record) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("malformed guest session record: {e}");
                self.cleanup();
                return None;
            }
        };

        Some(GuestSession {
            id: record.id,
            email: record.email,
            session_id: record.session_id,
            expires_at,
        })
    }

    /// Whether a persisted expiry exists and has passed.
    pub fn is_expired(&self) -> bool {
        let Some(expiry) = self.storage.get(GUEST_SESSION_EXPIRY_KEY) else {
            return false;
        };
        match parse_expiry(&expiry) {
            Some(expires_at) => self.clock.now() >= expires_at,
            None => true,
        }
    }

    /// Clean up if the persisted session has expired. Returns whether it had.
    pub fn sweep_expired(&self) -> bool {
        if self.is_expired() {
            tracing::info!("guest session expired");
            self.cleanup();
            true
        } else {
            false
        }
    }

    /// Remove the session, its expiry and all guest entries.
    pub fn cleanup(&self) {
        self.storage.remove(GUEST_SESSION_KEY);
        self.storage.remove(GUEST_SESSION_EXPIRY_KEY);
        self.storage.remove(GUEST_ENTRIES_KEY);
    }
}

fn parse_expiry(value: &str) -> Option<DateTime<Utc>> {
    let millis: i64 = value.trim().parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}
