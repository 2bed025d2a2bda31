//! # Application configuration: `owl.toml`
//!
//! Optional TOML file tuning the guest session lifetime and the polling and
//! expiry intervals. A missing file, or a file with missing sections, is
//! equivalent to the defaults.
//!
//! ## Structure
//!
//! ```toml
//! [guest]
//! session_ttl_hours = 24            # lifetime of a guest session
//! expiry_check_interval_secs = 60   # periodic expiry check
//!
//! [remote]
//! poll_interval_secs = 5            # snapshot polling for HTTP backends
//! ```
//!
//! ## Types
//!
//! | Struct | Purpose |
//! |--------|---------|
//! | [`OwlConfig`] | Top-level config. Builder helpers, TOML (de)serialisation, file loading and the canonical filename. |
//! | [`GuestConfig`] | Guest section. Defaults to a **24 hour** session checked every **60 seconds**. |
//! | [`RemoteConfig`] | Remote section. Defaults to polling every **5 seconds**. |

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration stored in `owl.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OwlConfig {
    #[serde(default)]
    pub guest: GuestConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Guest session configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuestConfig {
    /// Lifetime of a guest session in hours.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u32,
    /// Interval of the periodic expiry check in seconds.
    #[serde(default = "default_expiry_check_interval")]
    pub expiry_check_interval_secs: u32,
}

fn default_session_ttl_hours() -> u32 {
    24
}

fn default_expiry_check_interval() -> u32 {
    60
}

impl Default for GuestConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: default_session_ttl_hours(),
            expiry_check_interval_secs: default_expiry_check_interval(),
        }
    }
}

impl GuestConfig {
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.session_ttl_hours))
    }

    pub fn expiry_check_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.expiry_check_interval_secs.max(1)))
    }
}

/// Remote backend configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Snapshot polling interval in seconds for backends without push.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u32,
}

fn default_poll_interval() -> u32 {
    5
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl RemoteConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.poll_interval_secs.max(1)))
    }
}

impl OwlConfig {
    /// Builder method to set the guest session lifetime.
    pub fn with_session_ttl_hours(mut self, hours: u32) -> Self {
        self.guest.session_ttl_hours = hours;
        self
    }

    /// Builder method to set the expiry check interval.
    pub fn with_expiry_check_interval(mut self, secs: u32) -> Self {
        self.guest.expiry_check_interval_secs = secs;
        self
    }

    /// Builder method to set the snapshot polling interval.
    pub fn with_poll_interval(mut self, secs: u32) -> Self {
        self.remote.poll_interval_secs = secs;
        self
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "owl.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load from a file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::from_toml(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}
