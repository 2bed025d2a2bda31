//! # API crate: remote collaborators for OWL
//!
//! Implements the store crate's remote seams over HTTP, plus the reference
//! server those clients talk to.
//!
//! | Module | Feature gate | Purpose |
//! |--------|-------------|---------|
//! | [`config`] | none | `OWL_API_URL` / `OWL_BIND_ADDR` from the environment |
//! | [`http`] | none | [`HttpBackend`], the polling `EntryBackend` |
//! | [`identity`] | none | [`HttpIdentity`], the `IdentityProvider` over `/api/auth` |
//! | [`server`] | `server` | axum router over an in-memory backend |

pub mod config;
pub mod http;
pub mod identity;
#[cfg(feature = "server")]
pub mod server;

pub use config::BackendConfig;
pub use http::HttpBackend;
pub use identity::HttpIdentity;
