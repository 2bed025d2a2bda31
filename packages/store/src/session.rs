//! # Session selector
//!
//! Decides which identity, and therefore which store, is active. The selector
//! is a small state machine:
//!
//! ```text
//!                continue_as_guest()
//!   Unauthenticated ───────────────────▶ Guest
//!        │   ▲  ▲                           │
//!        │   │  └──── logout() / expiry ────┘
//!        │   │
//!        │   └──── logout() ────┐
//!        ▼                      │
//!   signed_in(user) ──▶ Authenticated
//! ```
//!
//! There is no direct transition between Guest and Authenticated. Any
//! transition not drawn above fails with [`SessionError::InvalidTransition`]
//! and leaves the state unchanged.
//!
//! The selector starts Unauthenticated with [`is_resolving`](SessionSelector::is_resolving)
//! set. [`resolve`](SessionSelector::resolve) runs the load-time guest expiry
//! check and then asks the [`IdentityProvider`] for the current user.

use std::future::Future;

use crate::clock::Clock;
use crate::error::{IdentityError, SessionError};
use crate::guest::{GuestSession, GuestSessions};
use crate::models::UserInfo;
use crate::storage::KeyValueStore;

/// The external authentication provider.
///
/// The interactive sign-in flow is not part of this trait; its result is
/// reported through [`SessionSelector::signed_in`].
pub trait IdentityProvider {
    /// The signed-in user, or `None` when nobody is signed in.
    fn current_user(&self) -> impl Future<Output = Result<Option<UserInfo>, IdentityError>>;
    fn sign_out(&self) -> impl Future<Output = Result<(), IdentityError>>;
}

/// Who is using the application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Guest(GuestSession),
    Authenticated(UserInfo),
}

impl SessionState {
    pub fn mode(&self) -> Option<Mode> {
        match self {
            SessionState::Unauthenticated => None,
            SessionState::Guest(_) => Some(Mode::Guest),
            SessionState::Authenticated(_) => Some(Mode::Authenticated),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Guest(_) => "in guest mode",
            SessionState::Authenticated(_) => "authenticated",
        }
    }
}

/// Which store backs the list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Guest,
    Authenticated,
}

/// Events raised by background work for the session owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The persisted guest session expired and its data was removed.
    GuestExpired,
}

pub struct SessionSelector<S, C, I> {
    sessions: GuestSessions<S, C>,
    identity: I,
    state: SessionState,
    resolving: bool,
}

impl<S: KeyValueStore, C: Clock, I: IdentityProvider> SessionSelector<S, C, I> {
    pub fn new(sessions: GuestSessions<S, C>, identity: I) -> Self {
        Self {
            sessions,
            identity,
            state: SessionState::Unauthenticated,
            resolving: true,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether the initial identity lookup is still pending.
    pub fn is_resolving(&self) -> bool {
        self.resolving
    }

    pub fn sessions(&self) -> &GuestSessions<S, C> {
        &self.sessions
    }

    pub fn identity(&self) -> &I {
        &self.identity
    }

    pub fn current_mode(&self) -> Option<Mode> {
        self.state.mode()
    }

    /// Guest email or the user's display name.
    pub fn display_name(&self) -> Option<&str> {
        match &self.state {
            SessionState::Unauthenticated => None,
            SessionState::Guest(session) => Some(&session.email),
            SessionState::Authenticated(user) => Some(user.display_name()),
        }
    }

    /// Establish the initial state.
    ///
    /// A persisted, unexpired guest session wins. Otherwise the identity
    /// provider is asked; a failed lookup is logged and leaves the selector
    /// Unauthenticated.
    pub async fn resolve(&mut self) -> Result<Option<Mode>, SessionError> {
        self.expect_unauthenticated("resolve")?;

        if let Some(session) = self.sessions.load() {
            tracing::info!(guest = %session.id, "restored guest session");
            self.state = SessionState::Guest(session);
        } else {
            match self.identity.current_user().await {
                Ok(Some(user)) => {
                    tracing::info!(user = %user.id, "restored signed-in user");
                    self.state = SessionState::Authenticated(user);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("failed to fetch current user: {e}"),
            }
        }

        self.resolving = false;
        Ok(self.current_mode())
    }

    pub fn continue_as_guest(&mut self) -> Result<GuestSession, SessionError> {
        self.expect_unauthenticated("continue as guest")?;
        let session = self.sessions.create()?;
        self.resolving = false;
        self.state = SessionState::Guest(session.clone());
        Ok(session)
    }

    /// Record the outcome of the external sign-in flow.
    pub fn signed_in(&mut self, user: UserInfo) -> Result<(), SessionError> {
        self.expect_unauthenticated("sign in")?;
        tracing::info!(user = %user.id, "signed in");
        self.resolving = false;
        self.state = SessionState::Authenticated(user);
        Ok(())
    }

    /// Leave Guest or Authenticated.
    ///
    /// Guest logout discards the guest's persisted data. Authenticated logout
    /// signs out with the identity provider first; if that fails the user
    /// stays signed in.
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        match &self.state {
            SessionState::Unauthenticated => Err(self.invalid("log out")),
            SessionState::Guest(session) => {
                tracing::info!(guest = %session.id, "guest logged out");
                self.sessions.cleanup();
                self.state = SessionState::Unauthenticated;
                Ok(())
            }
            SessionState::Authenticated(_) => {
                self.identity.sign_out().await.inspect_err(|e| {
                    tracing::warn!("sign out failed: {e}");
                })?;
                self.state = SessionState::Unauthenticated;
                Ok(())
            }
        }
    }

    /// Drop an expired guest session. Returns whether the state changed.
    pub fn check_expiry(&mut self) -> bool {
        let swept = self.sessions.sweep_expired();
        let SessionState::Guest(session) = &self.state else {
            return false;
        };
        if swept || !session.is_valid_at(self.sessions.clock().now()) {
            if !swept {
                self.sessions.cleanup();
            }
            tracing::info!(guest = %session.id, "guest session ended by expiry");
            self.state = SessionState::Unauthenticated;
            true
        } else {
            false
        }
    }

    fn expect_unauthenticated(&self, action: &'static str) -> Result<(), SessionError> {
        match self.state {
            SessionState::Unauthenticated => Ok(()),
            _ => Err(self.invalid(action)),
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            state: self.state.name(),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::DateTime;

    use crate::clock::ManualClock;
    use crate::storage::GUEST_SESSION_KEY;
    use crate::MemoryStorage;

    #[derive(Clone, Default)]
    struct MockIdentity {
        user: Option<UserInfo>,
        fail_lookup: bool,
        fail_sign_out: Arc<AtomicBool>,
        sign_outs: Arc<AtomicUsize>,
    }

    impl IdentityProvider for MockIdentity {
        async fn current_user(&self) -> Result<Option<UserInfo>, IdentityError> {
            if self.fail_lookup {
                return Err(IdentityError::Request("connection refused".to_string()));
            }
            Ok(self.user.clone())
        }

        async fn sign_out(&self) -> Result<(), IdentityError> {
            if self.fail_sign_out.load(Ordering::SeqCst) {
                return Err(IdentityError::Status(500));
            }
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn ada() -> UserInfo {
        UserInfo {
            id: "u1".to_string(),
            email: "ada@example.com".to_string(),
            name: Some("Ada".to_string()),
            avatar_url: None,
            provider: "cognito".to_string(),
        }
    }

    type Selector = SessionSelector<MemoryStorage, ManualClock, MockIdentity>;

    fn selector(identity: MockIdentity) -> (Selector, MemoryStorage, ManualClock) {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(DateTime::from_timestamp_millis(1_700_000_000_000).unwrap());
        let sessions = GuestSessions::new(storage.clone(), clock.clone());
        (SessionSelector::new(sessions, identity), storage, clock)
    }

    #[tokio::test]
    async fn test_resolve_without_anything() {
        let (mut selector, _, _) = selector(MockIdentity::default());
        assert!(selector.is_resolving());
        assert_eq!(selector.resolve().await.unwrap(), None);
        assert!(!selector.is_resolving());
        assert_eq!(selector.state(), &SessionState::Unauthenticated);
        assert!(selector.display_name().is_none());
    }

    #[tokio::test]
    async fn test_resolve_signed_in_user() {
        let identity = MockIdentity {
            user: Some(ada()),
            ..MockIdentity::default()
        };
        let (mut selector, _, _) = selector(identity);
        assert_eq!(selector.resolve().await.unwrap(), Some(Mode::Authenticated));
        assert_eq!(selector.display_name(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_resolve_identity_failure_is_unauthenticated() {
        let identity = MockIdentity {
            fail_lookup: true,
            ..MockIdentity::default()
        };
        let (mut selector, _, _) = selector(identity);
        assert_eq!(selector.resolve().await.unwrap(), None);
        assert!(!selector.is_resolving());
    }

    #[tokio::test]
    async fn test_resolve_prefers_persisted_guest() {
        let identity = MockIdentity {
            user: Some(ada()),
            ..MockIdentity::default()
        };
        let (mut selector, storage, clock) = selector(identity.clone());
        let guest = selector.continue_as_guest().unwrap();

        let sessions = GuestSessions::new(storage.clone(), clock.clone());
        let mut restored = SessionSelector::new(sessions, identity.clone());
        assert_eq!(restored.resolve().await.unwrap(), Some(Mode::Guest));
        assert_eq!(restored.state(), &SessionState::Guest(guest.clone()));
        assert_eq!(restored.display_name(), Some(guest.email.as_str()));

        // Once the session has expired the identity provider is consulted
        clock.advance(chrono::Duration::hours(24));
        let sessions = GuestSessions::new(storage.clone(), clock);
        let mut restored = SessionSelector::new(sessions, identity);
        assert_eq!(restored.resolve().await.unwrap(), Some(Mode::Authenticated));
        assert!(!storage.contains(GUEST_SESSION_KEY));
    }

    #[tokio::test]
    async fn test_guest_logout_cleans_up() {
        let (mut selector, storage, _) = selector(MockIdentity::default());
        selector.resolve().await.unwrap();
        selector.continue_as_guest().unwrap();
        assert_eq!(selector.current_mode(), Some(Mode::Guest));

        selector.logout().await.unwrap();
        assert_eq!(selector.current_mode(), None);
        assert!(!storage.contains(GUEST_SESSION_KEY));
    }

    #[tokio::test]
    async fn test_authenticated_logout_signs_out() {
        let identity = MockIdentity::default();
        let (mut selector, _, _) = selector(identity.clone());
        selector.signed_in(ada()).unwrap();

        identity.fail_sign_out.store(true, Ordering::SeqCst);
        let err = selector.logout().await.unwrap_err();
        assert!(matches!(err, SessionError::Identity(IdentityError::Status(500))));
        assert_eq!(selector.current_mode(), Some(Mode::Authenticated));

        identity.fail_sign_out.store(false, Ordering::SeqCst);
        selector.logout().await.unwrap();
        assert_eq!(selector.current_mode(), None);
        assert_eq!(identity.sign_outs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_transitions_are_rejected() {
        let (mut selector, _, _) = selector(MockIdentity::default());
        assert!(matches!(
            selector.logout().await,
            Err(SessionError::InvalidTransition { action: "log out", .. })
        ));

        selector.continue_as_guest().unwrap();
        let err = selector.signed_in(ada()).unwrap_err();
        assert_eq!(err.to_string(), "cannot sign in while in guest mode");
        assert!(selector.continue_as_guest().is_err());
        assert_eq!(selector.current_mode(), Some(Mode::Guest));

        selector.logout().await.unwrap();
        selector.signed_in(ada()).unwrap();
        assert!(selector.continue_as_guest().is_err());
        assert!(selector.resolve().await.is_err());
        assert_eq!(selector.current_mode(), Some(Mode::Authenticated));
    }

    #[tokio::test]
    async fn test_check_expiry() {
        let (mut selector, storage, clock) = selector(MockIdentity::default());
        assert!(!selector.check_expiry());

        selector.continue_as_guest().unwrap();
        clock.advance(chrono::Duration::hours(23));
        assert!(!selector.check_expiry());

        clock.advance(chrono::Duration::hours(1));
        assert!(selector.check_expiry());
        assert_eq!(selector.current_mode(), None);
        assert!(!storage.contains(GUEST_SESSION_KEY));
        assert!(!selector.check_expiry());
    }

    #[tokio::test]
    async fn test_check_expiry_after_external_cleanup() {
        let (mut selector, _, clock) = selector(MockIdentity::default());
        selector.continue_as_guest().unwrap();
        // A timer may already have swept storage
        clock.advance(chrono::Duration::hours(25));
        assert!(selector.sessions().sweep_expired());
        assert!(selector.check_expiry());
        assert_eq!(selector.current_mode(), None);
    }
}
