//! # Application context
//!
//! [`AppContext`] owns everything a running client needs: the session
//! selector, the backend handle, the list controller for the current mode and
//! the guest expiry timer. Every session transition goes through it so the
//! controller always matches the selector:
//!
//! | Mode | Controller | Expiry timer |
//! |------|------------|--------------|
//! | Unauthenticated | none | stopped |
//! | Guest | guest store loaded from storage | running (native targets) |
//! | Authenticated | remote store subscribed to the backend | stopped |
//!
//! Native builds need a tokio runtime for the timer and the remote
//! subscription. A transition made outside one still updates the selector but
//! leaves the timer stopped and, in Authenticated mode, the controller unbuilt.
//!
//! Timer events are read with [`next_event`](AppContext::next_event) and fed
//! back with [`apply_event`](AppContext::apply_event). Browser builds have no
//! timer and call [`check_expiry`](AppContext::check_expiry) from their own
//! interval instead.

use tokio::sync::mpsc;

use crate::clock::Clock;
use crate::config::OwlConfig;
use crate::error::SessionError;
use crate::guest::{GuestSession, GuestSessions};
use crate::guest_store::GuestStore;
use crate::list::{ActiveStore, ListController};
use crate::models::UserInfo;
use crate::remote::{EntryBackend, RemoteStore};
use crate::session::{IdentityProvider, Mode, SessionEvent, SessionSelector};
use crate::storage::KeyValueStore;

#[cfg(not(target_arch = "wasm32"))]
use crate::timer::{ExpiryTimer, TaskHandle};

pub struct AppContext<S, C, I, B: EntryBackend> {
    selector: SessionSelector<S, C, I>,
    backend: B,
    config: OwlConfig,
    controller: Option<ListController<S, C, B>>,
    #[cfg(not(target_arch = "wasm32"))]
    timer: Option<TaskHandle>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl<S, C, I, B> AppContext<S, C, I, B>
where
    S: KeyValueStore + Clone + Send + 'static,
    C: Clock + Clone + Send + 'static,
    I: IdentityProvider,
    B: EntryBackend + Clone,
{
    pub fn new(storage: S, clock: C, identity: I, backend: B, config: OwlConfig) -> Self {
        let sessions = GuestSessions::with_config(storage, clock, &config.guest);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            selector: SessionSelector::new(sessions, identity),
            backend,
            config,
            controller: None,
            #[cfg(not(target_arch = "wasm32"))]
            timer: None,
            events_tx,
            events_rx,
        }
    }

    pub fn selector(&self) -> &SessionSelector<S, C, I> {
        &self.selector
    }

    pub fn config(&self) -> &OwlConfig {
        &self.config
    }

    pub fn mode(&self) -> Option<Mode> {
        self.selector.current_mode()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.selector.display_name()
    }

    pub fn controller(&self) -> Option<&ListController<S, C, B>> {
        self.controller.as_ref()
    }

    pub fn controller_mut(&mut self) -> Option<&mut ListController<S, C, B>> {
        self.controller.as_mut()
    }

    /// Sender for injecting events, e.g. from a browser interval.
    pub fn events(&self) -> mpsc::UnboundedSender<SessionEvent> {
        self.events_tx.clone()
    }

    /// Restore the session found at startup. Call inside a tokio runtime.
    pub async fn resolve(&mut self) -> Result<Option<Mode>, SessionError> {
        let mode = self.selector.resolve().await?;
        self.rebuild();
        Ok(mode)
    }

    pub fn continue_as_guest(&mut self) -> Result<GuestSession, SessionError> {
        let session = self.selector.continue_as_guest()?;
        self.rebuild();
        Ok(session)
    }

    /// Enter Authenticated mode. Outside a tokio runtime the selector moves
    /// but no controller is built.
    pub fn signed_in(&mut self, user: UserInfo) -> Result<(), SessionError> {
        self.selector.signed_in(user)?;
        self.rebuild();
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<(), SessionError> {
        self.selector.logout().await?;
        self.rebuild();
        Ok(())
    }

    /// Run the guest expiry check now. Returns whether the session ended.
    pub fn check_expiry(&mut self) -> bool {
        let expired = self.selector.check_expiry();
        if expired {
            self.rebuild();
        }
        expired
    }

    /// Wait for the next background event.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    pub fn apply_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::GuestExpired => {
                self.check_expiry();
            }
        }
    }

    fn rebuild(&mut self) {
        let store = match self.selector.current_mode() {
            Some(Mode::Guest) => {
                self.start_timer();
                Some(ActiveStore::Guest(GuestStore::load(self.selector.sessions())))
            }
            Some(Mode::Authenticated) => {
                self.stop_timer();
                if runtime_available() {
                    Some(ActiveStore::Remote(RemoteStore::new(self.backend.clone())))
                } else {
                    tracing::warn!("no async runtime, remote store not subscribed");
                    None
                }
            }
            None => {
                self.stop_timer();
                None
            }
        };
        tracing::debug!(mode = ?self.selector.current_mode(), "list controller rebuilt");
        self.controller = store.map(ListController::new);
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn start_timer(&mut self) {
        if !runtime_available() {
            tracing::warn!("no async runtime, guest expiry timer not started");
            return;
        }
        self.timer = Some(ExpiryTimer::start(
            self.selector.sessions().clone(),
            self.config.guest.expiry_check_interval(),
            self.events_tx.clone(),
        ));
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn stop_timer(&mut self) {
        self.timer = None;
    }

    #[cfg(target_arch = "wasm32")]
    fn start_timer(&mut self) {}

    #[cfg(target_arch = "wasm32")]
    fn stop_timer(&mut self) {}
}

#[cfg(not(target_arch = "wasm32"))]
fn runtime_available() -> bool {
    tokio::runtime::Handle::try_current().is_ok()
}

#[cfg(target_arch = "wasm32")]
fn runtime_available() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::DateTime;

    use crate::clock::ManualClock;
    use crate::error::IdentityError;
    use crate::models::{EntryFields, EntryType};
    use crate::storage::GUEST_ENTRIES_KEY;
    use crate::{MemoryBackend, MemoryStorage};

    #[derive(Clone, Default)]
    struct StaticIdentity(Option<UserInfo>);

    impl IdentityProvider for StaticIdentity {
        async fn current_user(&self) -> Result<Option<UserInfo>, IdentityError> {
            Ok(self.0.clone())
        }

        async fn sign_out(&self) -> Result<(), IdentityError> {
            Ok(())
        }
    }

    type Context = AppContext<MemoryStorage, ManualClock, StaticIdentity, MemoryBackend>;

    fn context(identity: StaticIdentity) -> (Context, MemoryStorage, ManualClock, MemoryBackend) {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(DateTime::from_timestamp_millis(1_700_000_000_000).unwrap());
        let backend = MemoryBackend::new();
        let ctx = AppContext::new(
            storage.clone(),
            clock.clone(),
            identity,
            backend.clone(),
            OwlConfig::default(),
        );
        (ctx, storage, clock, backend)
    }

    fn docs() -> EntryFields {
        EntryFields::new("Docs", EntryType::Written, "https://docs.rs", "Rust")
    }

    #[tokio::test]
    async fn test_guest_flow() {
        let (mut ctx, storage, _, backend) = context(StaticIdentity::default());
        assert_eq!(ctx.resolve().await.unwrap(), None);
        assert!(ctx.controller().is_none());

        let session = ctx.continue_as_guest().unwrap();
        assert_eq!(ctx.display_name(), Some(session.email.as_str()));
        let controller = ctx.controller_mut().unwrap();
        assert_eq!(controller.mode(), Mode::Guest);
        controller.create(docs()).await.unwrap();
        assert!(storage.contains(GUEST_ENTRIES_KEY));
        assert!(backend.snapshot().is_empty());

        ctx.logout().await.unwrap();
        assert!(ctx.controller().is_none());
        assert!(!storage.contains(GUEST_ENTRIES_KEY));
    }

    #[tokio::test]
    async fn test_resolve_restores_guest_entries() {
        let (mut ctx, storage, clock, backend) = context(StaticIdentity::default());
        ctx.continue_as_guest().unwrap();
        ctx.controller_mut().unwrap().create(docs()).await.unwrap();

        let mut restored = AppContext::new(
            storage,
            clock,
            StaticIdentity::default(),
            backend,
            OwlConfig::default(),
        );
        assert_eq!(restored.resolve().await.unwrap(), Some(Mode::Guest));
        assert_eq!(restored.controller().unwrap().list().len(), 1);
    }

    #[tokio::test]
    async fn test_authenticated_flow_uses_backend() {
        let user = UserInfo {
            id: "u1".to_string(),
            email: "ada@example.com".to_string(),
            name: None,
            avatar_url: None,
            provider: "cognito".to_string(),
        };
        let (mut ctx, storage, _, backend) = context(StaticIdentity(Some(user)));
        assert_eq!(ctx.resolve().await.unwrap(), Some(Mode::Authenticated));
        assert_eq!(ctx.display_name(), Some("ada@example.com"));

        let controller = ctx.controller_mut().unwrap();
        controller.create(docs()).await.unwrap();
        assert!(controller.changed().await);
        assert_eq!(controller.list().len(), 1);
        assert_eq!(backend.snapshot().len(), 1);
        assert!(!storage.contains(GUEST_ENTRIES_KEY));

        ctx.logout().await.unwrap();
        assert!(ctx.controller().is_none());
        assert!(ctx.continue_as_guest().is_ok());
    }

    #[test]
    fn test_signed_in_outside_runtime() {
        let (mut ctx, _, _, backend) = context(StaticIdentity::default());
        ctx.signed_in(UserInfo {
            id: "u2".to_string(),
            email: "bo@example.com".to_string(),
            name: None,
            avatar_url: None,
            provider: "cognito".to_string(),
        })
        .unwrap();
        assert_eq!(ctx.mode(), Some(Mode::Authenticated));
        assert!(ctx.controller().is_none());
        assert!(backend.snapshot().is_empty());

        // Guest transitions still work, just without the timer
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(ctx.logout()).unwrap();
        ctx.continue_as_guest().unwrap();
        assert_eq!(ctx.controller().unwrap().mode(), Mode::Guest);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_expires_guest() {
        let (mut ctx, storage, clock, _) = context(StaticIdentity::default());
        ctx.continue_as_guest().unwrap();
        ctx.controller_mut().unwrap().create(docs()).await.unwrap();

        clock.advance(chrono::Duration::hours(24));
        let event = tokio::time::timeout(Duration::from_secs(120), ctx.next_event())
            .await
            .unwrap();
        assert_eq!(event, Some(SessionEvent::GuestExpired));
        assert!(!storage.contains(GUEST_ENTRIES_KEY));

        ctx.apply_event(SessionEvent::GuestExpired);
        assert_eq!(ctx.mode(), None);
        assert!(ctx.controller().is_none());
    }

    #[tokio::test]
    async fn test_check_expiry_without_timer() {
        let (mut ctx, _, clock, _) = context(StaticIdentity::default());
        ctx.continue_as_guest().unwrap();
        assert!(!ctx.check_expiry());
        clock.advance(chrono::Duration::hours(25));
        assert!(ctx.check_expiry());
        assert!(ctx.controller().is_none());
    }
}
