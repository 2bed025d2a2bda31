//! Background tasks: the periodic guest expiry check.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::clock::Clock;
use crate::guest::GuestSessions;
use crate::session::SessionEvent;
use crate::storage::KeyValueStore;

/// Owns a spawned task and aborts it when dropped.
#[derive(Debug)]
pub struct TaskHandle {
    handle: JoinHandle<()>,
}

impl TaskHandle {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    pub fn cancel(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Periodic guest expiry check.
pub struct ExpiryTimer;

impl ExpiryTimer {
    /// Check the persisted expiry every `every`.
    ///
    /// On expiry the guest data is cleaned up, [`SessionEvent::GuestExpired`]
    /// is sent once and the task ends. Must be called inside a tokio runtime.
    pub fn start<S, C>(
        sessions: GuestSessions<S, C>,
        every: Duration,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> TaskHandle
    where
        S: KeyValueStore + Send + 'static,
        C: Clock + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + every, every);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if sessions.sweep_expired() {
                    // Receiver may already be gone
                    let _ = events.send(SessionEvent::GuestExpired);
                    break;
                }
            }
            tracing::debug!("expiry timer stopped");
        });
        TaskHandle::new(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    use crate::clock::ManualClock;
    use crate::storage::{GUEST_ENTRIES_KEY, GUEST_SESSION_KEY};
    use crate::MemoryStorage;

    fn sessions() -> (GuestSessions<MemoryStorage, ManualClock>, MemoryStorage, ManualClock) {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(DateTime::from_timestamp_millis(1_700_000_000_000).unwrap());
        let sessions = GuestSessions::new(storage.clone(), clock.clone());
        sessions.create().unwrap();
        storage.set(GUEST_ENTRIES_KEY, "[]").unwrap();
        (sessions, storage, clock)
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_emits_expiry_and_cleans_up() {
        let (sessions, storage, clock) = sessions();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = ExpiryTimer::start(sessions, Duration::from_secs(60), tx);

        tokio::time::sleep(Duration::from_secs(150)).await;
        assert!(rx.try_recv().is_err());
        assert!(storage.contains(GUEST_SESSION_KEY));

        clock.advance(chrono::Duration::hours(24));
        assert_eq!(rx.recv().await, Some(SessionEvent::GuestExpired));
        assert!(!storage.contains(GUEST_SESSION_KEY));
        assert!(!storage.contains(GUEST_ENTRIES_KEY));

        // The task ends after reporting
        assert_eq!(rx.recv().await, None);
        drop(handle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_timer() {
        let (sessions, storage, clock) = sessions();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = ExpiryTimer::start(sessions, Duration::from_secs(60), tx);

        handle.cancel();
        clock.advance(chrono::Duration::hours(48));
        assert_eq!(rx.recv().await, None);
        assert!(storage.contains(GUEST_SESSION_KEY));
    }
}
