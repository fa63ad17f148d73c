use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};

use super::monitor::{ActivityMonitor, RenewalPrompt};
use super::scheduler::ExpiryScheduler;
use super::session::SessionStore;
use crate::models::User;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Active,
    /// Renewal prompt is open
    ExpiryWarning,
    /// Lifetime ran out; resolves to `Unauthenticated` once the store is cleared
    Expired,
}

/// Something `poll` observed that the host may want to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Expired,
    Renewed,
    RenewalDeclined,
}

type ExpiryHandler = Arc<dyn Fn() + Send + Sync>;

/// Owns the session store, the expiry timer and the activity monitor.
///
/// Call `poll` from the event loop; it fires whichever timers are due.
pub struct SessionManager {
    store: SessionStore,
    scheduler: ExpiryScheduler,
    monitor: Option<ActivityMonitor>,
    on_expire: ExpiryHandler,
    state: SessionState,
}

impl SessionManager {
    /// `on_expire` runs every time the session ends by timing out
    /// (typically: go back to the login view).
    pub fn new<F>(store: SessionStore, on_expire: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            store,
            scheduler: ExpiryScheduler::new(),
            monitor: None,
            on_expire: Arc::new(on_expire),
            state: SessionState::Unauthenticated,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, to: SessionState) {
        if self.state != to {
            debug!(from = ?self.state, to = ?to, "Session state change");
            self.state = to;
        }
    }

    /// Re-arm the expiry timer against the current start time.
    fn arm(&mut self) {
        let handler = Arc::clone(&self.on_expire);
        let fired = self.scheduler.arm(&self.store, move || handler());
        if fired {
            self.transition(SessionState::Expired);
            self.store.clear();
            self.transition(SessionState::Unauthenticated);
        }
    }

    /// Pick up a session persisted by an earlier run. Arms the expiry timer
    /// when one is found.
    pub fn restore(&mut self) -> Option<User> {
        match self.store.get_user() {
            Some(user) => {
                info!(email = %user.email, "Restored session");
                self.transition(SessionState::Active);
                self.arm();
                Some(user)
            }
            None => {
                self.scheduler.cancel();
                self.transition(SessionState::Unauthenticated);
                None
            }
        }
    }

    /// Start a session for a freshly authenticated user.
    pub fn login(&mut self, user: &User) {
        self.store.set_user(user);
        self.transition(SessionState::Active);
        self.arm();
        info!(email = %user.email, "Session started");
    }

    /// End the session: wipe the store and cancel the expiry timer.
    pub fn clear(&mut self) {
        self.scheduler.cancel();
        self.store.clear();
        self.transition(SessionState::Unauthenticated);
    }

    pub fn logout(&mut self) {
        info!("Logged out");
        self.clear();
    }

    /// Restart the session window and reschedule expiry. No-op when the
    /// session is not valid.
    pub fn extend(&mut self) -> bool {
        if !self.store.extend() {
            return false;
        }
        self.arm();
        true
    }

    pub fn is_valid(&self) -> bool {
        self.store.is_valid()
    }

    pub fn user(&mut self) -> Option<User> {
        self.store.get_user()
    }

    pub fn remaining(&self) -> Duration {
        self.store.remaining()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    pub fn is_expiry_armed(&self) -> bool {
        self.scheduler.is_armed()
    }

    // =========================================================================
    // Activity monitoring
    // =========================================================================

    /// Begin watching for activity. Restarting replaces the watchdog.
    pub fn start_monitoring(&mut self) {
        self.monitor = Some(ActivityMonitor::start(self.store.now_millis()));
        debug!("Activity monitoring started");
    }

    /// Stop watching. No renewal prompt fires after this returns.
    pub fn stop_monitoring(&mut self) {
        if let Some(mut monitor) = self.monitor.take() {
            monitor.stop();
            debug!("Activity monitoring stopped");
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_some()
    }

    /// Record user activity
    pub fn pulse(&mut self) {
        let now = self.store.now_millis();
        if let Some(ref mut monitor) = self.monitor {
            monitor.pulse(now);
        }
    }

    /// Fire due timers.
    ///
    /// The watchdog is checked first so a renewal prompt answered after the
    /// deadline still lets the expiry timer fire in the same poll. `prompt`
    /// runs while the manager is mutably borrowed, so it cannot re-enter.
    pub fn poll(&mut self, prompt: &mut dyn RenewalPrompt) -> Option<SessionEvent> {
        let mut event = None;

        let request = self
            .monitor
            .as_mut()
            .and_then(|monitor| monitor.poll(&self.store));
        if let Some(request) = request {
            self.transition(SessionState::ExpiryWarning);
            let accepted = prompt.confirm_renewal(&request);
            if accepted && self.extend() {
                info!("Session renewed");
                event = Some(SessionEvent::Renewed);
            } else {
                debug!(accepted, "Session not renewed");
                event = Some(SessionEvent::RenewalDeclined);
            }
            if self.store.is_valid() {
                self.transition(SessionState::Active);
            }
        }

        if self.scheduler.poll(&mut self.store) {
            self.transition(SessionState::Expired);
            self.transition(SessionState::Unauthenticated);
            return Some(SessionEvent::Expired);
        }

        event
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::auth::clock::ManualClock;
    use crate::auth::monitor::RenewalRequest;
    use crate::auth::store::MemoryStore;
    use crate::models::Position;

    const T0: i64 = 1_700_000_000_000;

    struct ScriptedPrompt {
        answer: bool,
        asked: Vec<RenewalRequest>,
    }

    impl ScriptedPrompt {
        fn answering(answer: bool) -> Self {
            Self {
                answer,
                asked: Vec::new(),
            }
        }
    }

    impl RenewalPrompt for ScriptedPrompt {
        fn confirm_renewal(&mut self, request: &RenewalRequest) -> bool {
            self.asked.push(request.clone());
            self.answer
        }
    }

    fn manager(clock: &ManualClock) -> (SessionManager, Arc<AtomicUsize>) {
        let expired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&expired);
        let store = SessionStore::new(MemoryStore::new(), Arc::new(clock.clone()));
        let manager = SessionManager::new(store, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (manager, expired)
    }

    fn user_a() -> User {
        User::new("A", "a@x.com", Position::Admin)
    }

    #[test]
    fn test_login_then_timeout() {
        let clock = ManualClock::new(T0);
        let (mut manager, expired) = manager(&clock);
        let mut prompt = ScriptedPrompt::answering(false);
        assert_eq!(manager.state(), SessionState::Unauthenticated);

        manager.login(&user_a());
        assert_eq!(manager.state(), SessionState::Active);
        assert!(manager.is_expiry_armed());

        clock.advance(Duration::minutes(30));
        assert_eq!(manager.poll(&mut prompt), Some(SessionEvent::Expired));
        assert_eq!(manager.state(), SessionState::Unauthenticated);
        assert_eq!(expired.load(Ordering::SeqCst), 1);
        assert_eq!(manager.user(), None);
    }

    #[test]
    fn test_idle_user_accepts_renewal() {
        let clock = ManualClock::new(T0);
        let (mut manager, expired) = manager(&clock);
        let mut prompt = ScriptedPrompt::answering(true);
        manager.login(&user_a());
        manager.start_monitoring();

        clock.advance(Duration::minutes(25));
        assert_eq!(manager.poll(&mut prompt), Some(SessionEvent::Renewed));
        assert_eq!(prompt.asked.len(), 1);
        assert_eq!(prompt.asked[0].remaining_minutes, 5);
        assert_eq!(manager.state(), SessionState::Active);
        assert_eq!(manager.remaining(), Duration::minutes(30));

        // The original deadline passes without expiring
        clock.advance(Duration::minutes(10));
        assert_eq!(manager.poll(&mut prompt), None);
        assert!(manager.is_valid());
        assert_eq!(expired.load(Ordering::SeqCst), 0);

        // Watchdog is idle until the next pulse, so no second prompt
        clock.advance(Duration::minutes(19));
        assert_eq!(manager.poll(&mut prompt), None);
        assert_eq!(prompt.asked.len(), 1);

        clock.advance(Duration::minutes(1));
        assert_eq!(manager.poll(&mut prompt), Some(SessionEvent::Expired));
        assert_eq!(expired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_idle_user_declines_renewal() {
        let clock = ManualClock::new(T0);
        let (mut manager, expired) = manager(&clock);
        let mut prompt = ScriptedPrompt::answering(false);
        manager.login(&user_a());
        manager.start_monitoring();

        clock.advance(Duration::minutes(25));
        assert_eq!(manager.poll(&mut prompt), Some(SessionEvent::RenewalDeclined));
        assert_eq!(manager.state(), SessionState::Active);

        clock.advance(Duration::minutes(5));
        assert_eq!(manager.poll(&mut prompt), Some(SessionEvent::Expired));
        assert_eq!(expired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_late_acceptance_still_expires() {
        let clock = ManualClock::new(T0);
        let (mut manager, expired) = manager(&clock);
        manager.login(&user_a());
        manager.start_monitoring();

        // The user walks away with the prompt open past expiry, then says yes
        let prompt_clock = clock.clone();
        let mut prompt = move |_: &RenewalRequest| {
            prompt_clock.advance(Duration::minutes(6));
            true
        };

        clock.advance(Duration::minutes(25));
        assert_eq!(manager.poll(&mut prompt), Some(SessionEvent::Expired));
        assert_eq!(manager.state(), SessionState::Unauthenticated);
        assert_eq!(expired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_active_user_is_never_prompted() {
        let clock = ManualClock::new(T0);
        let (mut manager, _) = manager(&clock);
        let mut prompt = ScriptedPrompt::answering(true);
        manager.login(&user_a());
        manager.start_monitoring();

        for _ in 0..29 {
            clock.advance(Duration::minutes(1));
            manager.pulse();
            assert_eq!(manager.poll(&mut prompt), None);
        }
        assert!(prompt.asked.is_empty());

        clock.advance(Duration::minutes(1));
        assert_eq!(manager.poll(&mut prompt), Some(SessionEvent::Expired));
    }

    #[test]
    fn test_stop_monitoring_prevents_prompt() {
        let clock = ManualClock::new(T0);
        let (mut manager, _) = manager(&clock);
        let mut prompt = ScriptedPrompt::answering(true);
        manager.login(&user_a());
        manager.start_monitoring();
        manager.stop_monitoring();
        assert!(!manager.is_monitoring());

        clock.advance(Duration::minutes(26));
        assert_eq!(manager.poll(&mut prompt), None);
        clock.advance(Duration::minutes(3));
        assert_eq!(manager.poll(&mut prompt), None);
        assert!(prompt.asked.is_empty());
    }

    #[test]
    fn test_logout_cancels_timer() {
        let clock = ManualClock::new(T0);
        let (mut manager, expired) = manager(&clock);
        let mut prompt = ScriptedPrompt::answering(false);
        manager.login(&user_a());
        manager.logout();
        assert!(!manager.is_expiry_armed());

        clock.advance(Duration::hours(1));
        assert_eq!(manager.poll(&mut prompt), None);
        assert_eq!(expired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_restore_arms_timer_for_persisted_session() {
        let clock = ManualClock::new(T0);
        let (mut manager, expired) = manager(&clock);
        let mut prompt = ScriptedPrompt::answering(false);
        manager.store_mut().set_user(&user_a());

        clock.advance(Duration::minutes(12));
        assert_eq!(manager.restore(), Some(user_a()));
        assert_eq!(manager.state(), SessionState::Active);

        clock.advance(Duration::minutes(18));
        assert_eq!(manager.poll(&mut prompt), Some(SessionEvent::Expired));
        assert_eq!(expired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_restore_without_session() {
        let clock = ManualClock::new(T0);
        let (mut manager, expired) = manager(&clock);
        assert_eq!(manager.restore(), None);
        assert_eq!(manager.state(), SessionState::Unauthenticated);
        assert!(!manager.is_expiry_armed());
        assert_eq!(expired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_restore_rejects_out_of_range_login_time() {
        use crate::auth::session::{LOGIN_TIME_KEY, USER_KEY};

        let clock = ManualClock::new(T0);
        let user = serde_json::to_string(&user_a()).unwrap();
        let tomorrow = (T0 + 24 * 60 * 60 * 1000).to_string();

        for started in [i64::MIN.to_string(), i64::MAX.to_string(), tomorrow] {
            let (mut manager, expired) = manager(&clock);
            let backend = manager.store_mut().backend_mut();
            backend.set(USER_KEY, &user).unwrap();
            backend.set(LOGIN_TIME_KEY, &started).unwrap();

            assert_eq!(manager.restore(), None, "loginTime {}", started);
            assert_eq!(manager.state(), SessionState::Unauthenticated);
            assert!(!manager.is_expiry_armed());
            assert_eq!(expired.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn test_extend_requires_valid_session() {
        let clock = ManualClock::new(T0);
        let (mut manager, _) = manager(&clock);
        assert!(!manager.extend());
        manager.login(&user_a());
        clock.advance(Duration::minutes(29));
        assert!(manager.extend());
        assert_eq!(manager.remaining(), Duration::minutes(30));
    }

    #[test]
    fn test_instances_do_not_interfere() {
        let clock = ManualClock::new(T0);
        let (mut first, first_expired) = manager(&clock);
        let (mut second, second_expired) = manager(&clock);
        let mut prompt = ScriptedPrompt::answering(false);

        first.login(&user_a());
        clock.advance(Duration::minutes(10));
        second.login(&user_a());

        clock.advance(Duration::minutes(20));
        assert_eq!(first.poll(&mut prompt), Some(SessionEvent::Expired));
        assert_eq!(second.poll(&mut prompt), None);
        assert_eq!(first_expired.load(Ordering::SeqCst), 1);
        assert_eq!(second_expired.load(Ordering::SeqCst), 0);
    }
}
