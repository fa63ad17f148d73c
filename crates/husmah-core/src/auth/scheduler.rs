use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, info};

use super::session::SessionStore;

pub type ExpiryCallback = Box<dyn FnOnce() + Send>;

struct ArmedTimer {
    deadline_millis: i64,
    on_expire: ExpiryCallback,
}

/// One-shot timer that ends the session when its lifetime runs out.
///
/// At most one timer is outstanding; arming again replaces it.
#[derive(Default)]
pub struct ExpiryScheduler {
    armed: Option<ArmedTimer>,
}

impl ExpiryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `on_expire` for when `session` runs out.
    ///
    /// Any previously armed timer is cancelled first. If no time is left the
    /// callback runs immediately and `true` is returned.
    pub fn arm<F>(&mut self, session: &SessionStore, on_expire: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        let remaining = session.remaining().num_milliseconds();
        if remaining <= 0 {
            info!("Session already expired when arming timer");
            run_guarded(Box::new(on_expire));
            return true;
        }

        let deadline_millis = session.now_millis().saturating_add(remaining);
        debug!(remaining_ms = remaining, "Expiry timer armed");
        self.armed = Some(ArmedTimer {
            deadline_millis,
            on_expire: Box::new(on_expire),
        });
        false
    }

    /// Drop the outstanding timer without firing it.
    pub fn cancel(&mut self) {
        if self.armed.take().is_some() {
            debug!("Expiry timer cancelled");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn deadline_millis(&self) -> Option<i64> {
        self.armed.as_ref().map(|t| t.deadline_millis)
    }

    /// Fire the timer if its deadline has passed: clear the session, then
    /// run the callback. Returns whether it fired.
    pub fn poll(&mut self, session: &mut SessionStore) -> bool {
        let due = self
            .armed
            .as_ref()
            .is_some_and(|t| session.now_millis() >= t.deadline_millis);
        if !due {
            return false;
        }
        let Some(timer) = self.armed.take() else {
            return false;
        };

        info!("Session expired");
        session.clear();
        run_guarded(timer.on_expire);
        true
    }
}

/// Run an expiry callback, containing any panic it raises.
fn run_guarded(on_expire: ExpiryCallback) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(on_expire)) {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        error!(panic = %message, "Session expiry callback panicked");
    }
}
