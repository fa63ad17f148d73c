use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::session::SessionStore;

/// Continuous inactivity before the watchdog checks in (25 minutes).
pub const INACTIVITY_WATCHDOG_MS: i64 = 25 * 60 * 1000;

/// Renewal is offered only when at most this many minutes remain.
pub const RENEWAL_WARNING_MINUTES: i64 = 5;

/// Details handed to the renewal prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalRequest {
    /// Whole minutes left, rounded up
    pub remaining_minutes: i64,
    pub expires_at: DateTime<Utc>,
}

impl RenewalRequest {
    pub fn message(&self) -> String {
        format!(
            "Your session will expire in {} minutes. Do you want to extend it?",
            self.remaining_minutes
        )
    }
}

/// Asks the user whether to extend the session. Returning `false` covers
/// both "no" and "no answer".
pub trait RenewalPrompt {
    fn confirm_renewal(&mut self, request: &RenewalRequest) -> bool;
}

impl<F> RenewalPrompt for F
where
    F: FnMut(&RenewalRequest) -> bool,
{
    fn confirm_renewal(&mut self, request: &RenewalRequest) -> bool {
        self(request)
    }
}

/// Inactivity watchdog fed by activity pulses.
///
/// Each pulse pushes the watchdog out to 25 minutes from now. When it fires
/// it goes idle until the next pulse.
#[derive(Debug, Default)]
pub struct ActivityMonitor {
    watchdog_deadline: Option<i64>,
}

impl ActivityMonitor {
    /// Start watching, with the watchdog armed from `now_millis`.
    pub fn start(now_millis: i64) -> Self {
        let mut monitor = Self::default();
        monitor.pulse(now_millis);
        monitor
    }

    pub fn pulse(&mut self, now_millis: i64) {
        self.watchdog_deadline = Some(now_millis + INACTIVITY_WATCHDOG_MS);
    }

    pub fn stop(&mut self) {
        self.watchdog_deadline = None;
    }

    pub fn watchdog_deadline(&self) -> Option<i64> {
        self.watchdog_deadline
    }

    /// Fire the watchdog if due. Returns a renewal request when the session
    /// is still valid and close enough to expiry to offer one.
    pub fn poll(&mut self, session: &SessionStore) -> Option<RenewalRequest> {
        let now = session.now_millis();
        let deadline = self.watchdog_deadline?;
        if now < deadline {
            return None;
        }
        self.watchdog_deadline = None;

        if !session.is_valid() {
            debug!("Inactivity watchdog fired without a valid session");
            return None;
        }

        let remaining = session.remaining();
        let remaining_minutes = ceil_minutes(remaining);
        debug!(remaining_minutes, "Inactivity watchdog fired");
        if remaining_minutes > RENEWAL_WARNING_MINUTES {
            return None;
        }

        let expires_at =
            DateTime::from_timestamp_millis(now.saturating_add(remaining.num_milliseconds()))
                .unwrap_or_else(Utc::now);
        Some(RenewalRequest {
            remaining_minutes,
            expires_at,
        })
    }
}

fn ceil_minutes(d: Duration) -> i64 {
    let ms = d.num_milliseconds().max(0);
    (ms + 59_999) / 60_000
}
