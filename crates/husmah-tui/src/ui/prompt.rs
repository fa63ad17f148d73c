//! Terminal implementation of the session renewal prompt.

use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, warn};

use husmah_core::auth::{Clock, RenewalPrompt, RenewalRequest};

use super::render::render_renewal_overlay;

/// Redraw interval while waiting for an answer (keeps the countdown moving)
const PROMPT_POLL_MS: u64 = 250;

/// Modal yes/no dialog drawn over the dashboard. Blocks until answered or
/// until the session runs out, which counts as "no".
pub struct TerminalRenewalPrompt<'a> {
    terminal: &'a mut Terminal<CrosstermBackend<Stdout>>,
    clock: Arc<dyn Clock>,
}

impl<'a> TerminalRenewalPrompt<'a> {
    /// `clock` must be the one the session runs on.
    pub fn new(
        terminal: &'a mut Terminal<CrosstermBackend<Stdout>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { terminal, clock }
    }
}

/// Time until the session in `request` runs out, as seen by `clock`
pub fn time_left(clock: &dyn Clock, request: &RenewalRequest) -> chrono::Duration {
    let left = request
        .expires_at
        .timestamp_millis()
        .saturating_sub(clock.now_millis());
    chrono::Duration::milliseconds(left.max(0))
}

impl RenewalPrompt for TerminalRenewalPrompt<'_> {
    fn confirm_renewal(&mut self, request: &RenewalRequest) -> bool {
        debug!(remaining_minutes = request.remaining_minutes, "Offering session renewal");
        loop {
            let left = time_left(self.clock.as_ref(), request);
            if left.is_zero() {
                return false;
            }

            if let Err(e) = self.terminal.draw(|f| render_renewal_overlay(f, request, left)) {
                warn!(error = %e, "Failed to draw renewal prompt");
                return false;
            }

            match event::poll(Duration::from_millis(PROMPT_POLL_MS)) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    warn!(error = %e, "Failed to poll terminal events");
                    return false;
                }
            }

            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if let Some(answer) = renewal_answer(key.code) {
                        return answer;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Failed to read terminal event");
                    return false;
                }
            }
        }
    }
}

/// Map a key to an answer; other keys are ignored.
pub fn renewal_answer(code: KeyCode) -> Option<bool> {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(true),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use husmah_core::auth::ManualClock;

    use super::*;

    const T0: i64 = 1_700_000_000_000;

    fn request_expiring_at(millis: i64) -> RenewalRequest {
        RenewalRequest {
            remaining_minutes: 5,
            expires_at: DateTime::from_timestamp_millis(millis).unwrap(),
        }
    }

    #[test]
    fn test_time_left_follows_session_clock() {
        let clock = ManualClock::new(T0);
        let request = request_expiring_at(T0 + 300_000);
        assert_eq!(time_left(&clock, &request), chrono::Duration::minutes(5));

        clock.advance(chrono::Duration::minutes(4));
        assert_eq!(time_left(&clock, &request), chrono::Duration::minutes(1));

        clock.advance(chrono::Duration::minutes(2));
        assert!(time_left(&clock, &request).is_zero());
    }

    #[test]
    fn test_renewal_answer() {
        assert_eq!(renewal_answer(KeyCode::Char('y')), Some(true));
        assert_eq!(renewal_answer(KeyCode::Enter), Some(true));
        assert_eq!(renewal_answer(KeyCode::Char('N')), Some(false));
        assert_eq!(renewal_answer(KeyCode::Esc), Some(false));
        assert_eq!(renewal_answer(KeyCode::Char('x')), None);
        assert_eq!(renewal_answer(KeyCode::Tab), None);
    }
}
