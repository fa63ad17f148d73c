//! Authentication module for managing the dashboard session and credentials.
//!
//! This module provides:
//! - `SessionStore`: the signed-in identity and session start time, kept in a
//!   durable `KeyValueStore` so it survives restarts
//! - `ExpiryScheduler`: one-shot timer that ends the session when its
//!   30 minute lifetime runs out
//! - `ActivityMonitor`: inactivity watchdog that offers renewal near the end
//!   of the window
//! - `SessionManager`: owns all of the above with an explicit lifecycle
//! - `CredentialStore`: OS keychain storage for "remember me"
//!
//! Timers are deadlines checked by `SessionManager::poll`, driven by the
//! host's event loop over an injected `Clock`.

pub mod clock;
pub mod credentials;
pub mod manager;
pub mod monitor;
pub mod scheduler;
pub mod session;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::CredentialStore;
pub use manager::{SessionEvent, SessionManager, SessionState};
pub use monitor::{ActivityMonitor, RenewalPrompt, RenewalRequest};
pub use scheduler::ExpiryScheduler;
pub use session::SessionStore;
pub use store::{FileStore, KeyValueStore, MemoryStore};
