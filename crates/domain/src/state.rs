//! Automation state — the single mutable record driving the automation.
//!
//! Created once at startup, mutated by the toggle control, manual resets and
//! successful clicks, and dropped on shutdown. Nothing here is persisted.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::time::{Timestamp, elapsed_between};

/// Phase of the automation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    RunningActive,
    RunningPaused,
    /// Terminal: the session bound was exceeded.
    Expired,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunningActive => f.write_str("running_active"),
            Self::RunningPaused => f.write_str("running_paused"),
            Self::Expired => f.write_str("expired"),
        }
    }
}

/// Mutable automation state.
///
/// Invariants:
/// - `last_action` never moves backwards.
/// - once `expired` is set it is never cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutomationState {
    active: bool,
    last_action: Option<Timestamp>,
    session_start: Timestamp,
    max_duration: Option<Duration>,
    expired: bool,
}

impl AutomationState {
    /// Start a session at `now`.
    ///
    /// `max_duration` of `None` means the session never expires.
    #[must_use]
    pub fn new(active: bool, max_duration: Option<Duration>, now: Timestamp) -> Self {
        Self {
            active,
            last_action: None,
            session_start: now,
            max_duration,
            expired: false,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn last_action(&self) -> Option<Timestamp> {
        self.last_action
    }

    #[must_use]
    pub fn session_start(&self) -> Timestamp {
        self.session_start
    }

    #[must_use]
    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Current phase. Expiry takes precedence over the active flag.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.expired {
            SessionPhase::Expired
        } else if self.active {
            SessionPhase::RunningActive
        } else {
            SessionPhase::RunningPaused
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Flip the active flag and return the new value.
    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        self.active
    }

    /// Time since the session (re)started.
    #[must_use]
    pub fn elapsed(&self, now: Timestamp) -> Duration {
        elapsed_between(self.session_start, now)
    }

    /// Latch expiry when the session bound is exceeded and report whether
    /// the session is expired.
    pub fn check_expiry(&mut self, now: Timestamp) -> bool {
        if !self.expired
            && let Some(bound) = self.max_duration
            && self.elapsed(now) > bound
        {
            self.expired = true;
        }
        self.expired
    }

    /// Whether a click at `now` would fall inside the cooldown window.
    #[must_use]
    pub fn in_cooldown(&self, now: Timestamp, cooldown: Duration) -> bool {
        self.last_action
            .is_some_and(|last| elapsed_between(last, now) < cooldown)
    }

    /// Record a successful click. Earlier timestamps than the stored one are ignored.
    pub fn record_action(&mut self, at: Timestamp) {
        if self.last_action.is_none_or(|last| at > last) {
            self.last_action = Some(at);
        }
    }

    /// Restart the session timer. Has no effect once expired, including a
    /// bound that passed since the last expiry check.
    ///
    /// Returns whether the reset was applied.
    pub fn reset_session(&mut self, now: Timestamp) -> bool {
        if self.check_expiry(now) {
            return false;
        }
        self.session_start = now;
        true
    }
}
