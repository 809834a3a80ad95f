//! Automation settings — cadence, cooldown, session bound and scenario table.
//!
//! The scenario list, the session bound and the initial active flag are
//! independent axes. A [`Profile`] only supplies the default session bound.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AutoResumeError, ValidationError};
use crate::scenario::{Scenario, default_scenarios};

/// Length of the bounded session profile.
pub const SESSION_PROFILE_BOUND: Duration = Duration::from_secs(30 * 60);

/// Upper bound of the timer periods (one day).
pub const MAX_PERIOD_MS: u64 = 24 * 60 * 60 * 1000;

/// Preset supplying the default session bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Runs until shut down; the user pauses it with the toggle.
    #[default]
    Toggle,
    /// Stops for good after [`SESSION_PROFILE_BOUND`].
    Session,
}

impl Profile {
    /// Session bound implied by this profile.
    #[must_use]
    pub fn default_max_duration(self) -> Option<Duration> {
        match self {
            Self::Toggle => None,
            Self::Session => Some(SESSION_PROFILE_BOUND),
        }
    }
}

impl std::str::FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "toggle" => Ok(Self::Toggle),
            "session" => Ok(Self::Session),
            other => Err(format!("unknown profile {other:?}")),
        }
    }
}

/// Settings of the detection loop and the injected control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationSettings {
    pub profile: Profile,
    /// Period between detection scans.
    pub poll_interval_ms: u64,
    /// Minimum time between two clicks.
    pub cooldown_ms: u64,
    /// Session bound; `0` disables it, absent falls back to the profile.
    pub max_duration_ms: Option<u64>,
    /// Whether the automation starts enabled.
    pub start_active: bool,
    /// Period between injection attempts until the control is first placed.
    pub injection_retry_ms: u64,
    /// Settle delay between a host mutation and the re-injection attempt.
    pub reinject_debounce_ms: u64,
    /// Ordered scenario table; earlier entries win.
    pub scenarios: Vec<Scenario>,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            poll_interval_ms: 1000,
            cooldown_ms: 3000,
            max_duration_ms: None,
            start_active: true,
            injection_retry_ms: 1000,
            reinject_debounce_ms: 100,
            scenarios: default_scenarios(),
        }
    }
}

impl AutomationSettings {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    #[must_use]
    pub fn injection_retry(&self) -> Duration {
        Duration::from_millis(self.injection_retry_ms)
    }

    #[must_use]
    pub fn reinject_debounce(&self) -> Duration {
        Duration::from_millis(self.reinject_debounce_ms)
    }

    /// Effective session bound: explicit setting first, then the profile.
    #[must_use]
    pub fn max_duration(&self) -> Option<Duration> {
        match self.max_duration_ms {
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
            None => self.profile.default_max_duration(),
        }
    }

    /// Check invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AutoResumeError::Validation`] when a period is zero or
    /// longer than [`MAX_PERIOD_MS`], or a scenario is invalid.
    pub fn validate(&self) -> Result<(), AutoResumeError> {
        for (field, value) in [
            ("poll_interval_ms", self.poll_interval_ms),
            ("injection_retry_ms", self.injection_retry_ms),
            ("reinject_debounce_ms", self.reinject_debounce_ms),
        ] {
            if value == 0 {
                return Err(ValidationError::ZeroDuration { field }.into());
            }
            if value > MAX_PERIOD_MS {
                return Err(ValidationError::DurationTooLong {
                    field,
                    max_ms: MAX_PERIOD_MS,
                }
                .into());
            }
        }
        self.scenarios.iter().try_for_each(Scenario::validate)
    }
}
