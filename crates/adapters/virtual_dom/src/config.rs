//! Simulated host configuration.

use std::time::Duration;

use serde::Deserialize;

/// Cadence of the simulated chat host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Delay before the composer button bar is first rendered.
    pub startup_delay_ms: u64,
    /// Period between re-renders of the button bar; `0` disables them.
    pub rerender_interval_ms: u64,
    /// Period between posted notices; `0` disables them.
    pub notice_interval_ms: u64,
    /// Messages kept in the chat window before the oldest are dropped.
    pub history_limit: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: 1500,
            rerender_interval_ms: 7000,
            notice_interval_ms: 4000,
            history_limit: 20,
        }
    }
}

impl DemoConfig {
    #[must_use]
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    #[must_use]
    pub fn rerender_interval(&self) -> Option<Duration> {
        (self.rerender_interval_ms > 0).then(|| Duration::from_millis(self.rerender_interval_ms))
    }

    #[must_use]
    pub fn notice_interval(&self) -> Option<Duration> {
        (self.notice_interval_ms > 0).then(|| Duration::from_millis(self.notice_interval_ms))
    }
}
