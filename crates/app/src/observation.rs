//! Observation layer — decides which host mutations call for re-injection,
//! and debounces the resulting attempts.

use std::time::Duration;

use tokio::time::Instant;

use autoresume_domain::layout::HostLayout;

use crate::ports::{Document, MutationRecord};

/// Classifies host mutation batches.
pub struct ObservationLayer {
    layout: HostLayout,
}

impl ObservationLayer {
    #[must_use]
    pub fn new(layout: HostLayout) -> Self {
        Self { layout }
    }

    /// Whether `batch` warrants a re-injection attempt: a button container
    /// was (re)rendered, or the control is gone from the tree.
    pub fn needs_reinjection<D: Document>(
        &self,
        doc: &D,
        batch: &[MutationRecord<D::Node>],
    ) -> bool {
        let container_added = batch
            .iter()
            .flat_map(|record| &record.added)
            .any(|node| {
                doc.matches(node, &self.layout.button_container)
                    || doc.query(node, &self.layout.button_container).is_some()
            });
        container_added || doc.query(&doc.root(), &self.layout.control()).is_none()
    }
}

/// A one-shot timer that keeps its first deadline while armed.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arm the timer relative to `now`. No effect while already armed, or
    /// when the deadline falls outside the clock's range.
    pub fn arm(&mut self, now: Instant) {
        if self.deadline.is_none() {
            self.deadline = now.checked_add(self.delay);
        }
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarm and report whether the deadline had passed at `now`.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
