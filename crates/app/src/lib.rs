//! # autoresume-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** the host side must implement (driven/outbound ports):
//!   - `Document` — structural queries, text reads, mutation and activation
//!     of the host document tree, plus its change notifications
//!   - `Clock` — wall-clock time for cooldowns and session bounds
//! - Define the **use-cases**:
//!   - `DetectionEngine` — find and click at most one recovery action per scan
//!   - `InjectionManager` — keep exactly one toggle control in the host button bar
//!   - `ObservationLayer` — decide when a mutation batch calls for re-injection
//!   - `Scheduler` — the single event loop driving all of the above
//!
//! ## Dependency rule
//! Depends on `autoresume-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod detection;
pub mod injection;
pub mod observation;
pub mod ports;
pub mod scheduler;

#[cfg(test)]
mod testing;
