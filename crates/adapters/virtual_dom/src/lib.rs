//! # autoresume-adapter-virtual-dom
//!
//! In-memory host document and a simulated chat host, for demonstration and
//! end-to-end testing without a real UI.
//!
//! ## Provided pieces
//!
//! | Piece | Role |
//! |-------|------|
//! | [`VirtualDocument`] | Arena-backed tree implementing the `Document` port; publishes mutations and activations |
//! | [`SimulatedHost`] | Renders a chat window and a composer button bar, re-renders the bar, posts notices, resolves clicked ones |
//! | [`DemoConfig`] | Cadence of the simulated host |
//!
//! ## Dependency rule
//!
//! Depends on `autoresume-app` (port traits) and `autoresume-domain` only.

mod config;
mod document;
mod host;
mod tree;

pub use config::DemoConfig;
pub use document::VirtualDocument;
pub use host::{ACTION_ATTRIBUTE, Notice, SimulatedHost};
pub use tree::NodeId;
