//! # autoresume-domain
//!
//! Pure domain model for the autoresume recovery automation.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps
//! - Define the **automation state** (active flag, cooldown bookkeeping,
//!   session bound) and its phase machine
//! - Define **scenarios** (notification text → action label pairs)
//! - Define **selectors** (the subset of CSS used to query the host tree)
//! - Define **element specs** and the toggle **control appearance**
//! - Define the **host layout** and **automation settings**
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! The host document is expressed as a trait in the `app` crate (port).

pub mod error;
pub mod time;

pub mod control;
pub mod element;
pub mod layout;
pub mod scenario;
pub mod selector;
pub mod settings;
pub mod state;
