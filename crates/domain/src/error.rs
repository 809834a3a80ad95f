//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`AutoResumeError`] via `#[from]`. Note that detection and injection
//! misses are *not* errors: they are modelled as `Option`/`bool` results
//! and retried on the next cycle.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum AutoResumeError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A selector string could not be parsed.
    #[error("invalid selector")]
    Selector(#[from] SelectorError),

    /// The host document rejected an operation.
    #[error("host document error")]
    Host(#[from] HostError),

    /// The scheduler event loop is no longer running.
    #[error("scheduler is not running")]
    Stopped,
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A scenario has an empty action label.
    #[error("action label must not be empty")]
    EmptyActionLabel,

    /// A scenario has no usable match text.
    #[error("scenario needs at least one non-empty match text")]
    NoMatchText,

    /// A duration setting that must be positive is zero.
    #[error("{field} must be non-zero")]
    ZeroDuration { field: &'static str },

    /// A timer period exceeds the supported maximum.
    #[error("{field} must not exceed {max_ms} ms")]
    DurationTooLong { field: &'static str, max_ms: u64 },
}

/// Selector parse failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// The selector (or one of its comma-separated parts) is empty.
    #[error("selector is empty")]
    Empty,

    /// A character outside the supported grammar was found.
    #[error("unexpected character {found:?} at offset {offset}")]
    Unexpected { found: char, offset: usize },

    /// An attribute selector is missing its closing bracket or quote.
    #[error("unterminated attribute selector")]
    UnterminatedAttribute,
}

/// Failures reported by the host document for structural operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The node was removed from the document (or never existed).
    #[error("node is not attached to the document")]
    Detached,

    /// The insertion reference is not a child of the target parent.
    #[error("reference node is not a child of the target parent")]
    NotAChild,

    /// The target node cannot hold children (e.g. a text node).
    #[error("node cannot have children")]
    NotAnElement,
}
