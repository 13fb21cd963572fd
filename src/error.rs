//! Error taxonomy for the generator
//!
//! Only `NotFound` aborts a render. Unresolved endpoint references and
//! expansion cycles are recovered locally by emitting placeholder nodes, and
//! `MalformedFragment` signals a defect in an upstream builder rather than a
//! user-recoverable condition.

use thiserror::Error;

/// Errors raised while building or serializing a call flow diagram
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The selected phone number matches no resource account.
    #[error("no voice app has a resource account with phone number {0}")]
    NotFound(String),

    /// Nested expansion would revisit a voice app already on the current
    /// expansion path.
    #[error("nested expansion revisited voice app {0}")]
    CycleDetected(String),

    /// The renderer received a fragment violating an internal invariant
    /// (duplicate node id, edge to an undeclared node).
    #[error("malformed diagram fragment: {0}")]
    MalformedFragment(String),
}
