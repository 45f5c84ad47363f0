//! Internal invariant violations (spec.md §7: "Internal invariants
//! (bugs): raise a generic exception carrying a message and location.").
//!
//! These are distinct from [`crate::diagnostics::Notice`], which is the
//! channel for *expected* program errors. A `CoreError` means the core or
//! its caller violated one of the invariants in spec.md §3/§5 — a host
//! embedding the crate should report it and abort rather than continue
//! compiling.

use crate::node::NodeId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("node {node:?} violates ownership invariant: {reason}")]
    BrokenOwnership {
        node: NodeId,
        reason: &'static str,
    },

    #[error("reference expression is malformed: {reason}")]
    MalformedReference { reason: &'static str },

    #[error("arity mismatch calling built-in `{name}`: expected {expected}, got {got}")]
    ArityMismatch {
        name: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("notice store location stack was not balanced: {depth} unpaired push(es)")]
    UnbalancedLocationStack { depth: usize },

    #[error("no target-level value cached for node {node:?}")]
    NoTargetForNode { node: NodeId },
}
