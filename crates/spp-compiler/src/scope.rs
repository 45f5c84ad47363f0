//! The scope repository (spec.md §3 "Scopes and the repository", glossary
//! "Repository").
//!
//! A [`Repository`] is an ordered stack of scope levels: level `0` is
//! outermost, and lookup scans from the deepest level outward. New levels
//! are pushed for nested lexical regions — function bodies, blocks — and
//! popped when those regions are left.

use crate::node::NodeId;

/// An ordered stack of scope levels. Each level is the `NodeId` of an
/// `AstKind::Scope` node (see [`crate::ast::Scope`]).
#[derive(Debug, Default, Clone)]
pub struct Repository {
    levels: Vec<NodeId>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a new, deepest level onto the repository (entering a nested
    /// lexical region).
    pub fn push_level(&mut self, scope: NodeId) {
        self.levels.push(scope);
    }

    /// Pops the deepest level (leaving a nested lexical region).
    pub fn pop_level(&mut self) -> Option<NodeId> {
        self.levels.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Iterates levels deepest-first, matching the seeker's scan order
    /// (spec.md §4.1, §5).
    pub fn levels_deepest_first(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.levels.iter().rev().copied()
    }

    /// The innermost (deepest) level, if any.
    pub fn innermost(&self) -> Option<NodeId> {
        self.levels.last().copied()
    }
}
