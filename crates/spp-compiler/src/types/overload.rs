//! Overload resolution's per-argument classification (spec.md §4.2, §9:
//! "Overload resolution stateful context... reify as an explicit value
//! passed along the argument iteration").

use super::{Type, TypeRegistry};
use crate::config::ExecutionContext;

/// The classification of a single argument against a single parameter.
/// Ordered worst-to-best: `None < Castable < Exact`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    None,
    Castable,
    Exact,
}

impl MatchKind {
    /// Combines this match with another, keeping the weaker of the two —
    /// a candidate's overall classification is only as good as its worst
    /// argument.
    pub fn combine(self, other: MatchKind) -> MatchKind {
        self.min(other)
    }
}

/// Threaded through successive `match_next_arg` calls over one candidate's
/// parameter list, per spec.md §9's design note against hiding this in
/// mutable fields.
#[derive(Debug, Clone, Copy)]
pub struct ArgMatchContext {
    worst: MatchKind,
    matched: usize,
}

impl ArgMatchContext {
    pub fn new() -> Self {
        Self {
            worst: MatchKind::Exact,
            matched: 0,
        }
    }

    /// Classifies one (parameter type, argument type) pair and folds it
    /// into the running worst-case classification.
    pub fn match_next_arg(
        &mut self,
        registry: &TypeRegistry,
        param_type: &Type,
        arg_type: &Type,
        ctx: &ExecutionContext,
    ) -> MatchKind {
        let kind = if param_type == arg_type {
            MatchKind::Exact
        } else if registry.is_implicitly_castable_to(arg_type, param_type, ctx) {
            MatchKind::Castable
        } else {
            MatchKind::None
        };
        self.worst = self.worst.combine(kind);
        self.matched += 1;
        kind
    }

    /// The overall classification after every argument has been folded in.
    pub fn overall(&self) -> MatchKind {
        self.worst
    }

    pub fn matched_count(&self) -> usize {
        self.matched
    }
}

impl Default for ArgMatchContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Classifies a full candidate's fixed parameter list plus an optional
/// vararg tail against `arg_types`, per spec.md §4.2: "a function with N
/// fixed args and a vararg tail accepts any ≥N arguments; each fixed
/// position must match by Exact or Castable, tail arguments are promoted to
/// their natural value type (no references)".
pub fn match_candidate(
    registry: &TypeRegistry,
    fixed_params: &[Type],
    is_vararg: bool,
    arg_types: &[Type],
    ctx: &ExecutionContext,
) -> MatchKind {
    if is_vararg {
        if arg_types.len() < fixed_params.len() {
            return MatchKind::None;
        }
    } else if arg_types.len() != fixed_params.len() {
        return MatchKind::None;
    }

    let mut cursor = ArgMatchContext::new();
    for (param_type, arg_type) in fixed_params.iter().zip(arg_types) {
        if cursor.match_next_arg(registry, param_type, arg_type, ctx) == MatchKind::None {
            return MatchKind::None;
        }
    }
    // Vararg tail positions have no declared parameter type to classify
    // against; they are always accepted and later stripped to a value type
    // during parameter preparation (spec.md §4.3), not matched here.
    cursor.overall()
}
