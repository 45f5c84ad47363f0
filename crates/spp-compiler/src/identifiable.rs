//! Runtime type identity and capability lookup (spec.md §2:
//! "Identifiable-object + interface registry — Runtime type identity;
//! capability lookup by tag").
//!
//! The source wires this as a COM-style `QueryInterface` over a registry of
//! interface ids. A tagged Rust enum already gives every node its identity
//! for free, so the registry collapses to: a coarse [`NodeTag`] per
//! [`AstKind`] variant, and a handful of free functions answering "does
//! this node support capability X", used by the seeker's link-operator
//! case (spec.md §4.1) to decide whether `data` behaves like a named map
//! without requiring `data` to literally be a `Scope`.

use crate::ast::AstKind;
use crate::node::{Arena, NodeId};

/// Coarse classification of an [`AstKind`], analogous to an interface id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTag {
    Identifier,
    LinkOperator,
    Definition,
    Scope,
    Function,
    Variable,
    Operator,
    Literal,
    TypeExpr,
    Statement,
}

impl AstKind {
    pub fn tag(&self) -> NodeTag {
        match self {
            AstKind::Identifier { .. } => NodeTag::Identifier,
            AstKind::LinkOperator { .. } => NodeTag::LinkOperator,
            AstKind::Definition { .. } => NodeTag::Definition,
            AstKind::Scope { .. } => NodeTag::Scope,
            AstKind::Function { .. } => NodeTag::Function,
            AstKind::Variable { .. } => NodeTag::Variable,
            AstKind::InfixOperator { .. }
            | AstKind::UnaryOperator { .. }
            | AstKind::AssignmentOperator { .. }
            | AstKind::ParamPass { .. }
            | AstKind::Bracket { .. }
            | AstKind::ExpressionList { .. }
            | AstKind::PointerOp { .. }
            | AstKind::ContentOp { .. }
            | AstKind::CastOp { .. }
            | AstKind::SizeOp { .. }
            | AstKind::TerminateOp { .. } => NodeTag::Operator,
            AstKind::StringLiteral { .. }
            | AstKind::IntegerLiteral { .. }
            | AstKind::FloatLiteral { .. } => NodeTag::Literal,
            AstKind::IntegerTypeExpr { .. }
            | AstKind::FloatTypeExpr { .. }
            | AstKind::PointerTypeExpr { .. }
            | AstKind::ReferenceTypeExpr { .. }
            | AstKind::ArrayTypeExpr { .. }
            | AstKind::UserTypeExpr { .. } => NodeTag::TypeExpr,
            AstKind::If { .. } | AstKind::While { .. } | AstKind::Return { .. } => {
                NodeTag::Statement
            }
        }
    }
}

/// Returns the scope a node behaves like a "named map" through, if any.
///
/// A plain `Scope`/`Module`/`Block` is trivially its own named map. A
/// `UserTypeExpr` exposes its member body scope without the caller needing
/// to know its target is a type rather than a scope. Nothing else currently
/// supports the capability; the seam exists for a host's own node kinds to
/// extend with their own capability lookups, the way the source's registry
/// lets other modules register interface implementations.
pub fn named_map_scope(arena: &Arena, node: NodeId) -> Option<NodeId> {
    match arena.kind(node) {
        AstKind::Scope { .. } => Some(node),
        AstKind::UserTypeExpr { body, .. } => Some(*body),
        _ => None,
    }
}
