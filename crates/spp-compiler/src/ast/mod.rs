//! The tagged AST node model (spec.md §3).
//!
//! `AstKind` is the payload carried by every node in the [`crate::node::Arena`].
//! Transplant-safe construction lives in [`decl`] (`Scope`/`Definition`
//! helpers) rather than on the enum itself, per the design note in spec.md
//! §9: "owner updates happen only during transplant operations that the
//! scope/definition APIs encapsulate."

mod decl;
mod expr;

pub use decl::{Definition, FunctionStage, Param, Scope, ScopeKind};
pub use expr::{InfixOp, LinkType, UnaryOp};

use crate::node::NodeId;

/// A tagged AST node, as described in spec.md §3.
#[derive(Debug, Clone)]
pub enum AstKind {
    Identifier {
        value: String,
    },
    LinkOperator {
        link_type: LinkType,
        first: NodeId,
        second: NodeId,
    },
    Definition {
        name: String,
        target: NodeId,
    },
    /// Ordered sequence of children, optionally specialized as a module or
    /// a function/statement block. The specialization only affects how the
    /// seeker and generator treat the scope, not its storage.
    Scope {
        kind: ScopeKind,
        children: Vec<NodeId>,
    },
    Function {
        name: String,
        params: Vec<Param>,
        return_type: Option<NodeId>,
        body: Option<NodeId>,
        inline: bool,
        stage: FunctionStage,
    },
    /// A declared variable: the `target` a non-function `Definition` owns.
    /// Not named explicitly in spec.md §3's variant list, but implied by
    /// "`target` owns the defined AST object (variable, function, type,
    /// module)" and required for `lookupCallee`'s "non-Function... returned
    /// as callee=variable" case (spec.md §4.2).
    Variable {
        type_spec: NodeId,
        stage: FunctionStage,
    },
    InfixOperator {
        op: InfixOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    UnaryOperator {
        op: UnaryOp,
        operand: NodeId,
    },
    AssignmentOperator {
        lhs: NodeId,
        rhs: NodeId,
    },
    ParamPass {
        callee: NodeId,
        args: Vec<NodeId>,
    },
    /// A round bracket around `inner`. Reference expressions only ever
    /// nest round brackets (spec.md §3 invariants); other bracket shapes
    /// would be a parser concern and never reach the core.
    Bracket {
        inner: NodeId,
    },
    ExpressionList {
        items: Vec<NodeId>,
    },
    StringLiteral {
        text: String,
    },
    IntegerLiteral {
        text: String,
    },
    FloatLiteral {
        text: String,
    },
    PointerOp {
        operand: NodeId,
    },
    ContentOp {
        operand: NodeId,
    },
    CastOp {
        operand: NodeId,
        target_type: NodeId,
    },
    SizeOp {
        target_type: NodeId,
    },
    TerminateOp {
        operand: NodeId,
    },

    // Type-expression shapes (lowered by the type registry's `traceType`).
    IntegerTypeExpr {
        bits: u16,
        signed: bool,
    },
    FloatTypeExpr {
        bits: u16,
    },
    PointerTypeExpr {
        to: NodeId,
    },
    ReferenceTypeExpr {
        to: NodeId,
    },
    ArrayTypeExpr {
        of: NodeId,
        length: Option<u64>,
    },
    /// A user-defined aggregate: a named type with a body scope of member
    /// `Definition`s (spec.md §3).
    UserTypeExpr {
        name: String,
        body: NodeId,
    },

    // Statement shapes (SPEC_FULL.md §4.4 supplement).
    If {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
    Return {
        value: Option<NodeId>,
    },
}

impl AstKind {
    /// Whether this node is a `Scope` (of any [`ScopeKind`]), i.e. something
    /// the seeker can enumerate `Definition`s in.
    pub fn as_scope(&self) -> Option<&[NodeId]> {
        match self {
            AstKind::Scope { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn as_scope_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            AstKind::Scope { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn scope_kind(&self) -> Option<ScopeKind> {
        match self {
            AstKind::Scope { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<(NodeId, FunctionStage)> {
        match self {
            AstKind::Variable { type_spec, stage } => Some((*type_spec, *stage)),
            _ => None,
        }
    }

    /// Whether this node is one of the reference-expression shapes the
    /// seeker knows how to evaluate (spec.md §4.1): an `Identifier`, a
    /// dot `LinkOperator`, or a `Bracket` wrapping one of those. A call or
    /// array-index (`ParamPass`) is not a path the seeker walks itself —
    /// the expression generator resolves its callee first and only then
    /// hands the result to the seeker.
    pub fn is_reference_shape(&self) -> bool {
        matches!(
            self,
            AstKind::Identifier { .. } | AstKind::LinkOperator { .. } | AstKind::Bracket { .. }
        )
    }
}
