//! `Scope` and `Definition` transplant helpers.
//!
//! These are the only functions allowed to change a node's owner once it
//! has one, matching spec.md §9: reimplement the source's runtime owner
//! rebinding "as non-owning back references... owner updates happen only
//! during transplant operations that the scope/definition APIs
//! encapsulate."

use super::AstKind;
use crate::error::CoreError;
use crate::node::{Arena, NodeId, NodeLocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// An ordinary nested scope (e.g. the braces around a struct's members).
    Plain,
    /// A translation unit or nested namespace.
    Module,
    /// A function body or nested statement block.
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionStage {
    None,
    PreCodeGen,
    CodeGen,
    PostCodeGen,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub type_spec: NodeId,
}

/// Free functions operating on `Scope`-kind nodes; grouped under a
/// zero-sized type so call sites read `Scope::append_child(...)` the way
/// the source groups its scope operations under a class.
pub struct Scope;

impl Scope {
    pub fn new(arena: &mut Arena, kind: ScopeKind, location: Option<NodeLocation>) -> NodeId {
        arena.alloc(
            AstKind::Scope {
                kind,
                children: Vec::new(),
            },
            location,
        )
    }

    /// Appends `child` to `scope`, taking ownership of it. `child` must not
    /// already have an owner.
    pub fn append_child(arena: &mut Arena, scope: NodeId, child: NodeId) -> Result<(), CoreError> {
        arena.attach(scope, child)?;
        match arena.kind_mut(scope) {
            AstKind::Scope { children, .. } => {
                children.push(child);
                Ok(())
            }
            _ => Err(CoreError::BrokenOwnership {
                node: scope,
                reason: "target of append_child is not a Scope",
            }),
        }
    }

    /// Removes `child` from `scope` and clears its owner, returning it to
    /// the caller as an ownerless node.
    pub fn remove_child(arena: &mut Arena, scope: NodeId, child: NodeId) -> Result<(), CoreError> {
        match arena.kind_mut(scope) {
            AstKind::Scope { children, .. } => {
                let position = children
                    .iter()
                    .position(|candidate| *candidate == child)
                    .ok_or(CoreError::BrokenOwnership {
                        node: child,
                        reason: "not a child of the given scope",
                    })?;
                children.remove(position);
            }
            _ => {
                return Err(CoreError::BrokenOwnership {
                    node: scope,
                    reason: "target of remove_child is not a Scope",
                })
            }
        }
        arena.detach(child);
        Ok(())
    }

    pub fn children<'a>(arena: &'a Arena, scope: NodeId) -> &'a [NodeId] {
        arena.kind(scope).as_scope().unwrap_or(&[])
    }

    pub fn kind(arena: &Arena, scope: NodeId) -> Option<ScopeKind> {
        arena.kind(scope).scope_kind()
    }
}

/// Free functions operating on `Definition`-kind nodes.
pub struct Definition;

impl Definition {
    /// Creates a `Definition{name, target}`, taking ownership of `target`.
    /// Per spec.md §3, a `Definition` exclusively owns its `target`.
    pub fn new(
        arena: &mut Arena,
        name: impl Into<String>,
        target: NodeId,
        location: Option<NodeLocation>,
    ) -> Result<NodeId, CoreError> {
        let def_id = arena.alloc(
            AstKind::Definition {
                name: name.into(),
                target,
            },
            location,
        );
        arena.attach(def_id, target)?;
        Ok(def_id)
    }

    /// Replaces the definition's target with `new_target`, disowning the
    /// previous target first (spec.md §3: "A node transplanted from one
    /// owner is first disowned from the previous."). Returns the old
    /// target, now ownerless.
    pub fn replace_target(
        arena: &mut Arena,
        def_id: NodeId,
        new_target: NodeId,
    ) -> Result<NodeId, CoreError> {
        let old_target = Self::target(arena, def_id)?;
        arena.detach(old_target);
        arena.attach(def_id, new_target)?;
        match arena.kind_mut(def_id) {
            AstKind::Definition { target, .. } => *target = new_target,
            _ => {
                return Err(CoreError::BrokenOwnership {
                    node: def_id,
                    reason: "not a Definition",
                })
            }
        }
        Ok(old_target)
    }

    pub fn name<'a>(arena: &'a Arena, def_id: NodeId) -> Result<&'a str, CoreError> {
        match arena.kind(def_id) {
            AstKind::Definition { name, .. } => Ok(name),
            _ => Err(CoreError::BrokenOwnership {
                node: def_id,
                reason: "not a Definition",
            }),
        }
    }

    pub fn target(arena: &Arena, def_id: NodeId) -> Result<NodeId, CoreError> {
        match arena.kind(def_id) {
            AstKind::Definition { target, .. } => Ok(*target),
            _ => Err(CoreError::BrokenOwnership {
                node: def_id,
                reason: "not a Definition",
            }),
        }
    }
}
