//! The AST node arena.
//!
//! Every node lives in an [`Arena`], addressed by a stable [`NodeId`], and
//! carries an optional [`NodeLocation`] the way GraphQL's `Node<T>` wrapper
//! carries a location for diagnostics. Unlike that wrapper, nodes here are
//! not reference-counted: the arena models the exclusive-ownership tree
//! described by the data model, and owner updates only ever happen through
//! the transplant helpers on [`crate::scope::Scope`] and
//! [`crate::ast::Definition`].

use crate::ast::AstKind;
use crate::error::CoreError;

/// Identifies a source file handed to the core by its caller.
///
/// The core never opens files itself; a [`FileId`] is an opaque handle the
/// host assigns when it registers source text for diagnostic rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    /// Used for synthetic nodes that were never parsed from any file.
    pub const SYNTHETIC: FileId = FileId(u32::MAX);
}

/// A source-location record, with an optional outer record for macro/inline
/// expansion chains (spec.md §3: "optional outer record for macro
/// expansion").
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeLocation {
    pub file: FileId,
    pub line: u32,
    pub column: u32,
    /// Byte offset of this location within the file's source text, for
    /// diagnostic rendering; `offset..offset+len` is the span reported.
    pub offset: u32,
    pub len: u32,
    pub outer: Option<Box<NodeLocation>>,
}

impl NodeLocation {
    pub fn new(file: FileId, line: u32, column: u32, offset: u32, len: u32) -> Self {
        Self {
            file,
            line,
            column,
            offset,
            len,
            outer: None,
        }
    }

    pub fn span(&self) -> std::ops::Range<usize> {
        self.offset as usize..(self.offset + self.len) as usize
    }

    /// Returns a copy of this location with `outer` set, recording that this
    /// location was reached through an expansion rooted at `outer`.
    pub fn with_outer(mut self, outer: NodeLocation) -> Self {
        self.outer = Some(Box::new(outer));
        self
    }
}

/// A stable index into an [`Arena`]. Doubles as the owner back-reference: it
/// is a non-owning handle, never itself responsible for dropping the node it
/// points to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

struct Slot {
    location: Option<NodeLocation>,
    owner: Option<NodeId>,
    kind: AstKind,
}

/// Owns every [`AstKind`] value created during parsing or synthesis.
///
/// Nodes are never individually freed; they live as long as the arena
/// (typically the lifetime of a single compilation). What the data model
/// calls "dropping the owning scope" corresponds here to the arena itself
/// going out of scope, or to a scope's children being detached and never
/// reattached, leaving them unreachable from any root.
#[derive(Default)]
pub struct Arena {
    slots: Vec<Slot>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a node with no owner. Callers must attach it to a scope or
    /// definition (via [`crate::scope::Scope`]/[`crate::ast::Definition`]
    /// helpers) before the tree invariants in spec.md §3 hold.
    pub fn alloc(&mut self, kind: AstKind, location: Option<NodeLocation>) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Slot {
            location,
            owner: None,
            kind,
        });
        id
    }

    pub fn kind(&self, id: NodeId) -> &AstKind {
        &self.slot(id).kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut AstKind {
        &mut self.slot_mut(id).kind
    }

    pub fn location(&self, id: NodeId) -> Option<&NodeLocation> {
        self.slot(id).location.as_ref()
    }

    pub fn owner(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).owner
    }

    /// Walks the owner chain starting at (and including) `id`.
    pub fn owner_chain(&self, id: NodeId) -> OwnerChain<'_> {
        OwnerChain {
            arena: self,
            current: Some(id),
        }
    }

    /// Records that `child` is now owned by `owner`. Fails if `child`
    /// already has an owner: callers must `detach` first, matching the
    /// "disowned from the previous owner" rule in spec.md §3.
    pub(crate) fn attach(&mut self, owner: NodeId, child: NodeId) -> Result<(), CoreError> {
        if self.slot(child).owner.is_some() {
            return Err(CoreError::BrokenOwnership {
                node: child,
                reason: "node already has an owner; detach before transplanting",
            });
        }
        self.slot_mut(child).owner = Some(owner);
        Ok(())
    }

    /// Clears `child`'s owner. Structural removal from the previous owner's
    /// container (a `Scope`'s children, a `Definition`'s target) is the
    /// caller's responsibility; this only updates the back-reference.
    pub(crate) fn detach(&mut self, child: NodeId) {
        self.slot_mut(child).owner = None;
    }

    fn slot(&self, id: NodeId) -> &Slot {
        &self.slots[id.0 as usize]
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        &mut self.slots[id.0 as usize]
    }
}

/// Iterator over a node's owner chain, innermost first, matching the
/// "innermost-first" ordering guarantee in spec.md §5.
pub struct OwnerChain<'a> {
    arena: &'a Arena,
    current: Option<NodeId>,
}

impl Iterator for OwnerChain<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.arena.owner(id);
        Some(id)
    }
}
