//! The notice store: diagnostics accumulator with a nested source-location
//! stack (spec.md §3 invariants, §6, §7).

use crate::error::CoreError;
use crate::node::NodeLocation;
use thiserror::Error;

/// A single user-level diagnostic (spec.md §6's "Notice kinds", §7's
/// "Specific policies"). Each variant carries the location of the
/// offending node plus enough structured data to render a message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Notice {
    #[error("unsupported operation: {message}")]
    UnsupportedOperation {
        message: String,
        location: Option<NodeLocation>,
    },

    #[error("invalid operation: {message}")]
    InvalidOperation {
        message: String,
        location: Option<NodeLocation>,
    },

    #[error("invalid reference: {message}")]
    InvalidReference {
        message: String,
        location: Option<NodeLocation>,
    },

    #[error("`{member}` is not a member of `{type_name}`")]
    InvalidTypeMember {
        type_name: String,
        member: String,
        location: Option<NodeLocation>,
    },

    #[error("unknown symbol `{name}`")]
    UnknownSymbol {
        name: String,
        location: Option<NodeLocation>,
    },

    #[error("no matching callee for `{name}`")]
    NoCalleeMatch {
        name: String,
        location: Option<NodeLocation>,
    },

    #[error("`{from}` is not implicitly castable to `{to}`")]
    NotImplicitlyCastable {
        from: String,
        to: String,
        location: Option<NodeLocation>,
    },

    #[error("cannot cast `{from}` to `{to}`")]
    InvalidCast {
        from: String,
        to: String,
        location: Option<NodeLocation>,
    },
}

impl Notice {
    pub fn location(&self) -> Option<&NodeLocation> {
        match self {
            Notice::UnsupportedOperation { location, .. }
            | Notice::InvalidOperation { location, .. }
            | Notice::InvalidReference { location, .. }
            | Notice::InvalidTypeMember { location, .. }
            | Notice::UnknownSymbol { location, .. }
            | Notice::NoCalleeMatch { location, .. }
            | Notice::NotImplicitlyCastable { location, .. }
            | Notice::InvalidCast { location, .. } => location.as_ref(),
        }
    }
}

/// Diagnostics accumulator, plus the nested source-location stack used to
/// give synthesized/inlined nodes a sensible location even when they carry
/// none of their own (spec.md §3: "balanced push/pop on all exit paths",
/// §5: "scoped push/pop is required on every exit path including error
/// paths").
#[derive(Debug, Default)]
pub struct NoticeStore {
    notices: Vec<Notice>,
    location_stack: Vec<NodeLocation>,
}

impl NoticeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    /// Discards notices past `len`, used by the generation driver to undo a
    /// stalled attempt's diagnostics before a fixed-point retry (spec.md
    /// §4.4) so a later successful pass doesn't leave stale duplicates.
    pub fn truncate(&mut self, len: usize) {
        self.notices.truncate(len);
    }

    pub fn push_location(&mut self, location: NodeLocation) {
        self.location_stack.push(location);
    }

    pub fn pop_location(&mut self) -> Option<NodeLocation> {
        self.location_stack.pop()
    }

    /// The innermost pushed location, used to fill in a location for a
    /// notice about a synthetic node.
    pub fn current_location(&self) -> Option<&NodeLocation> {
        self.location_stack.last()
    }

    /// Runs `body`, pushing `location` first and popping it afterward on
    /// every exit path, including an early return or panic unwind from
    /// `body`.
    pub fn with_location<T>(
        &mut self,
        location: NodeLocation,
        body: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.push_location(location);
        struct PopGuard<'a>(&'a mut NoticeStore);
        impl Drop for PopGuard<'_> {
            fn drop(&mut self) {
                self.0.pop_location();
            }
        }
        let mut guard = PopGuard(self);
        body(&mut *guard.0)
    }

    /// Verifies the stack returned to `expected_depth`, per the balance
    /// invariant in spec.md §3. Intended for tests and top-level driver
    /// checkpoints, not for routine per-node calls.
    pub fn check_balanced(&self, expected_depth: usize) -> Result<(), CoreError> {
        if self.location_stack.len() == expected_depth {
            Ok(())
        } else {
            Err(CoreError::UnbalancedLocationStack {
                depth: self.location_stack.len().saturating_sub(expected_depth),
            })
        }
    }
}
