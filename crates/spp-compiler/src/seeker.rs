//! The Seeker: reference-expression evaluation over scopes (spec.md §4.1).

use crate::ast::{AstKind, Definition, LinkType, Scope};
use crate::error::CoreError;
use crate::identifiable::named_map_scope;
use crate::node::{Arena, NodeId};
use crate::scope::Repository;

/// The four-valued visitor verb (spec.md §4.1, §9): two independent bits,
/// perform-or-skip and move-on-or-stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    PerformAndMove,
    PerformAndStop,
    SkipAndMove,
    Stop,
}

impl Verb {
    fn performs(self) -> bool {
        matches!(self, Verb::PerformAndMove | Verb::PerformAndStop)
    }

    fn continues(self) -> bool {
        matches!(self, Verb::PerformAndMove | Verb::SkipAndMove)
    }
}

bitflags::bitflags! {
    /// Seeker behavior flags, passed as an opaque word per spec.md §4.1.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SeekerFlags: u32 {
        const NONE = 0;
        const SKIP_OWNERS = 1 << 0;
    }
}

/// Where a reference expression is evaluated against.
#[derive(Debug, Clone, Copy)]
pub enum DataRoot<'a> {
    Repository(&'a Repository),
    Node(NodeId),
}

pub struct Seeker;

impl Seeker {
    /// Read-only visit of every match. `cb` receives each match's current
    /// target value.
    pub fn foreach(
        arena: &Arena,
        reference: NodeId,
        root: DataRoot<'_>,
        flags: SeekerFlags,
        mut cb: impl FnMut(NodeId) -> Verb,
    ) -> Result<(), CoreError> {
        let _span = tracing::trace_span!("seeker::foreach", reference = ?reference).entered();
        foreach_inner(arena, reference, root, flags, &mut cb)
    }

    /// Mutating visit. For each match (and, if the reference is a plain
    /// identifier with no match, once at a missing slot) invokes `cb` with
    /// the current value (`None` for a miss); if `cb` returns a performing
    /// verb, the value it supplies is written back (or, for a miss,
    /// synthesizes a new `Definition`).
    pub fn set(
        arena: &mut Arena,
        reference: NodeId,
        root: DataRoot<'_>,
        flags: SeekerFlags,
        mut cb: impl FnMut(Option<NodeId>) -> (Verb, Option<NodeId>),
    ) -> Result<(), CoreError> {
        let _span = tracing::trace_span!("seeker::set", reference = ?reference).entered();
        set_inner(arena, reference, root, flags, &mut cb)
    }

    /// Mutating visit of existing matches only; a performing verb erases
    /// the matched `Definition`.
    pub fn remove(
        arena: &mut Arena,
        reference: NodeId,
        root: DataRoot<'_>,
        flags: SeekerFlags,
        mut cb: impl FnMut(NodeId) -> Verb,
    ) -> Result<(), CoreError> {
        let _span = tracing::trace_span!("seeker::remove", reference = ?reference).entered();
        remove_inner(arena, reference, root, flags, &mut cb)
    }

    /// Sets the slot to `value` and reports whether a match (or a
    /// successful synthesis) occurred.
    pub fn try_set(
        arena: &mut Arena,
        reference: NodeId,
        root: DataRoot<'_>,
        value: NodeId,
    ) -> Result<bool, CoreError> {
        let mut done = false;
        Self::set(arena, reference, root, SeekerFlags::NONE, |_current| {
            done = true;
            (Verb::PerformAndStop, Some(value))
        })?;
        Ok(done)
    }

    /// Returns the first match's current value, if any.
    pub fn try_get(
        arena: &Arena,
        reference: NodeId,
        root: DataRoot<'_>,
    ) -> Result<Option<NodeId>, CoreError> {
        let mut found = None;
        Self::foreach(arena, reference, root, SeekerFlags::NONE, |value| {
            found = Some(value);
            Verb::PerformAndStop
        })?;
        Ok(found)
    }

    /// Removes the first match, if any, reporting whether one was removed.
    pub fn try_remove(
        arena: &mut Arena,
        reference: NodeId,
        root: DataRoot<'_>,
    ) -> Result<bool, CoreError> {
        let mut done = false;
        Self::remove(arena, reference, root, SeekerFlags::NONE, |_value| {
            done = true;
            Verb::PerformAndStop
        })?;
        Ok(done)
    }
}

/// Definitions in `scope` whose name equals `name`, in declaration order.
/// Snapshotted up front so the caller can mutate the scope mid-iteration
/// (e.g. removing a match) without invalidating later indices.
fn matching_definitions(arena: &Arena, scope: NodeId, name: &str) -> Vec<NodeId> {
    Scope::children(arena, scope)
        .iter()
        .copied()
        .filter(|&child| matches!(arena.kind(child), AstKind::Definition { name: n, .. } if n.as_str() == name))
        .collect()
}

fn identifier_name(arena: &Arena, reference: NodeId) -> Result<&str, CoreError> {
    match arena.kind(reference) {
        AstKind::Identifier { value } => Ok(value),
        _ => Err(CoreError::MalformedReference {
            reason: "expected an Identifier",
        }),
    }
}

fn foreach_inner(
    arena: &Arena,
    reference: NodeId,
    root: DataRoot<'_>,
    flags: SeekerFlags,
    cb: &mut dyn FnMut(NodeId) -> Verb,
) -> Result<(), CoreError> {
    if !arena.kind(reference).is_reference_shape() {
        return Err(CoreError::MalformedReference {
            reason: "unsupported reference expression shape",
        });
    }
    match arena.kind(reference).clone() {
        AstKind::Identifier { value } => match root {
            DataRoot::Repository(repo) => {
                for level in repo.levels_deepest_first() {
                    if !visit_scope_matches_readonly(arena, level, &value, cb)? {
                        return Ok(());
                    }
                }
                Ok(())
            }
            DataRoot::Node(node) => {
                let mut current = Some(node);
                while let Some(n) = current {
                    if let Some(scope) = named_map_scope(arena, n) {
                        if !visit_scope_matches_readonly(arena, scope, &value, cb)? {
                            return Ok(());
                        }
                    }
                    if flags.contains(SeekerFlags::SKIP_OWNERS) {
                        break;
                    }
                    current = arena.owner(n);
                }
                Ok(())
            }
        },
        AstKind::LinkOperator {
            link_type: LinkType::Dot,
            first,
            second,
        } => link_foreach(arena, first, second, root, cb),
        AstKind::Bracket { inner } => foreach_inner(arena, inner, root, flags, cb),
        _ => unreachable!("guarded by is_reference_shape above"),
    }
}

/// Visits matches of `name` within a single scope, read-only. Returns
/// `false` if the overall visit should stop (the caller must not continue
/// to outer levels/owners).
fn visit_scope_matches_readonly(
    arena: &Arena,
    scope: NodeId,
    name: &str,
    cb: &mut dyn FnMut(NodeId) -> Verb,
) -> Result<bool, CoreError> {
    for def in matching_definitions(arena, scope, name) {
        let target = Definition::target(arena, def)?;
        let verb = cb(target);
        if !verb.continues() {
            return Ok(false);
        }
    }
    Ok(true)
}

fn link_foreach(
    arena: &Arena,
    first: NodeId,
    second: NodeId,
    root: DataRoot<'_>,
    cb: &mut dyn FnMut(NodeId) -> Verb,
) -> Result<(), CoreError> {
    let name = identifier_name(arena, second)?.to_string();
    let mut stop = false;
    foreach_inner(arena, first, root, SeekerFlags::NONE, &mut |data| {
        if stop {
            return Verb::Stop;
        }
        if let Some(scope) = named_map_scope(arena, data) {
            let mut inner_stop = false;
            let _ = visit_scope_matches_readonly(arena, scope, &name, &mut |value| {
                if inner_stop {
                    return Verb::Stop;
                }
                let verb = cb(value);
                if !verb.continues() {
                    inner_stop = true;
                    stop = true;
                }
                verb
            });
        }
        Verb::PerformAndMove
    })
}

fn set_inner(
    arena: &mut Arena,
    reference: NodeId,
    root: DataRoot<'_>,
    flags: SeekerFlags,
    cb: &mut dyn FnMut(Option<NodeId>) -> (Verb, Option<NodeId>),
) -> Result<(), CoreError> {
    if !arena.kind(reference).is_reference_shape() {
        return Err(CoreError::MalformedReference {
            reason: "unsupported reference expression shape",
        });
    }
    match arena.kind(reference).clone() {
        AstKind::Identifier { value } => {
            let (stopped, deepest_scope) = match root {
                DataRoot::Repository(repo) => {
                    let mut deepest = None;
                    let mut stopped = false;
                    for level in repo.levels_deepest_first() {
                        if deepest.is_none() {
                            deepest = Some(level);
                        }
                        if !visit_scope_matches_mut(arena, level, &value, cb)? {
                            stopped = true;
                            break;
                        }
                    }
                    (stopped, deepest)
                }
                DataRoot::Node(node) => {
                    let mut current = Some(node);
                    let mut stopped = false;
                    let mut deepest = None;
                    while let Some(n) = current {
                        if let Some(scope) = named_map_scope(arena, n) {
                            if deepest.is_none() {
                                deepest = Some(scope);
                            }
                            if !visit_scope_matches_mut(arena, scope, &value, cb)? {
                                stopped = true;
                                break;
                            }
                        }
                        if flags.contains(SeekerFlags::SKIP_OWNERS) {
                            break;
                        }
                        current = arena.owner(n);
                    }
                    (stopped, deepest)
                }
            };
            if stopped {
                return Ok(());
            }
            // No match consumed the visit; for `set` over a plain
            // identifier, offer one more callback at a missing slot.
            if let DataRoot::Repository(_) = root {
                let (verb, new_value) = cb(None);
                if verb.performs() {
                    if let (Some(scope), Some(new_value)) = (deepest_scope, new_value) {
                        let def = Definition::new(arena, value, new_value, None)?;
                        Scope::append_child(arena, scope, def)?;
                    }
                }
            }
            Ok(())
        }
        AstKind::LinkOperator {
            link_type: LinkType::Dot,
            first,
            second,
        } => link_set(arena, first, second, root, cb),
        AstKind::Bracket { inner } => set_inner(arena, inner, root, flags, cb),
        _ => unreachable!("guarded by is_reference_shape above"),
    }
}

/// Visits matches of `name` within a single scope, writing back performed
/// replacements. Returns `false` if the overall visit should stop.
fn visit_scope_matches_mut(
    arena: &mut Arena,
    scope: NodeId,
    name: &str,
    cb: &mut dyn FnMut(Option<NodeId>) -> (Verb, Option<NodeId>),
) -> Result<bool, CoreError> {
    for def in matching_definitions(arena, scope, name) {
        let current = Definition::target(arena, def)?;
        let (verb, new_value) = cb(Some(current));
        if verb.performs() {
            if let Some(new_value) = new_value {
                Definition::replace_target(arena, def, new_value)?;
            }
        }
        if !verb.continues() {
            return Ok(false);
        }
    }
    Ok(true)
}

fn link_set(
    arena: &mut Arena,
    first: NodeId,
    second: NodeId,
    root: DataRoot<'_>,
    cb: &mut dyn FnMut(Option<NodeId>) -> (Verb, Option<NodeId>),
) -> Result<(), CoreError> {
    let name = identifier_name(arena, second)?.to_string();
    let mut matches = Vec::new();
    foreach_inner(arena, first, root, SeekerFlags::NONE, &mut |data| {
        matches.push(data);
        Verb::PerformAndMove
    })?;
    for data in matches {
        if let Some(scope) = named_map_scope(arena, data) {
            if !visit_scope_matches_mut(arena, scope, &name, cb)? {
                return Ok(());
            }
        }
    }
    Ok(())
}

fn remove_inner(
    arena: &mut Arena,
    reference: NodeId,
    root: DataRoot<'_>,
    flags: SeekerFlags,
    cb: &mut dyn FnMut(NodeId) -> Verb,
) -> Result<(), CoreError> {
    if !arena.kind(reference).is_reference_shape() {
        return Err(CoreError::MalformedReference {
            reason: "unsupported reference expression shape",
        });
    }
    match arena.kind(reference).clone() {
        AstKind::Identifier { value } => match root {
            DataRoot::Repository(repo) => {
                let levels: Vec<NodeId> = repo.levels_deepest_first().collect();
                for level in levels {
                    if !visit_scope_matches_remove(arena, level, &value, cb)? {
                        return Ok(());
                    }
                }
                Ok(())
            }
            DataRoot::Node(node) => {
                let mut current = Some(node);
                while let Some(n) = current {
                    if let Some(scope) = named_map_scope(arena, n) {
                        if !visit_scope_matches_remove(arena, scope, &value, cb)? {
                            return Ok(());
                        }
                    }
                    if flags.contains(SeekerFlags::SKIP_OWNERS) {
                        break;
                    }
                    current = arena.owner(n);
                }
                Ok(())
            }
        },
        AstKind::LinkOperator {
            link_type: LinkType::Dot,
            first,
            second,
        } => {
            let name = identifier_name(arena, second)?.to_string();
            let mut matches = Vec::new();
            foreach_inner(arena, first, root, SeekerFlags::NONE, &mut |data| {
                matches.push(data);
                Verb::PerformAndMove
            })?;
            for data in matches {
                if let Some(scope) = named_map_scope(arena, data) {
                    if !visit_scope_matches_remove(arena, scope, &name, cb)? {
                        return Ok(());
                    }
                }
            }
            Ok(())
        }
        AstKind::Bracket { inner } => remove_inner(arena, inner, root, flags, cb),
        _ => unreachable!("guarded by is_reference_shape above"),
    }
}

fn visit_scope_matches_remove(
    arena: &mut Arena,
    scope: NodeId,
    name: &str,
    cb: &mut dyn FnMut(NodeId) -> Verb,
) -> Result<bool, CoreError> {
    for def in matching_definitions(arena, scope, name) {
        let current = Definition::target(arena, def)?;
        let verb = cb(current);
        if verb.performs() {
            Scope::remove_child(arena, scope, def)?;
        }
        if !verb.continues() {
            return Ok(false);
        }
    }
    Ok(true)
}
