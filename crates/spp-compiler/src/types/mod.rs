//! Canonical types, castability, and overload resolution (spec.md §4.2).

mod overload;

pub use overload::{match_candidate, ArgMatchContext, MatchKind};

use crate::ast::AstKind;
use crate::config::ExecutionContext;
use crate::diagnostics::{Notice, NoticeStore};
use crate::error::CoreError;
use crate::node::{Arena, NodeId};
use crate::seeker::{DataRoot, Seeker, SeekerFlags, Verb};

/// [`indexmap::IndexMap`] configured with a specific hasher, used below for
/// [`TypeRegistry`]'s node-identity-keyed trace cache and by
/// [`crate::codegen::driver::GenerationDriver`] for its own per-node caches.
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, ahash::RandomState>;

/// [`std::collections::HashMap`] configured with the same hasher as
/// [`IndexMap`], for caches that don't need insertion-order iteration.
pub type HashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;

/// [`std::collections::HashSet`] configured with the same hasher as
/// [`IndexMap`].
pub type HashSet<T> = std::collections::HashSet<T, ahash::RandomState>;

/// A canonical type, as classified by spec.md §3's "Type shapes" and
/// resolved from a type-expression AST node by [`TypeRegistry::trace_type`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Integer { bits: u16, signed: bool },
    Float { bits: u16 },
    Pointer(Box<Type>),
    Reference(Box<Type>),
    Array { of: Box<Type>, length: Option<u64> },
    /// A user-defined aggregate, identified by the `UserTypeExpr` node that
    /// declares it rather than by structural equality — two distinctly
    /// declared structs with identical fields are different types.
    UserDefined { name: String, node: NodeId },
    /// The declared-return-nothing type; only legal as a function's return
    /// type, never as a variable's.
    Void,
}

impl Type {
    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Integer { .. })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float { .. })
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Reference(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array { .. })
    }

    pub fn display_name(&self) -> String {
        match self {
            Type::Integer { bits, signed } => {
                format!("{}{bits}", if *signed { "int" } else { "uint" })
            }
            Type::Float { bits } => format!("float{bits}"),
            Type::Pointer(inner) => format!("ptr[{}]", inner.display_name()),
            Type::Reference(inner) => format!("ref[{}]", inner.display_name()),
            Type::Array { of, length } => match length {
                Some(len) => format!("array[{}, {len}]", of.display_name()),
                None => format!("array[{}]", of.display_name()),
            },
            Type::UserDefined { name, .. } => name.clone(),
            Type::Void => "void".to_string(),
        }
    }
}

/// Resolves type-expression AST nodes to canonical [`Type`]s, answers
/// castability questions, and performs overload resolution (spec.md §4.2).
#[derive(Default)]
pub struct TypeRegistry {
    traced: IndexMap<NodeId, Type>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `traceType(node) → Type`: resolves a type-expression AST node to its
    /// canonical type, caching the result by node identity.
    pub fn trace_type(&mut self, arena: &Arena, node: NodeId) -> Result<Type, CoreError> {
        if let Some(cached) = self.traced.get(&node) {
            return Ok(cached.clone());
        }
        let ty = match arena.kind(node) {
            AstKind::IntegerTypeExpr { bits, signed } => Type::Integer {
                bits: *bits,
                signed: *signed,
            },
            AstKind::FloatTypeExpr { bits } => Type::Float { bits: *bits },
            AstKind::PointerTypeExpr { to } => {
                Type::Pointer(Box::new(self.trace_type(arena, *to)?))
            }
            AstKind::ReferenceTypeExpr { to } => {
                Type::Reference(Box::new(self.trace_type(arena, *to)?))
            }
            AstKind::ArrayTypeExpr { of, length } => Type::Array {
                of: Box::new(self.trace_type(arena, *of)?),
                length: *length,
            },
            AstKind::UserTypeExpr { name, .. } => Type::UserDefined {
                name: name.clone(),
                node,
            },
            _ => {
                return Err(CoreError::MalformedReference {
                    reason: "node is not a type-expression shape",
                })
            }
        };
        self.traced.insert(node, ty.clone());
        Ok(ty)
    }

    /// `getPointerTypeFor`.
    pub fn get_pointer_type_for(&self, base: &Type) -> Type {
        Type::Pointer(Box::new(base.clone()))
    }

    /// `getReferenceTypeFor`.
    pub fn get_reference_type_for(&self, base: &Type) -> Type {
        Type::Reference(Box::new(base.clone()))
    }

    /// `getContentType(ref)`: the pointee/referent of a `Reference` or
    /// `Pointer` type.
    pub fn get_content_type(&self, wrapper: &Type) -> Result<Type, CoreError> {
        match wrapper {
            Type::Reference(inner) | Type::Pointer(inner) => Ok((**inner).clone()),
            _ => Err(CoreError::MalformedReference {
                reason: "getContentType called on a non-reference, non-pointer type",
            }),
        }
    }

    /// Strips a leading `Reference` layer, used when passing vararg tail
    /// arguments (spec.md §4.3: "a reference-strip... so that values, not
    /// references, are passed").
    pub fn strip_reference(&self, ty: &Type) -> Type {
        match ty {
            Type::Reference(inner) => (**inner).clone(),
            other => other.clone(),
        }
    }

    /// `isImplicitlyCastableTo(from, to, ctx)`.
    pub fn is_implicitly_castable_to(&self, from: &Type, to: &Type, ctx: &ExecutionContext) -> bool {
        if from == to {
            return true;
        }
        match (self.strip_reference(from), self.strip_reference(to)) {
            (Type::Integer { bits: fb, .. }, Type::Integer { bits: tb, .. }) => tb >= fb,
            (Type::Integer { .. }, Type::Float { .. }) => true,
            (Type::Float { bits: fb }, Type::Float { bits: tb }) => tb >= fb,
            (Type::Reference(f), Type::Reference(t)) => f == t,
            (Type::Pointer(f), Type::Pointer(t)) => f == t,
            _ => {
                let _ = ctx;
                false
            }
        }
    }

    /// `isExplicitlyCastableTo(from, to, ctx)`.
    pub fn is_explicitly_castable_to(&self, from: &Type, to: &Type, ctx: &ExecutionContext) -> bool {
        if self.is_implicitly_castable_to(from, to, ctx) {
            return true;
        }
        match (self.strip_reference(from), self.strip_reference(to)) {
            (Type::Integer { .. }, Type::Integer { .. }) => true,
            (Type::Float { .. }, Type::Float { .. }) => true,
            (Type::Integer { .. }, Type::Float { .. }) | (Type::Float { .. }, Type::Integer { .. }) => true,
            (Type::Pointer(_), Type::Pointer(_)) => true,
            _ => false,
        }
    }

    /// A [`Type::Function`]-shaped candidate's static signature, read off
    /// an `AstKind::Function` node.
    fn function_signature(
        &mut self,
        arena: &Arena,
        func: NodeId,
    ) -> Result<(Vec<Type>, bool, Type), CoreError> {
        let (params, return_type) = match arena.kind(func) {
            AstKind::Function {
                params,
                return_type,
                ..
            } => (params.clone(), *return_type),
            _ => {
                return Err(CoreError::MalformedReference {
                    reason: "expected a Function node",
                })
            }
        };
        let mut fixed = Vec::with_capacity(params.len());
        for param in &params {
            fixed.push(self.trace_type(arena, param.type_spec)?);
        }
        let ret = match return_type {
            Some(node) => self.trace_type(arena, node)?,
            None => Type::Void,
        };
        // Vararg functions are tagged by a trailing parameter literally
        // named "...", the same convention the grammar front end would
        // otherwise lower a C-style ellipsis parameter to.
        let is_vararg = params.last().is_some_and(|p| p.name == "...");
        let fixed = if is_vararg {
            fixed[..fixed.len() - 1].to_vec()
        } else {
            fixed
        };
        Ok((fixed, is_vararg, ret))
    }

    /// `lookupCallee(nameExpr, scope, searchOwners, paramTypes, ctx, out
    /// callee, out calleeType)` (spec.md §4.2).
    ///
    /// Returns `Ok(None)` (with a `NoCalleeMatch` notice raised) when no
    /// candidate is uniquely best; returns `Ok(Some(node, type))` for the
    /// winning `Function` candidate, or for a non-function variable whose
    /// type is an array (spec.md: "x(i)" lowers via the array branch).
    #[allow(clippy::too_many_arguments)]
    pub fn lookup_callee(
        &mut self,
        arena: &Arena,
        name_expr: NodeId,
        root: DataRoot<'_>,
        search_owners: bool,
        arg_types: &[Type],
        ctx: &ExecutionContext,
        notices: &mut NoticeStore,
    ) -> Result<Option<(NodeId, Type)>, CoreError> {
        let mut candidates = Vec::new();
        let flags = if search_owners {
            SeekerFlags::NONE
        } else {
            SeekerFlags::SKIP_OWNERS
        };
        Seeker::foreach(arena, name_expr, root, flags, |target| {
            candidates.push(target);
            Verb::PerformAndMove
        })?;

        if let [single] = candidates[..] {
            if let Some((type_spec, _)) = arena.kind(single).as_variable() {
                let var_type = self.trace_type(arena, type_spec)?;
                if var_type.is_array() {
                    return Ok(Some((single, var_type)));
                }
            }
        }

        let mut best: Option<(NodeId, MatchKind, Type)> = None;
        let mut ambiguous = false;
        for candidate in &candidates {
            if !matches!(arena.kind(*candidate), AstKind::Function { .. }) {
                continue;
            }
            let (fixed, is_vararg, ret) = self.function_signature(arena, *candidate)?;
            let kind = match_candidate(self, &fixed, is_vararg, arg_types, ctx);
            if kind == MatchKind::None {
                continue;
            }
            match &best {
                None => best = Some((*candidate, kind, ret)),
                Some((_, best_kind, _)) => {
                    if kind > *best_kind {
                        best = Some((*candidate, kind, ret));
                        ambiguous = false;
                    } else if kind == *best_kind {
                        ambiguous = true;
                    }
                }
            }
        }

        if ambiguous || best.is_none() {
            if !candidates.is_empty() || best.is_none() {
                notices.add(Notice::NoCalleeMatch {
                    name: identifier_text(arena, name_expr),
                    location: notices.current_location().cloned(),
                });
            }
            return Ok(None);
        }
        let (node, _, ret) = best.unwrap();
        Ok(Some((node, ret)))
    }
}

pub(crate) fn identifier_text(arena: &Arena, reference: NodeId) -> String {
    match arena.kind(reference) {
        AstKind::Identifier { value } => value.clone(),
        AstKind::LinkOperator { second, .. } => identifier_text(arena, *second),
        _ => "<unknown>".to_string(),
    }
}
