//! The generation driver (spec.md §4.4): a staged walk over modules that
//! declares types, declares function signatures, emits bodies, then clears
//! per-node target-handle caches whose values have been consumed.

use super::statement::StatementGenerator;
use crate::ast::{AstKind, FunctionStage, Scope};
use crate::config::ExecutionContext;
use crate::diagnostics::{Notice, NoticeStore};
use crate::error::CoreError;
use crate::node::{Arena, NodeId};
use crate::scope::Repository;
use crate::seeker::DataRoot;
use crate::target::TargetGenerator;
use crate::types::{HashMap, HashSet, Type, TypeRegistry};

/// Orchestrates expression/statement lowering against a host-supplied
/// [`TargetGenerator`], owning every side table the generators consult.
pub struct GenerationDriver<'a, G: TargetGenerator> {
    pub(crate) arena: &'a mut Arena,
    pub(crate) types: TypeRegistry,
    pub(crate) notices: NoticeStore,
    pub(crate) ctx: ExecutionContext,
    pub(crate) target: G,
    /// Node-attached target-code cache (spec.md §9: "side table keyed by
    /// node identity"), cleared after the post-generation pass.
    pub(crate) value_cache: HashMap<NodeId, G::Value>,
    type_cache: HashMap<Type, G::Type>,
    declared_functions: HashSet<NodeId>,
}

impl<'a, G: TargetGenerator> GenerationDriver<'a, G> {
    pub fn new(arena: &'a mut Arena, target: G) -> Self {
        let ctx = *target.execution_context();
        Self {
            arena,
            types: TypeRegistry::new(),
            notices: NoticeStore::new(),
            ctx,
            target,
            value_cache: HashMap::default(),
            type_cache: HashMap::default(),
            declared_functions: HashSet::default(),
        }
    }

    pub fn notices(&self) -> &NoticeStore {
        &self.notices
    }

    pub fn into_notices(self) -> NoticeStore {
        self.notices
    }

    pub fn target(&self) -> &G {
        &self.target
    }

    /// Lowers a canonical [`Type`] to the backend's type representation,
    /// caching by structural equality.
    pub fn lower_type(&mut self, ty: &Type) -> Result<G::Type, CoreError> {
        if let Some(cached) = self.type_cache.get(ty) {
            return Ok(cached.clone());
        }
        let lowered = match ty {
            Type::Integer { bits, signed } => self.target.get_int_type(*bits, *signed)?,
            Type::Float { bits } => self.target.get_float_type(*bits)?,
            Type::Pointer(inner) => {
                let inner = self.lower_type(inner)?;
                self.target.get_pointer_type(&inner)?
            }
            // Targets do not model references (spec.md §4.3: "substitute a
            // pointer-to-struct at the target level"); a reference lowers
            // to its content type directly.
            Type::Reference(inner) => self.lower_type(inner)?,
            Type::Array { of, length } => {
                let of = self.lower_type(of)?;
                self.target.get_array_type(&of, length.unwrap_or(0))?
            }
            Type::UserDefined { name, node } => self.lower_struct_type(name.clone(), *node)?,
            Type::Void => {
                return Err(CoreError::MalformedReference {
                    reason: "void has no target-level type",
                })
            }
        };
        self.type_cache.insert(ty.clone(), lowered.clone());
        Ok(lowered)
    }

    fn lower_struct_type(&mut self, name: String, user_type: NodeId) -> Result<G::Type, CoreError> {
        let body = match self.arena.kind(user_type) {
            AstKind::UserTypeExpr { body, .. } => *body,
            _ => {
                return Err(CoreError::MalformedReference {
                    reason: "UserDefined type's node is not a UserTypeExpr",
                })
            }
        };
        let children = Scope::children(self.arena, body).to_vec();
        let mut field_type_nodes = Vec::with_capacity(children.len());
        for child in children {
            if let AstKind::Definition { target, .. } = self.arena.kind(child) {
                if let Some((type_spec, _)) = self.arena.kind(*target).as_variable() {
                    field_type_nodes.push(type_spec);
                }
            }
        }
        let mut field_types = Vec::with_capacity(field_type_nodes.len());
        for type_spec in field_type_nodes {
            let ty = self.types.trace_type(self.arena, type_spec)?;
            field_types.push(self.lower_type(&ty)?);
        }
        self.target.get_struct_type(&name, &field_types)
    }

    /// Returns the cached target-level declaration for `function`, emitting
    /// it on first use (idempotent, per spec.md §4.3's "ensure a
    /// declaration has been emitted").
    pub fn declare_function(&mut self, function: NodeId) -> Result<G::Value, CoreError> {
        if let Some(existing) = self.value_cache.get(&function) {
            return Ok(existing.clone());
        }
        let (name, params, return_type) = match self.arena.kind(function) {
            AstKind::Function {
                name,
                params,
                return_type,
                ..
            } => (name.clone(), params.clone(), *return_type),
            _ => {
                return Err(CoreError::MalformedReference {
                    reason: "declare_function called on a non-Function node",
                })
            }
        };
        let mut param_types = Vec::with_capacity(params.len());
        for param in &params {
            if param.name == "..." {
                continue;
            }
            let ty = self.types.trace_type(self.arena, param.type_spec)?;
            param_types.push(self.lower_type(&ty)?);
        }
        let ret = match return_type {
            Some(node) => {
                let ty = self.types.trace_type(self.arena, node)?;
                Some(self.lower_type(&ty)?)
            }
            None => None,
        };
        let decl = self
            .target
            .generate_function_decl(&name, &param_types, ret.as_ref())?;
        self.value_cache.insert(function, decl.clone());
        self.declared_functions.insert(function);
        Ok(decl)
    }

    /// Runs the staged walk of spec.md §4.4 over `module`'s top-level
    /// scope: declare types, declare function signatures, emit bodies,
    /// then clear per-node caches whose values were consumed.
    pub fn run(&mut self, module: NodeId, root: DataRoot<'_>) -> Result<(), CoreError> {
        let children = Scope::children(self.arena, module).to_vec();

        // Stage 1: declare all user-defined types.
        for child in &children {
            if let AstKind::Definition { target, .. } = self.arena.kind(*child) {
                if let AstKind::UserTypeExpr { name, .. } = self.arena.kind(*target).clone() {
                    let ty = Type::UserDefined {
                        name,
                        node: *target,
                    };
                    self.lower_type(&ty)?;
                }
            }
        }

        // Stage 2: declare all function signatures.
        let mut functions = Vec::new();
        for child in &children {
            if let AstKind::Definition { target, .. } = self.arena.kind(*child) {
                if matches!(self.arena.kind(*target), AstKind::Function { .. }) {
                    functions.push(*target);
                }
            }
        }
        for function in &functions {
            let (inline, fn_name) = match self.arena.kind(*function) {
                AstKind::Function { inline, name, .. } => (*inline, name.clone()),
                _ => unreachable!(),
            };
            if !inline && !fn_name.starts_with('#') {
                self.declare_function(*function)?;
            }
        }

        // Stage 3: emit function bodies, fixed-point re-visiting functions
        // stuck in `PreCodeGen`.
        let mut pending: Vec<NodeId> = functions;
        loop {
            let mut next_pending = Vec::new();
            let mut progressed = false;
            for function in pending {
                let stage = match self.arena.kind(function) {
                    AstKind::Function { stage, .. } => *stage,
                    _ => continue,
                };
                if stage == FunctionStage::PostCodeGen {
                    continue;
                }
                match self.emit_function_body(function, root)? {
                    true => {
                        progressed = true;
                        self.set_function_stage(function, FunctionStage::PostCodeGen)?;
                    }
                    false => next_pending.push(function),
                }
            }
            if next_pending.is_empty() {
                break;
            }
            if !progressed {
                for function in &next_pending {
                    let name = match self.arena.kind(*function) {
                        AstKind::Function { name, .. } => name.clone(),
                        _ => continue,
                    };
                    self.notices.add(Notice::UnknownSymbol {
                        name,
                        location: self.arena.location(*function).cloned(),
                    });
                }
                break;
            }
            pending = next_pending;
        }

        // Stage 4: post-generation cache clear.
        self.value_cache.clear();
        Ok(())
    }

    fn set_function_stage(&mut self, function: NodeId, stage: FunctionStage) -> Result<(), CoreError> {
        match self.arena.kind_mut(function) {
            AstKind::Function { stage: s, .. } => {
                *s = stage;
                Ok(())
            }
            _ => Err(CoreError::MalformedReference {
                reason: "set_function_stage called on a non-Function node",
            }),
        }
    }

    /// Emits one function's body. Returns `Ok(true)` on success (including
    /// a body-less declaration), `Ok(false)` if lowering stalled on an
    /// unresolved callee and should be retried next fixed-point round.
    fn emit_function_body(&mut self, function: NodeId, root: DataRoot<'_>) -> Result<bool, CoreError> {
        self.set_function_stage(function, FunctionStage::CodeGen)?;
        let body = match self.arena.kind(function) {
            AstKind::Function { body, .. } => *body,
            _ => {
                return Err(CoreError::MalformedReference {
                    reason: "emit_function_body called on a non-Function node",
                })
            }
        };
        let Some(body) = body else {
            return Ok(true);
        };
        let before = self.notices.notices().len();
        StatementGenerator::generate_block(self, body, root, function)?;
        // Every function was already declared in stage 2, so a lookup can
        // only fail here for a genuinely undeclared symbol; treat that as a
        // stall so the fixed-point loop gets one retry round before giving
        // up, matching spec.md §4.4's re-visit policy.
        let stalled = self.notices.notices()[before..]
            .iter()
            .any(|n| matches!(n, Notice::UnknownSymbol { .. }));
        if stalled {
            self.set_function_stage(function, FunctionStage::PreCodeGen)?;
            self.notices.truncate(before);
        }
        Ok(!stalled)
    }
}
