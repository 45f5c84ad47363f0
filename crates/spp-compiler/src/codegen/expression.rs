//! The expression generator (spec.md §4.3): lowers a reference or operator
//! AST node to a target-level `GenResult`.
//!
//! Every entry point returns `Ok(None)` rather than an error when lowering
//! stalls on something that might resolve on a later fixed-point round (an
//! unresolved callee); a genuine language-level mistake (bad cast, wrong
//! arity, non-reference assignment target) instead raises a terminal
//! `Notice` and also returns `Ok(None)`, since there is nothing left to
//! produce for that node either way. Only [`crate::error::CoreError`]
//! indicates the AST itself violates a structural invariant.

use super::driver::GenerationDriver;
use crate::ast::{AstKind, Definition, InfixOp, LinkType, Scope, UnaryOp};
use crate::diagnostics::Notice;
use crate::error::CoreError;
use crate::identifiable::named_map_scope;
use crate::node::{Arena, NodeId};
use crate::seeker::{DataRoot, Seeker, SeekerFlags, Verb};
use crate::target::{GenResult, TargetGenerator};
use crate::types::{identifier_text, Type};

/// Groups expression-lowering operations the way [`crate::ast::Scope`] and
/// [`crate::ast::Definition`] group their own free functions.
pub struct ExpressionGenerator;

impl ExpressionGenerator {
    pub fn generate<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        node: NodeId,
        root: DataRoot<'_>,
    ) -> Result<Option<GenResult<G::Value>>, CoreError> {
        match driver.arena.kind(node).clone() {
            AstKind::Identifier { .. } => Self::generate_identifier(driver, node, root),
            AstKind::LinkOperator {
                link_type: LinkType::Dot,
                first,
                second,
            } => Self::generate_link(driver, first, second, root),
            AstKind::Bracket { inner } => Self::generate(driver, inner, root),
            AstKind::ParamPass { callee, args } => {
                Self::generate_param_pass(driver, node, callee, &args, root)
            }
            AstKind::AssignmentOperator { lhs, rhs } => Self::generate_assignment(driver, lhs, rhs, root),
            AstKind::InfixOperator { op, lhs, rhs } => Self::generate_infix(driver, node, op, lhs, rhs, root),
            AstKind::UnaryOperator { op, operand } => Self::generate_unary(driver, node, op, operand, root),
            AstKind::PointerOp { operand } => Self::generate_pointer_op(driver, operand, root),
            AstKind::ContentOp { operand } => Self::generate_content_op(driver, operand, root),
            AstKind::CastOp { operand, target_type } => {
                Self::generate_cast_op(driver, operand, target_type, root)
            }
            AstKind::StringLiteral { text } => Self::generate_string_literal(driver, &text),
            AstKind::IntegerLiteral { text } => Self::generate_integer_literal(driver, &text),
            AstKind::FloatLiteral { text } => Self::generate_float_literal(driver, &text),
            _ => {
                driver.notices.add(Notice::UnsupportedOperation {
                    message: "expression shape is not supported by the generator".to_string(),
                    location: driver.arena.location(node).cloned(),
                });
                Ok(None)
            }
        }
    }

    /// `generateScopeMemberReference(owner, id, searchOwners=true)`.
    fn generate_identifier<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        node: NodeId,
        root: DataRoot<'_>,
    ) -> Result<Option<GenResult<G::Value>>, CoreError> {
        let Some(target) = Seeker::try_get(driver.arena, node, root)? else {
            driver.notices.add(Notice::UnknownSymbol {
                name: identifier_text(driver.arena, node),
                location: driver.arena.location(node).cloned(),
            });
            return Ok(None);
        };
        Self::generate_target_reference(driver, target)
    }

    /// Materializes a reference to whatever `target` is: a variable's
    /// storage, a user type's naming result, or a module/function naming
    /// result. Shared by identifier lookup and link-operator resolution.
    fn generate_target_reference<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        target: NodeId,
    ) -> Result<Option<GenResult<G::Value>>, CoreError> {
        match driver.arena.kind(target).clone() {
            AstKind::Variable { type_spec, .. } => {
                let ty = driver.types.trace_type(driver.arena, type_spec)?;
                let value = match driver.value_cache.get(&target) {
                    Some(existing) => existing.clone(),
                    None => {
                        let owner = driver.arena.owner(target).ok_or(CoreError::BrokenOwnership {
                            node: target,
                            reason: "variable has no owning definition",
                        })?;
                        let name = Definition::name(driver.arena, owner)?.to_string();
                        let lowered = driver.lower_type(&ty)?;
                        let storage = driver.target.generate_var_definition(&name, &lowered)?;
                        driver.value_cache.insert(target, storage.clone());
                        storage
                    }
                };
                let reference = driver.target.generate_var_reference(&value)?;
                Ok(Some(GenResult::value(reference, Type::Reference(Box::new(ty)))))
            }
            AstKind::UserTypeExpr { name, .. } => Ok(Some(GenResult::naming(
                Type::UserDefined { name, node: target },
                target,
            ))),
            AstKind::Scope { .. } | AstKind::Function { .. } => {
                Ok(Some(GenResult::naming(Type::Void, target)))
            }
            _ => Err(CoreError::MalformedReference {
                reason: "reference target is not a nameable or value-producing shape",
            }),
        }
    }

    /// `LinkOperator "."`: lower `first`; on a runtime value, emit a member
    /// reference; on a naming (module) result, resolve `second` confined to
    /// that module, with no owner ascent.
    fn generate_link<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        first: NodeId,
        second: NodeId,
        root: DataRoot<'_>,
    ) -> Result<Option<GenResult<G::Value>>, CoreError> {
        let Some(base) = Self::generate(driver, first, root)? else {
            return Ok(None);
        };
        let GenResult {
            target_data,
            ast_type,
            ast_node,
        } = base;
        match target_data {
            Some(base_value) => Self::generate_member_reference(driver, base_value, ast_type, second),
            None => {
                let module = ast_node.ok_or(CoreError::MalformedReference {
                    reason: "naming result carries no ast_node",
                })?;
                let mut found = None;
                Seeker::foreach(driver.arena, second, DataRoot::Node(module), SeekerFlags::SKIP_OWNERS, |value| {
                    found = Some(value);
                    Verb::PerformAndStop
                })?;
                let Some(target) = found else {
                    driver.notices.add(Notice::UnknownSymbol {
                        name: identifier_text(driver.arena, second),
                        location: driver.arena.location(second).cloned(),
                    });
                    return Ok(None);
                };
                Self::generate_target_reference(driver, target)
            }
        }
    }

    /// Struct member access: find `field`'s declared position in the
    /// struct's body scope and request a member-var reference. Substitutes
    /// a pointer-to-struct at the target level when `base_type` is a
    /// reference, since targets do not model references (spec.md §4.3).
    fn generate_member_reference<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        base_value: G::Value,
        base_type: Type,
        field: NodeId,
    ) -> Result<Option<GenResult<G::Value>>, CoreError> {
        let struct_type = match base_type {
            Type::Reference(inner) => *inner,
            other => other,
        };
        let Type::UserDefined { node: type_node, name: type_name } = struct_type.clone() else {
            driver.notices.add(Notice::UnsupportedOperation {
                message: format!("`.{}` requires a struct value", identifier_text(driver.arena, field)),
                location: driver.arena.location(field).cloned(),
            });
            return Ok(None);
        };
        let body = named_map_scope(driver.arena, type_node).ok_or(CoreError::MalformedReference {
            reason: "UserDefined type node has no body scope",
        })?;
        let field_name = identifier_text(driver.arena, field);
        let (field_index, field_type_spec) = match find_field(driver.arena, body, &field_name) {
            Some(found) => found,
            None => {
                driver.notices.add(Notice::InvalidTypeMember {
                    type_name,
                    member: field_name,
                    location: driver.arena.location(field).cloned(),
                });
                return Ok(None);
            }
        };
        let field_type = driver.types.trace_type(driver.arena, field_type_spec)?;
        let struct_target_type = driver.lower_type(&struct_type)?;
        let member = driver
            .target
            .generate_member_var_reference(&base_value, &struct_target_type, field_index)?;
        Ok(Some(GenResult::value(member, Type::Reference(Box::new(field_type)))))
    }

    /// `ParamPass`: identifier/link-op callees overload-resolve to a
    /// function call or an array index; anything else falls back to
    /// indexing the preceding expression's own value.
    fn generate_param_pass<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        node: NodeId,
        callee: NodeId,
        args: &[NodeId],
        root: DataRoot<'_>,
    ) -> Result<Option<GenResult<G::Value>>, CoreError> {
        let mut arg_values = Vec::with_capacity(args.len());
        let mut arg_types = Vec::with_capacity(args.len());
        for &arg in args {
            let Some(result) = Self::generate(driver, arg, root)? else {
                return Ok(None);
            };
            let Some(value) = result.target_data else {
                driver.notices.add(Notice::InvalidOperation {
                    message: "argument is a naming result, not a value".to_string(),
                    location: driver.arena.location(arg).cloned(),
                });
                return Ok(None);
            };
            arg_values.push(value);
            arg_types.push(result.ast_type);
        }

        let resolved_callee = unwrap_brackets(driver.arena, callee);
        if matches!(
            driver.arena.kind(resolved_callee),
            AstKind::Identifier { .. } | AstKind::LinkOperator { .. }
        ) {
            let lookup = driver.types.lookup_callee(
                driver.arena,
                resolved_callee,
                root,
                true,
                &arg_types,
                &driver.ctx,
                &mut driver.notices,
            )?;
            let Some((target, callee_type)) = lookup else {
                return Ok(None);
            };
            return if driver.arena.kind(target).as_variable().is_some() {
                let Some(base) = Self::generate_target_reference(driver, target)? else {
                    return Ok(None);
                };
                let Some(base_value) = base.target_data else {
                    return Ok(None);
                };
                array_index_from(driver, base_value, callee_type, &arg_values, &arg_types, node)
            } else {
                Self::generate_function_call(driver, target, &arg_types, arg_values, node)
            };
        }

        let Some(base) = Self::generate(driver, callee, root)? else {
            return Ok(None);
        };
        let Some(base_value) = base.target_data else {
            driver.notices.add(Notice::UnsupportedOperation {
                message: "cannot index a naming result".to_string(),
                location: driver.arena.location(callee).cloned(),
            });
            return Ok(None);
        };
        array_index_from(driver, base_value, base.ast_type, &arg_values, &arg_types, node)
    }

    /// Emits a call to `function`, casting each fixed-position argument to
    /// its declared parameter type and reference-stripping vararg tail
    /// arguments (spec.md §4.3 "Parameter preparation").
    fn generate_function_call<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        function: NodeId,
        arg_types: &[Type],
        arg_values: Vec<G::Value>,
        site: NodeId,
    ) -> Result<Option<GenResult<G::Value>>, CoreError> {
        let (params, return_type, fn_name, inline) = match driver.arena.kind(function) {
            AstKind::Function {
                params,
                return_type,
                name,
                inline,
                ..
            } => (params.clone(), *return_type, name.clone(), *inline),
            _ => {
                return Err(CoreError::MalformedReference {
                    reason: "call target is not a Function node",
                })
            }
        };
        let is_vararg = params.last().is_some_and(|p| p.name == "...");
        let fixed_count = if is_vararg { params.len() - 1 } else { params.len() };

        let mut prepared = Vec::with_capacity(arg_values.len());
        for (index, (value, from_type)) in arg_values.into_iter().zip(arg_types.iter()).enumerate() {
            if index < fixed_count {
                let param_type = driver.types.trace_type(driver.arena, params[index].type_spec)?;
                let Some(casted) = coerce_implicit(driver, value, from_type, &param_type, site)? else {
                    return Ok(None);
                };
                prepared.push(casted);
            } else {
                // A vararg tail argument is passed through as-is, except
                // that a reference is loaded to its content value first —
                // spec.md §4.3 calls this a dereference, not a cast.
                let (value, _) = load_if_reference(driver, value, from_type)?;
                prepared.push(value);
            }
        }

        let ret_type = match return_type {
            Some(node) => driver.types.trace_type(driver.arena, node)?,
            None => Type::Void,
        };

        if let Some(builtin_name) = fn_name.strip_prefix('#') {
            let value = driver.target.call_builtin(builtin_name, &prepared)?;
            return Ok(Some(GenResult::value(value, ret_type)));
        }

        if inline {
            // Recognized but deliberately unimplemented (spec.md §4.3).
            driver.notices.add(Notice::UnsupportedOperation {
                message: format!("inline function `{fn_name}` lowering is not implemented"),
                location: driver.arena.location(site).cloned(),
            });
            return Ok(None);
        }

        let decl = driver.declare_function(function)?;
        let value = driver.target.generate_function_call(&decl, &prepared)?;
        Ok(Some(GenResult::value(value, ret_type)))
    }

    fn generate_assignment<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        lhs: NodeId,
        rhs: NodeId,
        root: DataRoot<'_>,
    ) -> Result<Option<GenResult<G::Value>>, CoreError> {
        let Some(lhs_result) = Self::generate(driver, lhs, root)? else {
            return Ok(None);
        };
        if !lhs_result.ast_type.is_reference() {
            driver.notices.add(Notice::UnsupportedOperation {
                message: "left-hand side of an assignment is not a reference".to_string(),
                location: driver.arena.location(lhs).cloned(),
            });
            return Ok(None);
        }
        let Some(lhs_value) = lhs_result.target_data else {
            driver.notices.add(Notice::InvalidOperation {
                message: "left-hand side is a naming result, not a value".to_string(),
                location: driver.arena.location(lhs).cloned(),
            });
            return Ok(None);
        };
        let content_type = driver.types.get_content_type(&lhs_result.ast_type)?;

        let Some(rhs_result) = Self::generate(driver, rhs, root)? else {
            return Ok(None);
        };
        let Some(rhs_value) = rhs_result.target_data else {
            driver.notices.add(Notice::InvalidOperation {
                message: "right-hand side is a naming result, not a value".to_string(),
                location: driver.arena.location(rhs).cloned(),
            });
            return Ok(None);
        };
        let Some(rhs_value) = coerce_implicit(driver, rhs_value, &rhs_result.ast_type, &content_type, rhs)? else {
            return Ok(None);
        };
        driver.target.generate_assign(&lhs_value, &rhs_value)?;
        Ok(Some(GenResult::value(rhs_value, content_type)))
    }

    fn generate_infix<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        node: NodeId,
        op: InfixOp,
        lhs: NodeId,
        rhs: NodeId,
        root: DataRoot<'_>,
    ) -> Result<Option<GenResult<G::Value>>, CoreError> {
        let Some(lhs_result) = Self::generate(driver, lhs, root)? else {
            return Ok(None);
        };
        let Some(rhs_result) = Self::generate(driver, rhs, root)? else {
            return Ok(None);
        };
        let (Some(lhs_value), Some(rhs_value)) = (lhs_result.target_data, rhs_result.target_data) else {
            driver.notices.add(Notice::InvalidOperation {
                message: "operand is a naming result, not a value".to_string(),
                location: driver.arena.location(node).cloned(),
            });
            return Ok(None);
        };
        Self::dispatch_operator(
            driver,
            op.callee_name(),
            node,
            vec![lhs_value, rhs_value],
            vec![lhs_result.ast_type, rhs_result.ast_type],
            root,
        )
    }

    fn generate_unary<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        node: NodeId,
        op: UnaryOp,
        operand: NodeId,
        root: DataRoot<'_>,
    ) -> Result<Option<GenResult<G::Value>>, CoreError> {
        let Some(operand_result) = Self::generate(driver, operand, root)? else {
            return Ok(None);
        };
        let Some(value) = operand_result.target_data else {
            driver.notices.add(Notice::InvalidOperation {
                message: "operand is a naming result, not a value".to_string(),
                location: driver.arena.location(node).cloned(),
            });
            return Ok(None);
        };
        Self::dispatch_operator(driver, op.callee_name(), node, vec![value], vec![operand_result.ast_type], root)
    }

    /// Overload-resolves a built-in operator's `__`-prefixed name (a
    /// synthetic identifier, since nothing in the source text names one)
    /// and emits the call.
    fn dispatch_operator<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        name: &str,
        site: NodeId,
        arg_values: Vec<G::Value>,
        arg_types: Vec<Type>,
        root: DataRoot<'_>,
    ) -> Result<Option<GenResult<G::Value>>, CoreError> {
        let location = driver.arena.location(site).cloned();
        let name_node = driver.arena.alloc(AstKind::Identifier { value: name.to_string() }, location);
        let lookup = driver.types.lookup_callee(
            driver.arena,
            name_node,
            root,
            true,
            &arg_types,
            &driver.ctx,
            &mut driver.notices,
        )?;
        let Some((function, _)) = lookup else {
            return Ok(None);
        };
        Self::generate_function_call(driver, function, &arg_types, arg_values, site)
    }

    fn generate_pointer_op<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        operand: NodeId,
        root: DataRoot<'_>,
    ) -> Result<Option<GenResult<G::Value>>, CoreError> {
        let Some(result) = Self::generate(driver, operand, root)? else {
            return Ok(None);
        };
        let Type::Reference(content) = result.ast_type else {
            driver.notices.add(Notice::UnsupportedOperation {
                message: "`@` requires a reference operand".to_string(),
                location: driver.arena.location(operand).cloned(),
            });
            return Ok(None);
        };
        let Some(value) = result.target_data else {
            driver.notices.add(Notice::InvalidOperation {
                message: "operand is a naming result, not a value".to_string(),
                location: driver.arena.location(operand).cloned(),
            });
            return Ok(None);
        };
        Ok(Some(GenResult::value(value, Type::Pointer(content))))
    }

    fn generate_content_op<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        operand: NodeId,
        root: DataRoot<'_>,
    ) -> Result<Option<GenResult<G::Value>>, CoreError> {
        let Some(result) = Self::generate(driver, operand, root)? else {
            return Ok(None);
        };
        let pointer_type = match &result.ast_type {
            Type::Reference(inner) if inner.is_pointer() => (**inner).clone(),
            other if other.is_pointer() => other.clone(),
            _ => {
                driver.notices.add(Notice::UnsupportedOperation {
                    message: "`^` requires a pointer operand".to_string(),
                    location: driver.arena.location(operand).cloned(),
                });
                return Ok(None);
            }
        };
        let Some(pointer_value) = result.target_data else {
            driver.notices.add(Notice::InvalidOperation {
                message: "operand is a naming result, not a value".to_string(),
                location: driver.arena.location(operand).cloned(),
            });
            return Ok(None);
        };
        let pointee = driver.types.get_content_type(&pointer_type)?;
        let value = driver.target.generate_dereference(&pointer_value)?;
        Ok(Some(GenResult::value(value, Type::Reference(Box::new(pointee)))))
    }

    fn generate_cast_op<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        operand: NodeId,
        target_type: NodeId,
        root: DataRoot<'_>,
    ) -> Result<Option<GenResult<G::Value>>, CoreError> {
        let Some(result) = Self::generate(driver, operand, root)? else {
            return Ok(None);
        };
        let Some(value) = result.target_data else {
            driver.notices.add(Notice::InvalidOperation {
                message: "cast operand is a naming result, not a value".to_string(),
                location: driver.arena.location(operand).cloned(),
            });
            return Ok(None);
        };
        let to_type = driver.types.trace_type(driver.arena, target_type)?;
        match coerce_explicit(driver, value, &result.ast_type, &to_type, operand)? {
            Some(value) => Ok(Some(GenResult::value(value, to_type))),
            None => Ok(None),
        }
    }

    fn generate_string_literal<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        text: &str,
    ) -> Result<Option<GenResult<G::Value>>, CoreError> {
        let value = driver.target.generate_string_literal(text)?;
        let ty = Type::Pointer(Box::new(Type::Integer { bits: 8, signed: false }));
        Ok(Some(GenResult::value(value, ty)))
    }

    fn generate_integer_literal<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        text: &str,
    ) -> Result<Option<GenResult<G::Value>>, CoreError> {
        let (raw, bits, signed) = parse_integer_literal(text);
        let bits = bits.unwrap_or(driver.ctx.config.default_int_bits);
        let signed = signed.unwrap_or(true);
        let ty = Type::Integer { bits, signed };
        let lowered = driver.lower_type(&ty)?;
        let value = driver.target.generate_int_literal(&lowered, raw)?;
        Ok(Some(GenResult::value(value, ty)))
    }

    fn generate_float_literal<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        text: &str,
    ) -> Result<Option<GenResult<G::Value>>, CoreError> {
        let (raw, bits) = parse_float_literal(text);
        let bits = bits.unwrap_or(driver.ctx.config.default_float_bits);
        let ty = Type::Float { bits };
        let lowered = driver.lower_type(&ty)?;
        let value = driver.target.generate_float_literal(&lowered, raw)?;
        Ok(Some(GenResult::value(value, ty)))
    }
}

fn unwrap_brackets(arena: &Arena, mut node: NodeId) -> NodeId {
    while let AstKind::Bracket { inner } = arena.kind(node) {
        node = *inner;
    }
    node
}

/// Finds `name` among `scope`'s member-variable definitions, returning its
/// zero-based position among such members (for `generate_member_var_reference`'s
/// `field_index`) and its declared type-spec node.
fn find_field(arena: &Arena, scope: NodeId, name: &str) -> Option<(usize, NodeId)> {
    let mut index = 0;
    let mut found = None;
    for child in Scope::children(arena, scope) {
        if let AstKind::Definition { name: def_name, target } = arena.kind(*child) {
            if let Some((type_spec, _)) = arena.kind(*target).as_variable() {
                if found.is_none() && def_name == name {
                    found = Some((index, type_spec));
                }
                index += 1;
            }
        }
    }
    found
}

/// Loads `value` if `from` is a reference, returning the dereferenced value
/// alongside the content type — the r-value a cast or call should actually
/// operate on rather than the storage address `generate_target_reference`
/// handed back.
fn load_if_reference<G: TargetGenerator>(
    driver: &mut GenerationDriver<G>,
    value: G::Value,
    from: &Type,
) -> Result<(G::Value, Type), CoreError> {
    match from {
        Type::Reference(inner) => Ok((driver.target.generate_dereference(&value)?, (**inner).clone())),
        other => Ok((value, other.clone())),
    }
}

/// Casts `value` from `from` to `to` if they differ, requiring implicit
/// castability; raises `NotImplicitlyCastable` and returns `Ok(None)`
/// otherwise. Dereferences `from` first when it is a reference (spec.md
/// §4.3: dereferencing is a distinct step from casting).
pub(super) fn coerce_implicit<G: TargetGenerator>(
    driver: &mut GenerationDriver<G>,
    value: G::Value,
    from: &Type,
    to: &Type,
    site: NodeId,
) -> Result<Option<G::Value>, CoreError> {
    if from == to {
        return Ok(Some(value));
    }
    if !driver.types.is_implicitly_castable_to(from, to, &driver.ctx) {
        driver.notices.add(Notice::NotImplicitlyCastable {
            from: from.display_name(),
            to: to.display_name(),
            location: driver.arena.location(site).cloned(),
        });
        return Ok(None);
    }
    let (value, from) = load_if_reference(driver, value, from)?;
    if &from == to {
        return Ok(Some(value));
    }
    let from_lowered = driver.lower_type(&from)?;
    let to_lowered = driver.lower_type(to)?;
    Ok(Some(driver.target.generate_cast(&value, &from_lowered, &to_lowered)?))
}

/// As [`coerce_implicit`], but permits any explicitly castable pair; raises
/// `InvalidCast` on failure.
pub(super) fn coerce_explicit<G: TargetGenerator>(
    driver: &mut GenerationDriver<G>,
    value: G::Value,
    from: &Type,
    to: &Type,
    site: NodeId,
) -> Result<Option<G::Value>, CoreError> {
    if from == to {
        return Ok(Some(value));
    }
    if !driver.types.is_explicitly_castable_to(from, to, &driver.ctx) {
        driver.notices.add(Notice::InvalidCast {
            from: from.display_name(),
            to: to.display_name(),
            location: driver.arena.location(site).cloned(),
        });
        return Ok(None);
    }
    let (value, from) = load_if_reference(driver, value, from)?;
    if &from == to {
        return Ok(Some(value));
    }
    let from_lowered = driver.lower_type(&from)?;
    let to_lowered = driver.lower_type(to)?;
    Ok(Some(driver.target.generate_cast(&value, &from_lowered, &to_lowered)?))
}

/// Array indexing (spec.md §4.3): exactly one argument, cast to a 64-bit
/// signed integer, emits an array-element-reference.
fn array_index_from<G: TargetGenerator>(
    driver: &mut GenerationDriver<G>,
    base_value: G::Value,
    base_type: Type,
    arg_values: &[G::Value],
    arg_types: &[Type],
    site: NodeId,
) -> Result<Option<GenResult<G::Value>>, CoreError> {
    if arg_values.len() != 1 {
        driver.notices.add(Notice::UnsupportedOperation {
            message: "array indexing takes exactly one argument".to_string(),
            location: driver.arena.location(site).cloned(),
        });
        return Ok(None);
    }
    let array_type = match &base_type {
        Type::Reference(inner) if inner.is_array() => (**inner).clone(),
        other if other.is_array() => other.clone(),
        _ => {
            driver.notices.add(Notice::UnsupportedOperation {
                message: "indexing a non-array value".to_string(),
                location: driver.arena.location(site).cloned(),
            });
            return Ok(None);
        }
    };
    let element_type = match array_type {
        Type::Array { of, .. } => *of,
        _ => unreachable!(),
    };
    let index64 = Type::Integer { bits: 64, signed: true };
    let Some(index_value) = coerce_implicit(driver, arg_values[0].clone(), &arg_types[0], &index64, site)? else {
        return Ok(None);
    };
    let result = driver.target.generate_array_element_reference(&base_value, &index_value)?;
    Ok(Some(GenResult::value(result, Type::Reference(Box::new(element_type)))))
}

/// Parses an `IntegerLiteral`'s raw token: an optional `0b`/`0o`/`0h`
/// radix prefix, followed by digits, followed by an optional `u`/`iN`/`uN`
/// suffix (spec.md §4.3).
fn parse_integer_literal(text: &str) -> (i128, Option<u16>, Option<bool>) {
    let (mut digits, radix) = if let Some(rest) = text.strip_prefix("0b") {
        (rest, 2)
    } else if let Some(rest) = text.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = text.strip_prefix("0h") {
        (rest, 16)
    } else {
        (text, 10)
    };

    let mut bits = None;
    let mut signed = None;
    if let Some(pos) = digits.find(['i', 'u']) {
        let (head, suffix) = digits.split_at(pos);
        signed = Some(suffix.starts_with('i'));
        if let Ok(parsed) = suffix[1..].parse::<u16>() {
            bits = Some(parsed);
        }
        digits = head;
    }

    let value = i128::from_str_radix(digits, radix).unwrap_or(0);
    (value, bits, signed)
}

/// Parses a `FloatLiteral`'s raw token: a decimal literal with an optional
/// `fN` bit-width suffix (spec.md §4.3).
fn parse_float_literal(text: &str) -> (f64, Option<u16>) {
    if let Some(pos) = text.find('f') {
        let (head, suffix) = text.split_at(pos);
        let bits = suffix[1..].parse::<u16>().ok();
        (head.parse().unwrap_or(0.0), bits)
    } else {
        (text.parse().unwrap_or(0.0), None)
    }
}
