//! Shared fixtures for the integration tests: small hand-built ASTs (there
//! is no parser in this crate) and a recording [`TargetGenerator`] double
//! standing in for a real backend.

#![allow(dead_code)]

use spp_compiler::{
    AstKind, Arena, CoreError, Definition, ExecutionContext, FunctionStage, LinkType, NodeId,
    Param, Scope, ScopeKind, TargetConfig, TargetGenerator,
};

pub fn module(arena: &mut Arena) -> NodeId {
    Scope::new(arena, ScopeKind::Module, None)
}

pub fn block(arena: &mut Arena) -> NodeId {
    Scope::new(arena, ScopeKind::Block, None)
}

pub fn int_type(arena: &mut Arena, bits: u16, signed: bool) -> NodeId {
    arena.alloc(AstKind::IntegerTypeExpr { bits, signed }, None)
}

pub fn float_type(arena: &mut Arena, bits: u16) -> NodeId {
    arena.alloc(AstKind::FloatTypeExpr { bits }, None)
}

pub fn pointer_type(arena: &mut Arena, to: NodeId) -> NodeId {
    arena.alloc(AstKind::PointerTypeExpr { to }, None)
}

pub fn reference_type(arena: &mut Arena, to: NodeId) -> NodeId {
    arena.alloc(AstKind::ReferenceTypeExpr { to }, None)
}

pub fn array_type(arena: &mut Arena, of: NodeId, length: Option<u64>) -> NodeId {
    arena.alloc(AstKind::ArrayTypeExpr { of, length }, None)
}

pub fn ident(arena: &mut Arena, name: &str) -> NodeId {
    arena.alloc(AstKind::Identifier { value: name.to_string() }, None)
}

pub fn link(arena: &mut Arena, first: NodeId, second: NodeId) -> NodeId {
    arena.alloc(
        AstKind::LinkOperator {
            link_type: LinkType::Dot,
            first,
            second,
        },
        None,
    )
}

pub fn int_literal(arena: &mut Arena, text: &str) -> NodeId {
    arena.alloc(AstKind::IntegerLiteral { text: text.to_string() }, None)
}

/// Declares a variable named `name` of type `type_spec` directly as a child
/// of `scope`, returning the `Variable` node (the reference target the
/// seeker hands back).
pub fn define_var(arena: &mut Arena, scope: NodeId, name: &str, type_spec: NodeId) -> NodeId {
    let var = arena.alloc(
        AstKind::Variable {
            type_spec,
            stage: FunctionStage::None,
        },
        None,
    );
    let def = Definition::new(arena, name, var, None).unwrap();
    Scope::append_child(arena, scope, def).unwrap();
    var
}

/// Declares a user-defined struct type with the given `(name, type_spec)`
/// fields, returning the `UserTypeExpr` node.
pub fn define_struct(arena: &mut Arena, scope: NodeId, name: &str, fields: &[(&str, NodeId)]) -> NodeId {
    let body = Scope::new(arena, ScopeKind::Plain, None);
    for (field_name, type_spec) in fields {
        define_var(arena, body, field_name, *type_spec);
    }
    let user_type = arena.alloc(
        AstKind::UserTypeExpr {
            name: name.to_string(),
            body,
        },
        None,
    );
    let def = Definition::new(arena, name, user_type, None).unwrap();
    Scope::append_child(arena, scope, def).unwrap();
    user_type
}

/// Declares a free function, returning its `Function` node.
pub fn define_function(
    arena: &mut Arena,
    scope: NodeId,
    overload_name: &str,
    backend_name: &str,
    params: Vec<(&str, NodeId)>,
    return_type: Option<NodeId>,
) -> NodeId {
    let func = arena.alloc(
        AstKind::Function {
            name: backend_name.to_string(),
            params: params
                .into_iter()
                .map(|(name, type_spec)| Param {
                    name: name.to_string(),
                    type_spec,
                })
                .collect(),
            return_type,
            body: None,
            inline: false,
            stage: FunctionStage::None,
        },
        None,
    );
    let def = Definition::new(arena, overload_name, func, None).unwrap();
    Scope::append_child(arena, scope, def).unwrap();
    func
}

/// Declares a built-in binary operator overload (e.g. `__add(int,int64)`
/// resolving to the backend primitive `#addInt`).
pub fn define_builtin_binop(
    arena: &mut Arena,
    scope: NodeId,
    overload_name: &str,
    builtin_name: &str,
    lhs_type: NodeId,
    rhs_type: NodeId,
    return_type: NodeId,
) -> NodeId {
    define_function(
        arena,
        scope,
        overload_name,
        &format!("#{builtin_name}"),
        vec![("a", lhs_type), ("b", rhs_type)],
        Some(return_type),
    )
}

/// Declares a built-in unary operator overload (e.g. `__neg(float)`
/// resolving to the backend primitive `#negFloat`).
pub fn define_builtin_unary_op(
    arena: &mut Arena,
    scope: NodeId,
    overload_name: &str,
    builtin_name: &str,
    operand_type: NodeId,
    return_type: NodeId,
) -> NodeId {
    define_function(
        arena,
        scope,
        overload_name,
        &format!("#{builtin_name}"),
        vec![("a", operand_type)],
        Some(return_type),
    )
}

/// A [`TargetGenerator`] that never fails and records every call it
/// receives, standing in for a real LLVM-bound backend in these tests.
pub struct RecordingTarget {
    pub ctx: ExecutionContext,
    pub log: Vec<String>,
    next: u32,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self {
            ctx: ExecutionContext::new(TargetConfig::default()),
            log: Vec::new(),
            next: 0,
        }
    }

    fn fresh(&mut self, prefix: &str) -> String {
        let id = self.next;
        self.next += 1;
        format!("{prefix}{id}")
    }
}

impl Default for RecordingTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetGenerator for RecordingTarget {
    type Value = String;
    type Type = String;

    fn execution_context(&self) -> &ExecutionContext {
        &self.ctx
    }

    fn get_int_type(&mut self, bits: u16, signed: bool) -> Result<String, CoreError> {
        Ok(format!("{}{bits}", if signed { "i" } else { "u" }))
    }

    fn get_float_type(&mut self, bits: u16) -> Result<String, CoreError> {
        Ok(format!("f{bits}"))
    }

    fn get_pointer_type(&mut self, inner: &String) -> Result<String, CoreError> {
        Ok(format!("ptr<{inner}>"))
    }

    fn get_array_type(&mut self, inner: &String, len: u64) -> Result<String, CoreError> {
        Ok(format!("[{inner}; {len}]"))
    }

    fn get_struct_type(&mut self, name: &str, field_types: &[String]) -> Result<String, CoreError> {
        Ok(format!("struct {name}({})", field_types.join(", ")))
    }

    fn generate_int_literal(&mut self, ty: &String, value: i128) -> Result<String, CoreError> {
        let v = self.fresh("v");
        self.log.push(format!("{v} = const {value}: {ty}"));
        Ok(v)
    }

    fn generate_float_literal(&mut self, ty: &String, value: f64) -> Result<String, CoreError> {
        let v = self.fresh("v");
        self.log.push(format!("{v} = const {value}: {ty}"));
        Ok(v)
    }

    fn generate_string_literal(&mut self, text: &str) -> Result<String, CoreError> {
        let v = self.fresh("v");
        self.log.push(format!("{v} = const {text:?}"));
        Ok(v)
    }

    fn generate_var_definition(&mut self, name: &str, ty: &String) -> Result<String, CoreError> {
        let v = self.fresh("slot");
        self.log.push(format!("{v} = alloca {name}: {ty}"));
        Ok(v)
    }

    fn generate_var_reference(&mut self, var: &String) -> Result<String, CoreError> {
        Ok(var.clone())
    }

    fn generate_member_var_reference(
        &mut self,
        base: &String,
        struct_type: &String,
        field_index: usize,
    ) -> Result<String, CoreError> {
        let v = self.fresh("v");
        self.log
            .push(format!("{v} = member {base}: {struct_type}[{field_index}]"));
        Ok(v)
    }

    fn generate_array_element_reference(&mut self, base: &String, index: &String) -> Result<String, CoreError> {
        let v = self.fresh("v");
        self.log.push(format!("{v} = elem {base}[{index}]"));
        Ok(v)
    }

    fn generate_dereference(&mut self, pointer: &String) -> Result<String, CoreError> {
        let v = self.fresh("v");
        self.log.push(format!("{v} = deref {pointer}"));
        Ok(v)
    }

    fn generate_function_decl(
        &mut self,
        name: &str,
        param_types: &[String],
        return_type: Option<&String>,
    ) -> Result<String, CoreError> {
        self.log.push(format!(
            "declare {name}({}) -> {}",
            param_types.join(", "),
            return_type.cloned().unwrap_or_else(|| "void".to_string())
        ));
        Ok(format!("@{name}"))
    }

    fn generate_function_call(&mut self, callee: &String, args: &[String]) -> Result<String, CoreError> {
        let v = self.fresh("v");
        self.log.push(format!("{v} = call {callee}({})", args.join(", ")));
        Ok(v)
    }

    fn generate_assign(&mut self, lhs: &String, rhs: &String) -> Result<(), CoreError> {
        self.log.push(format!("store {rhs} -> {lhs}"));
        Ok(())
    }

    fn generate_cast(&mut self, value: &String, from: &String, to: &String) -> Result<String, CoreError> {
        let v = self.fresh("v");
        self.log.push(format!("{v} = cast {value}: {from} -> {to}"));
        Ok(v)
    }

    fn generate_return(&mut self, value: Option<&String>) -> Result<(), CoreError> {
        match value {
            Some(value) => self.log.push(format!("ret {value}")),
            None => self.log.push("ret void".to_string()),
        }
        Ok(())
    }

    fn generate_branch(&mut self, condition: &String) -> Result<(), CoreError> {
        self.log.push(format!("br {condition}"));
        Ok(())
    }

    fn call_builtin(&mut self, name: &str, args: &[String]) -> Result<String, CoreError> {
        let v = self.fresh("v");
        self.log.push(format!("{v} = builtin {name}({})", args.join(", ")));
        Ok(v)
    }
}
