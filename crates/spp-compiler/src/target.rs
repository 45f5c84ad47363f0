//! The target-generator interface (spec.md §6): the core's sole coupling to
//! a concrete backend. A host implements [`TargetGenerator`] (e.g. bound to
//! an LLVM `Builder`); this crate never constructs one itself.

use crate::config::ExecutionContext;
use crate::error::CoreError;
use crate::node::NodeId;
use crate::types::Type;
use std::fmt;

/// The result of lowering one AST expression (spec.md §4.3).
///
/// `ast_node` is set only when the result is a pure naming result (e.g. a
/// resolved module) rather than a runtime value, matching spec.md's
/// "`astNode` is set when the result is a pure naming result".
#[derive(Debug, Clone)]
pub struct GenResult<V> {
    /// Absent for a pure naming result (`ast_node` is set instead): a
    /// resolved module has no backend-level value of its own.
    pub target_data: Option<V>,
    pub ast_type: Type,
    pub ast_node: Option<NodeId>,
}

impl<V> GenResult<V> {
    pub fn value(target_data: V, ast_type: Type) -> Self {
        Self {
            target_data: Some(target_data),
            ast_type,
            ast_node: None,
        }
    }

    pub fn naming(ast_type: Type, ast_node: NodeId) -> Self {
        Self {
            target_data: None,
            ast_type,
            ast_node: Some(ast_node),
        }
    }
}

/// An opaque, backend-owned reference to something the target generator
/// produced: a variable slot, a function, a type. The core only ever moves
/// these around and hands them back to the same `TargetGenerator`.
pub trait TargetHandle: Clone + fmt::Debug {}
impl<T: Clone + fmt::Debug> TargetHandle for T {}

/// Abstract backend operations (spec.md §6). All fallible operations return
/// `CoreError` on a backend-side failure; the expression generator is
/// responsible for raising `Notice`s for AST-level problems before ever
/// calling into this trait.
pub trait TargetGenerator {
    /// A backend value: a register, a variable slot, a basic-block label.
    type Value: TargetHandle;
    /// A backend type descriptor.
    type Type: TargetHandle;

    fn execution_context(&self) -> &ExecutionContext;

    // -- type construction --------------------------------------------
    fn get_int_type(&mut self, bits: u16, signed: bool) -> Result<Self::Type, CoreError>;
    fn get_float_type(&mut self, bits: u16) -> Result<Self::Type, CoreError>;
    fn get_pointer_type(&mut self, inner: &Self::Type) -> Result<Self::Type, CoreError>;
    fn get_array_type(&mut self, inner: &Self::Type, len: u64) -> Result<Self::Type, CoreError>;
    fn get_struct_type(
        &mut self,
        name: &str,
        field_types: &[Self::Type],
    ) -> Result<Self::Type, CoreError>;

    // -- value production ----------------------------------------------
    fn generate_int_literal(&mut self, ty: &Self::Type, value: i128) -> Result<Self::Value, CoreError>;
    fn generate_float_literal(&mut self, ty: &Self::Type, value: f64) -> Result<Self::Value, CoreError>;
    fn generate_string_literal(&mut self, text: &str) -> Result<Self::Value, CoreError>;

    // -- variable ops ----------------------------------------------------
    fn generate_var_definition(
        &mut self,
        name: &str,
        ty: &Self::Type,
    ) -> Result<Self::Value, CoreError>;
    fn generate_var_reference(&mut self, var: &Self::Value) -> Result<Self::Value, CoreError>;
    fn generate_member_var_reference(
        &mut self,
        base: &Self::Value,
        struct_type: &Self::Type,
        field_index: usize,
    ) -> Result<Self::Value, CoreError>;
    fn generate_array_element_reference(
        &mut self,
        base: &Self::Value,
        index: &Self::Value,
    ) -> Result<Self::Value, CoreError>;
    fn generate_dereference(&mut self, pointer: &Self::Value) -> Result<Self::Value, CoreError>;

    // -- control ----------------------------------------------------------
    fn generate_function_decl(
        &mut self,
        name: &str,
        param_types: &[Self::Type],
        return_type: Option<&Self::Type>,
    ) -> Result<Self::Value, CoreError>;
    fn generate_function_call(
        &mut self,
        callee: &Self::Value,
        args: &[Self::Value],
    ) -> Result<Self::Value, CoreError>;
    fn generate_assign(&mut self, lhs: &Self::Value, rhs: &Self::Value) -> Result<(), CoreError>;
    fn generate_cast(
        &mut self,
        value: &Self::Value,
        from: &Self::Type,
        to: &Self::Type,
    ) -> Result<Self::Value, CoreError>;
    fn generate_return(&mut self, value: Option<&Self::Value>) -> Result<(), CoreError>;
    fn generate_branch(&mut self, condition: &Self::Value) -> Result<(), CoreError>;

    /// Dispatches one of the arithmetic/comparison primitives named in
    /// spec.md §4.3 (`addInt`, `subFloat`, `equalInt`, …) by name. The
    /// expression generator guarantees `args` has the arity the named
    /// primitive expects before calling this.
    fn call_builtin(&mut self, name: &str, args: &[Self::Value]) -> Result<Self::Value, CoreError>;
}
