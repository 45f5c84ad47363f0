//! End-to-end expression/statement generation scenarios.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use spp_compiler::codegen::statement::StatementGenerator;
use spp_compiler::codegen::ControlFlow;
use spp_compiler::{
    Arena, AstKind, DataRoot, Definition, ExpressionGenerator, FunctionStage, GenerationDriver,
    Notice, Scope, Type,
};

#[test]
fn variable_declare_and_assign() {
    let mut arena = Arena::new();
    let m = module(&mut arena);
    let i32_ty = int_type(&mut arena, 32, true);
    define_var(&mut arena, m, "x", i32_ty);

    let assign_lhs = ident(&mut arena, "x");
    let assign_rhs = int_literal(&mut arena, "5");
    let assign = arena.alloc(
        AstKind::AssignmentOperator {
            lhs: assign_lhs,
            rhs: assign_rhs,
        },
        None,
    );

    let mut driver = GenerationDriver::new(&mut arena, RecordingTarget::new());
    let result = ExpressionGenerator::generate(&mut driver, assign, DataRoot::Node(m))
        .unwrap()
        .expect("assignment should lower");

    assert_eq!(result.ast_type, Type::Integer { bits: 32, signed: true });
    assert!(driver.notices().is_empty());

    // The variable's storage is allocated exactly once even though it is
    // referenced on the assignment's left-hand side.
    let alloca_count = driver.target().log.iter().filter(|l| l.contains("alloca")).count();
    assert_eq!(alloca_count, 1);
    assert!(driver.target().log.iter().any(|l| l.starts_with("store")));
}

#[test]
fn arithmetic_with_implicit_promotion() {
    let mut arena = Arena::new();
    let m = module(&mut arena);
    let i32_ty = int_type(&mut arena, 32, true);
    let i64_ty = int_type(&mut arena, 64, true);
    define_var(&mut arena, m, "a", i32_ty);
    define_var(&mut arena, m, "b", i64_ty);
    define_builtin_binop(&mut arena, m, "__add", "addInt", i64_ty, i64_ty, i64_ty);

    let add_lhs = ident(&mut arena, "a");
    let add_rhs = ident(&mut arena, "b");
    let add = arena.alloc(
        AstKind::InfixOperator {
            op: spp_compiler::InfixOp::Add,
            lhs: add_lhs,
            rhs: add_rhs,
        },
        None,
    );

    let mut driver = GenerationDriver::new(&mut arena, RecordingTarget::new());
    let result = ExpressionGenerator::generate(&mut driver, add, DataRoot::Node(m))
        .unwrap()
        .expect("addition should lower");

    assert_eq!(result.ast_type, Type::Integer { bits: 64, signed: true });
    assert!(driver.notices().is_empty());
    assert!(driver.target().log.iter().any(|l| l.contains("cast")));
    assert!(driver.target().log.iter().any(|l| l.contains("builtin addInt")));
}

#[test]
fn unary_negation_resolves_float_builtin() {
    let mut arena = Arena::new();
    let m = module(&mut arena);
    let f64_ty = float_type(&mut arena, 64);
    define_var(&mut arena, m, "x", f64_ty);
    define_builtin_unary_op(&mut arena, m, "__neg", "negFloat", f64_ty, f64_ty);

    let neg_operand = ident(&mut arena, "x");
    let neg = arena.alloc(
        AstKind::UnaryOperator {
            op: spp_compiler::UnaryOp::Neg,
            operand: neg_operand,
        },
        None,
    );

    let mut driver = GenerationDriver::new(&mut arena, RecordingTarget::new());
    let result = ExpressionGenerator::generate(&mut driver, neg, DataRoot::Node(m))
        .unwrap()
        .expect("negation should lower");

    assert_eq!(result.ast_type, Type::Float { bits: 64 });
    assert!(driver.notices().is_empty());
    // A unary call site only ever produces a single argument, so the
    // builtin lookup is never offered an arity-2 candidate to confuse it
    // with.
    assert!(driver.target().log.iter().any(|l| l.contains("builtin negFloat") && !l.contains(", ")));
}

#[test]
fn undefined_symbol_raises_one_notice_and_calls_nothing() {
    let mut arena = Arena::new();
    let m = module(&mut arena);
    let foo = ident(&mut arena, "foo");

    let mut driver = GenerationDriver::new(&mut arena, RecordingTarget::new());
    let result = ExpressionGenerator::generate(&mut driver, foo, DataRoot::Node(m)).unwrap();

    assert!(result.is_none());
    assert_eq!(driver.notices().notices().len(), 1);
    assert!(matches!(driver.notices().notices()[0], Notice::UnknownSymbol { ref name, .. } if name == "foo"));
    assert!(driver.target().log.is_empty());
}

#[test]
fn member_access_through_a_pointer() {
    let mut arena = Arena::new();
    let m = module(&mut arena);
    let i32_ty = int_type(&mut arena, 32, true);
    define_struct(&mut arena, m, "S", &[("field", i32_ty)]);
    // `ptr[S]` must point at the same `UserTypeExpr` node `S` resolves to.
    let s_name = ident(&mut arena, "S");
    let mut s_node = None;
    spp_compiler::Seeker::foreach(
        &arena,
        s_name,
        DataRoot::Node(m),
        spp_compiler::SeekerFlags::NONE,
        |target| {
            s_node = Some(target);
            spp_compiler::Verb::PerformAndStop
        },
    )
    .unwrap();
    let s_type = pointer_type(&mut arena, s_node.expect("S should be declared"));
    define_var(&mut arena, m, "p", s_type);

    // `p^.field`
    let content_operand = ident(&mut arena, "p");
    let content = arena.alloc(AstKind::ContentOp { operand: content_operand }, None);
    let field = ident(&mut arena, "field");
    let access = link(&mut arena, content, field);

    let mut driver = GenerationDriver::new(&mut arena, RecordingTarget::new());
    let result = ExpressionGenerator::generate(&mut driver, access, DataRoot::Node(m))
        .unwrap()
        .expect("member access should lower");

    assert_eq!(
        result.ast_type,
        Type::Reference(Box::new(Type::Integer { bits: 32, signed: true }))
    );
    assert!(driver.notices().is_empty());
    assert!(driver.target().log.iter().any(|l| l.contains("deref")));
    assert!(driver.target().log.iter().any(|l| l.contains("member")));
}

#[test]
fn overload_ambiguity_raises_no_callee_match() {
    let mut arena = Arena::new();
    let m = module(&mut arena);
    let i32_ty = int_type(&mut arena, 32, true);
    let f64_ty = float_type(&mut arena, 64);
    let i32_ty_2 = int_type(&mut arena, 32, true);
    let f64_ty_2 = float_type(&mut arena, 64);
    let f2_b_ty = int_type(&mut arena, 32, true);
    let f2_ret_ty = float_type(&mut arena, 64);
    define_function(&mut arena, m, "f", "#f1", vec![("a", i32_ty), ("b", f64_ty)], Some(i32_ty_2));
    define_function(&mut arena, m, "f", "#f2", vec![("a", f64_ty_2), ("b", f2_b_ty)], Some(f2_ret_ty));

    let call_callee = ident(&mut arena, "f");
    let call_arg1 = int_literal(&mut arena, "1");
    let call_arg2 = int_literal(&mut arena, "2");
    let call = arena.alloc(
        AstKind::ParamPass {
            callee: call_callee,
            args: vec![call_arg1, call_arg2],
        },
        None,
    );

    let mut driver = GenerationDriver::new(&mut arena, RecordingTarget::new());
    let result = ExpressionGenerator::generate(&mut driver, call, DataRoot::Node(m)).unwrap();

    assert!(result.is_none());
    assert!(driver
        .notices()
        .notices()
        .iter()
        .any(|n| matches!(n, Notice::NoCalleeMatch { name, .. } if name == "f")));
    // Neither candidate's own call was ever emitted, only the two literal
    // arguments.
    assert!(!driver.target().log.iter().any(|l| l.contains("call") || l.contains("builtin")));
}

#[test]
fn array_index_via_param_pass() {
    let mut arena = Arena::new();
    let m = module(&mut arena);
    let i32_ty = int_type(&mut arena, 32, true);
    let arr_ty = array_type(&mut arena, i32_ty, Some(10));
    define_var(&mut arena, m, "a", arr_ty);

    let index_callee = ident(&mut arena, "a");
    let index_arg = int_literal(&mut arena, "3");
    let index = arena.alloc(
        AstKind::ParamPass {
            callee: index_callee,
            args: vec![index_arg],
        },
        None,
    );

    let mut driver = GenerationDriver::new(&mut arena, RecordingTarget::new());
    let result = ExpressionGenerator::generate(&mut driver, index, DataRoot::Node(m))
        .unwrap()
        .expect("array index should lower");

    assert_eq!(
        result.ast_type,
        Type::Reference(Box::new(Type::Integer { bits: 32, signed: true }))
    );
    assert!(driver.notices().is_empty());
    assert!(driver.target().log.iter().any(|l| l.contains("elem")));
}

#[test]
fn block_scoping_shadows_outer_definitions() {
    let mut arena = Arena::new();
    let m = module(&mut arena);
    let outer_ty = int_type(&mut arena, 32, true);
    let inner_ty = int_type(&mut arena, 64, true);
    define_var(&mut arena, m, "x", outer_ty);

    let body = block(&mut arena);
    define_var(&mut arena, body, "x", inner_ty);
    let read_x = ident(&mut arena, "x");
    Scope::append_child(&mut arena, body, read_x).unwrap();

    let func = arena.alloc(
        AstKind::Function {
            name: "f".to_string(),
            params: vec![],
            return_type: None,
            body: Some(body),
            inline: false,
            stage: spp_compiler::FunctionStage::None,
        },
        None,
    );

    let mut driver = GenerationDriver::new(&mut arena, RecordingTarget::new());
    let flow = StatementGenerator::generate_block(&mut driver, body, DataRoot::Node(m), func).unwrap();
    assert_eq!(flow, ControlFlow::Continue);
    assert!(driver.notices().is_empty());
    // Only the inner `x` (int64) should have been allocated; the outer one
    // is shadowed and never referenced.
    assert_eq!(driver.target().log.iter().filter(|l| l.contains("alloca")).count(), 1);
    assert!(driver.target().log.iter().any(|l| l.contains("i64")));
}

#[test]
fn driver_run_declares_and_calls_across_functions() {
    let mut arena = Arena::new();
    let m = module(&mut arena);
    let i32_ty = int_type(&mut arena, 32, true);

    let helper_body = block(&mut arena);
    let helper_return_value = int_literal(&mut arena, "7");
    let helper_return = arena.alloc(
        AstKind::Return { value: Some(helper_return_value) },
        None,
    );
    Scope::append_child(&mut arena, helper_body, helper_return).unwrap();
    let helper = arena.alloc(
        AstKind::Function {
            name: "helper".to_string(),
            params: vec![],
            return_type: Some(i32_ty),
            body: Some(helper_body),
            inline: false,
            stage: FunctionStage::None,
        },
        None,
    );
    let helper_def = Definition::new(&mut arena, "helper", helper, None).unwrap();
    Scope::append_child(&mut arena, m, helper_def).unwrap();

    let main_body = block(&mut arena);
    let call_helper_callee = ident(&mut arena, "helper");
    let call_helper = arena.alloc(
        AstKind::ParamPass {
            callee: call_helper_callee,
            args: vec![],
        },
        None,
    );
    let main_return = arena.alloc(AstKind::Return { value: Some(call_helper) }, None);
    Scope::append_child(&mut arena, main_body, main_return).unwrap();
    let main = arena.alloc(
        AstKind::Function {
            name: "main".to_string(),
            params: vec![],
            return_type: Some(i32_ty),
            body: Some(main_body),
            inline: false,
            stage: FunctionStage::None,
        },
        None,
    );
    let main_def = Definition::new(&mut arena, "main", main, None).unwrap();
    Scope::append_child(&mut arena, m, main_def).unwrap();

    let mut driver = GenerationDriver::new(&mut arena, RecordingTarget::new());
    driver.run(m, DataRoot::Node(m)).unwrap();

    assert!(driver.notices().is_empty());
    // Stage 2 declared both signatures before either body was emitted.
    assert!(driver.target().log.iter().any(|l| l.starts_with("declare helper(")));
    assert!(driver.target().log.iter().any(|l| l.starts_with("declare main(")));
    // Stage 3 emitted `main`'s body, which calls the already-declared `helper`.
    assert!(driver.target().log.iter().any(|l| l.contains("call @helper()")));
    assert_eq!(driver.target().log.iter().filter(|l| l.starts_with("ret ")).count(), 2);
}
