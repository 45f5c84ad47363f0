//! Property-style tests for the seeker and the type registry/overload
//! resolver, independent of code generation.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use spp_compiler::types::match_candidate;
use spp_compiler::{
    Arena, AstKind, DataRoot, ExecutionContext, ExpressionGenerator, GenerationDriver, MatchKind,
    Notice, NodeLocation, NoticeStore, Repository, Scope, Seeker, SeekerFlags, Type, TypeRegistry,
    Verb,
};

#[test]
fn foreach_visits_in_declaration_order_innermost_first() {
    let mut arena = Arena::new();
    let outer = module(&mut arena);
    let i32_ty = int_type(&mut arena, 32, true);
    define_var(&mut arena, outer, "x", i32_ty);

    let inner = block(&mut arena);
    Scope::append_child(&mut arena, outer, inner).unwrap();
    let first = define_var(&mut arena, inner, "x", i32_ty);
    let second_ty = int_type(&mut arena, 64, true);
    let second = define_var(&mut arena, inner, "x", second_ty);

    let x = ident(&mut arena, "x");
    let mut seen = Vec::new();
    Seeker::foreach(&arena, x, DataRoot::Node(inner), SeekerFlags::NONE, |target| {
        seen.push(target);
        Verb::PerformAndMove
    })
    .unwrap();

    // The two `x`s declared directly in `inner` come first, in declaration
    // order; the outer `x` (reached via owner-chain ascent) comes last.
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0], first);
    assert_eq!(seen[1], second);
}

#[test]
fn skip_owners_excludes_outer_scopes() {
    let mut arena = Arena::new();
    let outer = module(&mut arena);
    let i32_ty = int_type(&mut arena, 32, true);
    define_var(&mut arena, outer, "x", i32_ty);

    let inner = block(&mut arena);
    Scope::append_child(&mut arena, outer, inner).unwrap();

    let x = ident(&mut arena, "x");
    let mut seen = Vec::new();
    Seeker::foreach(&arena, x, DataRoot::Node(inner), SeekerFlags::SKIP_OWNERS, |target| {
        seen.push(target);
        Verb::PerformAndMove
    })
    .unwrap();

    assert!(seen.is_empty());
}

#[test]
fn set_then_get_round_trips() {
    let mut arena = Arena::new();
    let m = module(&mut arena);
    let placeholder = arena.alloc(AstKind::IntegerLiteral { text: "0".to_string() }, None);

    // Missing-slot synthesis (the "add" side of set/get/add/remove) is only
    // offered over a `Repository` root, which alone can tell the seeker
    // which level a brand-new definition belongs in.
    let mut repo = Repository::new();
    repo.push_level(m);

    let x = ident(&mut arena, "x");
    let did_set = Seeker::try_set(&mut arena, x, DataRoot::Repository(&repo), placeholder).unwrap();
    assert!(did_set);

    let x_again = ident(&mut arena, "x");
    let found = Seeker::try_get(&arena, x_again, DataRoot::Node(m)).unwrap();
    assert_eq!(found, Some(placeholder));
}

#[test]
fn remove_then_get_is_absent() {
    let mut arena = Arena::new();
    let m = module(&mut arena);
    let i32_ty = int_type(&mut arena, 32, true);
    define_var(&mut arena, m, "x", i32_ty);

    let x = ident(&mut arena, "x");
    let removed = Seeker::try_remove(&mut arena, x, DataRoot::Node(m)).unwrap();
    assert!(removed);

    let x_again = ident(&mut arena, "x");
    let found = Seeker::try_get(&arena, x_again, DataRoot::Node(m)).unwrap();
    assert_eq!(found, None);
}

#[test]
fn overload_resolution_prefers_exact_over_castable() {
    let registry = TypeRegistry::new();
    let ctx = ExecutionContext::default();
    let i32_ty = Type::Integer { bits: 32, signed: true };
    let i64_ty = Type::Integer { bits: 64, signed: true };

    let exact = match_candidate(&registry, &[i32_ty.clone()], false, &[i32_ty.clone()], &ctx);
    let castable = match_candidate(&registry, &[i64_ty.clone()], false, &[i32_ty.clone()], &ctx);

    assert_eq!(exact, MatchKind::Exact);
    assert_eq!(castable, MatchKind::Castable);
    assert!(exact > castable);
}

#[test]
fn integer_literal_parses_radix_prefix_and_width_suffix() {
    let mut arena = Arena::new();
    let m = module(&mut arena);
    let literal = int_literal(&mut arena, "0b1010i8");

    let mut driver = GenerationDriver::new(&mut arena, RecordingTarget::new());
    let result = ExpressionGenerator::generate(&mut driver, literal, DataRoot::Node(m))
        .unwrap()
        .expect("a literal always lowers");

    assert_eq!(result.ast_type, Type::Integer { bits: 8, signed: true });
    assert!(driver.notices().is_empty());
    assert!(driver.target().log.iter().any(|l| l.contains("const 10")));
}

#[test]
fn notice_store_location_stack_is_balanced_across_success_and_failure() {
    let mut store = NoticeStore::new();
    let loc = NodeLocation::new(spp_compiler::FileId(0), 1, 1, 0, 1);

    store.with_location(loc.clone(), |s| {
        s.add(Notice::UnsupportedOperation {
            message: "probe".to_string(),
            location: None,
        });
    });
    assert!(store.check_balanced(0).is_ok());

    // A panicking body still pops its location via the guard's `Drop`.
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        store.with_location(loc, |_| panic!("boom"));
    }));
    assert!(result.is_err());
    assert!(store.check_balanced(0).is_ok());
}
