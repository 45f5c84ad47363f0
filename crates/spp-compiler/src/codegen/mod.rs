//! Expression and statement/function code generation (spec.md §4.3, §4.4).

pub mod driver;
pub mod expression;
pub mod statement;

pub use driver::GenerationDriver;
pub use expression::ExpressionGenerator;

/// Whether a statement lowering fell through to its next sibling or
/// short-circuited the enclosing block, per SPEC_FULL.md §4.4: "a `return`
/// short-circuits the remaining statements in the same block".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Continue,
    Returned,
}
