//! The statement/function-body generator (SPEC_FULL.md §4.4 supplement):
//! `Block`, `If`, `While`, `Return` lowering, dispatched from the same AST
//! tag space as the expression generator's operator table.

use super::expression::{coerce_explicit, coerce_implicit};
use super::driver::GenerationDriver;
use super::{ControlFlow, ExpressionGenerator};
use crate::ast::{AstKind, Scope, ScopeKind};
use crate::diagnostics::Notice;
use crate::error::CoreError;
use crate::node::NodeId;
use crate::scope::Repository;
use crate::seeker::DataRoot;
use crate::target::TargetGenerator;
use crate::types::Type;

/// A boolean-compatible condition type; conditions are narrowed to this via
/// an explicit cast (SPEC_FULL.md §4.4: "cast to a boolean-compatible
/// integer type").
fn condition_type() -> Type {
    Type::Integer { bits: 1, signed: false }
}

pub struct StatementGenerator;

impl StatementGenerator {
    /// Lowers `block`'s statements in order, pushing a fresh repository
    /// level so definitions declared inside it shadow outer ones and fall
    /// out of scope once the block ends. Stops early (without lowering the
    /// remaining statements) once a `return` is reached.
    pub fn generate_block<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        block: NodeId,
        root: DataRoot<'_>,
        enclosing_function: NodeId,
    ) -> Result<ControlFlow, CoreError> {
        let mut repo = match root {
            DataRoot::Repository(repo) => repo.clone(),
            // A Node root has no repository to extend; treat the node
            // itself as the sole outer level so nested blocks still scan
            // it before falling back to its own owner-chain ascent.
            DataRoot::Node(node) => {
                let mut repo = Repository::new();
                repo.push_level(node);
                repo
            }
        };
        repo.push_level(block);
        let nested_root = DataRoot::Repository(&repo);

        let statements = Scope::children(driver.arena, block).to_vec();
        for statement in statements {
            if Self::generate_statement(driver, statement, nested_root, enclosing_function)? == ControlFlow::Returned
            {
                return Ok(ControlFlow::Returned);
            }
        }
        Ok(ControlFlow::Continue)
    }

    fn generate_statement<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        statement: NodeId,
        root: DataRoot<'_>,
        enclosing_function: NodeId,
    ) -> Result<ControlFlow, CoreError> {
        match driver.arena.kind(statement).clone() {
            AstKind::Scope { kind: ScopeKind::Block, .. } => {
                Self::generate_block(driver, statement, root, enclosing_function)
            }
            AstKind::If {
                condition,
                then_branch,
                else_branch,
            } => Self::generate_if(driver, condition, then_branch, else_branch, root, enclosing_function),
            AstKind::While { condition, body } => Self::generate_while(driver, condition, body, root, enclosing_function),
            AstKind::Return { value } => Self::generate_return(driver, value, root, enclosing_function),
            // A local `Definition` declares a variable/type binding; its
            // target-level allocation is synthesized lazily on first
            // reference (`ExpressionGenerator::generate_target_reference`),
            // so the declaration itself emits nothing here.
            AstKind::Definition { .. } => Ok(ControlFlow::Continue),
            _ => {
                ExpressionGenerator::generate(driver, statement, root)?;
                Ok(ControlFlow::Continue)
            }
        }
    }

    fn generate_if<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
        root: DataRoot<'_>,
        enclosing_function: NodeId,
    ) -> Result<ControlFlow, CoreError> {
        let Some(cond_value) = Self::lower_condition(driver, condition, root)? else {
            return Ok(ControlFlow::Continue);
        };
        driver.target.generate_branch(&cond_value)?;
        let then_flow = Self::generate_block(driver, then_branch, root, enclosing_function)?;
        let else_flow = match else_branch {
            Some(else_branch) => Self::generate_block(driver, else_branch, root, enclosing_function)?,
            None => ControlFlow::Continue,
        };
        Ok(if then_flow == ControlFlow::Returned && else_flow == ControlFlow::Returned {
            ControlFlow::Returned
        } else {
            ControlFlow::Continue
        })
    }

    /// The loop body's control flow, including any `return` inside it, is
    /// local to that one pass through the body: a `while` loop never
    /// itself short-circuits the enclosing block. `break`/`continue` are
    /// not modeled (SPEC_FULL.md §4.4: no loop-control target stack).
    fn generate_while<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        condition: NodeId,
        body: NodeId,
        root: DataRoot<'_>,
        enclosing_function: NodeId,
    ) -> Result<ControlFlow, CoreError> {
        let Some(cond_value) = Self::lower_condition(driver, condition, root)? else {
            return Ok(ControlFlow::Continue);
        };
        driver.target.generate_branch(&cond_value)?;
        Self::generate_block(driver, body, root, enclosing_function)?;
        Ok(ControlFlow::Continue)
    }

    fn lower_condition<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        condition: NodeId,
        root: DataRoot<'_>,
    ) -> Result<Option<G::Value>, CoreError> {
        let Some(result) = ExpressionGenerator::generate(driver, condition, root)? else {
            return Ok(None);
        };
        let Some(value) = result.target_data else {
            driver.notices.add(Notice::UnsupportedOperation {
                message: "condition is a naming result, not a value".to_string(),
                location: driver.arena.location(condition).cloned(),
            });
            return Ok(None);
        };
        coerce_explicit(driver, value, &result.ast_type, &condition_type(), condition)
    }

    fn generate_return<G: TargetGenerator>(
        driver: &mut GenerationDriver<G>,
        value: Option<NodeId>,
        root: DataRoot<'_>,
        enclosing_function: NodeId,
    ) -> Result<ControlFlow, CoreError> {
        let return_type_node = match driver.arena.kind(enclosing_function) {
            AstKind::Function { return_type, .. } => *return_type,
            _ => {
                return Err(CoreError::MalformedReference {
                    reason: "enclosing_function is not a Function node",
                })
            }
        };

        match (value, return_type_node) {
            (None, None) => {
                driver.target.generate_return(None)?;
            }
            (None, Some(declared)) => {
                let declared_ty = driver.types.trace_type(driver.arena, declared)?;
                driver.notices.add(Notice::NotImplicitlyCastable {
                    from: Type::Void.display_name(),
                    to: declared_ty.display_name(),
                    location: driver.arena.location(enclosing_function).cloned(),
                });
            }
            (Some(expr), None) => {
                driver.notices.add(Notice::UnsupportedOperation {
                    message: "returning a value from a function declared to return nothing".to_string(),
                    location: driver.arena.location(expr).cloned(),
                });
            }
            (Some(expr), Some(declared)) => {
                if let Some(result) = ExpressionGenerator::generate(driver, expr, root)? {
                    match result.target_data {
                        Some(value) => {
                            let declared_ty = driver.types.trace_type(driver.arena, declared)?;
                            if let Some(casted) =
                                coerce_implicit(driver, value, &result.ast_type, &declared_ty, expr)?
                            {
                                driver.target.generate_return(Some(&casted))?;
                            }
                        }
                        None => {
                            driver.notices.add(Notice::UnsupportedOperation {
                                message: "return value is a naming result, not a value".to_string(),
                                location: driver.arena.location(expr).cloned(),
                            });
                        }
                    }
                }
            }
        }
        Ok(ControlFlow::Returned)
    }
}
