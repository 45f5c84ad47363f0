//! Symbol resolution, type system, and expression code generation for a
//! programmable-language compiler front/middle-end.
//!
//! This crate owns three tightly-coupled subsystems: the [`seeker`] (walks
//! reference expressions over nested scopes), the [`types`] registry
//! (castability and overload resolution), and the [`codegen`] expression
//! lowering pipeline, which drives an abstract [`target::TargetGenerator`]
//! supplied by the host. Parsing, grammar, and the concrete backend are
//! outside this crate's scope; it consumes and produces ASTs built in its
//! own [`Arena`].

pub mod ast;
pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod diagnostics;
pub mod error;
pub mod identifiable;
pub mod node;
pub mod scope;
pub mod seeker;
pub mod target;
pub mod types;

pub use ast::{
    AstKind, Definition, FunctionStage, InfixOp, LinkType, Param, Scope, ScopeKind, UnaryOp,
};
pub use codegen::driver::GenerationDriver;
pub use codegen::expression::ExpressionGenerator;
pub use config::{ExecutionContext, TargetConfig};
pub use diagnostic::{render_notices, SourceMap};
pub use diagnostics::{Notice, NoticeStore};
pub use error::CoreError;
pub use identifiable::{named_map_scope, NodeTag};
pub use node::{Arena, FileId, NodeId, NodeLocation};
pub use scope::Repository;
pub use seeker::{DataRoot, Seeker, SeekerFlags, Verb};
pub use target::{GenResult, TargetGenerator, TargetHandle};
pub use types::{ArgMatchContext, MatchKind, Type, TypeRegistry};
