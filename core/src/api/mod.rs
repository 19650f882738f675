//! Public API for the C++ expression simulator.
//!
//! This module provides the stable surface for compiling and simulating
//! expressions:
//!
//! 1. **Engine**: owns the type manager and the global declarations, and
//!    compiles parsed [`Expr`](crate::ast::Expr) trees.
//! 2. **CompiledExpression**: a well-typed construct tree that can be run
//!    to completion or stepped through a [`Simulation`](crate::evaluator::Simulation).
//!
//! Compile-time problems come back as [`Diagnostic`]s inside
//! [`Error::Compilation`]. Undefined behavior and crashes of the simulated
//! program are not errors; they are events in the run's
//! [`EventLog`](crate::evaluator::EventLog).
//!
//! # Example
//!
//! ```ignore
//! use cppsim_core::api::{Engine, EngineOptions};
//! use cppsim_core::ast::{ArithmeticOp, build};
//! use cppsim_core::evaluator::SimpleHost;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let engine = Engine::new(&arena, EngineOptions::default(), |_types, _env| Ok(()))?;
//!
//! let expr = engine.compile(&build::binary(ArithmeticOp::Add, build::int(1), build::int(2)))?;
//! let mut host = SimpleHost::new(engine.type_manager());
//! let (result, _events) = expr.run(&mut host)?;
//! ```

pub mod engine;
pub mod environment;
pub mod error;
pub mod expression;
pub mod options;


pub use engine::Engine;
pub use environment::EnvironmentBuilder;
pub use error::{Diagnostic, Error, RelatedInfo, Severity};
pub use expression::CompiledExpression;
pub use options::{CompileOptions, EngineOptions, ExecutionOptions};
