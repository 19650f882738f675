//! cppsim - the expression core of a C++ teaching simulator
//!
//! # Overview
//!
//! cppsim compiles C++ expressions into typed construct trees and runs them
//! one observable step at a time, so a visualizer can show learners what
//! the language does. Besides plain evaluation it:
//!
//! - Inserts and names every implicit conversion (lvalue-to-rvalue, array
//!   decay, promotions, null pointer conversions and friends)
//! - Resolves function and operator overloads
//! - Reports undefined behavior, unspecified behavior and crashes as events
//!   instead of failing
//! - Decides whether two expressions are semantically equivalent
//!
//! Parsing is the host's business: expressions arrive as [`ast::Expr`]
//! trees.
//!
//! # Quick Start
//!
//! ```ignore
//! use cppsim::{Engine, EngineOptions};
//! use cppsim::ast::{ArithmeticOp, build};
//! use cppsim::entities::VariableKind;
//! use cppsim::evaluator::SimpleHost;
//! use bumpalo::Bump;
//!
//! // Create an arena for types and entities
//! let arena = Bump::new();
//!
//! // Declare `int x;`
//! let engine = Engine::new(&arena, EngineOptions::default(), |types, env| {
//!     env.declare_variable(types.declare_variable("x", types.int(), VariableKind::Global))?;
//!     Ok(())
//! })?;
//!
//! // Compile `x + 1`
//! let expr = engine.compile(&build::binary(ArithmeticOp::Add, build::ident("x"), build::int(1)))?;
//!
//! // Run it against a host holding the objects
//! let mut host = SimpleHost::new(engine.type_manager());
//! let (result, events) = expr.run(&mut host)?;
//! ```

pub mod error_renderer;

// Re-export public API from cppsim_core
pub use cppsim_core::api::{
    CompileOptions, CompiledExpression, Diagnostic, Engine, EngineOptions, EnvironmentBuilder,
    Error, ExecutionOptions, RelatedInfo, Severity,
};

// Re-export the building blocks hosts work with
pub use cppsim_core::analyzer::{self, Construct, ConstructKind, ConversionKind, ValueCategory};
pub use cppsim_core::ast::{self, Expr, Span};
pub use cppsim_core::entities;
pub use cppsim_core::equivalence::{self, are_equivalent};
pub use cppsim_core::evaluator::{
    self, EvalResult, EventLog, Host, SimpleHost, Simulation, SimulationEvent, SimulationEventKind,
    StepOutcome,
};
pub use cppsim_core::scope;
pub use cppsim_core::types::{self, Type, TypeManager};
pub use cppsim_core::values::{self, Value};

pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};
