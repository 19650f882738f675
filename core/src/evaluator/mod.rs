//! Step-by-step evaluation of compiled expressions.
//!
//! The evaluator runs a well-typed [`Construct`] tree as a stack machine so
//! that a debugger or visualizer can pause after every observable effect.
//! Objects live in a [`Host`]; the evaluator only keeps handles to them.
//!
//! ## Design Principles
//!
//! - **Never panic on user programs**: null dereferences, out-of-bounds
//!   accesses, double frees and friends become [`SimulationEvent`]s.
//! - **Bounded**: stack depth, step count and allocation size are capped by
//!   [`ExecutionOptions`](crate::api::ExecutionOptions).
//! - **Short-circuiting**: `&&`, `||` and `?:` instantiate an operand only
//!   once it is known to run, so skipped operands never get a runtime node.
//!
//! ## Example
//!
//! ```ignore
//! use cppsim_core::evaluator::{self, SimpleHost};
//!
//! let mut host = SimpleHost::new(types);
//! let (result, events) = evaluator::evaluate(types, &construct, &mut host, Default::default())?;
//! assert_eq!(result.and_then(|r| r.as_value()).map(|v| v.as_i64()), Some(3));
//! ```

mod error;
mod eval;
mod events;
mod host;
mod operators;
mod simple_host;
mod simulation;
mod stack;

#[cfg(test)]
mod eval_test;

pub use error::ExecutionError;
pub use events::{
    EventLog, LifecycleEvent, LifecycleEventKind, Observer, SimulationEvent, SimulationEventKind,
};
pub use host::{ArrayBounds, EvalResult, Host, HostError, ObjectRef, Storage};
pub use operators::Issue;
pub use simple_host::{CallResult, NativeFunction, SimpleHost};
pub use simulation::{NodeId, Simulation, StepOutcome};
pub use stack::Stack;

use crate::analyzer::Construct;
use crate::api::ExecutionOptions;
use crate::types::TypeManager;

/// Runs `construct` to completion against `host`.
///
/// Returns the result (`None` for `void` expressions and crashed or
/// blocked runs) together with every event raised along the way.
pub fn evaluate<'a>(
    types: &'a TypeManager<'a>,
    construct: &Construct<'a>,
    host: &mut dyn Host<'a>,
    options: ExecutionOptions,
) -> Result<(Option<EvalResult<'a>>, EventLog), ExecutionError> {
    let mut simulation = Simulation::new(types, construct, host, options)?;
    let outcome = simulation.run()?;
    let result = match outcome {
        StepOutcome::Finished => simulation.result(),
        _ => None,
    };
    Ok((result, simulation.into_events()))
}
