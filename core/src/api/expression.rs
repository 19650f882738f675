//! Compiled expressions.

use super::{Diagnostic, Error, ExecutionOptions};
use crate::analyzer::{Construct, ValueCategory};
use crate::equivalence;
use crate::evaluator::{self, EvalResult, EventLog, Host, Simulation};
use crate::types::{Type, TypeManager};
use crate::Vec;

/// A well-typed expression ready for execution.
///
/// Compiled expressions own their construct tree and borrow types and
/// entities from the engine's arena. Each run creates fresh runtime state,
/// so one expression can be simulated any number of times against
/// different hosts.
///
/// # Example
///
/// ```ignore
/// let expr = engine.compile(&build::binary(ArithmeticOp::Add, build::int(1), build::int(2)))?;
///
/// let mut host = SimpleHost::new(engine.type_manager());
/// let (result, events) = expr.run(&mut host)?;
/// assert_eq!(result.and_then(|r| r.as_value()).map(|v| v.as_i64()), Some(3));
/// assert!(events.simulation.is_empty());
/// ```
#[derive(Debug)]
pub struct CompiledExpression<'arena> {
    construct: Construct<'arena>,

    /// Type manager the runtime creates values with
    type_manager: &'arena TypeManager<'arena>,

    /// Non-error notes found while compiling
    warnings: Vec<Diagnostic>,

    options: ExecutionOptions,
}

impl<'arena> CompiledExpression<'arena> {
    pub(crate) fn new(
        construct: Construct<'arena>,
        type_manager: &'arena TypeManager<'arena>,
        warnings: Vec<Diagnostic>,
        options: ExecutionOptions,
    ) -> Self {
        Self {
            construct,
            type_manager,
            warnings,
            options,
        }
    }

    pub fn construct(&self) -> &Construct<'arena> {
        &self.construct
    }

    /// Type of the expression's result.
    pub fn ty(&self) -> Option<&'arena Type<'arena>> {
        self.construct.ty()
    }

    pub fn value_category(&self) -> Option<ValueCategory> {
        self.construct.value_category()
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Runs the expression to completion against `host`.
    ///
    /// Returns the result (`None` for `void` expressions and crashed or
    /// blocked runs) and the events raised on the way. Undefined behavior
    /// and crashes of the simulated program are events, not errors.
    pub fn run(
        &self,
        host: &mut dyn Host<'arena>,
    ) -> Result<(Option<EvalResult<'arena>>, EventLog), Error> {
        evaluator::evaluate(self.type_manager, &self.construct, host, self.options.clone())
            .map_err(Error::from)
    }

    /// Starts a step-by-step simulation against `host`.
    pub fn simulate<'h>(
        &self,
        host: &'h mut dyn Host<'arena>,
    ) -> Result<Simulation<'_, 'arena, 'h>, Error> {
        Simulation::new(self.type_manager, &self.construct, host, self.options.clone())
            .map_err(Error::from)
    }

    /// Whether `other` computes the same thing, up to the rewrites listed in
    /// [`equivalence`].
    pub fn is_equivalent_to(&self, other: &CompiledExpression<'arena>) -> bool {
        equivalence::are_equivalent(&self.construct, &other.construct)
    }
}
