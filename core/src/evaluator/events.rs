//! Events produced while a simulation runs.
//!
//! Two streams come out of a [`Simulation`](super::Simulation):
//! - [`LifecycleEvent`]s trace every runtime node through the stack (pushed,
//!   evaluated, popped, ...). Visualizers and tests watch these.
//! - [`SimulationEvent`]s report things the simulated C++ program did that
//!   a programmer should hear about: undefined behavior, failed assertions,
//!   crashes.
//!
//! Both are recorded in an [`EventLog`] and forwarded to an optional
//! [`Observer`].

use super::simulation::NodeId;
use crate::ast::Span;
use crate::{String, Vec};
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEventKind {
    /// The node was created and pushed onto the stack.
    Pushed,
    /// The node pushed the given child.
    UpNext,
    /// The node cannot make progress until input arrives.
    Waiting,
    /// The node has its result.
    Evaluated,
    Popped,
    /// The node is on top of the stack and ready to step.
    Current,
    Uncurrent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleEvent {
    pub node: NodeId,
    /// Kind name of the construct the node runs.
    pub construct: &'static str,
    pub kind: LifecycleEventKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationEventKind {
    UndefinedBehavior,
    UnspecifiedBehavior,
    ImplementationDefinedBehavior,
    MemoryLeak,
    AssertionFailure,
    Crash,
}

impl SimulationEventKind {
    pub fn name(self) -> &'static str {
        match self {
            SimulationEventKind::UndefinedBehavior => "UNDEFINED_BEHAVIOR",
            SimulationEventKind::UnspecifiedBehavior => "UNSPECIFIED_BEHAVIOR",
            SimulationEventKind::ImplementationDefinedBehavior => "IMPLEMENTATION_DEFINED_BEHAVIOR",
            SimulationEventKind::MemoryLeak => "MEMORY_LEAK",
            SimulationEventKind::AssertionFailure => "ASSERTION_FAILURE",
            SimulationEventKind::Crash => "CRASH",
        }
    }

    /// Fatal events halt the simulation.
    pub fn is_fatal(self) -> bool {
        self == SimulationEventKind::Crash
    }
}

impl fmt::Display for SimulationEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationEvent {
    pub kind: SimulationEventKind,
    pub message: String,
    /// Node that raised the event.
    pub node: NodeId,
    pub span: Span,
}

impl SimulationEvent {
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

impl fmt::Display for SimulationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Receives events as they happen. Both methods default to doing nothing.
pub trait Observer {
    fn lifecycle(&mut self, _event: &LifecycleEvent) {}

    fn simulation(&mut self, _event: &SimulationEvent) {}
}

/// Every event of a simulation, in order.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub lifecycle: Vec<LifecycleEvent>,
    pub simulation: Vec<SimulationEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulation events of `kind`.
    pub fn of_kind(&self, kind: SimulationEventKind) -> impl Iterator<Item = &SimulationEvent> {
        self.simulation.iter().filter(move |e| e.kind == kind)
    }

    pub fn has(&self, kind: SimulationEventKind) -> bool {
        self.of_kind(kind).next().is_some()
    }

    /// Construct names of nodes that produced a result, in evaluation order.
    pub fn evaluated(&self) -> Vec<&'static str> {
        self.lifecycle
            .iter()
            .filter(|e| e.kind == LifecycleEventKind::Evaluated)
            .map(|e| e.construct)
            .collect()
    }

    /// Whether a node for the construct at `span` ever produced a result.
    pub fn was_evaluated(&self, span: &Span) -> bool {
        self.lifecycle
            .iter()
            .any(|e| e.kind == LifecycleEventKind::Evaluated && &e.span == span)
    }
}
