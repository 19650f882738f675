//! The driver loop.
//!
//! A [`Simulation`] instantiates runtime nodes for a compiled construct tree
//! on demand and moves them through an explicit stack. Each node goes
//! through two phases:
//!
//! - **up next**: while the node is on top of the stack it decides which
//!   children to push. Most kinds push every child at once, in reverse, so
//!   they pop in evaluation order. `&&`, `||` and `?:` push one operand at
//!   a time, so a branch that is never taken never gets a runtime node.
//!   Some kinds (identifiers, parentheses) finish right here without a step
//!   of their own.
//! - **step**: once every child it needs is done the node becomes current
//!   and the next call to [`step_forward`](Simulation::step_forward) performs
//!   its effect, records its result and pops it.
//!
//! After each step the up-next loop runs until the top of the stack is a
//! node waiting to step, so every call leaves the simulation paused right
//! before an observable effect.

use super::error::ExecutionError;
use super::events::{
    EventLog, LifecycleEvent, LifecycleEventKind, Observer, SimulationEvent, SimulationEventKind,
};
use super::host::{EvalResult, Host};
use super::stack::Stack;
use crate::analyzer::{Construct, ConstructKind};
use crate::api::ExecutionOptions;
use crate::types::TypeManager;
use crate::{String, Vec};
use core::fmt;
use smallvec::SmallVec;
use tracing::{debug, trace};

/// Index of a runtime node within its simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Phase {
    /// Pushing children.
    Pending,
    /// All needed children are done; waiting to step.
    Ready,
    Done,
}

pub(super) struct RuntimeNode<'m, 'a> {
    pub(super) model: &'m Construct<'a>,
    /// Instantiated children by source-order slot.
    pub(super) children: SmallVec<[Option<NodeId>; 4]>,
    pub(super) phase: Phase,
    pub(super) result: Option<EvalResult<'a>>,
}

/// Child slots in the order they are evaluated.
pub(super) type Slots = SmallVec<[usize; 4]>;

/// What a node wants after an up-next check.
pub(super) enum UpNext<'a> {
    /// Instantiate these children and push them so the first one is on top.
    Push(Slots),
    /// Finished without a step.
    Immediate(Option<EvalResult<'a>>),
    /// Ready to step.
    Ready,
}

/// Outcome of a step.
pub(super) enum Operated<'a> {
    Done(Option<EvalResult<'a>>),
    /// Blocked on input; the step is retried next time.
    Wait,
    /// A fatal event was raised.
    Halted,
}

/// Where a simulation stands after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// More steps remain.
    Running,
    /// The current node needs input before it can step.
    WaitingForInput,
    /// The whole expression has been evaluated.
    Finished,
    /// A fatal event stopped the simulation.
    Crashed,
}

/// One evaluation of a compiled expression.
pub struct Simulation<'m, 'a, 'h> {
    pub(super) types: &'a TypeManager<'a>,
    pub(super) host: &'h mut dyn Host<'a>,
    observer: Option<&'h mut dyn Observer>,
    pub(super) options: ExecutionOptions,
    pub(super) nodes: Vec<RuntimeNode<'m, 'a>>,
    stack: Stack<NodeId>,
    events: EventLog,
    model: &'m Construct<'a>,
    steps: usize,
    started: bool,
    crashed: bool,
}

impl<'m, 'a, 'h> Simulation<'m, 'a, 'h> {
    /// Prepares a simulation of `model`, which must be executable.
    pub fn new(
        types: &'a TypeManager<'a>,
        model: &'m Construct<'a>,
        host: &'h mut dyn Host<'a>,
        options: ExecutionOptions,
    ) -> Result<Self, ExecutionError> {
        if !model.is_executable() {
            return Err(ExecutionError::NotExecutable {
                construct: model.kind_name(),
            });
        }
        let stack = Stack::new(options.max_stack_depth);
        Ok(Simulation {
            types,
            host,
            observer: None,
            options,
            nodes: Vec::new(),
            stack,
            events: EventLog::new(),
            model,
            steps: 0,
            started: false,
            crashed: false,
        })
    }

    /// Forwards every event to `observer` as it happens.
    pub fn with_observer(mut self, observer: &'h mut dyn Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn into_events(self) -> EventLog {
        self.events
    }

    /// Result of the whole expression, once finished.
    pub fn result(&self) -> Option<EvalResult<'a>> {
        self.nodes.first().and_then(|root| root.result)
    }

    pub fn is_finished(&self) -> bool {
        self.started && self.stack.is_empty()
    }

    pub fn is_crashed(&self) -> bool {
        self.crashed
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Construct run by the node on top of the stack.
    pub fn current(&self) -> Option<&'m Construct<'a>> {
        self.stack.peek().map(|id| self.node(*id).model)
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Feeds standard input to a simulation waiting on `>>`.
    pub fn provide_input(&mut self, text: &str) {
        self.host.provide_input(text);
    }

    /// Performs one step: the current node's effect, then up-next checks
    /// until another node is ready to step.
    pub fn step_forward(&mut self) -> Result<StepOutcome, ExecutionError> {
        if !self.started {
            self.started = true;
            let root = self.instantiate(self.model)?;
            self.push(root, None)?;
            self.settle()?;
            return Ok(self.outcome());
        }
        if self.crashed || self.stack.is_empty() {
            return Ok(self.outcome());
        }

        if let Some(max_steps) = self.options.max_steps {
            if self.steps >= max_steps {
                return Err(ExecutionError::StepLimitExceeded { max_steps });
            }
        }
        self.steps += 1;

        if let Some(&top) = self.stack.peek() {
            if self.node(top).phase == Phase::Ready {
                match self.operate(top)? {
                    Operated::Done(result) => self.complete(top, result),
                    Operated::Wait => {
                        self.lifecycle(top, LifecycleEventKind::Waiting);
                        return Ok(StepOutcome::WaitingForInput);
                    }
                    Operated::Halted => return Ok(StepOutcome::Crashed),
                }
            }
        }
        self.settle()?;
        Ok(self.outcome())
    }

    /// Steps until the expression finishes, crashes or waits for input.
    pub fn run(&mut self) -> Result<StepOutcome, ExecutionError> {
        loop {
            match self.step_forward()? {
                StepOutcome::Running => continue,
                outcome => return Ok(outcome),
            }
        }
    }

    fn outcome(&self) -> StepOutcome {
        if self.crashed {
            StepOutcome::Crashed
        } else if self.stack.is_empty() {
            StepOutcome::Finished
        } else {
            StepOutcome::Running
        }
    }

    /// Runs up-next checks until the top of the stack must step.
    fn settle(&mut self) -> Result<(), ExecutionError> {
        while !self.crashed {
            let Some(&top) = self.stack.peek() else {
                break;
            };
            if self.node(top).phase != Phase::Pending {
                break;
            }
            match self.up_next(top)? {
                UpNext::Push(slots) => {
                    let parent = self.node(top).model;
                    let models = parent.children();
                    let mut children: SmallVec<[NodeId; 4]> = SmallVec::new();
                    for slot in slots {
                        let child = self.instantiate(models[slot])?;
                        self.node_mut(top).children[slot] = Some(child);
                        children.push(child);
                    }
                    self.lifecycle(top, LifecycleEventKind::UpNext);
                    for child in children.into_iter().rev() {
                        self.push(child, Some(top))?;
                    }
                }
                UpNext::Immediate(result) => self.complete(top, result),
                UpNext::Ready => {
                    self.node_mut(top).phase = Phase::Ready;
                    self.lifecycle(top, LifecycleEventKind::Current);
                }
            }
        }
        Ok(())
    }

    fn instantiate(&mut self, model: &'m Construct<'a>) -> Result<NodeId, ExecutionError> {
        if !model.is_well_typed() {
            return Err(ExecutionError::NotExecutable {
                construct: model.kind_name(),
            });
        }
        let id = NodeId(self.nodes.len() as u32);
        let slots = model.children().len();
        self.nodes.push(RuntimeNode {
            model,
            children: core::iter::repeat_n(None, slots).collect(),
            phase: Phase::Pending,
            result: None,
        });
        Ok(id)
    }

    fn push(&mut self, id: NodeId, parent: Option<NodeId>) -> Result<(), ExecutionError> {
        if self.stack.is_full() {
            return Err(ExecutionError::StackOverflow {
                max_depth: self.stack.max_size(),
            });
        }
        trace!(node = %id, ?parent, construct = self.node(id).model.kind_name(), "push");
        self.stack.push(id);
        self.lifecycle(id, LifecycleEventKind::Pushed);
        Ok(())
    }

    /// Records the result of the top node and pops it.
    fn complete(&mut self, id: NodeId, result: Option<EvalResult<'a>>) {
        let was_current = self.node(id).phase == Phase::Ready;
        let node = self.node_mut(id);
        node.result = result;
        node.phase = Phase::Done;
        self.lifecycle(id, LifecycleEventKind::Evaluated);
        let popped = self.stack.pop();
        debug_assert_eq!(popped, Some(id), "only the top node can complete");
        trace!(node = %id, "pop");
        if was_current {
            self.lifecycle(id, LifecycleEventKind::Uncurrent);
        }
        self.lifecycle(id, LifecycleEventKind::Popped);
        if self.stack.is_empty() {
            self.check_leak();
        }
    }

    /// A discarded `new` leaks its allocation.
    fn check_leak(&mut self) {
        let mut root = self.model;
        while let ConstructKind::Parentheses(inner) = root.kind() {
            root = inner;
        }
        let discarded_new = matches!(
            root.kind(),
            ConstructKind::New { .. } | ConstructKind::NewArray { .. }
        );
        if discarded_new {
            self.raise(
                NodeId(0),
                SimulationEventKind::MemoryLeak,
                "The pointer returned by new is discarded, so the allocation can never be deleted",
            );
        }
    }

    pub(super) fn node(&self, id: NodeId) -> &RuntimeNode<'m, 'a> {
        &self.nodes[id.0 as usize]
    }

    pub(super) fn node_mut(&mut self, id: NodeId) -> &mut RuntimeNode<'m, 'a> {
        &mut self.nodes[id.0 as usize]
    }

    fn lifecycle(&mut self, id: NodeId, kind: LifecycleEventKind) {
        let model = self.node(id).model;
        let event = LifecycleEvent {
            node: id,
            construct: model.kind_name(),
            kind,
            span: model.span().clone(),
        };
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.lifecycle(&event);
        }
        self.events.lifecycle.push(event);
    }

    /// Reports a simulation event. A fatal one halts the simulation.
    pub(super) fn raise(
        &mut self,
        id: NodeId,
        kind: SimulationEventKind,
        message: impl Into<String>,
    ) {
        let message = message.into();
        debug!(node = %id, %kind, %message, "simulation event");
        let event = SimulationEvent {
            kind,
            message,
            node: id,
            span: self.node(id).model.span().clone(),
        };
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.simulation(&event);
        }
        if event.is_fatal() {
            self.crashed = true;
        }
        self.events.simulation.push(event);
    }
}
