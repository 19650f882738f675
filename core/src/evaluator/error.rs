//! Execution errors.
//!
//! These are failures of the simulator itself, not of the simulated C++
//! program. A C++ program doing something wrong (dereferencing null, reading
//! out of bounds, failing an assertion) raises a
//! [`SimulationEvent`](super::SimulationEvent) instead and the simulation
//! carries on or halts as the event dictates.
//!
//! # Error Categories
//!
//! - **Resource exceeded**: the evaluation stack or the step budget ran
//!   out. Raised when the limits in
//!   [`ExecutionOptions`](crate::api::ExecutionOptions) are hit.
//! - **Not executable**: a runtime instance was requested for a construct
//!   that carries errors or has no runtime meaning. This is a bug in the
//!   caller; compile diagnostics must be checked first.
//! - **Host**: the [`Host`](super::Host) reported a protocol violation.

use super::host::HostError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("evaluation stack exceeded its maximum depth of {max_depth}")]
    StackOverflow { max_depth: usize },

    #[error("evaluation exceeded the step limit of {max_steps}")]
    StepLimitExceeded { max_steps: usize },

    /// The construct has error notes or is a placeholder kind.
    #[error("`{construct}` cannot be executed")]
    NotExecutable { construct: &'static str },

    /// A node found a child result of the wrong shape.
    #[error("`{construct}` expected {expected} from its operand")]
    UnexpectedResult {
        construct: &'static str,
        expected: &'static str,
    },

    #[error(transparent)]
    Host(#[from] HostError),
}

impl ExecutionError {
    /// Resource limits, as opposed to bugs in the caller or host.
    pub fn is_resource_exceeded(&self) -> bool {
        matches!(
            self,
            ExecutionError::StackOverflow { .. } | ExecutionError::StepLimitExceeded { .. }
        )
    }
}

