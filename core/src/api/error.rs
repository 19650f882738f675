//! Public error types.
//!
//! Compile-time notes and execution failures are converted to these types
//! at the API boundary. C++ runtime events (undefined behavior, crashes)
//! are *not* errors; they are reported through the simulation's event log.

use crate::ast::Span;
use crate::{String, Vec};
use core::fmt;
use thiserror::Error;

/// Error type for all engine operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid API usage.
    #[error("API error: {0}")]
    Api(String),

    /// A name could not be declared while building the environment.
    #[error(transparent)]
    Declaration(#[from] crate::scope::DeclarationError),

    /// The expression compiled with at least one error note.
    ///
    /// Contains every diagnostic (warnings included) found in the tree.
    #[error("Compilation failed with {} error(s)", count_errors(.diagnostics))]
    Compilation { diagnostics: Vec<Diagnostic> },

    /// The simulation could not continue.
    #[error(transparent)]
    Execution(#[from] crate::evaluator::ExecutionError),
}

fn count_errors(diagnostics: &[Diagnostic]) -> usize {
    diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count()
}

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity level (error, warning, info).
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// Source location of the construct that produced the note.
    pub span: Span,

    /// Related locations that provide additional context.
    pub related: Vec<RelatedInfo>,

    /// Optional help text suggesting how to fix the issue.
    pub help: Option<String>,

    /// Stable dotted code, e.g. `expr.assignment.lhs_const`.
    pub code: Option<String>,
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - the construct is ill-formed.
    Error,
    /// Warning - suspicious code that might be wrong.
    Warning,
    /// Info - informational message.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Related information for a diagnostic (e.g., "candidate declared here").
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedInfo {
    pub span: Span,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(ref code) = self.code {
            write!(f, " [{}]", code)?;
        }
        if let Some(ref help) = self.help {
            write!(f, "\nhelp: {}", help)?;
        }
        Ok(())
    }
}
