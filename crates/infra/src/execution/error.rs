use thiserror::Error;

use trafo_execution::ExecutionFault;

/// Failure of an execution request as seen by callers.
///
/// `Fault` is a structured, expected failure of the attempt; everything else
/// is `Unexpected` and is escalated rather than handled.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error(transparent)]
    Fault(#[from] ExecutionFault),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ExecutionError {
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }
}
