use thiserror::Error;

use trafo_core::IoInterface;

use crate::outcome::ExecutionOutcome;
use crate::request::ExecutionJobRequest;

/// Structured failure of one execution attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionFault {
    /// The requested revision (or revision group) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The engine could not be reached or failed at the transport level.
    #[error("execution engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The engine answered, but its result failed post-execution validation.
    #[error("invalid execution result: {0}")]
    InvalidResult(String),
}

/// Runs a transformation revision against a runtime.
///
/// Implementations return an outcome stamped with the request's job id and
/// without service-side timing/process metadata (the caller attaches those).
/// A single attempt; retries are not this trait's concern.
#[async_trait::async_trait]
pub trait ExecutionEngine: Send + Sync + 'static {
    async fn execute(&self, request: &ExecutionJobRequest) -> Result<ExecutionOutcome, ExecutionFault>;
}

/// Post-execution check: a successful outcome must provide every declared output.
pub fn validate_declared_outputs(
    outcome: &ExecutionOutcome,
    io_interface: &IoInterface,
) -> Result<(), ExecutionFault> {
    if !outcome.is_success() {
        return Ok(());
    }

    let missing: Vec<&str> = io_interface
        .outputs
        .iter()
        .map(|o| o.name.as_str())
        .filter(|name| !outcome.result.output_results_by_output_name.contains_key(*name))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ExecutionFault::InvalidResult(format!(
            "missing outputs: {}",
            missing.join(", ")
        )))
    }
}
