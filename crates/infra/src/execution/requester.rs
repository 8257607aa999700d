use std::sync::Arc;

use tracing::{debug, warn};

use trafo_execution::{
    ExecutionEngine, ExecutionJobRequest, ExecutionOutcome, PerformanceMeasuredStep, INTERNAL_FULL,
};

use super::error::ExecutionError;

/// Runs a single execution attempt against the configured engine.
///
/// Stamps the job id (minting one if absent), records the `internal_full`
/// timing step and, when advanced measurement is on, the serving process id.
pub struct ExecutionRequester {
    engine: Arc<dyn ExecutionEngine>,
    measure_performance: bool,
}

impl ExecutionRequester {
    pub fn new(engine: Arc<dyn ExecutionEngine>, measure_performance: bool) -> Self {
        Self {
            engine,
            measure_performance,
        }
    }

    pub async fn execute(&self, mut request: ExecutionJobRequest) -> Result<ExecutionOutcome, ExecutionError> {
        let mut internal_full = PerformanceMeasuredStep::create_and_begin(INTERNAL_FULL);
        let job_id = request.ensure_job_id();

        debug!(job_id = %job_id, revision_id = %request.id, "executing transformation revision");

        let mut outcome = self.engine.execute(&request).await.map_err(|fault| {
            warn!(job_id = %job_id, revision_id = %request.id, error = %fault, "execution failed");
            ExecutionError::Fault(fault)
        })?;

        internal_full.stop();

        if outcome.job_id != job_id {
            warn!(
                job_id = %job_id,
                engine_job_id = %outcome.job_id,
                "engine returned a different job id; keeping the requested one"
            );
            outcome.job_id = job_id;
        }
        outcome.record_step(internal_full);
        if self.measure_performance {
            outcome.process_id = Some(std::process::id());
        }

        Ok(outcome)
    }
}
