//! Detached execution of accepted jobs with callback delivery.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use thiserror::Error;
use tokio::task::JoinHandle;
use chrono::Utc;
use tracing::{debug, error, info};

use trafo_core::JobId;

use crate::execution::{ExecutionError, ExecutionService};
use crate::external::{CallbackDispatcher, DeliveryReport};

use super::types::{ExecutionJob, InvalidTransition, JobState};

/// Failure that escaped the expected-fault handling of a job.
#[derive(Debug, Error)]
pub enum JobFailure {
    #[error("unexpected error in job {job_id}: {reason}")]
    Unexpected { job_id: JobId, reason: String },

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

/// Runner statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RunnerStats {
    pub accepted: u64,
    pub succeeded: u64,
    pub faulted: u64,
    pub callbacks_sent: u64,
    pub callbacks_failed: u64,
    pub unexpected: u64,
    pub in_flight: usize,
}

/// Executes accepted jobs on the tokio runtime, detached from the request
/// that produced them.
///
/// Jobs run concurrently; there is no ordering guarantee between them.
#[derive(Clone)]
pub struct BackgroundJobRunner {
    execution: ExecutionService,
    dispatcher: Arc<CallbackDispatcher>,
    stats: Arc<Mutex<RunnerStats>>,
}

impl BackgroundJobRunner {
    pub fn new(execution: ExecutionService, dispatcher: Arc<CallbackDispatcher>) -> Self {
        Self {
            execution,
            dispatcher,
            stats: Arc::new(Mutex::new(RunnerStats::default())),
        }
    }

    /// Schedule `job` and return immediately.
    ///
    /// The handle resolves to the job's terminal state. It resolves to an
    /// error (or a panic `JoinError`) only for unexpected failures; expected
    /// execution faults end in `Ok(JobState::Terminated { .. })`.
    pub fn run_detached(&self, job: ExecutionJob) -> JoinHandle<Result<JobState, JobFailure>> {
        self.record(|s| {
            s.accepted += 1;
            s.in_flight += 1;
        });
        let runner = self.clone();
        tokio::spawn(async move { runner.supervise(job).await })
    }

    pub fn stats(&self) -> RunnerStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, f: impl FnOnce(&mut RunnerStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut stats);
    }

    /// Outer layer: log anything unexpected with the job id, then re-raise.
    async fn supervise(&self, mut job: ExecutionJob) -> Result<JobState, JobFailure> {
        let job_id = job.job_id;
        let caught = AssertUnwindSafe(self.process(&mut job)).catch_unwind().await;
        self.record(|s| s.in_flight = s.in_flight.saturating_sub(1));

        match caught {
            Ok(Ok(())) => Ok(job.state),
            Ok(Err(failure)) => {
                error!(
                    job_id = %job_id,
                    error = %failure,
                    "an unexpected error occurred during execution as background task"
                );
                mark_aborted(&mut job, &failure);
                self.record(|s| s.unexpected += 1);
                Err(failure)
            }
            Err(panic) => {
                error!(
                    job_id = %job_id,
                    error = %panic_message(&*panic),
                    "an unexpected error occurred during execution as background task"
                );
                self.record(|s| s.unexpected += 1);
                std::panic::resume_unwind(panic)
            }
        }
    }

    /// Inner layer: execute, then deliver. Expected faults end the job here.
    async fn process(&self, job: &mut ExecutionJob) -> Result<(), JobFailure> {
        let job_id = job.job_id;
        job.transition(JobState::Executing)?;

        let outcome = match self.execution.run(job.target.clone()).await {
            Ok(outcome) => outcome,
            Err(ExecutionError::Fault(fault)) => {
                error!(
                    job_id = %job_id,
                    callback_url = %job.callback_url,
                    error = %fault,
                    "execution as background task failed"
                );
                job.transition(JobState::Terminated { fault })?;
                self.record(|s| s.faulted += 1);
                return Ok(());
            }
            Err(ExecutionError::Unexpected(reason)) => {
                return Err(JobFailure::Unexpected { job_id, reason });
            }
        };

        info!(
            job_id = %job_id,
            elapsed_ms = (Utc::now() - job.accepted_at).num_milliseconds(),
            "finished execution"
        );
        job.transition(JobState::Succeeded)?;
        self.record(|s| s.succeeded += 1);

        match self.dispatcher.deliver(&job.callback_url, &outcome).await {
            DeliveryReport::Delivered { .. } => {
                job.transition(JobState::CallbackSent)?;
                self.record(|s| s.callbacks_sent += 1);
                info!(
                    job_id = %job_id,
                    callback_url = %job.callback_url,
                    "sent result of execution to callback url"
                );
            }
            DeliveryReport::Failed => {
                job.transition(JobState::CallbackFailed)?;
                self.record(|s| s.callbacks_failed += 1);
            }
        }
        Ok(())
    }
}

/// Returns false when the job had already reached a terminal state.
fn mark_aborted(job: &mut ExecutionJob, failure: &JobFailure) -> bool {
    match job.transition(JobState::Aborted {
        error: failure.to_string(),
    }) {
        Ok(()) => true,
        Err(e) => {
            debug!(job_id = %job.job_id, error = %e, "job not marked aborted");
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trafo_core::{TransformationRevisionId, WorkflowWiring};
    use trafo_execution::ExecutionJobRequest;
    use url::Url;

    fn job() -> ExecutionJob {
        let target = ExecutionJobRequest::new(TransformationRevisionId::new(), WorkflowWiring::default());
        ExecutionJob::accept(target.into(), Url::parse("http://localhost/cb").unwrap())
    }

    fn unexpected(job: &ExecutionJob) -> JobFailure {
        JobFailure::Unexpected {
            job_id: job.job_id,
            reason: "storage offline".to_string(),
        }
    }

    #[test]
    fn running_job_is_marked_aborted() {
        let mut job = job();
        job.transition(JobState::Executing).unwrap();
        let failure = unexpected(&job);

        assert!(mark_aborted(&mut job, &failure));
        assert!(matches!(job.state, JobState::Aborted { ref error } if error.contains("storage offline")));
    }

    #[test]
    fn terminal_job_keeps_its_state_when_aborting() {
        let mut job = job();
        job.transition(JobState::Executing).unwrap();
        job.transition(JobState::Succeeded).unwrap();
        job.transition(JobState::CallbackSent).unwrap();
        let failure = unexpected(&job);

        assert!(!mark_aborted(&mut job, &failure));
        assert_eq!(job.state, JobState::CallbackSent);
    }

    #[test]
    fn panic_payloads_are_rendered() {
        let boxed: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(&*boxed), "static message");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(&*boxed), "owned message");

        let boxed: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(&*boxed), "non-string panic payload");
    }
}
