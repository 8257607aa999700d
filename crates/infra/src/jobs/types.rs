use chrono::{DateTime, Utc};
use url::Url;

use trafo_core::JobId;
use trafo_execution::{ExecutionFault, ExecutionTarget};

/// Lifecycle of a background execution job.
///
/// `Accepted -> Executing -> Succeeded -> CallbackSent | CallbackFailed`, or
/// `Executing -> Terminated` when the execution faults. `Aborted` marks an
/// unexpected failure at any point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Acknowledged to the caller, not yet started.
    Accepted,
    Executing,
    /// Execution produced an outcome; delivery pending.
    Succeeded,
    CallbackSent,
    CallbackFailed,
    /// Execution faulted; no callback is sent.
    Terminated { fault: ExecutionFault },
    Aborted { error: String },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::CallbackSent
                | JobState::CallbackFailed
                | JobState::Terminated { .. }
                | JobState::Aborted { .. }
        )
    }

    pub fn can_transition_to(&self, next: &JobState) -> bool {
        match (self, next) {
            (_, JobState::Aborted { .. }) => !self.is_terminal(),
            (JobState::Accepted, JobState::Executing) => true,
            (JobState::Executing, JobState::Succeeded | JobState::Terminated { .. }) => true,
            (JobState::Succeeded, JobState::CallbackSent | JobState::CallbackFailed) => true,
            _ => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobState::Accepted => "accepted",
            JobState::Executing => "executing",
            JobState::Succeeded => "succeeded",
            JobState::CallbackSent => "callback_sent",
            JobState::CallbackFailed => "callback_failed",
            JobState::Terminated { .. } => "terminated",
            JobState::Aborted { .. } => "aborted",
        }
    }
}

/// One accepted async execution request.
#[derive(Debug, Clone)]
pub struct ExecutionJob {
    pub job_id: JobId,
    pub target: ExecutionTarget,
    pub callback_url: Url,
    pub state: JobState,
    pub accepted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rejected state change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("job {job_id} cannot move from {} to {}", .from.label(), .to.label())]
pub struct InvalidTransition {
    pub job_id: JobId,
    pub from: JobState,
    pub to: JobState,
}

impl ExecutionJob {
    /// Accept a job; the job id is fixed here (minted if the request has none).
    pub fn accept(mut target: ExecutionTarget, callback_url: Url) -> Self {
        let job_id = target.ensure_job_id();
        let now = Utc::now();
        Self {
            job_id,
            target,
            callback_url,
            state: JobState::Accepted,
            accepted_at: now,
            updated_at: now,
        }
    }

    pub fn transition(&mut self, next: JobState) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(&next) {
            return Err(InvalidTransition {
                job_id: self.job_id,
                from: self.state.clone(),
                to: next,
            });
        }
        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trafo_core::{TransformationRevisionId, WorkflowWiring};
    use trafo_execution::ExecutionJobRequest;

    fn job() -> ExecutionJob {
        let target = ExecutionJobRequest::new(TransformationRevisionId::new(), WorkflowWiring::default());
        ExecutionJob::accept(target.into(), Url::parse("http://localhost/cb").unwrap())
    }

    #[test]
    fn accept_mints_job_id_into_target() {
        let job = job();
        assert_eq!(job.target.job_id(), Some(job.job_id));
        assert_eq!(job.state, JobState::Accepted);
    }

    #[test]
    fn happy_path_transitions() {
        let mut job = job();
        job.transition(JobState::Executing).unwrap();
        job.transition(JobState::Succeeded).unwrap();
        job.transition(JobState::CallbackSent).unwrap();
        assert!(job.state.is_terminal());
    }

    #[test]
    fn fault_terminates_without_callback_states() {
        let mut job = job();
        job.transition(JobState::Executing).unwrap();
        job.transition(JobState::Terminated {
            fault: ExecutionFault::NotFound("x".to_string()),
        })
        .unwrap();

        let err = job.transition(JobState::CallbackSent).unwrap_err();
        assert_eq!(err.to, JobState::CallbackSent);
        assert!(matches!(err.from, JobState::Terminated { .. }));
    }

    #[test]
    fn callback_cannot_precede_execution() {
        let mut job = job();
        assert!(job.transition(JobState::CallbackSent).is_err());
        assert!(job.transition(JobState::Succeeded).is_err());
        assert_eq!(job.state, JobState::Accepted);
    }

    #[test]
    fn abort_is_allowed_until_terminal() {
        let mut job = job();
        job.transition(JobState::Aborted {
            error: "boom".to_string(),
        })
        .unwrap();
        assert!(job
            .transition(JobState::Aborted {
                error: "again".to_string()
            })
            .is_err());
    }
}
