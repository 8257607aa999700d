use serde::{Deserialize, Serialize};

use trafo_core::{JobId, RevisionGroupId, TransformationRevisionId, WorkflowWiring};

/// Request to execute one concrete transformation revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionJobRequest {
    pub id: TransformationRevisionId,
    #[serde(default)]
    pub wiring: WorkflowWiring,
    #[serde(default)]
    pub run_pure_plot_operators: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
}

impl ExecutionJobRequest {
    pub fn new(id: TransformationRevisionId, wiring: WorkflowWiring) -> Self {
        Self {
            id,
            wiring,
            run_pure_plot_operators: false,
            job_id: None,
        }
    }

    pub fn with_job_id(mut self, job_id: JobId) -> Self {
        self.job_id = Some(job_id);
        self
    }

    /// Return the job id, minting a fresh one if the caller did not supply it.
    pub fn ensure_job_id(&mut self) -> JobId {
        *self.job_id.get_or_insert_with(JobId::new)
    }
}

/// Request to execute the latest released revision of a revision group.
///
/// Repeated calls may run different revisions (and therefore accept different
/// wirings) when a newer revision is released in between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecLatestRequest {
    pub revision_group_id: RevisionGroupId,
    #[serde(default)]
    pub wiring: WorkflowWiring,
    #[serde(default)]
    pub run_pure_plot_operators: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
}

impl ExecLatestRequest {
    pub fn new(revision_group_id: RevisionGroupId, wiring: WorkflowWiring) -> Self {
        Self {
            revision_group_id,
            wiring,
            run_pure_plot_operators: false,
            job_id: None,
        }
    }

    pub fn ensure_job_id(&mut self) -> JobId {
        *self.job_id.get_or_insert_with(JobId::new)
    }

    /// Bind the request to the resolved concrete revision.
    pub fn to_exec_by_id(self, id: TransformationRevisionId) -> ExecutionJobRequest {
        ExecutionJobRequest {
            id,
            wiring: self.wiring,
            run_pure_plot_operators: self.run_pure_plot_operators,
            job_id: self.job_id,
        }
    }
}

/// What a background job should run.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionTarget {
    Revision(ExecutionJobRequest),
    LatestOfGroup(ExecLatestRequest),
}

impl ExecutionTarget {
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            ExecutionTarget::Revision(r) => r.job_id,
            ExecutionTarget::LatestOfGroup(r) => r.job_id,
        }
    }

    pub fn ensure_job_id(&mut self) -> JobId {
        match self {
            ExecutionTarget::Revision(r) => r.ensure_job_id(),
            ExecutionTarget::LatestOfGroup(r) => r.ensure_job_id(),
        }
    }
}

impl From<ExecutionJobRequest> for ExecutionTarget {
    fn from(value: ExecutionJobRequest) -> Self {
        Self::Revision(value)
    }
}

impl From<ExecLatestRequest> for ExecutionTarget {
    fn from(value: ExecLatestRequest) -> Self {
        Self::LatestOfGroup(value)
    }
}
