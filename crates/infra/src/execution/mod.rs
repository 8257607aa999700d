//! Execution dispatch: run a revision by id or the latest release of a group.
//!
//! - `ExecutionRequester`: one execution attempt, with timing and job id
//! - `LatestRevisionResolver`: group id -> latest released revision -> requester
//! - `ExecutionService`: the pair behind one handle, shared by HTTP and jobs

pub mod error;
pub mod requester;
pub mod resolver;

use std::sync::Arc;

use trafo_execution::{
    ExecLatestRequest, ExecutionEngine, ExecutionJobRequest, ExecutionOutcome, ExecutionTarget,
};

use crate::revision_store::RevisionStore;

pub use error::ExecutionError;
pub use requester::ExecutionRequester;
pub use resolver::LatestRevisionResolver;

#[derive(Clone)]
pub struct ExecutionService {
    requester: Arc<ExecutionRequester>,
    resolver: Arc<LatestRevisionResolver>,
}

impl ExecutionService {
    pub fn new(
        engine: Arc<dyn ExecutionEngine>,
        store: Arc<dyn RevisionStore>,
        measure_performance: bool,
    ) -> Self {
        let requester = Arc::new(ExecutionRequester::new(engine, measure_performance));
        let resolver = Arc::new(LatestRevisionResolver::new(store, requester.clone()));
        Self { requester, resolver }
    }

    pub async fn execute(&self, request: ExecutionJobRequest) -> Result<ExecutionOutcome, ExecutionError> {
        self.requester.execute(request).await
    }

    pub async fn execute_latest(&self, request: ExecLatestRequest) -> Result<ExecutionOutcome, ExecutionError> {
        self.resolver.resolve_and_execute(request).await
    }

    pub async fn run(&self, target: ExecutionTarget) -> Result<ExecutionOutcome, ExecutionError> {
        match target {
            ExecutionTarget::Revision(request) => self.execute(request).await,
            ExecutionTarget::LatestOfGroup(request) => self.execute_latest(request).await,
        }
    }
}
