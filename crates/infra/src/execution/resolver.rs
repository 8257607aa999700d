use std::sync::Arc;

use tracing::debug;

use trafo_execution::{ExecLatestRequest, ExecutionFault, ExecutionOutcome};

use crate::revision_store::{RevisionStore, RevisionStoreError};

use super::error::ExecutionError;
use super::requester::ExecutionRequester;

/// Resolves a revision group to its latest RELEASED revision and executes it.
///
/// Resolution happens per request; two calls may run different revisions if
/// a newer one is released in between.
pub struct LatestRevisionResolver {
    store: Arc<dyn RevisionStore>,
    requester: Arc<ExecutionRequester>,
}

impl LatestRevisionResolver {
    pub fn new(store: Arc<dyn RevisionStore>, requester: Arc<ExecutionRequester>) -> Self {
        Self { store, requester }
    }

    pub async fn resolve_and_execute(
        &self,
        mut request: ExecLatestRequest,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let job_id = request.ensure_job_id();
        let group = request.revision_group_id;

        let id = self.store.latest_released_id(group).map_err(|e| match e {
            RevisionStoreError::NotFound(msg) => ExecutionError::Fault(ExecutionFault::NotFound(msg)),
            other => ExecutionError::Unexpected(other.to_string()),
        })?;

        debug!(job_id = %job_id, revision_group_id = %group, revision_id = %id, "resolved latest revision");

        self.requester.execute(request.to_exec_by_id(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use chrono::Utc;
    use serde_json::Value as JsonValue;
    use trafo_core::{
        IoInterface, RevisionGroupId, State, TransformationRevision, TransformationRevisionId, Type,
        WorkflowWiring,
    };
    use trafo_execution::{ExecutionEngine, ExecutionJobRequest, ExecutionResult};

    use crate::revision_store::InMemoryRevisionStore;

    #[derive(Default)]
    struct RecordingEngine {
        seen: Mutex<Vec<TransformationRevisionId>>,
    }

    #[async_trait::async_trait]
    impl ExecutionEngine for RecordingEngine {
        async fn execute(&self, request: &ExecutionJobRequest) -> Result<ExecutionOutcome, ExecutionFault> {
            self.seen.lock().unwrap().push(request.id);
            Ok(ExecutionOutcome::new(
                request.job_id.unwrap_or_default(),
                ExecutionResult::ok(BTreeMap::new()),
            ))
        }
    }

    fn released(group: RevisionGroupId, version: &str, at: chrono::DateTime<Utc>) -> TransformationRevision {
        let mut rev = TransformationRevision {
            id: TransformationRevisionId::new(),
            revision_group_id: group,
            name: "Add".to_string(),
            description: String::new(),
            category: "Arithmetic".to_string(),
            version_tag: version.to_string(),
            kind: Type::Component,
            state: State::Draft,
            released_timestamp: None,
            disabled_timestamp: None,
            documentation: String::new(),
            io_interface: IoInterface::default(),
            content: JsonValue::Null,
            test_wiring: WorkflowWiring::default(),
        };
        rev.release(at).unwrap();
        rev
    }

    fn resolver(store: Arc<InMemoryRevisionStore>, engine: Arc<RecordingEngine>) -> LatestRevisionResolver {
        let requester = Arc::new(ExecutionRequester::new(engine, false));
        LatestRevisionResolver::new(store, requester)
    }

    #[tokio::test]
    async fn executes_newest_release_of_group() {
        let group = RevisionGroupId::new();
        let now = Utc::now();
        let old = released(group, "1.0.0", now - chrono::Duration::hours(1));
        let new = released(group, "2.0.0", now);
        let expected = new.id;

        let store = Arc::new(InMemoryRevisionStore::with_revisions([old, new]).unwrap());
        let engine = Arc::new(RecordingEngine::default());
        let job_id = trafo_core::JobId::new();
        let mut request = ExecLatestRequest::new(group, WorkflowWiring::default());
        request.job_id = Some(job_id);

        let outcome = resolver(store, engine.clone()).resolve_and_execute(request).await.unwrap();

        assert_eq!(outcome.job_id, job_id);
        assert_eq!(*engine.seen.lock().unwrap(), vec![expected]);
    }

    #[tokio::test]
    async fn resolution_is_repeated_per_request() {
        let group = RevisionGroupId::new();
        let now = Utc::now();
        let store = Arc::new(
            InMemoryRevisionStore::with_revisions([released(group, "1.0.0", now - chrono::Duration::hours(1))])
                .unwrap(),
        );
        let engine = Arc::new(RecordingEngine::default());
        let resolver = resolver(store.clone(), engine.clone());

        resolver
            .resolve_and_execute(ExecLatestRequest::new(group, WorkflowWiring::default()))
            .await
            .unwrap();
        let newer = released(group, "2.0.0", now);
        let newer_id = newer.id;
        store.store(newer).unwrap();
        resolver
            .resolve_and_execute(ExecLatestRequest::new(group, WorkflowWiring::default()))
            .await
            .unwrap();

        let seen = engine.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_ne!(seen[0], seen[1]);
        assert_eq!(seen[1], newer_id);
    }

    #[tokio::test]
    async fn unknown_group_is_not_found_without_invoking_engine() {
        let store = Arc::new(InMemoryRevisionStore::new());
        let engine = Arc::new(RecordingEngine::default());

        let err = resolver(store, engine.clone())
            .resolve_and_execute(ExecLatestRequest::new(RevisionGroupId::new(), WorkflowWiring::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Fault(ExecutionFault::NotFound(_))));
        assert!(engine.seen.lock().unwrap().is_empty());
    }
}
