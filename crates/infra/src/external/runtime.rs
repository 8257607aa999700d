use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use trafo_auth::{AuthHeaderProvider, AuthHeaders};
use trafo_core::{JobId, TransformationRevision, WorkflowWiring};
use trafo_execution::{
    validate_declared_outputs, ExecutionEngine, ExecutionFault, ExecutionJobRequest, ExecutionOutcome,
    ExecutionResult,
};

use crate::revision_store::{RevisionStore, RevisionStoreError};

#[derive(Debug, Serialize)]
struct RuntimeRequest<'a> {
    job_id: JobId,
    transformation_revision: &'a TransformationRevision,
    wiring: &'a WorkflowWiring,
    run_pure_plot_operators: bool,
}

/// Execution engine backed by a remote runtime service.
///
/// Loads the revision from the store, posts it together with the wiring to
/// `<base_url>runtime` and checks the answer against the declared outputs.
pub struct RemoteRuntimeEngine {
    client: reqwest::Client,
    runtime_url: Url,
    store: Arc<dyn RevisionStore>,
    auth: Arc<dyn AuthHeaderProvider>,
}

impl RemoteRuntimeEngine {
    pub fn new(
        base_url: &Url,
        store: Arc<dyn RevisionStore>,
        auth: Arc<dyn AuthHeaderProvider>,
        verify_certs: bool,
    ) -> anyhow::Result<Self> {
        let runtime_url = base_url.join("runtime")?;
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!verify_certs)
            .build()?;
        Ok(Self {
            client,
            runtime_url,
            store,
            auth,
        })
    }

    pub fn runtime_url(&self) -> &Url {
        &self.runtime_url
    }
}

#[async_trait::async_trait]
impl ExecutionEngine for RemoteRuntimeEngine {
    async fn execute(&self, request: &ExecutionJobRequest) -> Result<ExecutionOutcome, ExecutionFault> {
        let job_id = request.job_id.unwrap_or_default();

        let revision = self.store.read(request.id).map_err(|e| match e {
            RevisionStoreError::NotFound(msg) => ExecutionFault::NotFound(msg),
            other => ExecutionFault::EngineUnavailable(format!("could not load revision: {other}")),
        })?;

        let headers = match self.auth.auth_headers(false).await {
            Ok(headers) => headers,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "failed to obtain auth headers for runtime call");
                AuthHeaders::empty()
            }
        };

        let body = RuntimeRequest {
            job_id,
            transformation_revision: &revision,
            wiring: &request.wiring,
            run_pure_plot_operators: request.run_pure_plot_operators,
        };

        let mut call = self.client.post(self.runtime_url.clone()).json(&body);
        for (name, value) in headers.iter() {
            call = call.header(name, value);
        }

        debug!(job_id = %job_id, runtime_url = %self.runtime_url, "calling runtime");
        let resp = call
            .send()
            .await
            .map_err(|e| ExecutionFault::EngineUnavailable(e.to_string()))?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(ExecutionFault::EngineUnavailable(format!(
                "runtime responded with {status}"
            )));
        }
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ExecutionFault::InvalidResult(format!(
                "runtime rejected request with {status}: {detail}"
            )));
        }

        let result: ExecutionResult = resp
            .json()
            .await
            .map_err(|e| ExecutionFault::InvalidResult(format!("could not parse runtime response: {e}")))?;

        let outcome = ExecutionOutcome::new(job_id, result);
        validate_declared_outputs(&outcome, &revision.io_interface)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value as JsonValue};
    use trafo_auth::NoAuthHeaders;
    use trafo_core::{IoDescriptor, IoInterface, RevisionGroupId, State, TransformationRevisionId, Type};

    use crate::revision_store::InMemoryRevisionStore;

    fn revision(outputs: &[&str]) -> TransformationRevision {
        TransformationRevision {
            id: TransformationRevisionId::new(),
            revision_group_id: RevisionGroupId::new(),
            name: "Add".to_string(),
            description: String::new(),
            category: "Arithmetic".to_string(),
            version_tag: "1.0.0".to_string(),
            kind: Type::Component,
            state: State::Draft,
            released_timestamp: None,
            disabled_timestamp: None,
            documentation: String::new(),
            io_interface: IoInterface {
                inputs: Vec::new(),
                outputs: outputs
                    .iter()
                    .map(|n| IoDescriptor {
                        id: uuid::Uuid::now_v7(),
                        name: n.to_string(),
                        data_type: "INT".to_string(),
                    })
                    .collect(),
            },
            content: JsonValue::Null,
            test_wiring: WorkflowWiring::default(),
        }
    }

    async fn fake_runtime(status: StatusCode, reply: JsonValue) -> Url {
        let app = Router::new().route(
            "/runtime",
            post(move |Json(body): Json<JsonValue>| {
                let reply = reply.clone();
                async move {
                    // Echo the job id so callers can assert on it.
                    let mut reply = reply;
                    if let Some(obj) = reply.as_object_mut() {
                        obj.insert("job_id".to_string(), body["job_id"].clone());
                    }
                    (status, Json(reply))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    fn engine(base: &Url, rev: TransformationRevision) -> RemoteRuntimeEngine {
        let store = Arc::new(InMemoryRevisionStore::with_revisions([rev]).unwrap());
        RemoteRuntimeEngine::new(base, store, Arc::new(NoAuthHeaders), true).unwrap()
    }

    #[test]
    fn runtime_url_is_joined_onto_base() {
        let base = Url::parse("http://runtime:8090/engine/").unwrap();
        let e = RemoteRuntimeEngine::new(
            &base,
            Arc::new(InMemoryRevisionStore::new()),
            Arc::new(NoAuthHeaders),
            true,
        )
        .unwrap();
        assert_eq!(e.runtime_url().as_str(), "http://runtime:8090/engine/runtime");
    }

    #[tokio::test]
    async fn successful_run_is_parsed_and_validated() {
        let base = fake_runtime(
            StatusCode::OK,
            json!({"result": "ok", "output_results_by_output_name": {"sum": 3}}),
        )
        .await;
        let rev = revision(&["sum"]);
        let request = ExecutionJobRequest::new(rev.id, WorkflowWiring::default()).with_job_id(JobId::new());

        let outcome = engine(&base, rev).execute(&request).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.job_id, request.job_id.unwrap());
        assert_eq!(outcome.result.output_results_by_output_name["sum"], json!(3));
    }

    #[tokio::test]
    async fn missing_declared_output_is_invalid_result() {
        let base = fake_runtime(StatusCode::OK, json!({"result": "ok"})).await;
        let rev = revision(&["sum"]);
        let request = ExecutionJobRequest::new(rev.id, WorkflowWiring::default());

        let err = engine(&base, rev).execute(&request).await.unwrap_err();
        assert!(matches!(err, ExecutionFault::InvalidResult(_)));
    }

    #[tokio::test]
    async fn server_error_is_engine_unavailable() {
        let base = fake_runtime(StatusCode::INTERNAL_SERVER_ERROR, json!({})).await;
        let rev = revision(&[]);
        let request = ExecutionJobRequest::new(rev.id, WorkflowWiring::default());

        let err = engine(&base, rev).execute(&request).await.unwrap_err();
        assert!(matches!(err, ExecutionFault::EngineUnavailable(_)));
    }

    #[tokio::test]
    async fn unreachable_runtime_is_engine_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let base = Url::parse(&format!("http://{addr}/")).unwrap();
        let rev = revision(&[]);
        let request = ExecutionJobRequest::new(rev.id, WorkflowWiring::default());

        let err = engine(&base, rev).execute(&request).await.unwrap_err();
        assert!(matches!(err, ExecutionFault::EngineUnavailable(_)));
    }

    #[tokio::test]
    async fn unknown_revision_is_not_found() {
        let base = Url::parse("http://127.0.0.1:9/").unwrap();
        let request = ExecutionJobRequest::new(TransformationRevisionId::new(), WorkflowWiring::default());

        let err = engine(&base, revision(&[])).execute(&request).await.unwrap_err();
        assert!(matches!(err, ExecutionFault::NotFound(_)));
    }
}
