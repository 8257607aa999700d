use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use trafo_core::{TransformationRevision, TransformationRevisionId};
use trafo_execution::{ExecLatestRequest, ExecutionJobRequest};
use trafo_infra::jobs::ExecutionJob;
use trafo_infra::revision_store::RevisionStoreError;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_revision).get(list_revisions))
        .route("/execute", post(execute))
        .route("/execute-latest", post(execute_latest))
        .route("/execute-async", post(execute_async))
        .route("/execute-latest-async", post(execute_latest_async))
        .route(
            "/:id",
            get(get_revision).put(update_revision).delete(delete_revision),
        )
}

fn parse_revision_id(raw: &str) -> Result<TransformationRevisionId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid transformation revision id"))
}

// -------------------------
// Revisions
// -------------------------

pub async fn create_revision(
    Extension(services): Extension<Arc<AppServices>>,
    Json(revision): Json<TransformationRevision>,
) -> axum::response::Response {
    tracing::info!(revision_id = %revision.id, "creating transformation revision");

    match services.store.store(revision.clone()) {
        Ok(()) => (StatusCode::CREATED, Json(revision)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_revisions(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListRevisionsQuery>,
) -> axum::response::Response {
    let filter = match query.into_filter() {
        Ok(f) => f,
        Err(resp) => return resp,
    };

    match services.store.list(&filter) {
        Ok(revisions) => Json(revisions).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_revision(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_revision_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.store.read(id) {
        Ok(revision) => Json(revision).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_revision(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<dto::UpdateRevisionQuery>,
    Json(revision): Json<TransformationRevision>,
) -> axum::response::Response {
    let id = match parse_revision_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if revision.id != id {
        return errors::json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "id_mismatch",
            format!("path id {id} does not match body id {}", revision.id),
        );
    }

    tracing::info!(
        revision_id = %id,
        allow_overwrite_released = query.allow_overwrite_released,
        strip_wiring = query.strip_wiring,
        "updating transformation revision"
    );

    match services.store.update_or_create(revision, query.into()) {
        Ok(stored) => (StatusCode::CREATED, Json(stored)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_revision(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<dto::DeleteRevisionQuery>,
) -> axum::response::Response {
    let id = match parse_revision_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.store.delete(id, query.ignore_state) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(RevisionStoreError::Integrity(msg)) => {
            errors::json_error(StatusCode::CONFLICT, "integrity_error", msg)
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

// -------------------------
// Execution
// -------------------------

pub async fn execute(
    Extension(services): Extension<Arc<AppServices>>,
    Json(request): Json<ExecutionJobRequest>,
) -> axum::response::Response {
    match services.execution.execute(request).await {
        Ok(outcome) => {
            tracing::info!(job_id = %outcome.job_id, "finished execution");
            Json(outcome).into_response()
        }
        Err(e) => errors::execution_error_to_response(e),
    }
}

pub async fn execute_latest(
    Extension(services): Extension<Arc<AppServices>>,
    Json(request): Json<ExecLatestRequest>,
) -> axum::response::Response {
    match services.execution.execute_latest(request).await {
        Ok(outcome) => {
            tracing::info!(job_id = %outcome.job_id, "finished execution of latest revision");
            Json(outcome).into_response()
        }
        Err(e) => errors::execution_error_to_response(e),
    }
}

pub async fn execute_async(
    Extension(services): Extension<Arc<AppServices>>,
    principal: Option<Extension<PrincipalContext>>,
    query: Result<Query<dto::CallbackQuery>, QueryRejection>,
    Json(request): Json<ExecutionJobRequest>,
) -> axum::response::Response {
    let callback_url = match dto::callback_url(query) {
        Ok(url) => url,
        Err(resp) => return resp,
    };

    let job = ExecutionJob::accept(request.into(), callback_url);
    let body = dto::AcceptedResponse::by_id(job.job_id);
    tracing::info!(
        job_id = %job.job_id,
        callback_url = %job.callback_url,
        principal = ?principal.map(|Extension(p)| p.principal_id()),
        "accepted execution request"
    );
    drop(services.runner.run_detached(job));

    (StatusCode::ACCEPTED, Json(body)).into_response()
}

pub async fn execute_latest_async(
    Extension(services): Extension<Arc<AppServices>>,
    principal: Option<Extension<PrincipalContext>>,
    query: Result<Query<dto::CallbackQuery>, QueryRejection>,
    Json(request): Json<ExecLatestRequest>,
) -> axum::response::Response {
    let callback_url = match dto::callback_url(query) {
        Ok(url) => url,
        Err(resp) => return resp,
    };

    let job = ExecutionJob::accept(request.into(), callback_url);
    let body = dto::AcceptedResponse::latest(job.job_id);
    tracing::info!(
        job_id = %job.job_id,
        callback_url = %job.callback_url,
        principal = ?principal.map(|Extension(p)| p.principal_id()),
        "accepted execution request for latest revision"
    );
    drop(services.runner.run_detached(job));

    (StatusCode::ACCEPTED, Json(body)).into_response()
}
