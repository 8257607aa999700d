use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use trafo_execution::ExecutionFault;
use trafo_infra::execution::ExecutionError;
use trafo_infra::revision_store::RevisionStoreError;

pub fn execution_error_to_response(err: ExecutionError) -> axum::response::Response {
    match err {
        ExecutionError::Fault(ExecutionFault::NotFound(msg)) => {
            json_error(StatusCode::NOT_FOUND, "not_found", msg)
        }
        ExecutionError::Fault(ExecutionFault::EngineUnavailable(msg)) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "engine_unavailable", msg)
        }
        ExecutionError::Fault(ExecutionFault::InvalidResult(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_result", msg)
        }
        ExecutionError::Unexpected(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "unexpected_error", msg)
        }
    }
}

pub fn store_error_to_response(err: RevisionStoreError) -> axum::response::Response {
    match err {
        RevisionStoreError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        RevisionStoreError::Integrity(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "integrity_error", msg)
        }
        RevisionStoreError::Invalid(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_revision", msg)
        }
        RevisionStoreError::ModelConstraintViolation(msg) => {
            json_error(StatusCode::CONFLICT, "model_constraint_violation", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
