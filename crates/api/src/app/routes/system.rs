use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, Json};

use trafo_infra::jobs::RunnerStats;

use crate::app::services::AppServices;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn job_stats(Extension(services): Extension<Arc<AppServices>>) -> Json<RunnerStats> {
    Json(services.runner.stats())
}
