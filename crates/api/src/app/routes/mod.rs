use axum::{routing::get, Router};

pub mod system;
pub mod transformations;

/// Router for all endpoints behind (optional) authentication.
pub fn router() -> Router {
    Router::new()
        .route("/jobs/stats", get(system::job_stats))
        .nest("/transformations", transformations::router())
}
