//! HTTP API application wiring (axum router + service wiring).
//!
//! - `services.rs`: component wiring (store, engine, execution, job runner)
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: query/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use trafo_auth::{Hs256JwtValidator, JwtValidator};
use trafo_infra::config::ServiceConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
pub fn build_app(config: &ServiceConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::AppServices::from_config(config)?);
    let jwt = config
        .jwt_secret
        .as_ref()
        .map(|secret| Arc::new(Hs256JwtValidator::new(secret.as_bytes())) as Arc<dyn JwtValidator>);
    Ok(build_router(services, jwt))
}

/// Build the router around already-wired services.
///
/// With `jwt` set, every route except `/health` requires a bearer token.
pub fn build_router(services: Arc<AppServices>, jwt: Option<Arc<dyn JwtValidator>>) -> Router {
    let mut protected = routes::router().layer(Extension(services));

    match jwt {
        Some(jwt) => {
            let auth_state = middleware::AuthState { jwt };
            protected = protected.layer(axum::middleware::from_fn_with_state(
                auth_state,
                middleware::auth_middleware,
            ));
        }
        None => tracing::warn!("JWT_SECRET not set; incoming requests are not authenticated"),
    }

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::log_requests)))
}

pub use services::AppServices;
