//! HTTP API: routing, request/response mapping and auth.

pub mod app;
pub mod context;
pub mod middleware;
