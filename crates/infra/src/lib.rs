//! Infrastructure layer: configuration, persistence, execution dispatch,
//! external clients and background jobs.

pub mod config;
pub mod execution;
pub mod external;
pub mod jobs;
pub mod revision_store;
