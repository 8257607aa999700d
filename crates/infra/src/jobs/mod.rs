//! Background execution jobs.
//!
//! An accepted async request becomes an `ExecutionJob`, handed to the
//! `BackgroundJobRunner`, which executes it detached from the request and
//! delivers the outcome to the job's callback URL.
//!
//! Failure containment has two layers:
//!
//! - expected execution faults are logged and end the job without a callback
//! - anything else is logged with the job id and re-raised to the task
//!   scheduler (the task's `JoinHandle` resolves to an error)

pub mod runner;
pub mod types;

pub use runner::{BackgroundJobRunner, JobFailure, RunnerStats};
pub use types::{ExecutionJob, InvalidTransition, JobState};
