//! `trafo-execution`
//!
//! **Responsibility:** the execution contract between the service and an
//! execution engine.
//!
//! This crate performs no IO:
//! - requests identify *what* to run and with which wiring,
//! - outcomes carry the engine's result plus service-side timing metadata,
//! - the `ExecutionEngine` trait is the seam behind which the actual runtime lives.

pub mod engine;
pub mod outcome;
pub mod request;
pub mod timing;

pub use engine::{validate_declared_outputs, ExecutionEngine, ExecutionFault};
pub use outcome::{ExecutionOutcome, ExecutionResult, ExecutionStatus};
pub use request::{ExecLatestRequest, ExecutionJobRequest, ExecutionTarget};
pub use timing::{MeasuredSteps, PerformanceMeasuredStep, INTERNAL_FULL};
