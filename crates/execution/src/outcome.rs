use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use trafo_core::JobId;

use crate::timing::{MeasuredSteps, PerformanceMeasuredStep};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Ok,
    Failure,
}

/// The engine's own result payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub result: ExecutionStatus,
    #[serde(default)]
    pub output_results_by_output_name: BTreeMap<String, JsonValue>,
    #[serde(default)]
    pub output_types_by_output_name: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl ExecutionResult {
    pub fn ok(outputs: BTreeMap<String, JsonValue>) -> Self {
        Self {
            result: ExecutionStatus::Ok,
            output_results_by_output_name: outputs,
            output_types_by_output_name: BTreeMap::new(),
            error: None,
            traceback: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            result: ExecutionStatus::Failure,
            output_results_by_output_name: BTreeMap::new(),
            output_types_by_output_name: BTreeMap::new(),
            error: Some(error.into()),
            traceback: None,
        }
    }
}

/// Result of running one request: what the caller (or the callback URL) receives.
///
/// Created by the engine, then mutated once by the service (timing stopped,
/// process metadata attached) before it is returned or delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub job_id: JobId,
    #[serde(default)]
    pub measured_steps: MeasuredSteps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<u32>,
    #[serde(flatten)]
    pub result: ExecutionResult,
}

impl ExecutionOutcome {
    pub fn new(job_id: JobId, result: ExecutionResult) -> Self {
        Self {
            job_id,
            measured_steps: MeasuredSteps::new(),
            process_id: None,
            result,
        }
    }

    pub fn record_step(&mut self, step: PerformanceMeasuredStep) {
        self.measured_steps.insert(step);
    }

    pub fn is_success(&self) -> bool {
        self.result.result == ExecutionStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_payload_is_flattened_next_to_job_id() {
        let job_id = JobId::new();
        let mut outputs = BTreeMap::new();
        outputs.insert("z".to_string(), serde_json::json!(3.0));
        let outcome = ExecutionOutcome::new(job_id, ExecutionResult::ok(outputs));

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["job_id"], job_id.to_string());
        assert_eq!(json["result"], "ok");
        assert_eq!(json["output_results_by_output_name"]["z"], 3.0);
        assert!(json.get("process_id").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failure_outcome_is_not_success() {
        let outcome = ExecutionOutcome::new(JobId::new(), ExecutionResult::failure("division by zero"));
        assert!(!outcome.is_success());
        assert_eq!(outcome.result.error.as_deref(), Some("division by zero"));
    }
}
