//! Measured execution phases.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Step wrapping the whole handling of one execution request.
pub const INTERNAL_FULL: &str = "internal_full";

/// Wall-clock bounds and duration (seconds) of one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMeasuredStep {
    pub name: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub duration: Option<f64>,
    #[serde(skip)]
    began: Option<Instant>,
}

impl PerformanceMeasuredStep {
    pub fn create_and_begin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Some(Utc::now()),
            end: None,
            duration: None,
            began: Some(Instant::now()),
        }
    }

    /// Stop the step. The duration comes from a monotonic clock, so it is never negative.
    ///
    /// Stopping twice keeps the first measurement.
    pub fn stop(&mut self) {
        if self.end.is_some() {
            return;
        }
        self.end = Some(Utc::now());
        self.duration = self.began.map(|b| b.elapsed().as_secs_f64());
    }

    pub fn is_stopped(&self) -> bool {
        self.end.is_some()
    }
}

/// Measured steps of one outcome, keyed by phase name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasuredSteps(BTreeMap<String, PerformanceMeasuredStep>);

impl MeasuredSteps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a step under its own name.
    pub fn insert(&mut self, step: PerformanceMeasuredStep) {
        self.0.insert(step.name.clone(), step);
    }

    pub fn get(&self, name: &str) -> Option<&PerformanceMeasuredStep> {
        self.0.get(name)
    }

    pub fn internal_full(&self) -> Option<&PerformanceMeasuredStep> {
        self.get(INTERNAL_FULL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn stop_is_idempotent() {
        let mut step = PerformanceMeasuredStep::create_and_begin(INTERNAL_FULL);
        step.stop();
        let first_end = step.end;
        let first_duration = step.duration;
        step.stop();
        assert_eq!(step.end, first_end);
        assert_eq!(step.duration, first_duration);
    }

    #[test]
    fn steps_serialize_keyed_by_name() {
        let mut steps = MeasuredSteps::new();
        let mut step = PerformanceMeasuredStep::create_and_begin(INTERNAL_FULL);
        step.stop();
        steps.insert(step);

        let json = serde_json::to_value(&steps).unwrap();
        assert_eq!(json[INTERNAL_FULL]["name"], INTERNAL_FULL);
        assert!(json[INTERNAL_FULL]["duration"].as_f64().unwrap() >= 0.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: a stopped step always carries a non-negative duration.
        #[test]
        fn stopped_step_has_non_negative_duration(name in "[a-z_]{1,24}", spins in 0u64..2_000) {
            let mut step = PerformanceMeasuredStep::create_and_begin(name.clone());
            for i in 0..spins {
                std::hint::black_box(i);
            }
            step.stop();

            prop_assert!(step.is_stopped());
            prop_assert!(step.duration.unwrap() >= 0.0);
            prop_assert_eq!(step.name, name);
        }
    }
}
