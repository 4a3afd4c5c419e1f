use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::extraction::ExtractionOutcome;

/// Pipeline step vocabulary, in display order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    ApiRequest,
    ServerProcessing,
    IntentClassification,
    DataExtraction,
    Validation,
    Storage,
    ResponseParse,
    Total,
}

impl PipelineStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStep::ApiRequest => "api_request",
            PipelineStep::ServerProcessing => "server_processing",
            PipelineStep::IntentClassification => "intent_classification",
            PipelineStep::DataExtraction => "data_extraction",
            PipelineStep::Validation => "validation",
            PipelineStep::Storage => "storage",
            PipelineStep::ResponseParse => "response_parse",
            PipelineStep::Total => "total",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineStep::ApiRequest => "API Request",
            PipelineStep::ServerProcessing => "Server Processing",
            PipelineStep::IntentClassification => "Intent Classification",
            PipelineStep::DataExtraction => "Data Extraction",
            PipelineStep::Validation => "Validation",
            PipelineStep::Storage => "Storage",
            PipelineStep::ResponseParse => "Response Parse",
            PipelineStep::Total => "Total",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Duration of one pipeline step in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepTiming {
    pub step: PipelineStep,
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl StepTiming {
    pub fn new(step: PipelineStep, duration: u64) -> Self {
        Self {
            step,
            duration,
            start_time: None,
            end_time: None,
        }
    }

    pub fn spanning(
        step: PipelineStep,
        duration: u64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            step,
            duration,
            start_time: Some(start_time),
            end_time: Some(end_time),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Running,
    Passed,
    Failed,
    Error,
}

impl TestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TestStatus::Running)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestStatus::Running => "running",
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Execution record for one test case.
///
/// Created as `running`, then finished exactly once. A re-run replaces the
/// whole record rather than mutating a finished one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub status: TestStatus,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency: u64,
    pub step_timings: Vec<StepTiming>,
    #[serde(default)]
    pub raw_response: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl TestResult {
    pub fn running() -> Self {
        Self {
            status: TestStatus::Running,
            output: None,
            error: None,
            latency: 0,
            step_timings: Vec::new(),
            raw_response: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Move to a terminal status. Returns false if already finished.
    pub fn finish(&mut self, status: TestStatus, outcome: ExtractionOutcome) -> bool {
        if self.status.is_terminal() {
            log::warn!("Ignoring second completion of a finished test result");
            return false;
        }
        debug_assert!(status.is_terminal());

        self.output = Some(outcome.output());
        self.error = outcome.response.err();
        self.status = status;
        self.latency = outcome.latency;
        self.step_timings = outcome.step_timings;
        self.raw_response = outcome.raw_response;
        self.finished_at = Some(Utc::now());
        true
    }

    pub fn timing(&self, step: PipelineStep) -> Option<u64> {
        self.step_timings
            .iter()
            .find(|t| t.step == step)
            .map(|t| t.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(response: Result<serde_json::Value, String>) -> ExtractionOutcome {
        ExtractionOutcome {
            response,
            raw_response: Some("{}".to_string()),
            step_timings: vec![
                StepTiming::new(PipelineStep::ApiRequest, 40),
                StepTiming::new(PipelineStep::Total, 42),
            ],
            latency: 42,
        }
    }

    #[test]
    fn test_result_finishes_once() {
        let mut result = TestResult::running();
        assert!(!result.status.is_terminal());

        assert!(result.finish(TestStatus::Passed, outcome(Ok(json!({"invoice": {"amount": 5}})))));
        assert_eq!(result.status, TestStatus::Passed);
        assert_eq!(result.output, Some(json!({"amount": 5})));
        assert_eq!(result.timing(PipelineStep::Total), Some(42));
        assert!(result.finished_at.is_some());

        assert!(!result.finish(TestStatus::Error, outcome(Err("late".to_string()))));
        assert_eq!(result.status, TestStatus::Passed);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_error_result_keeps_message() {
        let mut result = TestResult::running();
        result.finish(TestStatus::Error, outcome(Err("HTTP 500: boom".to_string())));
        assert_eq!(result.error.as_deref(), Some("HTTP 500: boom"));
        assert_eq!(result.output, Some(json!({"error": "HTTP 500: boom"})));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TestStatus::Error).unwrap(), "\"error\"");
        assert_eq!(
            serde_json::to_string(&PipelineStep::IntentClassification).unwrap(),
            "\"intent_classification\""
        );
    }

    #[test]
    fn test_step_order_follows_pipeline() {
        let mut steps = vec![
            PipelineStep::Total,
            PipelineStep::Storage,
            PipelineStep::ApiRequest,
        ];
        steps.sort();
        assert_eq!(
            steps,
            vec![
                PipelineStep::ApiRequest,
                PipelineStep::Storage,
                PipelineStep::Total
            ]
        );
    }
}
